//! Parser for `intent:` app-linking URIs of the form
//! `intent://host/path#Intent;scheme=..;package=..;S.browser_fallback_url=..;end`.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::ShellError;

const PREFIX: &str = "intent:";
const FRAGMENT: &str = "#Intent;";
const FALLBACK_KEY: &str = "S.browser_fallback_url";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentDescriptor {
    /// Scheme-less data part, e.g. `//scan/`.
    pub data: Option<String>,
    pub scheme: Option<String>,
    pub package: Option<String>,
    pub action: Option<String>,
    pub categories: Vec<String>,
    pub component: Option<String>,
    pub fallback_url: Option<String>,
    /// Remaining typed extras keyed as written (`S.title`, `i.count`, ...).
    pub extras: BTreeMap<String, String>,
}

impl IntentDescriptor {
    pub fn parse(uri: &str) -> Result<Self, ShellError> {
        let head = uri.get(..PREFIX.len()).unwrap_or_default();
        if !head.eq_ignore_ascii_case(PREFIX) {
            return Err(malformed(uri, "missing intent: prefix"));
        }
        let rest = &uri[PREFIX.len()..];
        let (data, params) = rest
            .split_once(FRAGMENT)
            .ok_or_else(|| malformed(uri, "missing #Intent; section"))?;

        let mut segments: Vec<&str> = params.split(';').filter(|s| !s.is_empty()).collect();
        if segments.pop() != Some("end") {
            return Err(malformed(uri, "section is not terminated by `end`"));
        }

        let mut descriptor = IntentDescriptor {
            data: (!data.is_empty()).then(|| data.to_string()),
            ..IntentDescriptor::default()
        };
        for segment in segments {
            let (key, raw_value) = segment
                .split_once('=')
                .ok_or_else(|| malformed(uri, "segment without `=`"))?;
            let value = urlencoding::decode(raw_value)
                .map_err(|_| malformed(uri, "invalid percent-encoding"))?
                .into_owned();
            match key {
                "scheme" => descriptor.scheme = Some(value),
                "package" => descriptor.package = Some(value),
                "action" => descriptor.action = Some(value),
                "category" => descriptor.categories.push(value),
                "component" => descriptor.component = Some(value),
                FALLBACK_KEY => descriptor.fallback_url = Some(value),
                _ => {
                    descriptor.extras.insert(key.to_string(), value);
                }
            }
        }
        Ok(descriptor)
    }

    /// Data URI the target app should receive, e.g. `zxing://scan/`.
    pub fn data_uri(&self) -> Option<String> {
        match (&self.scheme, &self.data) {
            (Some(scheme), Some(data)) => Some(format!("{scheme}:{data}")),
            _ => None,
        }
    }
}

impl FromStr for IntentDescriptor {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn malformed(uri: &str, reason: &str) -> ShellError {
    ShellError::MalformedDescriptor(format!("{reason}: {uri}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_descriptor() {
        let raw = "intent://scan/#Intent;scheme=zxing;package=com.google.zxing.client.android;\
                   action=android.intent.action.VIEW;category=android.intent.category.BROWSABLE;\
                   S.browser_fallback_url=https%3A%2F%2Fexample.com%2Fscan;S.title=Bonjour%20toi;end";
        let intent: IntentDescriptor = raw.parse().expect("descriptor parses");

        assert_eq!(intent.data.as_deref(), Some("//scan/"));
        assert_eq!(intent.scheme.as_deref(), Some("zxing"));
        assert_eq!(
            intent.package.as_deref(),
            Some("com.google.zxing.client.android")
        );
        assert_eq!(intent.categories, vec!["android.intent.category.BROWSABLE"]);
        assert_eq!(
            intent.fallback_url.as_deref(),
            Some("https://example.com/scan")
        );
        assert_eq!(intent.extras.get("S.title").map(String::as_str), Some("Bonjour toi"));
        assert_eq!(intent.data_uri().as_deref(), Some("zxing://scan/"));
    }

    #[test]
    fn accepts_descriptor_without_data() {
        let intent = IntentDescriptor::parse("intent:#Intent;action=com.example.OPEN;end").unwrap();
        assert_eq!(intent.data, None);
        assert_eq!(intent.action.as_deref(), Some("com.example.OPEN"));
        assert_eq!(intent.data_uri(), None);
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for raw in [
            "intent://scan/",
            "intent://scan/#Intent;scheme=zxing",
            "intent://scan/#Intent;scheme;end",
            "intent://scan/#Intent;S.browser_fallback_url=%FF%FE;end",
            "market://details?id=com.whatsapp",
        ] {
            let err = IntentDescriptor::parse(raw).unwrap_err();
            assert!(
                matches!(err, ShellError::MalformedDescriptor(_)),
                "{raw} should be malformed"
            );
        }
    }
}
