//! Navigation interception: decides, for every URL the embedded browser is
//! about to load, whether it stays in the surface or goes to an OS handler.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use url::{Origin, Url};

use crate::error::{HandlerError, ShellError};
use crate::intent::IntentDescriptor;
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::platform::{PlatformHandlers, ViewRequest};

pub const DEFAULT_TRUSTED_ORIGIN: &str = "https://mybestrong.netlify.app";

const LINK_UNAVAILABLE: &str = "Impossible d'ouvrir ce lien";
const BROWSER_UNAVAILABLE: &str = "Aucun navigateur disponible pour ouvrir ce lien";
const INTENT_MALFORMED: &str = "Lien d'application invalide";
const INTENT_UNAVAILABLE: &str = "Application introuvable";
const MARKET_UNAVAILABLE: &str = "Impossible d'ouvrir la boutique d'applications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommunicationKind {
    Tel,
    Mailto,
    Sms,
    WhatsApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Communication(CommunicationKind),
    Web,
    AppLink,
    Market,
    Other,
}

impl Scheme {
    /// Classifies by prefix in precedence order; matching ignores ASCII case.
    pub fn classify(url: &str) -> Self {
        let lowered = url.trim_start().to_ascii_lowercase();
        let starts = |prefix: &str| lowered.starts_with(prefix);
        if starts("tel:") {
            Scheme::Communication(CommunicationKind::Tel)
        } else if starts("mailto:") {
            Scheme::Communication(CommunicationKind::Mailto)
        } else if starts("sms:") {
            Scheme::Communication(CommunicationKind::Sms)
        } else if starts("whatsapp:") {
            Scheme::Communication(CommunicationKind::WhatsApp)
        } else if starts("http:") || starts("https:") {
            Scheme::Web
        } else if starts("intent:") {
            Scheme::AppLink
        } else if starts("market:") {
            Scheme::Market
        } else {
            Scheme::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub scheme: Scheme,
}

impl NavigationRequest {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let scheme = Scheme::classify(&url);
        Self { url, scheme }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep loading inside the embedded browser.
    Continue,
    /// Handled outside the browser, or failed with a notice.
    Consumed,
}

impl Disposition {
    pub fn allows_load(self) -> bool {
        matches!(self, Disposition::Continue)
    }
}

/// Where a request should go, before any handler is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    InBrowser,
    Communication(String),
    ExternalBrowser(String),
    AppLink(String),
    Market(String),
}

/// The single base URL the product is served from.
#[derive(Debug, Clone)]
pub struct TrustedOrigin {
    base: Url,
    origin: Origin,
}

impl TrustedOrigin {
    pub fn parse(base: &str) -> Result<Self, ShellError> {
        let url = Url::parse(base).map_err(|_| ShellError::InvalidOrigin(base.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ShellError::InvalidOrigin(base.to_string()));
        }
        let origin = url.origin();
        Ok(Self { base: url, origin })
    }

    pub fn url(&self) -> &Url {
        &self.base
    }

    pub fn as_str(&self) -> &str {
        self.base.as_str()
    }

    /// True when `candidate` has the same scheme, host and port.
    pub fn matches(&self, candidate: &str) -> bool {
        Url::parse(candidate)
            .map(|url| url.origin() == self.origin)
            .unwrap_or(false)
    }
}

pub struct NavigationPolicy {
    trusted: TrustedOrigin,
    platform: Arc<dyn PlatformHandlers>,
    notices: Arc<NoticeBoard>,
}

impl NavigationPolicy {
    pub fn new(
        trusted: TrustedOrigin,
        platform: Arc<dyn PlatformHandlers>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            trusted,
            platform,
            notices,
        }
    }

    pub fn trusted(&self) -> &TrustedOrigin {
        &self.trusted
    }

    pub fn notices(&self) -> &Arc<NoticeBoard> {
        &self.notices
    }

    pub fn route(&self, request: &NavigationRequest) -> Route {
        let url = request.url.clone();
        match request.scheme {
            Scheme::Communication(_) => Route::Communication(url),
            Scheme::Web if self.trusted.matches(&url) => Route::InBrowser,
            Scheme::Web => Route::ExternalBrowser(url),
            Scheme::AppLink => Route::AppLink(url),
            Scheme::Market => Route::Market(url),
            Scheme::Other => Route::InBrowser,
        }
    }

    /// Decides and performs the disposition for `url`. Exactly one
    /// disposition is returned; failed delegations become notices.
    #[instrument(skip(self))]
    pub fn decide(&self, url: &str) -> Disposition {
        let request = NavigationRequest::new(url);
        match self.route(&request) {
            Route::InBrowser => {
                debug!("loading inside the embedded browser");
                Disposition::Continue
            }
            Route::Communication(uri) => {
                if let Err(err) = self.platform.view(&ViewRequest::new(&uri)) {
                    warn!(%err, "communication link not handled");
                    self.notify(NoticeKind::HandlerUnavailable, LINK_UNAVAILABLE);
                }
                Disposition::Consumed
            }
            Route::ExternalBrowser(uri) => {
                self.open_external(&uri);
                Disposition::Consumed
            }
            Route::AppLink(uri) => {
                self.launch_app_link(&uri);
                Disposition::Consumed
            }
            Route::Market(uri) => {
                if let Err(err) = self.platform.view(&ViewRequest::new(&uri)) {
                    warn!(%err, "store listing not handled");
                    self.notify(NoticeKind::HandlerUnavailable, MARKET_UNAVAILABLE);
                }
                Disposition::Consumed
            }
        }
    }

    /// Handles a request to open `url` in a new window or tab. The shell never
    /// opens a second window: trusted web pages are returned for loading in the
    /// current surface, everything else is decided and consumed here.
    #[instrument(skip(self))]
    pub fn redirect_new_window(&self, url: &str) -> Option<String> {
        let request = NavigationRequest::new(url);
        if request.scheme == Scheme::Other {
            debug!("ignoring new window without a navigable target");
            return None;
        }
        self.decide(url)
            .allows_load()
            .then(|| request.url)
    }

    fn open_external(&self, uri: &str) {
        let first = match self.platform.view(&ViewRequest::in_new_task(uri)) {
            Ok(()) => {
                info!("opened in external browser");
                return;
            }
            Err(err) => err,
        };
        warn!(err = %first, "external browser refused, trying fallback");
        if let Err(err) = self.platform.view(&ViewRequest::new(uri)) {
            warn!(%err, "fallback browser refused");
            self.notify(NoticeKind::HandlerUnavailable, BROWSER_UNAVAILABLE);
        }
    }

    fn launch_app_link(&self, uri: &str) {
        let intent = match IntentDescriptor::parse(uri) {
            Ok(intent) => intent,
            Err(err) => {
                warn!(%err, "rejecting app link");
                self.notify(NoticeKind::MalformedDescriptor, INTENT_MALFORMED);
                return;
            }
        };
        match self.platform.launch_intent(&intent) {
            Ok(()) => info!(package = ?intent.package, "app link launched"),
            Err(HandlerError::Unavailable(target)) => {
                warn!(%target, "no app for link");
                self.notify(NoticeKind::HandlerUnavailable, INTENT_UNAVAILABLE);
            }
            Err(err) => {
                warn!(%err, "app link launch failed");
                self.notify(NoticeKind::HandlerUnavailable, INTENT_UNAVAILABLE);
            }
        }
    }

    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.push(Notice::new(kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_respects_precedence_and_case() {
        assert_eq!(
            Scheme::classify("TEL:+2250700000000"),
            Scheme::Communication(CommunicationKind::Tel)
        );
        assert_eq!(
            Scheme::classify("mailto:contact@example.com"),
            Scheme::Communication(CommunicationKind::Mailto)
        );
        assert_eq!(
            Scheme::classify("whatsapp://send?text=hi"),
            Scheme::Communication(CommunicationKind::WhatsApp)
        );
        assert_eq!(Scheme::classify("HTTPS://example.com"), Scheme::Web);
        assert_eq!(Scheme::classify("intent://scan/#Intent;end"), Scheme::AppLink);
        assert_eq!(Scheme::classify("market://details?id=x"), Scheme::Market);
        assert_eq!(Scheme::classify("about:blank"), Scheme::Other);
        assert_eq!(Scheme::classify("/relative/path"), Scheme::Other);
    }

    #[test]
    fn trusted_origin_compares_scheme_host_and_port() {
        let trusted = TrustedOrigin::parse(DEFAULT_TRUSTED_ORIGIN).unwrap();
        assert!(trusted.matches("https://mybestrong.netlify.app/dashboard?tab=1"));
        assert!(trusted.matches("https://MYBESTRONG.netlify.app"));
        assert!(trusted.matches("https://mybestrong.netlify.app:443/x"));
        assert!(!trusted.matches("http://mybestrong.netlify.app/"));
        assert!(!trusted.matches("https://mybestrong.netlify.app.evil.com/"));
        assert!(!trusted.matches("https://mybestrong.netlify.app:8443/"));
        assert!(!trusted.matches("not a url"));
    }

    #[test]
    fn rejects_opaque_trusted_origin() {
        assert!(TrustedOrigin::parse("mailto:someone@example.com").is_err());
        assert!(TrustedOrigin::parse("::").is_err());
    }
}
