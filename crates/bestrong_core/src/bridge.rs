//! Native <-> page message bridge.
//!
//! The page posts JSON envelopes `{"v":1,"id":7,"method":"shareContent","params":{..}}`.
//! Only the fixed method set below is recognised, and only envelopes posted
//! by a page on the trusted origin are accepted.

use serde::Deserialize;
use serde_json::Value;

use crate::error::BridgeError;
use crate::navigation::TrustedOrigin;
use crate::share::ShareContent;

pub const BRIDGE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    ShareContent(ShareContent),
    ToggleTheme,
    IsDarkMode,
}

impl BridgeCall {
    pub fn method(&self) -> &'static str {
        match self {
            BridgeCall::ShareContent(_) => "shareContent",
            BridgeCall::ToggleTheme => "toggleTheme",
            BridgeCall::IsDarkMode => "isDarkMode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMessage {
    pub id: Option<u64>,
    pub call: BridgeCall,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    v: u32,
    #[serde(default)]
    id: Option<u64>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Clone)]
pub struct Bridge {
    trusted: TrustedOrigin,
}

impl Bridge {
    pub fn new(trusted: TrustedOrigin) -> Self {
        Self { trusted }
    }

    /// Validates origin and version, then decodes the call.
    pub fn accept(&self, origin: &str, body: &str) -> Result<BridgeMessage, BridgeError> {
        if !self.trusted.matches(origin) {
            return Err(BridgeError::Untrusted(origin.to_string()));
        }
        let envelope: Envelope = serde_json::from_str(body)?;
        if envelope.v != BRIDGE_VERSION {
            return Err(BridgeError::Version {
                found: envelope.v,
                expected: BRIDGE_VERSION,
            });
        }
        let call = match envelope.method.as_str() {
            "shareContent" => BridgeCall::ShareContent(serde_json::from_value(envelope.params)?),
            "toggleTheme" => BridgeCall::ToggleTheme,
            "isDarkMode" => BridgeCall::IsDarkMode,
            other => return Err(BridgeError::UnknownMethod(other.to_string())),
        };
        Ok(BridgeMessage {
            id: envelope.id,
            call,
        })
    }
}
