use crate::error::HandlerError;
use crate::intent::IntentDescriptor;
use crate::share::ShareIntent;

/// Request for the OS "view" action on a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub uri: String,
    /// Ask the OS to open the target in a separate task/window.
    pub new_task: bool,
}

impl ViewRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            new_task: false,
        }
    }

    pub fn in_new_task(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            new_task: true,
        }
    }
}

/// OS handlers the shell delegates to. Platform adapters implement this trait;
/// launches are fire-and-forget, only the availability outcome is reported.
pub trait PlatformHandlers: Send + Sync {
    fn view(&self, request: &ViewRequest) -> Result<(), HandlerError>;
    fn launch_intent(&self, intent: &IntentDescriptor) -> Result<(), HandlerError>;
    fn share(&self, intent: &ShareIntent) -> Result<(), HandlerError>;
}
