use thiserror::Error;

/// Failure reported by an OS-facing handler (view, share, intent launch).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("no handler available for `{0}`")]
    Unavailable(String),
    #[error("handler for `{target}` failed: {reason}")]
    Failed { target: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge call from untrusted origin `{0}`")]
    Untrusted(String),
    #[error("unsupported bridge version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("unknown bridge method `{0}`")]
    UnknownMethod(String),
    #[error("malformed bridge message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("browser surface error: {0}")]
pub struct SurfaceError(pub String);

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("malformed intent descriptor: {0}")]
    MalformedDescriptor(String),
    #[error("popup unavailable: {0}")]
    PopupConstruction(String),
    #[error("invalid trusted origin `{0}`")]
    InvalidOrigin(String),
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}
