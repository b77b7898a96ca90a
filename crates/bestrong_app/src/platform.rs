//! Desktop counterparts of the phone's view, intent and share handlers.

use bestrong_core::error::HandlerError;
use bestrong_core::intent::IntentDescriptor;
use bestrong_core::platform::{PlatformHandlers, ViewRequest};
use bestrong_core::share::ShareIntent;
use bestrong_core::theme::{Appearance, AppearanceProbe};
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopPlatform;

impl DesktopPlatform {
    pub fn new() -> Self {
        Self
    }

    /// Hands `target` to the desktop launcher without waiting for it to exit.
    fn open(&self, target: &str) -> Result<(), HandlerError> {
        open::that_detached(target).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => HandlerError::Unavailable(target.to_string()),
            _ => HandlerError::Failed {
                target: target.to_string(),
                reason: err.to_string(),
            },
        })
    }
}

/// Only web targets may leave an app link; anything else could start a local program.
fn is_web_target(uri: &str) -> bool {
    let lowered = uri.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

impl PlatformHandlers for DesktopPlatform {
    fn view(&self, request: &ViewRequest) -> Result<(), HandlerError> {
        debug!(uri = %request.uri, new_task = request.new_task, "opening with system handler");
        self.open(&request.uri)
    }

    /// Desktops have no package manager to resolve intents; the browser
    /// fallback or an http(s) data URI is the best available target.
    fn launch_intent(&self, intent: &IntentDescriptor) -> Result<(), HandlerError> {
        let target = intent
            .fallback_url
            .clone()
            .filter(|uri| is_web_target(uri))
            .or_else(|| intent.data_uri().filter(|uri| is_web_target(uri)));
        match target {
            Some(target) => {
                info!(%target, package = ?intent.package, "opening app link target");
                self.open(&target)
            }
            None => Err(HandlerError::Unavailable(
                intent.package.clone().unwrap_or_else(|| "intent".to_string()),
            )),
        }
    }

    fn share(&self, intent: &ShareIntent) -> Result<(), HandlerError> {
        if let Some(package) = &intent.package {
            return Err(HandlerError::Unavailable(package.clone()));
        }
        let draft = mail_draft(intent);
        info!(subject = %intent.subject, "sharing through a mail draft");
        self.open(&draft)
    }
}

fn mail_draft(intent: &ShareIntent) -> String {
    format!(
        "mailto:?subject={}&body={}",
        urlencoding::encode(&intent.subject),
        urlencoding::encode(&intent.text)
    )
}

/// Reads the desktop colour scheme; undetectable schemes count as light.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAppearance;

impl AppearanceProbe for SystemAppearance {
    fn system_appearance(&self) -> Appearance {
        match dark_light::detect() {
            Ok(dark_light::Mode::Dark) => Appearance::Dark,
            Ok(_) => Appearance::Light,
            Err(err) => {
                debug!(%err, "system appearance unknown");
                Appearance::Light
            }
        }
    }
}
