//! In-process stand-ins for the browser surface and OS handlers, used to drive
//! the shell without a window.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::browser::BrowserSurface;
use crate::error::{HandlerError, SurfaceError};
use crate::intent::IntentDescriptor;
use crate::platform::{PlatformHandlers, ViewRequest};
use crate::share::ShareIntent;
use crate::theme::{AppearanceTarget, ThemeMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    View(ViewRequest),
    Intent(IntentDescriptor),
    Share(ShareIntent),
}

/// Records every delegation; availability is configurable per action.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    refused_views: Mutex<usize>,
    refuse_all_views: bool,
    share_available: bool,
    intents_available: bool,
    missing_packages: HashSet<String>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            share_available: true,
            intents_available: true,
            ..Self::default()
        }
    }

    /// Refuses the next `count` view requests, then accepts.
    pub fn refusing_views(self, count: usize) -> Self {
        *self.refused_views.lock() = count;
        self
    }

    pub fn without_view_handler(mut self) -> Self {
        self.refuse_all_views = true;
        self
    }

    pub fn without_share_handler(mut self) -> Self {
        self.share_available = false;
        self
    }

    pub fn without_intent_handler(mut self) -> Self {
        self.intents_available = false;
        self
    }

    pub fn without_package(mut self, package: &str) -> Self {
        self.missing_packages.insert(package.to_string());
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    pub fn view_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, PlatformCall::View(_)))
            .count()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }
}

impl PlatformHandlers for HeadlessPlatform {
    fn view(&self, request: &ViewRequest) -> Result<(), HandlerError> {
        self.record(PlatformCall::View(request.clone()));
        if self.refuse_all_views {
            return Err(HandlerError::Unavailable(request.uri.clone()));
        }
        let mut refused = self.refused_views.lock();
        if *refused > 0 {
            *refused -= 1;
            return Err(HandlerError::Unavailable(request.uri.clone()));
        }
        Ok(())
    }

    fn launch_intent(&self, intent: &IntentDescriptor) -> Result<(), HandlerError> {
        self.record(PlatformCall::Intent(intent.clone()));
        if self.intents_available {
            Ok(())
        } else {
            Err(HandlerError::Unavailable(
                intent.package.clone().unwrap_or_else(|| "intent".to_string()),
            ))
        }
    }

    fn share(&self, intent: &ShareIntent) -> Result<(), HandlerError> {
        self.record(PlatformCall::Share(intent.clone()));
        if let Some(package) = &intent.package {
            if self.missing_packages.contains(package) {
                return Err(HandlerError::Unavailable(package.clone()));
            }
        }
        if self.share_available {
            Ok(())
        } else {
            Err(HandlerError::Unavailable("text/plain".to_string()))
        }
    }
}

/// Browser surface that remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub loaded: Vec<String>,
    pub scripts: Vec<String>,
    pub appearance: Vec<ThemeMode>,
    /// Every loading-indicator change, in order.
    pub loading: Vec<bool>,
    history: Vec<String>,
    fail_scripts: bool,
    fail_loads: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_scripts(mut self) -> Self {
        self.fail_scripts = true;
        self
    }

    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Simulates the page finishing a navigation to `url`.
    pub fn visit(&mut self, url: &str) {
        self.history.push(url.to_string());
    }

    pub fn current_url(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }
}

impl AppearanceTarget for HeadlessSurface {
    fn set_appearance(&mut self, mode: ThemeMode) {
        self.appearance.push(mode);
    }
}

impl BrowserSurface for HeadlessSurface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        if self.fail_loads {
            return Err(SurfaceError(format!("unable to load {url}")));
        }
        self.loaded.push(url.to_string());
        self.history.push(url.to_string());
        Ok(())
    }

    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        if self.fail_scripts {
            return Err(SurfaceError("script evaluation disabled".to_string()));
        }
        self.scripts.push(script.to_string());
        Ok(())
    }

    fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    fn go_back(&mut self) -> Result<(), SurfaceError> {
        if self.history.len() <= 1 {
            return Err(SurfaceError("no history".to_string()));
        }
        self.history.pop();
        Ok(())
    }

    fn show_loading(&mut self, loading: bool) {
        self.loading.push(loading);
    }
}
