use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::bridge::{Bridge, BridgeCall, BridgeMessage};
use crate::error::{ShellError, SurfaceError};
use crate::motivation::{Catalog, MotivationPicker, Popup};
use crate::navigation::{Disposition, NavigationPolicy, TrustedOrigin, DEFAULT_TRUSTED_ORIGIN};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::platform::PlatformHandlers;
use crate::scripts;
use crate::settings::{MemorySettings, SettingsStore};
use crate::share::{ShareContent, ShareDispatcher, ShareOutcome};
use crate::theme::{AppearanceProbe, AppearanceTarget, ThemeController, ThemeMode, ThemeSnapshot};

const POPUP_UNAVAILABLE: &str = "Message de motivation indisponible";
const PAGE_UNAVAILABLE: &str = "Impossible de charger la page";

/// Capabilities requested from the browser engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub javascript: bool,
    /// Persistent DOM storage; off means a private, forgetful profile.
    pub dom_storage: bool,
    pub zoom: bool,
    pub media_requires_gesture: bool,
    pub clipboard: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            javascript: true,
            dom_storage: true,
            zoom: true,
            media_requires_gesture: false,
            clipboard: true,
        }
    }
}

/// Embedded browser engine as seen by the controller.
pub trait BrowserSurface: AppearanceTarget {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError>;
    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError>;
    fn can_go_back(&self) -> bool;
    fn go_back(&mut self) -> Result<(), SurfaceError>;
    /// Shows or hides the page-loading indicator.
    fn show_loading(&mut self, loading: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    WentBack,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Started,
    Finished,
}

/// Page-side share button that gets rebound to the native share path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareButton {
    pub label: String,
    pub content: ShareContent,
}

pub struct BrowserController {
    settings: BrowserSettings,
    policy: Arc<NavigationPolicy>,
    bridge: Bridge,
    theme: ThemeController,
    share: ShareDispatcher,
    picker: MotivationPicker,
    notices: Arc<NoticeBoard>,
    share_button: ShareButton,
    loading_since: Option<Instant>,
    page_url: Option<String>,
}

pub struct BrowserControllerBuilder {
    trusted_origin: String,
    settings: BrowserSettings,
    store: Option<Arc<dyn SettingsStore>>,
    platform: Option<Arc<dyn PlatformHandlers>>,
    probe: Option<Arc<dyn AppearanceProbe>>,
    catalog: Catalog,
    share_button: Option<ShareButton>,
    seed: Option<u64>,
}

impl BrowserControllerBuilder {
    pub fn new() -> Self {
        Self {
            trusted_origin: DEFAULT_TRUSTED_ORIGIN.to_string(),
            settings: BrowserSettings::default(),
            store: None,
            platform: None,
            probe: None,
            catalog: Catalog::builtin(),
            share_button: None,
            seed: None,
        }
    }

    pub fn trusted_origin(mut self, origin: impl Into<String>) -> Self {
        self.trusted_origin = origin.into();
        self
    }

    pub fn browser_settings(mut self, settings: BrowserSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn PlatformHandlers>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn appearance_probe(mut self, probe: Arc<dyn AppearanceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn share_button(mut self, button: ShareButton) -> Self {
        self.share_button = Some(button);
        self
    }

    /// Seeds the motivational picker instead of drawing from OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<BrowserController, ShellError> {
        let trusted = TrustedOrigin::parse(&self.trusted_origin)?;
        let platform = self
            .platform
            .ok_or(ShellError::MissingComponent("platform handlers"))?;
        let probe = self
            .probe
            .ok_or(ShellError::MissingComponent("appearance probe"))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySettings::new()));
        let notices = Arc::new(NoticeBoard::new());

        let picker = match self.seed {
            Some(seed) => MotivationPicker::seeded(self.catalog, store.clone(), seed),
            None => MotivationPicker::from_entropy(self.catalog, store.clone()),
        };
        let share_button = self.share_button.unwrap_or_else(|| ShareButton {
            label: scripts::SHARE_BUTTON_LABEL.to_string(),
            content: ShareContent::be_strong(trusted.as_str()),
        });

        info!(origin = %trusted.as_str(), "browser controller ready");
        Ok(BrowserController {
            settings: self.settings,
            policy: Arc::new(NavigationPolicy::new(
                trusted.clone(),
                platform.clone(),
                notices.clone(),
            )),
            bridge: Bridge::new(trusted),
            theme: ThemeController::new(store, probe),
            share: ShareDispatcher::new(platform, notices.clone()),
            picker,
            notices,
            share_button,
            loading_since: None,
            page_url: None,
        })
    }
}

impl Default for BrowserControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserController {
    pub fn builder() -> BrowserControllerBuilder {
        BrowserControllerBuilder::new()
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn start_url(&self) -> &str {
        self.policy.trusted().as_str()
    }

    /// Shared policy for the engine's synchronous navigation callback.
    pub fn policy(&self) -> Arc<NavigationPolicy> {
        Arc::clone(&self.policy)
    }

    pub fn notices(&self) -> Arc<NoticeBoard> {
        Arc::clone(&self.notices)
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme.mode()
    }

    pub fn theme_snapshot(&self) -> ThemeSnapshot {
        self.theme.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.loading_since.is_some()
    }

    pub fn page_url(&self) -> Option<&str> {
        self.page_url.as_deref()
    }

    /// Applies the stored theme and loads the trusted origin into `surface`.
    /// Returns `false` when the load could not be issued; the failure is reported.
    pub fn attach(&mut self, surface: &mut dyn BrowserSurface) -> bool {
        self.theme.apply_current(surface);
        let start = self.start_url().to_string();
        info!(url = %start, "loading start page");
        self.open_in_place(surface, &start)
    }

    /// Loads `url` in the current surface, reporting a failed load as a page error.
    pub fn open_in_place(&mut self, surface: &mut dyn BrowserSurface, url: &str) -> bool {
        match surface.load_url(url) {
            Ok(()) => true,
            Err(err) => {
                self.on_page_error(surface, url, &err.to_string());
                false
            }
        }
    }

    pub fn apply_theme(&mut self, surface: &mut dyn BrowserSurface) -> bool {
        self.theme.apply_current(surface)
    }

    pub fn on_navigation(&self, url: &str) -> Disposition {
        self.policy.decide(url)
    }

    /// See [`NavigationPolicy::redirect_new_window`].
    pub fn on_new_window(&self, url: &str) -> Option<String> {
        self.policy.redirect_new_window(url)
    }

    pub fn on_page_event(&mut self, surface: &mut dyn BrowserSurface, event: PageEvent, url: &str) {
        match event {
            PageEvent::Started => {
                debug!(%url, "page load started");
                self.loading_since = Some(Instant::now());
                surface.show_loading(true);
            }
            PageEvent::Finished => self.on_page_finished(surface, url),
        }
    }

    pub fn on_page_error(&mut self, surface: &mut dyn BrowserSurface, url: &str, description: &str) {
        error!(%url, %description, "page failed to load");
        self.loading_since = None;
        surface.show_loading(false);
        self.notices
            .push(Notice::new(NoticeKind::PageUnavailable, PAGE_UNAVAILABLE));
        self.flush_notices(surface);
    }

    fn on_page_finished(&mut self, surface: &mut dyn BrowserSurface, url: &str) {
        let elapsed_ms = self
            .loading_since
            .take()
            .map(|since| since.elapsed().as_millis())
            .unwrap_or_default();
        info!(%url, elapsed_ms, "page loaded");
        surface.show_loading(false);
        self.page_url = Some(url.to_string());

        if self.policy.trusted().matches(url) {
            let theme = self.theme.snapshot();
            let injected = [
                scripts::bridge_shim(),
                scripts::theme_sync(theme),
                scripts::share_button(&self.share_button.label, &self.share_button.content),
                scripts::dom_tweaks().to_string(),
            ];
            for script in injected {
                if let Err(err) = surface.evaluate_script(&script) {
                    warn!(%err, "script injection failed");
                }
            }
        } else {
            debug!(%url, "skipping injection on untrusted page");
        }
        self.flush_notices(surface);
    }

    /// Handles a message posted by page script; replies when the call carries an id.
    pub fn on_bridge_message(
        &mut self,
        surface: &mut dyn BrowserSurface,
        origin: &str,
        body: &str,
    ) {
        match self.bridge.accept(origin, body) {
            Ok(message) => self.dispatch(surface, message),
            Err(err) => warn!(%origin, %err, "bridge message rejected"),
        }
        self.flush_notices(surface);
    }

    fn dispatch(&mut self, surface: &mut dyn BrowserSurface, message: BridgeMessage) {
        debug!(method = message.call.method(), "bridge call");
        let reply = match message.call {
            BridgeCall::ShareContent(content) => {
                let outcome = self.share.share(&content);
                Value::Bool(outcome != ShareOutcome::Reported)
            }
            BridgeCall::ToggleTheme => match self.theme.toggle(surface) {
                Ok(mode) => {
                    self.sync_page_theme(surface);
                    Value::String(mode.display_name().to_string())
                }
                Err(err) => {
                    error!(%err, "unable to persist theme");
                    Value::Null
                }
            },
            BridgeCall::IsDarkMode => Value::Bool(self.theme.is_dark()),
        };
        if let Some(id) = message.id {
            if let Err(err) = surface.evaluate_script(&scripts::bridge_reply(id, &reply)) {
                warn!(%err, id, "bridge reply failed");
            }
        }
    }

    /// Re-sends the current theme to page script, e.g. after the OS scheme changed.
    pub fn sync_page_theme(&self, surface: &mut dyn BrowserSurface) {
        let script = scripts::theme_sync(self.theme.snapshot());
        if let Err(err) = surface.evaluate_script(&script) {
            warn!(%err, "theme sync failed");
        }
    }

    /// Picks the popup content; failures become a notice and no popup.
    pub fn compose_popup(&mut self) -> Option<Popup> {
        match self.picker.pick() {
            Ok(pick) => {
                info!(count = pick.count, tier = pick.tier.name(), "motivational popup ready");
                Some(Popup::from(pick))
            }
            Err(err) => {
                error!(%err, "unable to build motivational popup");
                self.notices
                    .push(Notice::new(NoticeKind::PopupUnavailable, POPUP_UNAVAILABLE));
                None
            }
        }
    }

    pub fn on_back(&mut self, surface: &mut dyn BrowserSurface) -> BackOutcome {
        if surface.can_go_back() {
            match surface.go_back() {
                Ok(()) => return BackOutcome::WentBack,
                Err(err) => warn!(%err, "history navigation failed"),
            }
        }
        BackOutcome::Exit
    }

    /// Renders pending notices as toasts on `surface`.
    pub fn flush_notices(&mut self, surface: &mut dyn BrowserSurface) -> usize {
        let pending = self.notices.drain();
        for notice in &pending {
            if let Err(err) = surface.evaluate_script(&scripts::toast(&notice.message)) {
                warn!(%err, message = %notice.message, "unable to display notice");
            }
        }
        pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessPlatform, HeadlessSurface, PlatformCall};
    use crate::settings::KEY_MESSAGE_COUNT;
    use crate::theme::{Appearance, FixedAppearance};

    const HOME: &str = "https://mybestrong.netlify.app/";

    fn controller(platform: Arc<HeadlessPlatform>) -> (BrowserController, Arc<MemorySettings>) {
        let store = Arc::new(MemorySettings::new());
        let controller = BrowserController::builder()
            .settings_store(store.clone())
            .platform(platform)
            .appearance_probe(Arc::new(FixedAppearance(Appearance::Light)))
            .seed(7)
            .build()
            .expect("controller");
        (controller, store)
    }

    #[test]
    fn builder_requires_platform_and_probe() {
        let missing = BrowserController::builder()
            .appearance_probe(Arc::new(FixedAppearance(Appearance::Dark)))
            .build();
        assert!(matches!(
            missing,
            Err(ShellError::MissingComponent("platform handlers"))
        ));

        let bad_origin = BrowserController::builder()
            .trusted_origin("ftp://example.com")
            .platform(Arc::new(HeadlessPlatform::new()))
            .appearance_probe(Arc::new(FixedAppearance(Appearance::Dark)))
            .build();
        assert!(matches!(bad_origin, Err(ShellError::InvalidOrigin(_))));
    }

    #[test]
    fn defaults_follow_the_mobile_shell() {
        let settings = BrowserSettings::default();
        assert!(settings.javascript && settings.dom_storage && settings.zoom);
        assert!(settings.clipboard);
        assert!(!settings.media_requires_gesture);
    }

    #[test]
    fn attach_applies_theme_and_loads_home() {
        let (mut controller, _) = controller(Arc::new(HeadlessPlatform::new()));
        let mut surface = HeadlessSurface::new();
        assert!(controller.attach(&mut surface));
        assert_eq!(surface.loaded, vec![HOME.to_string()]);
        assert_eq!(surface.appearance, vec![ThemeMode::System]);
        assert!(!controller.apply_theme(&mut surface));
    }

    #[test]
    fn scripts_are_injected_only_on_trusted_pages() {
        let (mut controller, _) = controller(Arc::new(HeadlessPlatform::new()));
        let mut surface = HeadlessSurface::new();

        controller.on_page_event(&mut surface, PageEvent::Started, "https://other.example/");
        assert!(controller.is_loading());
        controller.on_page_event(&mut surface, PageEvent::Finished, "https://other.example/");
        assert!(!controller.is_loading());
        assert!(surface.scripts.is_empty());

        controller.on_page_event(&mut surface, PageEvent::Finished, HOME);
        assert_eq!(surface.loading, vec![true, false, false]);
        assert_eq!(surface.scripts.len(), 4);
        assert!(surface.scripts[0].contains("window.Android"));
        assert!(surface.scripts[1].contains("data-theme"));
        assert_eq!(controller.page_url(), Some(HOME));
    }

    #[test]
    fn failed_load_clears_progress_and_raises_a_toast() {
        let (mut controller, _) = controller(Arc::new(HeadlessPlatform::new()));
        let mut surface = HeadlessSurface::new().failing_loads();

        controller.on_page_event(&mut surface, PageEvent::Started, HOME);
        assert!(!controller.attach(&mut surface));
        assert!(!controller.is_loading());
        assert_eq!(surface.loading, vec![true, false]);
        assert_eq!(surface.scripts.len(), 1);
        assert!(surface.scripts[0].contains(PAGE_UNAVAILABLE));
        assert!(controller.notices().is_empty());
    }

    #[test]
    fn new_window_requests_reuse_the_current_surface() {
        let platform = Arc::new(HeadlessPlatform::new());
        let (controller, _) = controller(platform.clone());

        assert_eq!(
            controller.on_new_window("https://mybestrong.netlify.app/boost"),
            Some("https://mybestrong.netlify.app/boost".to_string())
        );
        assert_eq!(controller.on_new_window("https://www.tiktok.com/@bestrong"), None);
        assert_eq!(platform.view_count(), 1);
    }

    #[test]
    fn failing_injection_does_not_panic() {
        let (mut controller, _) = controller(Arc::new(HeadlessPlatform::new()));
        let mut surface = HeadlessSurface::new().failing_scripts();
        controller.on_page_event(&mut surface, PageEvent::Finished, HOME);
        assert!(surface.scripts.is_empty());
    }

    #[test]
    fn toggle_over_bridge_resyncs_and_replies() {
        let (mut controller, _) = controller(Arc::new(HeadlessPlatform::new()));
        let mut surface = HeadlessSurface::new();
        controller.on_bridge_message(&mut surface, HOME, r#"{"v":1,"id":3,"method":"toggleTheme"}"#);

        assert_eq!(controller.theme_mode(), ThemeMode::Light);
        assert_eq!(surface.appearance, vec![ThemeMode::Light]);
        assert!(surface.scripts[0].contains("setDark(false)"));
        assert_eq!(
            surface.scripts[1],
            scripts::bridge_reply(3, &Value::String("Clair".to_string()))
        );
    }

    #[test]
    fn untrusted_bridge_message_is_ignored() {
        let platform = Arc::new(HeadlessPlatform::new());
        let (mut controller, _) = controller(platform.clone());
        let mut surface = HeadlessSurface::new();
        controller.on_bridge_message(
            &mut surface,
            "https://evil.example",
            r#"{"v":1,"method":"shareContent","params":{"title":"t","text":"b","url":"u"}}"#,
        );
        assert!(platform.calls().is_empty());
        assert!(surface.scripts.is_empty());
    }

    #[test]
    fn share_without_handler_becomes_toast() {
        let platform = Arc::new(HeadlessPlatform::new().without_share_handler());
        let (mut controller, _) = controller(platform.clone());
        let mut surface = HeadlessSurface::new();
        controller.on_bridge_message(
            &mut surface,
            HOME,
            r#"{"v":1,"id":1,"method":"shareContent","params":{"title":"t","text":"b","url":"u"}}"#,
        );

        assert!(matches!(platform.calls().as_slice(), [PlatformCall::Share(_)]));
        assert_eq!(surface.scripts[0], scripts::bridge_reply(1, &Value::Bool(false)));
        assert!(surface.scripts[1].contains("Aucune application de partage disponible"));
        assert!(controller.notices().is_empty());
    }

    #[test]
    fn popup_counts_each_display() {
        let (mut controller, store) = controller(Arc::new(HeadlessPlatform::new()));
        let popup = controller.compose_popup().expect("popup");
        assert_eq!(popup.title, "MOTIVATION DEBUTANT");
        assert_eq!(store.get_int(KEY_MESSAGE_COUNT, 0), 1);
    }

    #[test]
    fn back_walks_history_then_exits() {
        let (mut controller, _) = controller(Arc::new(HeadlessPlatform::new()));
        let mut surface = HeadlessSurface::new();
        assert!(controller.attach(&mut surface));
        surface.visit("https://mybestrong.netlify.app/profile");

        assert_eq!(controller.on_back(&mut surface), BackOutcome::WentBack);
        assert_eq!(surface.current_url(), Some(HOME));
        assert_eq!(controller.on_back(&mut surface), BackOutcome::Exit);
    }
}
