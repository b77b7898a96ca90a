use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bestrong_core::browser::{BackOutcome, BrowserController, BrowserSurface, PageEvent};
use bestrong_core::error::SurfaceError;
use bestrong_core::motivation::Popup;
use bestrong_core::navigation::DEFAULT_TRUSTED_ORIGIN;
use bestrong_core::settings::{FileSettings, MemorySettings, SettingsStore};
use bestrong_core::shell::{
    AppShell, Screen, ShellConfig, TimerQueue, Transition, DEFAULT_POPUP_DELAY, DEFAULT_SPLASH,
    SPLASH_SUBTITLE, SPLASH_TITLE,
};
use bestrong_core::theme::{AppearanceTarget, ThemeMode};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Theme, Window, WindowId};
use wry::{PageLoadEvent, WebView, WebViewBuilder};

use crate::platform::{DesktopPlatform, SystemAppearance};

const SPLASH_BACKGROUND: (u8, u8, u8, u8) = (17, 24, 39, 255);
const LOADING_SUFFIX: &str = " (chargement…)";

/// Upper bound on how long the loop sleeps so GTK keeps getting pumped.
#[cfg(target_os = "linux")]
const GTK_TICK: Duration = Duration::from_millis(16);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) start_url: String,
    pub(crate) splash: Duration,
    pub(crate) popup_delay: Duration,
    pub(crate) settings_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BESTRONG_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.start_url = url.to_string();
            }
        }
        if let Some(splash) = millis_from_env("BESTRONG_SPLASH_MS") {
            config.splash = splash;
        }
        if let Some(delay) = millis_from_env("BESTRONG_POPUP_DELAY_MS") {
            config.popup_delay = delay;
        }
        if let Ok(path) = std::env::var("BESTRONG_SETTINGS_PATH") {
            if !path.trim().is_empty() {
                config.settings_path = Some(PathBuf::from(path));
            }
        }
        Ok(config)
    }

    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            splash: self.splash,
            popup_delay: self.popup_delay,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_TRUSTED_ORIGIN.to_string(),
            splash: DEFAULT_SPLASH,
            popup_delay: DEFAULT_POPUP_DELAY,
            settings_path: dirs::config_dir()
                .map(|dir| dir.join("BeStrong").join("settings.toml")),
        }
    }
}

fn millis_from_env(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(Duration::from_millis(value)),
        Err(err) => {
            warn!(%key, %raw, %err, "ignoring invalid duration");
            None
        }
    }
}

/// Webview callbacks, forwarded into the event loop.
#[derive(Debug)]
pub enum UserEvent {
    Page { event: PageEvent, url: String },
    Bridge { origin: String, body: String },
    /// A new-window request the policy allowed; loaded in the existing webview.
    OpenInPlace { url: String },
    NoticesPending,
}

fn forward(proxy: &EventLoopProxy<UserEvent>, event: UserEvent) {
    if let Err(err) = proxy.send_event(event) {
        debug!(%err, "event loop already closed");
    }
}

struct WrySurface {
    // Dropped before the window it is attached to.
    webview: WebView,
    window: Window,
    history: Vec<String>,
}

impl WrySurface {
    fn record_visit(&mut self, url: &str) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return;
        }
        if self.history.last().map(String::as_str) != Some(url) {
            self.history.push(url.to_string());
        }
    }
}

fn surface_error(err: wry::Error) -> SurfaceError {
    SurfaceError(err.to_string())
}

impl AppearanceTarget for WrySurface {
    fn set_appearance(&mut self, mode: ThemeMode) {
        let theme = match mode {
            ThemeMode::System => None,
            ThemeMode::Light => Some(Theme::Light),
            ThemeMode::Dark => Some(Theme::Dark),
        };
        self.window.set_theme(theme);
    }
}

impl BrowserSurface for WrySurface {
    fn load_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.webview.load_url(url).map_err(surface_error)
    }

    fn evaluate_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        self.webview.evaluate_script(script).map_err(surface_error)
    }

    fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    fn go_back(&mut self) -> Result<(), SurfaceError> {
        self.webview
            .evaluate_script("history.back();")
            .map_err(surface_error)?;
        self.history.pop();
        Ok(())
    }

    fn show_loading(&mut self, loading: bool) {
        self.window.set_title(&window_title(loading));
    }
}

fn window_title(loading: bool) -> String {
    if loading {
        format!("{SPLASH_TITLE}{LOADING_SUFFIX}")
    } else {
        SPLASH_TITLE.to_string()
    }
}

fn splash_html() -> String {
    format!(
        r#"<!doctype html><html lang="fr"><head><meta charset="utf-8"><style>
html, body {{ margin: 0; height: 100%; background: #111827; color: #fff; font-family: sans-serif; }}
body {{ display: flex; flex-direction: column; align-items: center; justify-content: center; }}
h1 {{ margin: 0; font-size: 44px; letter-spacing: 6px; }}
p {{ opacity: 0.8; }}
</style></head><body><h1>{SPLASH_TITLE}</h1><p>{SPLASH_SUBTITLE}</p></body></html>"#
    )
}

pub struct ShellApp {
    config: AppConfig,
    proxy: EventLoopProxy<UserEvent>,
    shell: AppShell,
    timers: TimerQueue,
    controller: BrowserController,
    surface: Option<WrySurface>,
}

impl ShellApp {
    pub fn new(
        config: AppConfig,
        controller: BrowserController,
        proxy: EventLoopProxy<UserEvent>,
    ) -> Self {
        Self {
            shell: AppShell::new(config.shell_config()),
            config,
            proxy,
            timers: TimerQueue::new(),
            controller,
            surface: None,
        }
    }

    fn create_surface(&self, event_loop: &ActiveEventLoop) -> Result<WrySurface> {
        let attributes = Window::default_attributes()
            .with_title(SPLASH_TITLE)
            .with_inner_size(LogicalSize::new(430.0, 900.0));
        let window = event_loop
            .create_window(attributes)
            .context("failed to create window")?;

        let settings = self.controller.settings().clone();
        let policy = self.controller.policy();
        let navigation_proxy = self.proxy.clone();
        let window_policy = self.controller.policy();
        let window_proxy = self.proxy.clone();
        let page_proxy = self.proxy.clone();
        let ipc_proxy = self.proxy.clone();

        let mut builder = WebViewBuilder::new()
            .with_html(splash_html())
            .with_navigation_handler(move |url: String| {
                let disposition = policy.decide(&url);
                if !policy.notices().is_empty() {
                    forward(&navigation_proxy, UserEvent::NoticesPending);
                }
                disposition.allows_load()
            })
            .with_new_window_req_handler(move |url: String| {
                if let Some(url) = window_policy.redirect_new_window(&url) {
                    forward(&window_proxy, UserEvent::OpenInPlace { url });
                }
                if !window_policy.notices().is_empty() {
                    forward(&window_proxy, UserEvent::NoticesPending);
                }
                false
            })
            .with_on_page_load_handler(move |event, url| {
                let event = match event {
                    PageLoadEvent::Started => PageEvent::Started,
                    PageLoadEvent::Finished => PageEvent::Finished,
                };
                forward(&page_proxy, UserEvent::Page { event, url });
            })
            .with_ipc_handler(move |request: wry::http::Request<String>| {
                let origin = request.uri().to_string();
                let body = request.into_body();
                forward(&ipc_proxy, UserEvent::Bridge { origin, body });
            })
            .with_autoplay(!settings.media_requires_gesture)
            .with_hotkeys_zoom(settings.zoom)
            .with_incognito(!settings.dom_storage)
            .with_clipboard(settings.clipboard)
            .with_devtools(cfg!(debug_assertions))
            .with_background_color(SPLASH_BACKGROUND);
        if !settings.javascript {
            builder = builder.with_javascript_disabled();
        }
        debug!(?settings, "browser settings");

        let webview = builder.build(&window).context("failed to create webview")?;
        Ok(WrySurface {
            webview,
            window,
            history: Vec::new(),
        })
    }

    fn apply(&mut self, transition: Transition) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match transition {
            Transition::EnterBrowser => {
                if !self.controller.attach(surface) {
                    warn!("start page unavailable, staying on the current page");
                }
            }
            Transition::ShowPopup => match self.controller.compose_popup() {
                Some(popup) => show_popup(&popup),
                None => {
                    self.controller.flush_notices(surface);
                }
            },
        }
    }

    fn back(&mut self, event_loop: &ActiveEventLoop) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let outcome = match self.shell.screen() {
            Screen::Browser => self.controller.on_back(surface),
            Screen::Splash => BackOutcome::Exit,
        };
        if outcome == BackOutcome::Exit {
            info!("back pressed without history, exiting");
            event_loop.exit();
        }
    }

    fn schedule_wakeup(&self, event_loop: &ActiveEventLoop) {
        let deadline = self.timers.next_deadline();
        #[cfg(target_os = "linux")]
        let deadline = {
            let tick = Instant::now() + GTK_TICK;
            Some(deadline.map_or(tick, |deadline| deadline.min(tick)))
        };
        event_loop.set_control_flow(match deadline {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }
}

fn show_popup(popup: &Popup) {
    let description = format!("{}\n\nNiveau : {}", popup.message, popup.level_name);
    let result = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title(&popup.title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
    debug!(?result, "motivational popup dismissed");
}

impl ApplicationHandler<UserEvent> for ShellApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        match self.create_surface(event_loop) {
            Ok(surface) => {
                info!(url = %self.config.start_url, "shell window ready");
                self.surface = Some(surface);
                self.shell.launch(&mut self.timers);
            }
            Err(err) => {
                error!(%err, "unable to create shell window");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape | NamedKey::BrowserBack),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.back(event_loop),
            WindowEvent::ThemeChanged(theme) => {
                debug!(?theme, "system theme changed");
                if let Some(surface) = self.surface.as_mut() {
                    if self.controller.theme_mode() == ThemeMode::System {
                        self.controller.sync_page_theme(surface);
                    }
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match event {
            UserEvent::Page { event, url } => {
                if event == PageEvent::Finished {
                    surface.record_visit(&url);
                }
                self.controller.on_page_event(surface, event, &url);
            }
            UserEvent::Bridge { origin, body } => {
                self.controller.on_bridge_message(surface, &origin, &body);
            }
            UserEvent::OpenInPlace { url } => {
                self.controller.open_in_place(surface, &url);
            }
            UserEvent::NoticesPending => {
                self.controller.flush_notices(surface);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        #[cfg(target_os = "linux")]
        while gtk::events_pending() {
            gtk::main_iteration_do(false);
        }

        for event in self.timers.due(Instant::now()) {
            if let Some(transition) = self.shell.handle(event, &mut self.timers) {
                self.apply(transition);
            }
        }
        self.schedule_wakeup(event_loop);
    }
}

fn open_settings(config: &AppConfig) -> Arc<dyn SettingsStore> {
    if let Some(path) = &config.settings_path {
        match FileSettings::open(path) {
            Ok(store) => {
                info!(path = %store.path().display(), "using settings file");
                return Arc::new(store);
            }
            Err(err) => warn!(path = %path.display(), %err, "settings file unavailable, keeping preferences in memory"),
        }
    }
    Arc::new(MemorySettings::new())
}

pub fn run(config: AppConfig) -> Result<()> {
    #[cfg(target_os = "linux")]
    gtk::init().context("failed to initialise GTK")?;

    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("failed to create event loop")?;

    let controller = BrowserController::builder()
        .trusted_origin(config.start_url.clone())
        .settings_store(open_settings(&config))
        .platform(Arc::new(DesktopPlatform::new()))
        .appearance_probe(Arc::new(SystemAppearance))
        .build()
        .context("invalid shell configuration")?;

    info!("starting BE STRONG shell");
    let mut app = ShellApp::new(config, controller, event_loop.create_proxy());
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with an error")?;
    Ok(())
}
