pub mod bridge;
pub mod browser;
pub mod error;
pub mod headless;
pub mod intent;
pub mod motivation;
pub mod navigation;
pub mod notice;
pub mod platform;
pub mod scripts;
pub mod settings;
pub mod share;
pub mod shell;
pub mod theme;

pub use browser::{BrowserController, BrowserControllerBuilder, BrowserSettings, BrowserSurface};
pub use error::ShellError;
pub use navigation::{Disposition, NavigationPolicy, TrustedOrigin};
pub use shell::{AppShell, ShellConfig, ShellEvent, TimerQueue};
