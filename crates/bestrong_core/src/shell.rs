//! Screen flow: splash, then the browser screen with a delayed popup.

use std::time::{Duration, Instant};

use tracing::{debug, info};

pub const DEFAULT_SPLASH: Duration = Duration::from_millis(3000);
pub const DEFAULT_POPUP_DELAY: Duration = Duration::from_millis(3000);

pub const SPLASH_TITLE: &str = "BE STRONG";
pub const SPLASH_SUBTITLE: &str = "Augmentez votre visibilité TikTok";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    SplashElapsed,
    ShowPopup,
}

/// Posts fire-once delayed events back to the event loop.
pub trait Scheduler {
    fn post_delayed(&mut self, delay: Duration, event: ShellEvent);
}

/// Deadline-ordered queue of pending events, drained by the event loop.
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<(Instant, ShellEvent)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_at(&mut self, deadline: Instant, event: ShellEvent) {
        let slot = self
            .pending
            .partition_point(|(existing, _)| *existing <= deadline);
        self.pending.insert(slot, (deadline, event));
    }

    /// Removes and returns every event whose deadline is at or before `now`.
    pub fn due(&mut self, now: Instant) -> Vec<ShellEvent> {
        let split = self.pending.partition_point(|(deadline, _)| *deadline <= now);
        self.pending
            .drain(..split)
            .map(|(_, event)| event)
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn post_delayed(&mut self, delay: Duration, event: ShellEvent) {
        self.post_at(Instant::now() + delay, event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnterBrowser,
    ShowPopup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellConfig {
    pub splash: Duration,
    pub popup_delay: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            splash: DEFAULT_SPLASH,
            popup_delay: DEFAULT_POPUP_DELAY,
        }
    }
}

#[derive(Debug)]
pub struct AppShell {
    config: ShellConfig,
    screen: Screen,
    popup_shown: bool,
}

impl AppShell {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            screen: Screen::Splash,
            popup_shown: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn config(&self) -> ShellConfig {
        self.config
    }

    /// Shows the splash and schedules its end.
    pub fn launch(&mut self, scheduler: &mut dyn Scheduler) {
        info!(splash_ms = self.config.splash.as_millis(), "shell launched");
        self.screen = Screen::Splash;
        scheduler.post_delayed(self.config.splash, ShellEvent::SplashElapsed);
    }

    pub fn handle(
        &mut self,
        event: ShellEvent,
        scheduler: &mut dyn Scheduler,
    ) -> Option<Transition> {
        match (event, self.screen) {
            (ShellEvent::SplashElapsed, Screen::Splash) => {
                self.screen = Screen::Browser;
                self.popup_shown = false;
                scheduler.post_delayed(self.config.popup_delay, ShellEvent::ShowPopup);
                info!("entering browser screen");
                Some(Transition::EnterBrowser)
            }
            (ShellEvent::ShowPopup, Screen::Browser) if !self.popup_shown => {
                self.popup_shown = true;
                Some(Transition::ShowPopup)
            }
            (event, screen) => {
                debug!(?event, ?screen, "ignoring stale shell event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingScheduler {
        posted: Vec<(Duration, ShellEvent)>,
    }

    impl Scheduler for RecordingScheduler {
        fn post_delayed(&mut self, delay: Duration, event: ShellEvent) {
            self.posted.push((delay, event));
        }
    }

    #[test]
    fn splash_then_browser_then_single_popup() {
        let mut shell = AppShell::new(ShellConfig::default());
        let mut scheduler = RecordingScheduler::default();

        shell.launch(&mut scheduler);
        assert_eq!(scheduler.posted, vec![(DEFAULT_SPLASH, ShellEvent::SplashElapsed)]);

        assert_eq!(
            shell.handle(ShellEvent::SplashElapsed, &mut scheduler),
            Some(Transition::EnterBrowser)
        );
        assert_eq!(shell.screen(), Screen::Browser);
        assert_eq!(scheduler.posted[1], (DEFAULT_POPUP_DELAY, ShellEvent::ShowPopup));

        assert_eq!(
            shell.handle(ShellEvent::ShowPopup, &mut scheduler),
            Some(Transition::ShowPopup)
        );
        assert_eq!(shell.handle(ShellEvent::ShowPopup, &mut scheduler), None);
        assert_eq!(shell.handle(ShellEvent::SplashElapsed, &mut scheduler), None);
        assert_eq!(scheduler.posted.len(), 2);
    }

    #[test]
    fn popup_before_browser_is_ignored() {
        let mut shell = AppShell::new(ShellConfig::default());
        let mut scheduler = RecordingScheduler::default();
        shell.launch(&mut scheduler);
        assert_eq!(shell.handle(ShellEvent::ShowPopup, &mut scheduler), None);
        assert_eq!(shell.screen(), Screen::Splash);
    }

    #[test]
    fn timer_queue_releases_in_deadline_order() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.post_at(start + Duration::from_millis(30), ShellEvent::ShowPopup);
        queue.post_at(start + Duration::from_millis(10), ShellEvent::SplashElapsed);

        assert_eq!(queue.next_deadline(), Some(start + Duration::from_millis(10)));
        assert!(queue.due(start).is_empty());
        assert_eq!(
            queue.due(start + Duration::from_millis(10)),
            vec![ShellEvent::SplashElapsed]
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.due(start + Duration::from_secs(1)),
            vec![ShellEvent::ShowPopup]
        );
        assert!(queue.is_empty());
    }
}
