use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SettingsError;
use crate::settings::{SettingsStore, KEY_THEME_MODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn code(self) -> i64 {
        match self {
            ThemeMode::System => 0,
            ThemeMode::Light => 1,
            ThemeMode::Dark => 2,
        }
    }

    /// Unknown codes read back as `System`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ThemeMode::Light,
            2 => ThemeMode::Dark,
            _ => ThemeMode::System,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ThemeMode::System => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::System,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ThemeMode::System => "Système",
            ThemeMode::Light => "Clair",
            ThemeMode::Dark => "Sombre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

/// Answers what the OS currently renders when the user follows the system theme.
pub trait AppearanceProbe: Send + Sync {
    fn system_appearance(&self) -> Appearance;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedAppearance(pub Appearance);

impl AppearanceProbe for FixedAppearance {
    fn system_appearance(&self) -> Appearance {
        self.0
    }
}

/// Receives OS-level appearance changes (window theme, night mode).
pub trait AppearanceTarget {
    fn set_appearance(&mut self, mode: ThemeMode);
}

/// Theme state captured when a screen is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeSnapshot {
    pub mode: ThemeMode,
    pub dark: bool,
}

impl ThemeSnapshot {
    pub fn data_theme(&self) -> &'static str {
        if self.dark {
            "dark"
        } else {
            "light"
        }
    }
}

pub struct ThemeController {
    store: Arc<dyn SettingsStore>,
    probe: Arc<dyn AppearanceProbe>,
    applied: Option<ThemeMode>,
}

impl ThemeController {
    pub fn new(store: Arc<dyn SettingsStore>, probe: Arc<dyn AppearanceProbe>) -> Self {
        Self {
            store,
            probe,
            applied: None,
        }
    }

    pub fn mode(&self) -> ThemeMode {
        ThemeMode::from_code(self.store.get_int(KEY_THEME_MODE, ThemeMode::System.code()))
    }

    pub fn set_mode<T: AppearanceTarget + ?Sized>(
        &mut self,
        mode: ThemeMode,
        target: &mut T,
    ) -> Result<(), SettingsError> {
        self.store.put_int(KEY_THEME_MODE, mode.code())?;
        info!(mode = mode.display_name(), "theme preference stored");
        self.apply_current(target);
        Ok(())
    }

    /// Advances System -> Light -> Dark -> System and persists the result.
    pub fn toggle<T: AppearanceTarget + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> Result<ThemeMode, SettingsError> {
        let next = self.mode().next();
        self.set_mode(next, target)?;
        Ok(next)
    }

    /// Pushes the stored mode to `target`; returns `false` when it was already applied.
    pub fn apply_current<T: AppearanceTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        let mode = self.mode();
        if self.applied == Some(mode) {
            debug!(mode = mode.display_name(), "theme already applied");
            return false;
        }
        target.set_appearance(mode);
        self.applied = Some(mode);
        true
    }

    pub fn is_dark(&self) -> bool {
        match self.mode() {
            ThemeMode::Dark => true,
            ThemeMode::Light => false,
            ThemeMode::System => self.probe.system_appearance() == Appearance::Dark,
        }
    }

    pub fn snapshot(&self) -> ThemeSnapshot {
        ThemeSnapshot {
            mode: self.mode(),
            dark: self.is_dark(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[derive(Default)]
    struct RecordingTarget {
        applied: Vec<ThemeMode>,
    }

    impl AppearanceTarget for RecordingTarget {
        fn set_appearance(&mut self, mode: ThemeMode) {
            self.applied.push(mode);
        }
    }

    fn controller(store: Arc<MemorySettings>, appearance: Appearance) -> ThemeController {
        ThemeController::new(store, Arc::new(FixedAppearance(appearance)))
    }

    #[test]
    fn toggle_cycles_through_all_modes() {
        let store = Arc::new(MemorySettings::new());
        let mut theme = controller(store.clone(), Appearance::Light);
        let mut target = RecordingTarget::default();

        assert_eq!(theme.mode(), ThemeMode::System);
        let visited: Vec<ThemeMode> = (0..4).map(|_| theme.toggle(&mut target).unwrap()).collect();
        assert_eq!(
            visited,
            vec![
                ThemeMode::Light,
                ThemeMode::Dark,
                ThemeMode::System,
                ThemeMode::Light
            ]
        );
        assert_eq!(target.applied, visited);
        assert_eq!(store.write_count(), 4);
        assert_eq!(store.get_int(KEY_THEME_MODE, -1), 1);
    }

    #[test]
    fn apply_current_is_idempotent() {
        let store = Arc::new(MemorySettings::new());
        store.put_int(KEY_THEME_MODE, ThemeMode::Dark.code()).unwrap();
        let mut theme = controller(store.clone(), Appearance::Light);
        let mut target = RecordingTarget::default();

        assert!(theme.apply_current(&mut target));
        assert!(!theme.apply_current(&mut target));
        assert!(!theme.apply_current(&mut target));
        assert_eq!(target.applied, vec![ThemeMode::Dark]);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn dark_is_derived_from_system_only_when_following_it() {
        let store = Arc::new(MemorySettings::new());
        let mut theme = controller(store.clone(), Appearance::Dark);
        let mut target = RecordingTarget::default();
        assert!(theme.is_dark());

        theme.set_mode(ThemeMode::Light, &mut target).unwrap();
        assert!(!theme.is_dark());
        assert_eq!(theme.snapshot().data_theme(), "light");
    }

    #[test]
    fn unknown_stored_code_reads_as_system() {
        let store = Arc::new(MemorySettings::new());
        store.put_int(KEY_THEME_MODE, 7).unwrap();
        let theme = controller(store, Appearance::Light);
        assert_eq!(theme.mode(), ThemeMode::System);
    }
}
