//! Motivational popup content: a fixed catalog, a non-repeating picker and
//! the experience tiers derived from how many popups a user has seen.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{SettingsError, ShellError};
use crate::settings::{SettingsStore, KEY_LAST_MESSAGE, KEY_MESSAGE_COUNT};

pub const DEFAULT_MESSAGES: &[&str] = &[
    "Tu es plus fort que tes excuses",
    "Chaque jour est une nouvelle opportunite",
    "Ta visibilite TikTok va exploser",
    "Tu as le pouvoir de reussir",
    "Concentre-toi sur tes objectifs",
    "La perseverance transforme les reves",
    "Tu es ne pour briller",
    "Chaque follower est un pas vers le succes",
    "Tu es unique",
    "Le monde attend de voir ton talent",
    "Aujourd'hui tu vas creer quelque chose d'incroyable",
    "La confiance en soi est ta meilleure arme",
    "Pret a conquerir TikTok",
    "Ta creativite n'a pas de limites",
    "Le succes est a portee de main",
    "Crois en toi",
    "Tu es le heros de ta propre histoire",
    "Chaque video te rapproche de tes reves",
    "Ton authenticite est ta force",
    "Le monde a besoin de ta voix",
    "Transforme tes defis en opportunites",
    "Tu as tout ce qu'il faut pour reussir",
    "Prepare-toi a devenir viral",
    "Ta passion va inspirer des millions",
    "Aujourd'hui tu vas faire la difference",
    "Tu es plus fort que tu ne le penses",
    "Le moment est venu de briller",
    "Chaque like est une validation",
    "Tu es une etoile qui s'ignore",
    "Le monde a besoin de ton energie",
    "Tu es une force de la nature",
    "Rien ne peut t'arreter maintenant",
    "Tu vas creer un tsunami de followers",
    "Ton potentiel est infini",
    "Tu es ne pour etre viral",
    "Ta lumiere va eclairer le monde",
    "Tu es electrisant",
    "Tu vas devenir une icone",
    "Tu es un diamant brut",
    "Prepare-toi a la celebrite",
    "Defie tes limites",
    "Tu es capable de l'impossible",
    "Ton ascension commence maintenant",
    "Tu vas surprendre tout le monde",
    "Tes reves deviennent realite",
    "Tu es en train de creer ta legende",
    "Tu es une tempete de creativite",
    "Tu vas conquerir le monde",
    "Tu es un phenomene",
    "Le monde va te decouvrir",
    "Ton energie positive est contagieuse",
    "Tu inspires les autres",
    "Tu vas creer un mouvement",
    "Tu es un catalyseur de changement",
    "Tu vas revolutionner TikTok",
    "Tu es un leader ne",
    "Tu electrises ton audience",
    "Tu vas creer une communaute",
    "Tu es un influenceur naturel",
    "Tu vas devenir une reference",
    "Le succes est ton destin",
    "Tu vas atteindre les sommets",
    "Tu vas devenir une star",
    "Tu es fait pour briller",
    "Tu vas realiser tes reves",
    "Tu es sur la voie du succes",
    "Tu vas exploser en popularite",
    "Tu vas gagner la partie",
    "Tu vas devenir celebre",
    "Tu vas conquerir les reseaux",
    "TU ES UNE MACHINE DE GUERRE",
    "PERSONNE NE PEUT T'ARRETER",
    "TU VAS DEVENIR UNE LEGENDE",
    "TU ES LE ROI DE TIKTOK",
    "TU VAS DOMINER LE MONDE",
    "TU ES UN PHENOMENE",
    "TU ES ELECTRIQUE",
    "TU VAS TOUT DETRUIRE",
    "TU ES UN DIAMANT",
    "TU VAS DEVENIR UNE ICONE",
    "Aujourd'hui tu vas tout changer",
    "Ce jour est ton jour de gloire",
    "Tu vas creer l'histoire",
    "Tu vas impressionner le monde",
    "Tu vas realiser l'impossible",
    "Tu vas eblouir ton audience",
    "Tu vas creer un buzz",
    "Tu vas gagner la bataille",
    "Tu vas briller comme jamais",
    "TU ES PRET A CONQUERIR LE MONDE",
    "RIEN NE PEUT T'ARRÊTER MAINTENANT",
    "TU VAS DEVENIR UNE LEGENDE VIVANTE",
    "TU ES LE FUTUR DE TIKTOK",
    "TU VAS REVOLUTIONNER L'INFLUENCE",
    "TU ES UN PHENOMENE MONDIAL",
    "TU VAS ELECTRISER LE MONDE",
    "TU ES UN TRESOR NATIONAL",
    "TU VAS CONQUERIR L'UNIVERS",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Tier {
    pub fn for_count(count: u64) -> Self {
        match count {
            0..=9 => Tier::Beginner,
            10..=29 => Tier::Intermediate,
            30..=59 => Tier::Advanced,
            _ => Tier::Expert,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tier::Beginner => "MOTIVATION DEBUTANT",
            Tier::Intermediate => "MOTIVATION INTERMEDIAIRE",
            Tier::Advanced => "MOTIVATION AVANCE",
            Tier::Expert => "MOTIVATION EXPERT",
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Tier::Beginner => 1,
            Tier::Intermediate => 2,
            Tier::Advanced => 3,
            Tier::Expert => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Beginner => "Debutant",
            Tier::Intermediate => "Intermediaire",
            Tier::Advanced => "Avance",
            Tier::Expert => "Expert",
        }
    }
}

/// Non-empty list of messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    messages: Vec<String>,
}

impl Catalog {
    pub fn new<I, S>(messages: I) -> Result<Self, ShellError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if messages.is_empty() {
            return Err(ShellError::PopupConstruction(
                "motivational catalog is empty".to_string(),
            ));
        }
        Ok(Self { messages })
    }

    pub fn builtin() -> Self {
        Self {
            messages: DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.messages.get(index).map(String::as_str)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub message: String,
    /// Usage counter after this pick was recorded.
    pub count: u64,
    pub tier: Tier,
    pub redrawn: bool,
}

impl Pick {
    pub fn title(&self) -> &'static str {
        self.tier.title()
    }
}

/// Title and body of the dismissible popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub message: String,
    pub level_name: String,
}

impl From<Pick> for Popup {
    fn from(pick: Pick) -> Self {
        Self {
            title: pick.tier.title().to_string(),
            level_name: pick.tier.name().to_string(),
            message: pick.message,
        }
    }
}

/// Source of catalog indices. Every [`Rng`] is one.
pub trait IndexSource {
    /// Returns an index in `0..len`; `len` is never zero.
    fn next_index(&mut self, len: usize) -> usize;
}

impl<R: Rng> IndexSource for R {
    fn next_index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

pub struct MotivationPicker<R = StdRng> {
    catalog: Catalog,
    store: Arc<dyn SettingsStore>,
    rng: R,
}

impl MotivationPicker<StdRng> {
    pub fn from_entropy(catalog: Catalog, store: Arc<dyn SettingsStore>) -> Self {
        Self::new(catalog, store, StdRng::from_entropy())
    }

    pub fn seeded(catalog: Catalog, store: Arc<dyn SettingsStore>, seed: u64) -> Self {
        Self::new(catalog, store, StdRng::seed_from_u64(seed))
    }
}

impl<R: IndexSource> MotivationPicker<R> {
    pub fn new(catalog: Catalog, store: Arc<dyn SettingsStore>, rng: R) -> Self {
        Self {
            catalog,
            store,
            rng,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn usage_count(&self) -> u64 {
        self.store.get_int(KEY_MESSAGE_COUNT, 0).max(0) as u64
    }

    pub fn tier(&self) -> Tier {
        Tier::for_count(self.usage_count())
    }

    /// Draws a message, redrawing once if it repeats the previous pick, and
    /// records it together with the incremented usage counter.
    pub fn pick(&mut self) -> Result<Pick, SettingsError> {
        let last = self.store.get_string(KEY_LAST_MESSAGE, "");
        let mut index = self.draw();
        let mut redrawn = false;
        if self.catalog.len() > 1 && self.catalog.messages[index] == last {
            index = self.draw();
            redrawn = true;
        }
        let message = self.catalog.messages[index].clone();

        self.store.put_string(KEY_LAST_MESSAGE, &message)?;
        let count = self.usage_count() + 1;
        self.store.put_int(KEY_MESSAGE_COUNT, count as i64)?;

        debug!(count, redrawn, "motivational message picked");
        Ok(Pick {
            message,
            count,
            tier: Tier::for_count(count),
            redrawn,
        })
    }

    fn draw(&mut self) -> usize {
        self.rng.next_index(self.catalog.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::for_count(0).title(), "MOTIVATION DEBUTANT");
        assert_eq!(Tier::for_count(9).title(), "MOTIVATION DEBUTANT");
        assert_eq!(Tier::for_count(10).title(), "MOTIVATION INTERMEDIAIRE");
        assert_eq!(Tier::for_count(29), Tier::Intermediate);
        assert_eq!(Tier::for_count(30), Tier::Advanced);
        assert_eq!(Tier::for_count(59), Tier::Advanced);
        assert_eq!(Tier::for_count(60).title(), "MOTIVATION EXPERT");
        assert_eq!(Tier::for_count(u64::MAX).level(), 4);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let err = Catalog::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ShellError::PopupConstruction(_)));
    }

    #[test]
    fn builtin_catalog_has_no_duplicates() {
        let catalog = Catalog::builtin();
        let mut seen = std::collections::HashSet::new();
        for index in 0..catalog.len() {
            assert!(seen.insert(catalog.get(index).unwrap()));
        }
    }

    #[test]
    fn consecutive_picks_only_repeat_after_a_failed_redraw() {
        let store = Arc::new(MemorySettings::new());
        let catalog = Catalog::new(["un", "deux"]).unwrap();
        let mut picker = MotivationPicker::seeded(catalog, store, 42);

        let mut previous = picker.pick().unwrap().message;
        for _ in 0..200 {
            let pick = picker.pick().unwrap();
            if pick.message == previous {
                assert!(pick.redrawn, "repeat without a redraw");
            }
            previous = pick.message;
        }
    }

    /// Replays a fixed index sequence and counts how many were consumed.
    struct Scripted {
        indices: std::collections::VecDeque<usize>,
        draws: usize,
    }

    impl Scripted {
        fn new(indices: &[usize]) -> Self {
            Self {
                indices: indices.iter().copied().collect(),
                draws: 0,
            }
        }
    }

    impl IndexSource for Scripted {
        fn next_index(&mut self, len: usize) -> usize {
            self.draws += 1;
            self.indices.pop_front().expect("script exhausted") % len
        }
    }

    #[test]
    fn collision_is_redrawn_once_and_a_second_collision_is_kept() {
        let store = Arc::new(MemorySettings::new());
        let catalog = Catalog::new(["un", "deux", "trois"]).unwrap();
        store.put_string(KEY_LAST_MESSAGE, "deux").unwrap();

        let mut picker = MotivationPicker::new(catalog.clone(), store.clone(), Scripted::new(&[1, 2]));
        let pick = picker.pick().unwrap();
        assert_eq!(pick.message, "trois");
        assert!(pick.redrawn);
        assert_eq!(picker.rng.draws, 2);

        let mut picker = MotivationPicker::new(catalog.clone(), store.clone(), Scripted::new(&[2, 2, 0]));
        let pick = picker.pick().unwrap();
        assert_eq!(pick.message, "trois");
        assert!(pick.redrawn);
        assert_eq!(picker.rng.draws, 2);

        let mut picker = MotivationPicker::new(catalog, store, Scripted::new(&[0]));
        let pick = picker.pick().unwrap();
        assert_eq!(pick.message, "un");
        assert!(!pick.redrawn);
        assert_eq!(picker.rng.draws, 1);
    }

    #[test]
    fn every_pick_increments_counter_and_records_message() {
        let store = Arc::new(MemorySettings::new());
        let mut picker = MotivationPicker::seeded(Catalog::builtin(), store.clone(), 7);

        for expected in 1..=12u64 {
            let pick = picker.pick().unwrap();
            assert_eq!(pick.count, expected);
            assert_eq!(store.get_string(KEY_LAST_MESSAGE, ""), pick.message);
        }
        assert_eq!(picker.usage_count(), 12);
        assert_eq!(picker.tier(), Tier::Intermediate);
    }

    #[test]
    fn single_entry_catalog_never_redraws() {
        let store = Arc::new(MemorySettings::new());
        let catalog = Catalog::new(["seul"]).unwrap();
        let mut picker = MotivationPicker::seeded(catalog, store, 1);

        for _ in 0..3 {
            let pick = picker.pick().unwrap();
            assert_eq!(pick.message, "seul");
            assert!(!pick.redrawn);
        }
    }

    #[test]
    fn popup_uses_tier_after_increment() {
        let store = Arc::new(MemorySettings::new());
        store.put_int(KEY_MESSAGE_COUNT, 9).unwrap();
        let mut picker = MotivationPicker::seeded(Catalog::builtin(), store, 3);

        let popup = Popup::from(picker.pick().unwrap());
        assert_eq!(popup.title, "MOTIVATION INTERMEDIAIRE");
        assert_eq!(popup.level_name, "Intermediaire");
    }
}
