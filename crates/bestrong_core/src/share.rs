use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::HandlerError;
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::platform::PlatformHandlers;

pub const SHARE_CHOOSER_TITLE: &str = "Partager BE STRONG";
pub const WHATSAPP_PACKAGE: &str = "com.whatsapp";

const NO_SHARE_HANDLER: &str = "Aucune application de partage disponible";
const SHARE_FAILED: &str = "Erreur lors du partage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareContent {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareContent {
    pub fn new(title: impl Into<String>, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            url: url.into(),
        }
    }

    /// Promotional triple bound to the page's share button.
    pub fn be_strong(url: impl Into<String>) -> Self {
        Self::new(
            "🚀 Rejoins BE STRONG et deviens une légende !",
            "🔥 Découvre BE STRONG : la plateforme éthique qui booste ta visibilité TikTok avec des échanges organiques, analytics et conseils d'optimisation ! Clique ici pour vivre l'expérience 👉",
            url,
        )
    }

    pub fn payload(&self) -> String {
        format!("{} {}", self.text, self.url)
    }
}

/// Plain-text share request handed to the OS share facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareIntent {
    pub subject: String,
    pub text: String,
    pub chooser_title: String,
    pub package: Option<String>,
}

impl ShareIntent {
    pub fn from_content(content: &ShareContent, package: Option<&str>) -> Self {
        Self {
            subject: content.title.clone(),
            text: content.payload(),
            chooser_title: SHARE_CHOOSER_TITLE.to_string(),
            package: package.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Launched,
    /// The targeted app was missing; the general share sheet was used instead.
    FellBack,
    Reported,
}

pub struct ShareDispatcher {
    platform: Arc<dyn PlatformHandlers>,
    notices: Arc<NoticeBoard>,
}

impl ShareDispatcher {
    pub fn new(platform: Arc<dyn PlatformHandlers>, notices: Arc<NoticeBoard>) -> Self {
        Self { platform, notices }
    }

    #[instrument(skip(self, content), fields(title = %content.title))]
    pub fn share(&self, content: &ShareContent) -> ShareOutcome {
        match self.platform.share(&ShareIntent::from_content(content, None)) {
            Ok(()) => {
                info!("share sheet launched");
                ShareOutcome::Launched
            }
            Err(err) => {
                self.report(err);
                ShareOutcome::Reported
            }
        }
    }

    /// Tries `package` first and falls back to the general share sheet.
    #[instrument(skip(self, content), fields(title = %content.title))]
    pub fn share_with(&self, package: &str, content: &ShareContent) -> ShareOutcome {
        match self
            .platform
            .share(&ShareIntent::from_content(content, Some(package)))
        {
            Ok(()) => {
                info!("targeted share launched");
                ShareOutcome::Launched
            }
            Err(err) => {
                warn!(%err, "targeted share unavailable, using share sheet");
                match self.share(content) {
                    ShareOutcome::Launched => ShareOutcome::FellBack,
                    other => other,
                }
            }
        }
    }

    fn report(&self, err: HandlerError) {
        let message = match err {
            HandlerError::Unavailable(_) => NO_SHARE_HANDLER,
            HandlerError::Failed { .. } => SHARE_FAILED,
        };
        self.notices
            .push(Notice::new(NoticeKind::HandlerUnavailable, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessPlatform, PlatformCall};

    fn content() -> ShareContent {
        ShareContent::new("Titre", "Rejoins-nous", "https://mybestrong.netlify.app")
    }

    #[test]
    fn payload_joins_text_and_link_with_a_space() {
        assert_eq!(
            content().payload(),
            "Rejoins-nous https://mybestrong.netlify.app"
        );
    }

    #[test]
    fn share_uses_title_as_subject() {
        let platform = Arc::new(HeadlessPlatform::new());
        let notices = Arc::new(NoticeBoard::new());
        let dispatcher = ShareDispatcher::new(platform.clone(), notices.clone());

        assert_eq!(dispatcher.share(&content()), ShareOutcome::Launched);
        let calls = platform.calls();
        assert_eq!(calls.len(), 1);
        let PlatformCall::Share(intent) = &calls[0] else {
            panic!("expected a share call, got {:?}", calls[0]);
        };
        assert_eq!(intent.subject, "Titre");
        assert_eq!(intent.chooser_title, SHARE_CHOOSER_TITLE);
        assert!(intent.package.is_none());
        assert!(notices.is_empty());
    }

    #[test]
    fn missing_handler_produces_notice() {
        let platform = Arc::new(HeadlessPlatform::new().without_share_handler());
        let notices = Arc::new(NoticeBoard::new());
        let dispatcher = ShareDispatcher::new(platform, notices.clone());

        assert_eq!(dispatcher.share(&content()), ShareOutcome::Reported);
        let raised = notices.drain();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].message, NO_SHARE_HANDLER);
    }

    #[test]
    fn targeted_share_falls_back_to_sheet() {
        let platform = Arc::new(HeadlessPlatform::new().without_package(WHATSAPP_PACKAGE));
        let notices = Arc::new(NoticeBoard::new());
        let dispatcher = ShareDispatcher::new(platform.clone(), notices.clone());

        let outcome = dispatcher.share_with(WHATSAPP_PACKAGE, &content());
        assert_eq!(outcome, ShareOutcome::FellBack);

        let calls = platform.calls();
        assert_eq!(calls.len(), 2);
        match (&calls[0], &calls[1]) {
            (PlatformCall::Share(first), PlatformCall::Share(second)) => {
                assert_eq!(first.package.as_deref(), Some(WHATSAPP_PACKAGE));
                assert_eq!(second.package, None);
                assert_eq!(first.text, second.text);
            }
            other => panic!("unexpected calls {other:?}"),
        }
        assert!(notices.is_empty());
    }
}
