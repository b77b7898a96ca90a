use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    HandlerUnavailable,
    MalformedDescriptor,
    PopupUnavailable,
    PageUnavailable,
}

/// Short transient message shown to the user instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Queue of notices waiting to be rendered by the active screen.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    pending: Mutex<VecDeque<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        warn!(kind = ?notice.kind, message = %notice.message, "user notice raised");
        self.pending.lock().push_back(notice);
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.pending.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
