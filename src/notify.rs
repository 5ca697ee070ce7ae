use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const NOTIFICATION_FEED_CAP: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// One user-visible transient message. Failures never crash the session;
/// they degrade to an entry here and a return to the prior stable state.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

/// Bounded in-memory feed the presentation layer drains for toasts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFeed {
    entries: VecDeque<Notification>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_success(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message.into());
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message.into());
    }

    pub fn push_info(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message.into());
    }

    fn push(&mut self, level: NotificationLevel, message: String) {
        if self.entries.len() == NOTIFICATION_FEED_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(Notification {
            level,
            message,
            at: Local::now(),
        });
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Append a notification to a plain-text log file. Best-effort; logging
/// failures are ignored.
pub fn append_notification_log(path: &Path, notification: &Notification) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(
            file,
            "{} - {} - {}",
            notification.at.to_rfc3339(),
            notification.level.as_str(),
            notification.message
        );
    }
}
