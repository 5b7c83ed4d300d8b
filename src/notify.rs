//! User-facing notifications (toasts).

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn success(&self, message: &str) {
        self.notify(Toast::new(ToastLevel::Success, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Toast::new(ToastLevel::Warning, message));
    }

    fn error(&self, message: &str) {
        self.notify(Toast::new(ToastLevel::Error, message));
    }

    fn info(&self, message: &str) {
        self.notify(Toast::new(ToastLevel::Info, message));
    }
}

/// Routes toasts into the tracing log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Info | ToastLevel::Success => tracing::info!("{}", toast.message),
            ToastLevel::Warning => tracing::warn!("{}", toast.message),
            ToastLevel::Error => tracing::error!("{}", toast.message),
        }
    }
}

/// Keeps every toast in memory; used by the CLI to print a summary and by tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn count(&self, level: ToastLevel) -> usize {
        self.toasts().iter().filter(|t| t.level == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        tracing::debug!("toast {:?}: {}", toast.level, toast.message);
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast);
        }
    }
}
