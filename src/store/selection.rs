//! Selection with a hard cap and a rate-limited warning.

use std::time::{Duration, Instant};

/// Shipments that can be bundled into one mass download.
pub const MASS_DOWNLOAD_CAP: usize = 20;
/// Quiet period before a repeated over-cap attempt warns again.
pub const WARNING_REARM: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
    /// Over the cap; `warn` is true only for the first attempt of a run.
    Rejected { warn: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectAllOutcome {
    pub selected: usize,
    pub truncated: bool,
    pub warn: bool,
}

#[derive(Debug, Clone)]
pub struct CappedSelection {
    cap: usize,
    selected: Vec<String>,
    warned_at: Option<Instant>,
}

impl Default for CappedSelection {
    fn default() -> Self {
        Self::new(MASS_DOWNLOAD_CAP)
    }
}

impl CappedSelection {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            selected: Vec::new(),
            warned_at: None,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn ids(&self) -> &[String] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn toggle(&mut self, id: &str, now: Instant) -> SelectionChange {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            self.warned_at = None;
            return SelectionChange::Removed;
        }
        if self.selected.len() < self.cap {
            self.selected.push(id.to_string());
            return SelectionChange::Added;
        }
        SelectionChange::Rejected {
            warn: self.arm_warning(now),
        }
    }

    /// Selects `ids` in order up to the cap.
    pub fn select_all(&mut self, ids: &[String], now: Instant) -> SelectAllOutcome {
        let mut truncated = false;
        for id in ids {
            if self.contains(id) {
                continue;
            }
            if self.selected.len() >= self.cap {
                truncated = true;
                break;
            }
            self.selected.push(id.clone());
        }
        let warn = truncated && self.arm_warning(now);
        SelectAllOutcome {
            selected: self.selected.len(),
            truncated,
            warn,
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.warned_at = None;
    }

    fn arm_warning(&mut self, now: Instant) -> bool {
        let fire = match self.warned_at {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= WARNING_REARM,
        };
        if fire {
            self.warned_at = Some(now);
        }
        fire
    }
}
