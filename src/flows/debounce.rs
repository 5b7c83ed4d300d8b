//! Cancel-on-retrigger debounce for search-as-you-type.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default idle delay before a typed search is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Runs only the most recent action once `delay` passes without a new trigger.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn trigger<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Typed search input. Keystrokes go in through `input`; a list controller
/// awaits `settled` and only ever sees the term that survived the idle delay.
pub struct DebouncedSearch {
    debouncer: Debouncer,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl DebouncedSearch {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            debouncer: Debouncer::new(delay),
            tx,
            rx,
        }
    }

    pub fn input(&mut self, term: impl Into<String>) {
        let term = term.into();
        let tx = self.tx.clone();
        self.debouncer.trigger(async move {
            // fails only once the search itself is gone
            let _ = tx.send(term);
        });
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Waits for the next term that outlived the delay.
    pub async fn settled(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Default for DebouncedSearch {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn test_only_last_trigger_fires() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for term in ["N", "NZ", "NZE"] {
            let fired = fired.clone();
            debouncer.trigger(async move {
                fired.lock().unwrap().push(term);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*fired.lock().unwrap(), vec!["NZE"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending() {
        let fired = Arc::new(Mutex::new(false));
        let mut debouncer = Debouncer::default();
        let flag = fired.clone();
        debouncer.trigger(async move {
            *flag.lock().unwrap() = true;
        });
        debouncer.cancel();
        tokio::time::sleep(SEARCH_DEBOUNCE * 2).await;
        assert!(!*fired.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_settles_on_last_term() {
        let mut search = DebouncedSearch::new(Duration::from_millis(300));
        search.input("N");
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.input("NZE");
        assert!(search.is_pending());

        assert_eq!(search.settled().await.as_deref(), Some("NZE"));
        assert!(!search.is_pending());
    }
}
