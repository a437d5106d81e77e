//! Keystroke debouncing for the search input.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Emitted once the input has been quiet for the debounce delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debounced {
    pub generation: u64,
    pub text: String,
}

/// Coalesces keystrokes into a single search trigger.
///
/// Each [`push`](Self::push) cancels the pending timer and starts a new one.
/// Timer tasks send a [`Debounced`] event through the channel; the receiver
/// must pass it through [`accept`](Self::accept) so that events queued before
/// a newer push or a [`stop`](Self::stop) are discarded.
pub struct Debouncer<E> {
    delay: Duration,
    sender: mpsc::UnboundedSender<E>,
    generation: u64,
    pending: Option<CancellationToken>,
    stopped: bool,
}

impl<E> Debouncer<E>
where
    E: From<Debounced> + Send + 'static,
{
    pub fn new(delay: Duration, sender: mpsc::UnboundedSender<E>) -> Self {
        Self {
            delay,
            sender,
            generation: 0,
            pending: None,
            stopped: false,
        }
    }

    /// Record a keystroke. Restarts the quiet period.
    pub fn push(&mut self, text: impl Into<String>) {
        self.cancel_pending();
        self.stopped = false;
        self.generation += 1;

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let event = Debounced {
            generation: self.generation,
            text: text.into(),
        };
        let delay = self.delay;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = sender.send(E::from(event));
                }
            }
        });
    }

    /// Returns the text if `event` came from the latest push and the
    /// debouncer has not been stopped since.
    pub fn accept(&mut self, event: Debounced) -> Option<String> {
        if self.stopped || event.generation != self.generation {
            tracing::trace!(generation = event.generation, "dropping stale debounce");
            return None;
        }
        self.pending = None;
        Some(event.text)
    }

    /// Cancel any pending trigger. Events already in flight are rejected by
    /// [`accept`](Self::accept).
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.stopped = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<E> Drop for Debouncer<E> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    fn debouncer() -> (Debouncer<Debounced>, mpsc::UnboundedReceiver<Debounced>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Debouncer::new(DELAY, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_window_trigger_once() {
        let (mut debouncer, mut rx) = debouncer();

        for text in ["h", "he", "hel", "hell", "hello"] {
            debouncer.push(text);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tokio::time::sleep(DELAY).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(debouncer.accept(event), Some("hello".to_string()));
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_quiet_periods_trigger_separately() {
        let (mut debouncer, mut rx) = debouncer();

        debouncer.push("a");
        tokio::time::sleep(DELAY * 2).await;
        debouncer.push("ab");
        tokio::time::sleep(DELAY * 2).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.text, "a");
        assert_eq!(debouncer.accept(first), None);
        assert_eq!(debouncer.accept(second), Some("ab".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_pending_trigger() {
        let (mut debouncer, mut rx) = debouncer();

        debouncer.push("hello");
        debouncer.stop();
        tokio::time::sleep(DELAY * 2).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_rejects_event_already_queued() {
        let (mut debouncer, mut rx) = debouncer();

        debouncer.push("hello");
        tokio::time::sleep(DELAY * 2).await;
        let queued = rx.recv().await.unwrap();

        debouncer.stop();
        assert_eq!(debouncer.accept(queued), None);
    }
}
