//! Debounced, single-flight, paginated message search.

pub mod controller;
pub mod debounce;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::types::RawMessage;

pub use controller::{SearchController, SearchOutcome, SearchRequest};
pub use debounce::{Debounced, Debouncer};

/// Drive a remote search until it finishes or `cancel` fires.
///
/// Losing the race to the token yields [`SearchOutcome::Cancelled`], which
/// the controller treats as a supersession rather than a failure.
pub async fn race_cancel<F, E>(cancel: &CancellationToken, search: F) -> SearchOutcome
where
    F: Future<Output = Result<Vec<RawMessage>, E>>,
    E: std::fmt::Display,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => SearchOutcome::Cancelled,
        result = search => match result {
            Ok(docs) => SearchOutcome::Loaded(docs),
            Err(e) => SearchOutcome::Failed(Arc::new(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_over_slow_search() {
        let cancel = CancellationToken::new();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, String>(Vec::new())
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        assert!(matches!(
            race_cancel(&cancel, slow).await,
            SearchOutcome::Cancelled
        ));
    }

    #[tokio::test]
    async fn errors_become_failures() {
        let cancel = CancellationToken::new();
        let outcome = race_cancel(&cancel, async { Err::<Vec<RawMessage>, _>("offline") }).await;
        match outcome {
            SearchOutcome::Failed(e) => assert_eq!(e.as_str(), "offline"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn results_pass_through() {
        let cancel = CancellationToken::new();
        let outcome = race_cancel(&cancel, async { Ok::<_, String>(Vec::new()) }).await;
        assert!(matches!(outcome, SearchOutcome::Loaded(docs) if docs.is_empty()));
    }
}
