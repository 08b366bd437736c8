use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Doubling delay capped at [`MAX_DELAY`].
struct Backoff {
    next: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            next: INITIAL_DELAY,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(MAX_DELAY);
        delay
    }
}

/// Connect the score store, poll its health and reconnect with backoff.
///
/// While the store is unreachable the shared state stays in degraded mode;
/// gameplay continues and score reads and writes fail fast.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>> + Send,
{
    loop {
        let store = connect_with_backoff(&mut connect).await;
        state.set_score_store(store.clone()).await;
        info!("score store connected; leaving degraded mode");

        watch_health(&state, store.as_ref()).await;

        warn!("exhausted score store reconnect attempts; connecting from scratch");
        state.clear_score_store().await;
    }
}

async fn connect_with_backoff<F, Fut>(connect: &mut F) -> Arc<dyn ScoreStore>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>>,
{
    let mut backoff = Backoff::new();
    loop {
        match connect().await {
            Ok(store) => return store,
            Err(err) => {
                let delay = backoff.next_delay();
                warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "score store connection attempt failed");
                sleep(delay).await;
            }
        }
    }
}

/// Poll `store` until it stays unreachable after every reconnect attempt.
async fn watch_health(state: &SharedState, store: &dyn ScoreStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("score store healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "score store health check failed; entering degraded mode");
                state.update_degraded(true).await;
                if !reconnect(store).await {
                    return;
                }
                info!("score store reconnected; leaving degraded mode");
                state.update_degraded(false).await;
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}

async fn reconnect(store: &dyn ScoreStore) -> bool {
    let mut backoff = Backoff::new();
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "score store reconnect attempt failed");
                sleep(backoff.next_delay()).await;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::score_store::memory::InMemoryScoreStore, state::AppState,
    };

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let mut backoff = Backoff::new();
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_mode_follows_store_health() {
        let state = AppState::new(AppConfig::default());
        let store = InMemoryScoreStore::new();
        let mut degraded = state.degraded_watcher();

        let connect_store = store.clone();
        tokio::spawn(run(state.clone(), move || {
            let store = connect_store.clone();
            async move { Ok(Arc::new(store) as Arc<dyn ScoreStore>) }
        }));

        degraded.wait_for(|value| !*value).await.unwrap();
        assert!(state.score_store().await.is_some());

        store.set_offline(true);
        degraded.wait_for(|value| *value).await.unwrap();

        store.set_offline(false);
        degraded.wait_for(|value| !*value).await.unwrap();
        assert!(!state.is_degraded().await);
    }
}
