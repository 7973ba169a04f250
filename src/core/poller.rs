use crate::core::status::{OperationHandle, OperationStatus};
use log::{debug, info};
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to fetch status of {handle} (attempt {attempt})")]
    Fetch {
        handle: OperationHandle,
        attempt: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("polling of {handle} was cancelled after {attempts} attempts")]
    Cancelled {
        handle: OperationHandle,
        attempts: u32,
    },
}

/// Receives progress notifications from a running poll loop.
pub trait PollObserver {
    fn on_status(&mut self, _handle: &OperationHandle, _attempt: u32, _status: &dyn fmt::Display) {}

    fn on_wait(&mut self, _handle: &OperationHandle, _interval: Duration) {}

    fn on_finish(&mut self, _handle: &OperationHandle, _attempts: u32) {}
}

/// Reports progress through the `log` facade only.
#[derive(Debug, Default)]
pub struct LogObserver;

impl PollObserver for LogObserver {
    fn on_status(&mut self, handle: &OperationHandle, attempt: u32, status: &dyn fmt::Display) {
        debug!("{} status on attempt {}: {}", handle, attempt, status);
    }

    fn on_wait(&mut self, handle: &OperationHandle, interval: Duration) {
        debug!("Waiting {:?} before polling {} again", interval, handle);
    }

    fn on_finish(&mut self, handle: &OperationHandle, attempts: u32) {
        info!("{} reached a terminal state after {} polls", handle, attempts);
    }
}

/// Fixed-interval poller for long-running operations.
///
/// There is no upper bound on the number of polls. A loop only stops on a
/// terminal status, a fetch error, or the cancellation token firing.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    cancellation: Option<CancellationToken>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller {
    pub fn new() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, cancellation: None }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Calls `fetch` until `is_terminal` accepts the returned status, sleeping
    /// `interval` between calls. `fetch` always runs at least once.
    pub async fn poll_until<S, F, Fut, P>(
        &self,
        handle: &OperationHandle,
        mut fetch: F,
        is_terminal: P,
        observer: &mut dyn PollObserver,
    ) -> Result<S, PollError>
    where
        S: fmt::Display,
        F: FnMut(OperationHandle) -> Fut,
        Fut: Future<Output = anyhow::Result<S>>,
        P: Fn(&S) -> bool,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let status = self.fetch_once(handle, attempt, fetch(handle.clone())).await?;
            observer.on_status(handle, attempt, &status);

            if is_terminal(&status) {
                observer.on_finish(handle, attempt);
                return Ok(status);
            }

            self.pause(handle, attempt, observer).await?;
        }
    }

    /// `poll_until` with the status type's own terminal predicate.
    pub async fn wait_for_completion<S, F, Fut>(
        &self,
        handle: &OperationHandle,
        fetch: F,
        observer: &mut dyn PollObserver,
    ) -> Result<S, PollError>
    where
        S: OperationStatus,
        F: FnMut(OperationHandle) -> Fut,
        Fut: Future<Output = anyhow::Result<S>>,
    {
        self.poll_until(handle, fetch, |status: &S| status.is_terminal(), observer).await
    }

    async fn fetch_once<S, Fut>(&self, handle: &OperationHandle, attempt: u32, fetch: Fut) -> Result<S, PollError>
    where
        Fut: Future<Output = anyhow::Result<S>>,
    {
        let result = match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                result = fetch => result,
                _ = token.cancelled() => {
                    return Err(PollError::Cancelled { handle: handle.clone(), attempts: attempt });
                }
            },
            None => fetch.await,
        };
        result.map_err(|source| PollError::Fetch { handle: handle.clone(), attempt, source })
    }

    async fn pause(
        &self,
        handle: &OperationHandle,
        attempts: u32,
        observer: &mut dyn PollObserver,
    ) -> Result<(), PollError> {
        let cancelled = || PollError::Cancelled { handle: handle.clone(), attempts };

        let Some(token) = &self.cancellation else {
            observer.on_wait(handle, self.interval);
            sleep(self.interval).await;
            return Ok(());
        };

        if token.is_cancelled() {
            return Err(cancelled());
        }
        observer.on_wait(handle, self.interval);
        tokio::select! {
            _ = sleep(self.interval) => Ok(()),
            _ = token.cancelled() => Err(cancelled()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::ClassifierStatus;
    use anyhow::anyhow;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<String>,
        waits: usize,
        finished: Option<u32>,
    }

    impl PollObserver for Recorder {
        fn on_status(&mut self, _handle: &OperationHandle, _attempt: u32, status: &dyn fmt::Display) {
            self.statuses.push(status.to_string());
        }

        fn on_wait(&mut self, _handle: &OperationHandle, _interval: Duration) {
            self.waits += 1;
        }

        fn on_finish(&mut self, _handle: &OperationHandle, attempts: u32) {
            self.finished = Some(attempts);
        }
    }

    fn handle() -> OperationHandle {
        OperationHandle::new("arn:aws:comprehend:us-east-1:000000000000:document-classifier/test")
    }

    fn trained_or_in_error(status: &ClassifierStatus) -> bool {
        matches!(status, ClassifierStatus::Trained | ClassifierStatus::InError)
    }

    #[tokio::test(start_paused = true)]
    async fn returns_on_first_terminal_status() {
        let mut script = VecDeque::from(vec![
            ClassifierStatus::Training,
            ClassifierStatus::Training,
            ClassifierStatus::Trained,
            ClassifierStatus::Training,
        ]);
        let mut fetches = 0;
        let mut recorder = Recorder::default();

        let status = Poller::new()
            .poll_until(
                &handle(),
                |_| {
                    fetches += 1;
                    let next = script.pop_front().ok_or_else(|| anyhow!("script exhausted"));
                    async move { next }
                },
                trained_or_in_error,
                &mut recorder,
            )
            .await
            .unwrap();

        assert_eq!(status, ClassifierStatus::Trained);
        assert_eq!(fetches, 3);
        assert_eq!(recorder.waits, 2);
        assert_eq!(recorder.finished, Some(3));
        assert_eq!(recorder.statuses, vec!["TRAINING", "TRAINING", "TRAINED"]);
    }

    #[tokio::test(start_paused = true)]
    async fn already_terminal_status_is_fetched_once() {
        let mut fetches = 0;
        let mut recorder = Recorder::default();

        let status = Poller::new()
            .poll_until(
                &handle(),
                |_| {
                    fetches += 1;
                    async { Ok(ClassifierStatus::InError) }
                },
                trained_or_in_error,
                &mut recorder,
            )
            .await
            .unwrap();

        assert_eq!(status, ClassifierStatus::InError);
        assert_eq!(fetches, 1);
        assert_eq!(recorder.waits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_propagates() {
        let mut script: VecDeque<anyhow::Result<ClassifierStatus>> = VecDeque::from(vec![
            Ok(ClassifierStatus::Training),
            Err(anyhow!("connection reset")),
            Ok(ClassifierStatus::Trained),
        ]);
        let mut fetches = 0;
        let mut recorder = Recorder::default();

        let err = Poller::new()
            .poll_until(
                &handle(),
                |_| {
                    fetches += 1;
                    let next = script.pop_front().unwrap_or_else(|| Err(anyhow!("script exhausted")));
                    async move { next }
                },
                trained_or_in_error,
                &mut recorder,
            )
            .await
            .unwrap_err();

        assert_eq!(fetches, 2);
        assert_eq!(recorder.waits, 1);
        assert_eq!(recorder.statuses, vec!["TRAINING"]);
        match err {
            PollError::Fetch { attempt, source, .. } => {
                assert_eq!(attempt, 2);
                assert_eq!(source.to_string(), "connection reset");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_fetches_are_at_least_one_interval_apart() {
        let interval = Duration::from_millis(1500);
        let mut remaining = 4;
        let mut fetched_at = Vec::new();

        Poller::new()
            .with_interval(interval)
            .wait_for_completion(
                &handle(),
                |_| {
                    fetched_at.push(Instant::now());
                    remaining -= 1;
                    let status = if remaining == 0 { ClassifierStatus::Trained } else { ClassifierStatus::Submitted };
                    async move { Ok(status) }
                },
                &mut LogObserver,
            )
            .await
            .unwrap();

        assert_eq!(fetched_at.len(), 4);
        for pair in fetched_at.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_before_sleeping() {
        let token = CancellationToken::new();
        token.cancel();
        let mut fetches = 0;
        let mut recorder = Recorder::default();

        let err = Poller::new()
            .with_cancellation(token)
            .wait_for_completion(
                &handle(),
                |_| {
                    fetches += 1;
                    async { Ok(ClassifierStatus::Training) }
                },
                &mut recorder,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 1, .. }));
        assert_eq!(fetches, 1);
        assert_eq!(recorder.waits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_sleep() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(7)).await;
            canceller.cancel();
        });
        let mut fetches = 0;

        let err = Poller::new()
            .with_cancellation(token)
            .wait_for_completion(
                &handle(),
                |_| {
                    fetches += 1;
                    async { Ok(ClassifierStatus::Training) }
                },
                &mut LogObserver,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 2, .. }));
        assert_eq!(fetches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_a_hanging_fetch() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(3600),
            Poller::new().with_cancellation(token).wait_for_completion(
                &handle(),
                |_| std::future::pending::<anyhow::Result<ClassifierStatus>>(),
                &mut LogObserver,
            ),
        )
        .await
        .expect("poll kept running after cancellation");

        assert!(matches!(outcome, Err(PollError::Cancelled { attempts: 1, .. })));
    }

    fn non_terminal() -> impl Strategy<Value = ClassifierStatus> {
        prop_oneof![
            Just(ClassifierStatus::Submitted),
            Just(ClassifierStatus::Training),
            Just(ClassifierStatus::StopRequested),
            Just(ClassifierStatus::Unknown("QUEUED".to_string())),
        ]
    }

    fn terminal() -> impl Strategy<Value = ClassifierStatus> {
        prop_oneof![Just(ClassifierStatus::Trained), Just(ClassifierStatus::InError)]
    }

    proptest! {
        #[test]
        fn stops_on_first_terminal_of_any_sequence(
            pending in prop::collection::vec(non_terminal(), 0..12),
            last in terminal(),
            trailing in prop::collection::vec(non_terminal(), 0..4),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let mut script: VecDeque<ClassifierStatus> = pending.iter().cloned().collect();
            script.push_back(last.clone());
            script.extend(trailing);
            let mut fetches = 0;
            let mut recorder = Recorder::default();

            let status = runtime.block_on(Poller::new().poll_until(
                &handle(),
                |_| {
                    fetches += 1;
                    let next = script.pop_front().ok_or_else(|| anyhow!("polled past terminal"));
                    async move { next }
                },
                trained_or_in_error,
                &mut recorder,
            )).unwrap();

            prop_assert_eq!(status, last);
            prop_assert_eq!(fetches, pending.len() + 1);
            prop_assert_eq!(recorder.waits, pending.len());
        }
    }
}
