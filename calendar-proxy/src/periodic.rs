use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Duration, MissedTickBehavior};

/// A job that runs right away and then once per `period` until stopped.
///
/// The task belongs to whoever holds the handle: `stop` ends it after the
/// in-flight run, dropping the handle aborts it.
pub struct PeriodicTask {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F, Fut>(period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = task::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => job().await,
                }
            }
        });

        Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Signals the task and waits until it has exited.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(period: Duration, runtime: Duration) -> (PeriodicTask, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let task = PeriodicTask::spawn(period, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                time::sleep(runtime).await;
            }
        });

        (task, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_every_period() {
        let (task, runs) = counting(Duration::from_secs(10), Duration::ZERO);

        time::sleep(Duration::from_secs(25)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_final() {
        let (task, runs) = counting(Duration::from_secs(10), Duration::ZERO);

        time::sleep(Duration::from_secs(5)).await;
        task.stop().await;
        let after_stop = runs.load(Ordering::SeqCst);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(after_stop, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (task, runs) = counting(Duration::from_secs(10), Duration::ZERO);

        time::sleep(Duration::from_secs(5)).await;
        drop(task);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_runs_skip_missed_ticks() {
        let (task, runs) = counting(Duration::from_secs(10), Duration::from_secs(25));

        time::sleep(Duration::from_secs(35)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(!task.is_finished());

        task.stop().await;
    }
}
