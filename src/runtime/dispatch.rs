//! Dispatch loop: one spawned unit of work per inbound update, admitted through the gate.

use super::gate::AdmissionGate;
use super::Inbound;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    async fn handle(&self, update: Inbound);
}

/// Pulls updates until the channel closes, then waits for all spawned work.
///
/// A slot is acquired before spawning, so a full gate stops the loop from pulling
/// further updates. Returns the number of updates handled.
pub async fn run<H: UpdateHandler>(
    mut updates: mpsc::Receiver<Inbound>,
    gate: AdmissionGate,
    handler: Arc<H>,
) -> usize {
    let mut tasks = JoinSet::new();
    let mut handled = 0usize;

    info!("Dispatch loop started (capacity {})", gate.capacity());

    while let Some(update) = updates.recv().await {
        while let Some(result) = tasks.try_join_next() {
            report(result);
        }

        let permit = match gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Admission gate closed, dropping remaining updates");
                break;
            }
        };

        debug!(
            "Admitted update for chat {} ({} in flight)",
            update.chat_id,
            gate.in_flight()
        );

        let handler = handler.clone();
        tasks.spawn(async move {
            let _permit = permit;
            handler.handle(update).await;
        });
        handled += 1;
    }

    info!("Update source closed, waiting for {} in-flight updates", tasks.len());
    while let Some(result) = tasks.join_next().await {
        report(result);
    }
    info!("Dispatch loop finished after {} updates", handled);

    handled
}

fn report(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("Update handler task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Payload;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Counting {
        current: AtomicUsize,
        peak: AtomicUsize,
        done: AtomicUsize,
        delay: Duration,
    }

    impl Counting {
        fn new(delay: Duration) -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                done: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl UpdateHandler for Counting {
        async fn handle(&self, _update: Inbound) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn update(chat_id: i64) -> Inbound {
        Inbound {
            chat_id,
            user_id: chat_id,
            username: None,
            payload: Payload::Text("/start".to_string()),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_capacity() {
        let (tx, rx) = mpsc::channel(100);
        let handler = Arc::new(Counting::new(Duration::from_millis(20)));

        for chat in 0..20 {
            tx.send(update(chat)).await.unwrap();
        }
        drop(tx);

        let handled = run(rx, AdmissionGate::new(4), handler.clone()).await;

        assert_eq!(handled, 20);
        assert_eq!(handler.done.load(Ordering::SeqCst), 20);
        let peak = handler.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak concurrency {peak}");
        assert!(peak >= 2, "updates should overlap, peak {peak}");
    }

    struct Panicking {
        done: AtomicUsize,
    }

    #[async_trait]
    impl UpdateHandler for Panicking {
        async fn handle(&self, update: Inbound) {
            if update.chat_id == 0 {
                panic!("handler failure");
            }
            self.done.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_panicking_update_does_not_stop_loop() {
        let (tx, rx) = mpsc::channel(10);
        let handler = Arc::new(Panicking {
            done: AtomicUsize::new(0),
        });

        for chat in 0..3 {
            tx.send(update(chat)).await.unwrap();
        }
        drop(tx);

        let handled = run(rx, AdmissionGate::new(1), handler.clone()).await;
        assert_eq!(handled, 3);
        assert_eq!(handler.done.load(Ordering::SeqCst), 2);
    }

    struct Blocking {
        release: Notify,
        started: AtomicUsize,
    }

    #[async_trait]
    impl UpdateHandler for Blocking {
        async fn handle(&self, _update: Inbound) {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
        }
    }

    #[tokio::test]
    async fn test_waits_for_in_flight_work_on_close() {
        let (tx, rx) = mpsc::channel(10);
        let handler = Arc::new(Blocking {
            release: Notify::new(),
            started: AtomicUsize::new(0),
        });

        let loop_handle = tokio::spawn(run(rx, AdmissionGate::new(2), handler.clone()));

        tx.send(update(1)).await.unwrap();
        tx.send(update(2)).await.unwrap();
        tx.send(update(3)).await.unwrap();
        drop(tx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Third update is held back by the gate
        assert_eq!(handler.started.load(Ordering::SeqCst), 2);
        assert!(!loop_handle.is_finished());

        handler.release.notify_waiters();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handler.started.load(Ordering::SeqCst), 3);
        assert!(!loop_handle.is_finished());

        handler.release.notify_waiters();
        let handled = tokio::time::timeout(Duration::from_secs(1), loop_handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(handled, 3);
    }
}
