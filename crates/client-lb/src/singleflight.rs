//! Single-flight: collapse concurrent calls that share a key into one
//! execution, with every caller (leader and joiners alike) waiting for and
//! receiving the same result.
//!
//! A bare async function rather than a service wrapper: callers that want
//! fire-and-forget semantics (a background refresh) simply don't await the
//! returned future.

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::broadcast;

/// Why [`SingleFlight::run`] failed to produce a result for a joiner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// The leader's future was dropped (cancelled) before it completed.
    #[error("leader was cancelled before completing")]
    LeaderCancelled,
    /// The leader's result was missed (shouldn't happen at capacity 1).
    #[error("missed the leader's result")]
    Lagged,
}

/// Collapses concurrent `run` calls sharing a key into one execution of the
/// supplied future.
pub struct SingleFlight<K, Res>
where
    K: Hash + Eq + Clone,
    Res: Clone,
{
    requests: Mutex<HashMap<K, broadcast::Sender<Res>>>,
}

impl<K, Res> Default for SingleFlight<K, Res>
where
    K: Hash + Eq + Clone,
    Res: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Res> SingleFlight<K, Res>
where
    K: Hash + Eq + Clone,
    Res: Clone,
{
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `make_future()` for `key` if no call for that key is already in
    /// flight; otherwise waits for the in-flight call's result.
    ///
    /// Every caller — leader or joiner — only returns once the work is
    /// done. Callers that want fire-and-forget semantics instead can simply
    /// not await the returned future.
    pub async fn run<F, Fut>(&self, key: K, make_future: F) -> Result<Res, JoinError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Res>,
    {
        let mut receiver = {
            let mut requests = self.requests.lock();
            if let Some(sender) = requests.get(&key) {
                Some(sender.subscribe())
            } else {
                let (tx, _rx) = broadcast::channel(1);
                requests.insert(key.clone(), tx);
                None
            }
        };

        match receiver.take() {
            Some(mut rx) => match rx.recv().await {
                Ok(res) => Ok(res),
                Err(broadcast::error::RecvError::Closed) => Err(JoinError::LeaderCancelled),
                Err(broadcast::error::RecvError::Lagged(_)) => Err(JoinError::Lagged),
            },
            None => {
                let mut guard = LeaderGuard {
                    requests: &self.requests,
                    key: Some(key.clone()),
                };
                let result = make_future().await;
                guard.key.take();

                let mut requests = self.requests.lock();
                if let Some(sender) = requests.remove(&key) {
                    let _ = sender.send(result.clone());
                }
                Ok(result)
            }
        }
    }
}

/// Removes the leader's map entry if the leader future is dropped (task
/// aborted, or unwinding from a panic in `make_future`) before it reaches
/// the normal remove-and-send completion path below. Without this, the
/// `broadcast::Sender` would stay in the map forever and every later
/// `run()` call for the same key would subscribe as a joiner and block on
/// a sender that will never send.
struct LeaderGuard<'a, K, Res>
where
    K: Hash + Eq + Clone,
    Res: Clone,
{
    requests: &'a Mutex<HashMap<K, broadcast::Sender<Res>>>,
    key: Option<K>,
}

impl<'a, K, Res> Drop for LeaderGuard<'a, K, Res>
where
    K: Hash + Eq + Clone,
    Res: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.requests.lock().remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn solo_call_runs_and_returns() {
        let sf: SingleFlight<String, u32> = SingleFlight::new();
        let result = sf.run("refresh".to_string(), || async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn concurrent_calls_with_same_key_execute_once() {
        let sf = Arc::new(SingleFlight::<String, u32>::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let sf = Arc::clone(&sf);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                sf.run("refresh".to_string(), || async {
                    executions.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    7u32
                })
                .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), Ok(7));
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_execute_independently() {
        let sf = Arc::new(SingleFlight::<String, u32>::new());
        let a = {
            let sf = Arc::clone(&sf);
            tokio::spawn(async move { sf.run("a".to_string(), || async { 1u32 }).await })
        };
        let b = {
            let sf = Arc::clone(&sf);
            tokio::spawn(async move { sf.run("b".to_string(), || async { 2u32 }).await })
        };
        assert_eq!(a.await.unwrap(), Ok(1));
        assert_eq!(b.await.unwrap(), Ok(2));
    }

    #[tokio::test]
    async fn key_can_run_again_after_completing() {
        let sf: SingleFlight<String, u32> = SingleFlight::new();
        assert_eq!(sf.run("refresh".to_string(), || async { 1 }).await, Ok(1));
        assert_eq!(sf.run("refresh".to_string(), || async { 2 }).await, Ok(2));
    }

    #[tokio::test]
    async fn leader_panic_does_not_leak_the_map_entry() {
        let sf = Arc::new(SingleFlight::<String, u32>::new());

        let leader = {
            let sf = Arc::clone(&sf);
            tokio::spawn(async move {
                sf.run("refresh".to_string(), || async { panic!("boom") })
                    .await
            })
        };
        assert!(leader.await.is_err(), "leader task should have panicked");

        // A fresh run() for the same key must not block forever on a
        // sender that will never send; the dropped guard should have
        // already removed the stale entry, so this becomes a new leader.
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            sf.run("refresh".to_string(), || async { 7u32 }),
        )
        .await
        .expect("run() should not deadlock after the prior leader panicked");
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn aborted_leader_does_not_leak_the_map_entry() {
        let sf = Arc::new(SingleFlight::<String, u32>::new());

        let leader = {
            let sf = Arc::clone(&sf);
            tokio::spawn(async move {
                sf.run("refresh".to_string(), || async {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    1u32
                })
                .await
            })
        };
        // Give the leader task a chance to register itself before aborting.
        tokio::task::yield_now().await;
        leader.abort();
        let _ = leader.await;

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            sf.run("refresh".to_string(), || async { 9u32 }),
        )
        .await
        .expect("run() should not deadlock after the prior leader was aborted");
        assert_eq!(result, Ok(9));
    }
}
