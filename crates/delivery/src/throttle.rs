//! Send throttling — caps how many recipient attempts are in flight at once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicU64,
    peak: AtomicU64,
}

/// Bounded worker-pool gate for one launch.
#[derive(Debug, Clone)]
pub struct SendThrottle {
    semaphore: Arc<Semaphore>,
    in_flight: Arc<InFlight>,
    max_in_flight: usize,
}

impl SendThrottle {
    pub fn new(max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            in_flight: Arc::new(InFlight::default()),
            max_in_flight,
        }
    }

    /// Wait for a free slot. Returns `None` once `cancel` fires; a slot that
    /// is already free still loses to a cancelled token.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<SendPermit> {
        if cancel.is_cancelled() {
            return None;
        }
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok()?,
        };

        let now = self.in_flight.current.fetch_add(1, Ordering::Relaxed) + 1;
        self.in_flight.peak.fetch_max(now, Ordering::Relaxed);
        Some(SendPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn peak_in_flight(&self) -> u64 {
        self.in_flight.peak.load(Ordering::Relaxed)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

/// Held by a recipient attempt for its whole duration.
#[derive(Debug)]
pub struct SendPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<InFlight>,
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.in_flight.current.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_bounded() {
        let throttle = SendThrottle::new(2);
        let cancel = CancellationToken::new();

        let a = throttle.acquire(&cancel).await.unwrap();
        let _b = throttle.acquire(&cancel).await.unwrap();
        assert_eq!(throttle.in_flight.current.load(Ordering::Relaxed), 2);

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            throttle.acquire(&cancel),
        )
        .await;
        assert!(pending.is_err(), "third permit should wait");

        drop(a);
        assert_eq!(throttle.in_flight.current.load(Ordering::Relaxed), 1);
        assert!(throttle.acquire(&cancel).await.is_some());
        assert_eq!(throttle.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_cancel_stops_acquire() {
        let throttle = SendThrottle::new(1);
        let cancel = CancellationToken::new();
        let _held = throttle.acquire(&cancel).await.unwrap();

        let waiter = {
            let throttle = throttle.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { throttle.acquire(&cancel).await.is_none() })
        };
        cancel.cancel();
        assert!(waiter.await.unwrap());
        assert!(throttle.acquire(&cancel).await.is_none());
    }

    #[test]
    fn test_zero_cap_is_raised_to_one() {
        assert_eq!(SendThrottle::new(0).max_in_flight(), 1);
    }
}
