//! Per-room turn timer.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A pending turn expiry. Dropping or re-arming it cancels the old one.
#[derive(Debug)]
pub struct TurnTimer {
    turn_number: u64,
    handle: JoinHandle<()>,
}

impl TurnTimer {
    /// Run `on_expire` after `limit` unless cancelled first
    pub fn start<F>(turn_number: u64, limit: Duration, on_expire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            on_expire.await;
        });
        Self { turn_number, handle }
    }

    /// The turn this timer was armed for
    pub fn turn_number(&self) -> u64 {
        self.turn_number
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
