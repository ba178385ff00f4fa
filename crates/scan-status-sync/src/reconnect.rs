/*
[INPUT]:  Transport failures reported by a stream session
[OUTPUT]: At most one armed reconnect timer
[POS]:    Retry policy - fixed-delay reconnect scheduling
[UPDATE]: When changing the reconnect delay policy
*/

use std::future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep, sleep};

/// Delay between a transport failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Owns the single pending reconnect timer of a stream session.
///
/// The delay is fixed; failures are assumed to be transient.
#[derive(Debug)]
pub struct ReconnectScheduler {
    delay: Duration,
    timer: Option<Pin<Box<Sleep>>>,
}

impl ReconnectScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// When the armed timer will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.as_ref().map(|timer| timer.deadline())
    }

    /// Arm the timer. Returns `false` (and changes nothing) if one is already armed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&mut self) -> bool {
        if self.timer.is_some() {
            return false;
        }
        self.timer = Some(Box::pin(sleep(self.delay)));
        true
    }

    /// Disarm the timer. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Resolves once the armed timer fires, disarming it.
    ///
    /// Never resolves while disarmed. Cancel-safe: dropping the future keeps the
    /// timer armed.
    pub async fn expired(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => future::pending::<()>().await,
        }
    }
}

impl Default for ReconnectScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}
