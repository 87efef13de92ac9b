//! Line-oriented channel to an external engine process.
//!
//! A transport knows how to launch the engine, write one command line at a
//! time, and forward every output line to at most one subscriber. It knows
//! nothing about the protocol spoken over it.

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod process;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use process::ProcessTransport;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Engine binary not found")]
    EngineNotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Engine has no {0}")]
    MissingPipe(&'static str),
    #[error("Engine process is not running")]
    NotRunning,
    #[error("Failed to write to engine: {0}")]
    Write(#[source] std::io::Error),
    #[error("An output subscription is already installed")]
    AlreadySubscribed,
}

/// What a subscriber receives from the engine's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Line(String),
    /// The output stream ended (process exit or read failure).
    Closed,
}

/// Proof of an installed output subscription, required to revoke it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

pub type LineSink = mpsc::Sender<ChannelEvent>;

/// Bidirectional line channel to an engine process.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Start the process. A no-op while the process is already alive.
    async fn launch(&mut self) -> Result<(), TransportError>;

    fn is_running(&mut self) -> bool;

    /// Write `line` followed by the protocol terminator.
    async fn send(&mut self, line: &str) -> Result<(), TransportError>;

    /// Install the single output sink. Fails if one is already installed.
    fn subscribe(&mut self, sink: LineSink) -> Result<SubscriptionToken, TransportError>;

    /// Revoke a subscription. Stale tokens are ignored.
    fn unsubscribe(&mut self, token: SubscriptionToken);

    /// Shut the process down. A no-op when nothing is running.
    async fn terminate(&mut self) -> Result<(), TransportError>;
}

#[derive(Debug, Default)]
struct SlotState {
    next_token: u64,
    current: Option<(SubscriptionToken, LineSink)>,
}

/// The one output sink of a transport, shared with its reader task.
#[derive(Debug, Clone, Default)]
pub(crate) struct SinkSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl SinkSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn install(&self, sink: LineSink) -> Result<SubscriptionToken, TransportError> {
        let mut slot = self.lock();
        if slot.current.is_some() {
            return Err(TransportError::AlreadySubscribed);
        }
        slot.next_token += 1;
        let token = SubscriptionToken(slot.next_token);
        slot.current = Some((token, sink));
        Ok(token)
    }

    pub(crate) fn revoke(&self, token: SubscriptionToken) -> bool {
        let mut slot = self.lock();
        match slot.current {
            Some((current, _)) if current == token => {
                slot.current = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_installed(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Hand `event` to the current subscriber. Returns false when nobody is
    /// listening, in which case the event is dropped.
    pub(crate) async fn deliver(&self, event: ChannelEvent) -> bool {
        let sink = self.lock().current.as_ref().map(|(_, sink)| sink.clone());
        match sink {
            Some(sink) => sink.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_subscription_is_rejected() {
        let slot = SinkSlot::default();
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);

        slot.install(tx1).unwrap();
        assert!(matches!(
            slot.install(tx2),
            Err(TransportError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_no_delivery_after_revoke() {
        let slot = SinkSlot::default();
        let (tx, mut rx) = mpsc::channel(4);
        let token = slot.install(tx).unwrap();

        assert!(slot.deliver(ChannelEvent::Line("readyok".into())).await);
        assert!(slot.revoke(token));
        assert!(!slot.deliver(ChannelEvent::Line("bestmove e2e4".into())).await);

        assert_eq!(rx.recv().await, Some(ChannelEvent::Line("readyok".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stale_token_does_not_revoke_new_subscription() {
        let slot = SinkSlot::default();
        let (tx1, _rx1) = mpsc::channel(4);
        let old = slot.install(tx1).unwrap();
        slot.revoke(old);

        let (tx2, _rx2) = mpsc::channel(4);
        slot.install(tx2).unwrap();
        assert!(!slot.revoke(old));
        assert!(slot.is_installed());
    }
}
