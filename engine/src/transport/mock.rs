//! In-memory transport for testing - only compiled in test mode or with the mock feature

use super::{ChannelEvent, LineSink, SinkSlot, SubscriptionToken, Transport, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    running: bool,
    sent: Vec<String>,
    launches: usize,
    terminations: usize,
    fail_launch: bool,
    /// Fail every write once this many lines have been accepted in total.
    fail_after: Option<usize>,
}

/// Scriptable transport. Clones share state, so a test keeps one clone as a
/// probe after handing the other to a session.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    sink: SinkSlot,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written so far, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.state.lock().unwrap().sent.clear();
    }

    /// How many times `line` was written.
    pub fn sent_count(&self, line: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|sent| sent.as_str() == line)
            .count()
    }

    /// Number of launches that actually started a process.
    pub fn launches(&self) -> usize {
        self.state.lock().unwrap().launches
    }

    pub fn terminations(&self) -> usize {
        self.state.lock().unwrap().terminations
    }

    pub fn running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn has_subscriber(&self) -> bool {
        self.sink.is_installed()
    }

    pub fn fail_launch(&self, fail: bool) {
        self.state.lock().unwrap().fail_launch = fail;
    }

    /// Accept `count` more lines, then fail every write after that.
    pub fn fail_writes_after(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        state.fail_after = Some(state.sent.len() + count);
    }

    /// Pretend the engine printed `line`. Returns whether anyone received it.
    pub async fn emit(&self, line: &str) -> bool {
        self.sink.deliver(ChannelEvent::Line(line.to_string())).await
    }

    /// Pretend the engine process died.
    pub async fn crash(&self) -> bool {
        self.state.lock().unwrap().running = false;
        self.sink.deliver(ChannelEvent::Closed).await
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn launch(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.running {
            return Ok(());
        }
        if state.fail_launch {
            return Err(TransportError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "mock launch failure",
            )));
        }
        state.running = true;
        state.launches += 1;
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        self.state.lock().unwrap().running
    }

    async fn send(&mut self, line: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if !state.running {
            return Err(TransportError::NotRunning);
        }
        let over_budget = state.fail_after.is_some_and(|limit| state.sent.len() >= limit);
        if over_budget {
            return Err(TransportError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.sent.push(line.to_string());
        Ok(())
    }

    fn subscribe(&mut self, sink: LineSink) -> Result<SubscriptionToken, TransportError> {
        self.sink.install(sink)
    }

    fn unsubscribe(&mut self, token: SubscriptionToken) {
        self.sink.revoke(token);
    }

    async fn terminate(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.running {
            state.running = false;
            state.terminations += 1;
        }
        Ok(())
    }
}
