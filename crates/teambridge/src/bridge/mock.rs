use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::{Arc, Mutex};

use crate::bridge::base::TeamPlatform;
use crate::errors::{BridgeError, BridgeResult};
use crate::models::exchange::MultiAgentExchangeFormat;
use crate::models::message::RemoteMessage;

/// An in-memory platform that serves a fixed transcript and records what is sent to it
#[derive(Default)]
pub struct MockPlatform {
    messages: Vec<RemoteMessage>,
    fail_create: bool,
    fail_send: bool,
    fail_fetch: bool,
    created: Arc<Mutex<Vec<String>>>,
    sent: Arc<Mutex<Vec<(String, MultiAgentExchangeFormat)>>>,
}

impl MockPlatform {
    pub fn new(messages: Vec<RemoteMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Tasks of every session created so far
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    /// Every message sent so far, with its session id
    pub fn sent(&self) -> Vec<(String, MultiAgentExchangeFormat)> {
        self.sent.lock().unwrap().clone()
    }
}

fn server_error<T>() -> BridgeResult<T> {
    Err(BridgeError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "mock failure".to_string(),
    })
}

#[async_trait]
impl TeamPlatform for MockPlatform {
    async fn create_team_session(&self, team_id: &str, task: &str) -> BridgeResult<String> {
        if self.fail_create {
            return server_error();
        }
        let mut created = self.created.lock().unwrap();
        created.push(task.to_string());
        Ok(format!("{}-session-{}", team_id, created.len()))
    }

    async fn create_session(&self, agent_id: &str, task: &str) -> BridgeResult<String> {
        if self.fail_create {
            return server_error();
        }
        let mut created = self.created.lock().unwrap();
        created.push(task.to_string());
        Ok(format!("{}-session-{}", agent_id, created.len()))
    }

    async fn send_message(
        &self,
        session_id: &str,
        message: &MultiAgentExchangeFormat,
    ) -> BridgeResult<()> {
        if self.fail_send {
            return server_error();
        }
        self.sent
            .lock()
            .unwrap()
            .push((session_id.to_string(), message.clone()));
        Ok(())
    }

    async fn get_messages(&self, _session_id: &str) -> BridgeResult<Vec<RemoteMessage>> {
        if self.fail_fetch {
            return server_error();
        }
        Ok(self.messages.clone())
    }
}

/// Collects formatted `tracing` output so tests can assert on what was logged
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route events at `WARN` and above into this capture until the guard is dropped
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
