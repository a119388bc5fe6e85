//! Scripted reply source for tests and offline replays.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::ports::{non_blank, ReplySource, SubstrateError};

/// One scripted step: a reply, no reply, or a failure.
pub type ScriptedReply = Result<Option<String>, SubstrateError>;

/// Replays a fixed queue of replies in order. Clones share the queue.
#[derive(Clone)]
pub struct ScriptedSource {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Queue of successful replies.
    pub fn from_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(Some(r.into()))).collect())
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplySource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn request_reply(&self, _prompt: &str) -> Result<Option<String>, SubstrateError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().await.pop_front();
        match next {
            Some(Ok(reply)) => Ok(non_blank(reply)),
            Some(Err(err)) => Err(err),
            None => Err(SubstrateError::ScriptExhausted),
        }
    }
}
