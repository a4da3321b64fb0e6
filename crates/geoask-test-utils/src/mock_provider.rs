// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use geoask_core::{CompletionOptions, CompletionProvider, GeoaskError, Message};
use tokio::sync::Mutex;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Returns `Ok(Some(text))`.
    Text(String),
    /// Returns `Ok(None)`.
    Empty,
    /// Returns a backend error with this message.
    Error(String),
    /// Sleeps, then returns `Ok(Some(text))`.
    Delayed(Duration, String),
}

/// A mock backend that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// `SELECT 1;` is returned. Every call is counted and its messages kept.
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider pre-loaded with text replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::with_replies(responses.into_iter().map(MockReply::Text).collect())
    }

    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Self::default()
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message sequences received, in call order.
    pub async fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Option<String>, GeoaskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(messages.to_vec());

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("SELECT 1;".to_string()));

        match reply {
            MockReply::Text(text) => Ok(Some(text)),
            MockReply::Empty => Ok(None),
            MockReply::Error(message) => Err(GeoaskError::backend(message)),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(Some(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_in_order_then_default() {
        let provider = MockProvider::with_replies(vec![
            MockReply::Text("a".into()),
            MockReply::Empty,
            MockReply::Error("down".into()),
        ]);
        let opts = CompletionOptions::sql();
        let msgs = [Message::user("q")];

        assert_eq!(provider.complete(&msgs, &opts).await.unwrap().as_deref(), Some("a"));
        assert!(provider.complete(&msgs, &opts).await.unwrap().is_none());
        assert!(provider.complete(&msgs, &opts).await.is_err());
        assert_eq!(
            provider.complete(&msgs, &opts).await.unwrap().as_deref(),
            Some("SELECT 1;")
        );
        assert_eq!(provider.call_count(), 4);
        assert_eq!(provider.requests().await.len(), 4);
    }
}
