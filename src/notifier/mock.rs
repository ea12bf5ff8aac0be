use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::{message::JobMessage, DeliveryError};

/// How the mock should reject sends to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    MalformedContent,
    RateLimited,
    Transport,
}

/// A message captured by the mock notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub message_id: String,
    pub message: JobMessage,
}

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<SentMessage>,
    failing_channels: HashMap<String, MockFailure>,
    failing_users: HashSet<String>,
}

/// Mock transport that captures sent messages for testing.
#[derive(Clone, Debug, Default)]
pub struct MockNotifier {
    state: Arc<Mutex<MockState>>,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every future send to `channel_id`
    pub fn fail_channel(&self, channel_id: &str, failure: MockFailure) {
        self.state()
            .failing_channels
            .insert(channel_id.to_string(), failure);
    }

    /// Reject opening a private channel with `user_id`
    pub fn fail_private_channel(&self, user_id: &str) {
        self.state().failing_users.insert(user_id.to_string());
    }

    pub(super) fn send(
        &self,
        channel_id: &str,
        message: &JobMessage,
    ) -> Result<String, DeliveryError> {
        let mut state = self.state();

        match state.failing_channels.get(channel_id) {
            Some(MockFailure::MalformedContent) => {
                return Err(DeliveryError::MalformedContent(format!(
                    "channel {channel_id} rejected the message"
                )));
            }
            Some(MockFailure::RateLimited) => {
                return Err(DeliveryError::RateLimited(format!(
                    "channel {channel_id} is rate limited"
                )));
            }
            Some(MockFailure::Transport) => {
                return Err(DeliveryError::Transport(format!(
                    "channel {channel_id} is unreachable"
                )));
            }
            None => {}
        }

        let message_id = format!("mock-{}", state.sent.len() + 1);
        state.sent.push(SentMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.clone(),
            message: message.clone(),
        });

        Ok(message_id)
    }

    pub(super) fn open_private_channel(&self, user_id: &str) -> Result<String, DeliveryError> {
        if self.state().failing_users.contains(user_id) {
            return Err(DeliveryError::Transport(format!(
                "cannot message user {user_id}"
            )));
        }

        Ok(private_channel_id(user_id))
    }

    /// Get all sent messages
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state().sent.clone()
    }

    /// Messages sent to one channel, in send order
    #[must_use]
    pub fn sent_to(&self, channel_id: &str) -> Vec<SentMessage> {
        self.state()
            .sent
            .iter()
            .filter(|sent| sent.channel_id == channel_id)
            .cloned()
            .collect()
    }
}

/// Channel id the mock hands out for a user's private channel
#[must_use]
pub fn private_channel_id(user_id: &str) -> String {
    format!("dm-{user_id}")
}
