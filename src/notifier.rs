use thiserror::Error;

pub mod discord;
pub mod message;
pub mod mock;

use discord::DiscordClient;
use message::JobMessage;
use mock::MockNotifier;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Discord refused the payload itself; resending it will never work
    #[error("Message content rejected: {0}")]
    MalformedContent(String),
    /// Discord kept answering 429 after the client waited and retried
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Delivery failed: {0}")]
    Transport(String),
}

/// Notifier that can be either the Discord API or a mock for testing.
///
/// The mock variant captures sent messages in memory, allowing tests to verify
/// deliveries without talking to Discord.
#[derive(Clone, Debug)]
pub enum Notifier {
    Discord(DiscordClient),
    Mock(MockNotifier),
}

impl Notifier {
    #[must_use]
    pub fn mock() -> Self {
        Self::Mock(MockNotifier::new())
    }

    pub fn discord(api_base_url: &str, token: &str) -> Result<Self, reqwest::Error> {
        Ok(Self::Discord(DiscordClient::new(api_base_url, token)?))
    }

    /// Posts a job message and returns the created message id.
    pub async fn send(
        &self,
        channel_id: &str,
        message: &JobMessage,
    ) -> Result<String, DeliveryError> {
        match self {
            Self::Discord(client) => client.send(channel_id, message).await,
            Self::Mock(mock) => mock.send(channel_id, message),
        }
    }

    /// Opens (or reuses) the private channel with a user.
    pub async fn open_private_channel(&self, user_id: &str) -> Result<String, DeliveryError> {
        match self {
            Self::Discord(client) => client.open_private_channel(user_id).await,
            Self::Mock(mock) => mock.open_private_channel(user_id),
        }
    }
}
