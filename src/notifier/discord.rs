use std::{
    fmt::{self, Debug},
    time::Duration,
};

use reqwest::{
    header::{AUTHORIZATION, RETRY_AFTER},
    Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, trace};

use super::{message::JobMessage, DeliveryError};

/// Discord's "Invalid Form Body" error code
pub const INVALID_FORM_BODY: u64 = 50035;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after a 429 before giving up on a request
pub const MAX_RATE_LIMIT_RETRIES: u32 = 3;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Minimal Discord REST client for the two calls delivery needs.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base_url: String,
    token: String,
}

impl Debug for DiscordClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct CreatedResource {
    id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: u64,
}

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

#[derive(Serialize)]
struct OpenPrivateChannel<'a> {
    recipient_id: &'a str,
}

impl DiscordClient {
    pub fn new(api_base_url: &str, token: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(
                "DiscordBot (",
                env!("CARGO_PKG_NAME"),
                ", ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub async fn send(
        &self,
        channel_id: &str,
        message: &JobMessage,
    ) -> Result<String, DeliveryError> {
        let url = format!("{}/channels/{channel_id}/messages", self.api_base_url);
        let created: CreatedResource = self.post(&url, message).await?;
        Ok(created.id)
    }

    pub async fn open_private_channel(&self, user_id: &str) -> Result<String, DeliveryError> {
        let url = format!("{}/users/@me/channels", self.api_base_url);
        trace!("Opening private channel with user {}", user_id);

        let channel: CreatedResource = self
            .post(
                &url,
                &OpenPrivateChannel {
                    recipient_id: user_id,
                },
            )
            .await?;
        Ok(channel.id)
    }

    /// Posts `body`, waiting out 429 responses up to [`MAX_RATE_LIMIT_RETRIES`] times.
    async fn post<B, T>(&self, url: &str, body: &B) -> Result<T, DeliveryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut retries = 0;

        loop {
            trace!("POST {}", url);

            let response = self
                .http
                .post(url)
                .header(AUTHORIZATION, format!("Bot {}", self.token))
                .json(body)
                .send()
                .await
                .map_err(|e| DeliveryError::Transport(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return read_response(response).await;
            }

            let header_wait = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<f64>().ok());
            let text = response.text().await.unwrap_or_default();

            if retries >= MAX_RATE_LIMIT_RETRIES {
                return Err(DeliveryError::RateLimited(format!("429: {text}")));
            }
            retries += 1;

            let wait = retry_after(&text, header_wait);
            debug!(
                "⏳ Rate limited on {}, retrying in {:?} ({}/{})",
                url, wait, retries, MAX_RATE_LIMIT_RETRIES
            );
            sleep(wait).await;
        }
    }
}

async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T, DeliveryError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status.as_u16(), &body))
}

/// How long Discord asked us to wait, from the JSON body or the `Retry-After` header.
#[must_use]
pub fn retry_after(body: &str, header_seconds: Option<f64>) -> Duration {
    serde_json::from_str::<RateLimitBody>(body)
        .ok()
        .map(|limit| limit.retry_after)
        .or(header_seconds)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .map_or(DEFAULT_RETRY_AFTER, |wait| wait.min(MAX_RETRY_AFTER))
}

/// Maps a rejected Discord request to a delivery error.
#[must_use]
pub fn classify_failure(status: u16, body: &str) -> DeliveryError {
    if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
        return DeliveryError::RateLimited(format!("{status}: {body}"));
    }

    let code = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|error| error.code);

    if code == Some(INVALID_FORM_BODY) {
        DeliveryError::MalformedContent(format!("{status}: {body}"))
    } else {
        DeliveryError::Transport(format!("{status}: {body}"))
    }
}
