use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use snafu::{ensure, ResultExt};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::errors::{CustomResult, WebhookRequestSnafu, WebhookStatusSnafu};

/// who a chat message goes to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatTarget {
    All,
    Driver(u64),
}

/// the in-session chat of the host
pub trait ChatSender: Send + Sync + 'static {
    fn send(&self, target: ChatTarget, message: &str) -> CustomResult<()>;
}

/// posts a json body to a webhook url
pub trait WebhookSender: Send + Sync + 'static {
    fn post(&self, url: &str, body: String) -> impl Future<Output = CustomResult<()>> + Send;
}

/// webhook delivery over http, for discord style webhooks
#[derive(Clone, Default)]
pub struct DiscordWebhook {
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new() -> DiscordWebhook {
        DiscordWebhook::default()
    }
}

impl WebhookSender for DiscordWebhook {
    fn post(&self, url: &str, body: String) -> impl Future<Output = CustomResult<()>> + Send {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        send_request(request)
    }
}

async fn send_request(request: reqwest::RequestBuilder) -> CustomResult<()> {
    let response = request.send().await.context(WebhookRequestSnafu)?;
    let status = response.status();
    ensure!(status.is_success(), WebhookStatusSnafu { status: status.as_u16() });
    Ok(())
}

/// # webhook payload
/// the body posted to the webhook for one message, `{"content":"..."}`.
/// quotes, backslashes and control characters in the message are escaped.
pub fn webhook_payload(message: &str) -> String {
    json!({ "content": message }).to_string()
}

/// # split a message into chat lines
/// every line of the message becomes one chat line, cut to `max_length`
/// characters. empty lines are dropped.
pub fn chunk_lines<S: AsRef<str>>(messages: &[S], max_length: usize) -> Vec<String> {
    messages
        .iter()
        .flat_map(|message| message.as_ref().lines())
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| match line.char_indices().nth(max_length) {
            Some((cut, _)) => line[..cut].to_string(),
            None => line.to_string(),
        })
        .collect()
}

/// delivers rendered messages to the chat and the webhook
pub struct Notifier<C, W> {
    chat: Arc<C>,
    webhook: Arc<W>,
    webhook_url: String,
    message_interval: Duration,
    max_line_length: usize,
}

impl<C: ChatSender, W: WebhookSender> Notifier<C, W> {
    pub fn new(
        chat: Arc<C>,
        webhook: Arc<W>,
        webhook_url: String,
        message_interval: Duration,
        max_line_length: usize,
    ) -> Notifier<C, W> {
        Notifier {
            chat,
            webhook,
            webhook_url,
            message_interval,
            max_line_length,
        }
    }

    /// # send throttled
    /// schedule every line of the messages as its own chat message. the
    /// first line goes out after one interval, the second after two and so
    /// on, so a long leaderboard does not flood the chat.
    ///
    /// nothing is retried, a failed line is logged and dropped.
    ///
    /// ## Returns
    /// * `Vec<JoinHandle<()>>` - one handle per scheduled line, safe to drop
    pub fn send_throttled<S: AsRef<str>>(&self, target: ChatTarget, messages: &[S]) -> Vec<JoinHandle<()>> {
        chunk_lines(messages, self.max_line_length)
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                let chat = Arc::clone(&self.chat);
                let delay = self.message_interval.saturating_mul(index as u32 + 1);

                tokio::spawn(async move {
                    sleep(delay).await;
                    match chat.send(target, &line) {
                        Ok(()) => debug!(target: "notifications:send_throttled", "sent chat line to {:?}", target),
                        Err(error) => warn!(target: "notifications:send_throttled", "failed sending chat line to {:?}: {}", target, error),
                    }
                })
            })
            .collect()
    }

    /// # post to the webhook
    /// post each message as its own request, in order. does nothing when no
    /// webhook url is configured.
    pub fn post_webhook(&self, messages: Vec<String>) -> Option<JoinHandle<()>> {
        if self.webhook_url.is_empty() || messages.is_empty() {
            return None;
        }

        let webhook = Arc::clone(&self.webhook);
        let url = self.webhook_url.clone();

        Some(tokio::spawn(async move {
            for message in messages {
                match webhook.post(&url, webhook_payload(&message)).await {
                    Ok(()) => debug!(target: "notifications:post_webhook", "posted message to webhook"),
                    Err(error) => error!(target: "notifications:post_webhook", "webhook post failed: {}", error),
                }
            }
        }))
    }
}
