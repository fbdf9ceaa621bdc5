//! Telegram channel -- one bot sendMessage POST per completion.

use reqwest::Client;
use serde_json::json;

use crate::error::NotifyError;

/// Production Telegram Bot API root.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// POST `{base}/bot{token}/sendMessage` with `{chat_id, text}`.
///
/// A non-success response becomes [`NotifyError::Http`] carrying the API
/// `description` when the body has one.
pub async fn send_message(
    client: &Client,
    base: &str,
    token: &str,
    chat_id: &str,
    text: &str,
) -> Result<(), NotifyError> {
    let url = format!("{base}/bot{token}/sendMessage");
    let resp = client
        .post(&url)
        .json(&json!({ "chat_id": chat_id, "text": text }))
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let detail = body["description"]
        .as_str()
        .unwrap_or("Telegram API error")
        .to_string();
    Err(NotifyError::Http {
        status: status.as_u16(),
        detail,
    })
}
