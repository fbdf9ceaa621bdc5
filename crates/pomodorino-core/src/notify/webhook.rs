//! Generic webhook channel.
//!
//! The user supplies the request body as a template; `{{timestamp}}` and
//! `{{mode}}` are substituted before sending. The POST always carries a
//! JSON content type, whatever the template holds.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::error::NotifyError;

/// Substitute every `{{timestamp}}` (ISO-8601, millisecond precision) and
/// `{{mode}}` placeholder in the template.
pub fn render_payload(template: &str, timestamp: DateTime<Utc>, mode: &str) -> String {
    template
        .replace(
            "{{timestamp}}",
            &timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .replace("{{mode}}", mode)
}

/// POST the rendered body to the endpoint.
///
/// Failures split into [`NotifyError::Network`] (the request never got an
/// answer) and [`NotifyError::Http`] (the endpoint said no), so callers
/// can phrase the two differently.
pub async fn post(client: &Client, url: &str, body: String) -> Result<(), NotifyError> {
    let resp = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::Http {
            status: status.as_u16(),
            detail: resp.text().await.unwrap_or_default(),
        })
    }
}

/// User-facing message for a failed webhook call.
pub fn failure_message(err: &NotifyError) -> String {
    match err {
        NotifyError::Network(_) => {
            "Could not reach the endpoint. Check the URL and your network.".to_string()
        }
        NotifyError::Http { status, .. } => {
            format!("Endpoint answered HTTP {status}. Check the URL and payload.")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn substitutes_both_placeholders() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let body = render_payload(r#"{"t":"{{timestamp}}","m":"{{mode}}"}"#, at, "shortBreak");
        assert_eq!(body, r#"{"t":"2024-01-01T00:00:00.000Z","m":"shortBreak"}"#);
    }

    #[test]
    fn substitutes_repeated_placeholders() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let body = render_payload("{{mode}}/{{mode}}", at, "work");
        assert_eq!(body, "work/work");
    }

    #[test]
    fn template_without_placeholders_is_untouched() {
        let body = render_payload(r#"{"event":"done"}"#, Utc::now(), "work");
        assert_eq!(body, r#"{"event":"done"}"#);
    }
}
