use askama::Template;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Message accepted by the HTTP mail relay.
#[derive(Debug, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Relays answer with an id under one of a few names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MailReceipt {
    pub id: Option<String>,
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
}

impl MailReceipt {
    pub fn into_id(self) -> Option<String> {
        self.message_id.or(self.id)
    }
}

/// HTML body of the welcome mail; askama escapes both fields.
#[derive(Template)]
#[template(path = "welcome_email.html")]
struct WelcomeEmailTemplate<'a> {
    visitor_name: &'a str,
    exhibition: &'a str,
}

/// `"Display Name" <address>` with quotes and backslashes in the name escaped.
fn mailbox(display_name: &str, address: &str) -> String {
    let quoted = display_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{quoted}\" <{address}>")
}

/// Welcome mail for a freshly registered visitor.
pub fn welcome_message(
    from: &str,
    to: &str,
    visitor_name: &str,
    exhibition: &str,
) -> Result<MailMessage, askama::Error> {
    let html = WelcomeEmailTemplate {
        visitor_name,
        exhibition,
    }
    .render()?;
    Ok(MailMessage {
        from: mailbox(exhibition, from),
        to: to.to_string(),
        subject: format!("Welcome to {exhibition}!"),
        html,
        text: format!(
            "Welcome {visitor_name}! Thank you for registering for {exhibition}. We look forward to seeing you at the event."
        ),
    })
}

pub struct EmailApi;

impl EmailApi {
    pub async fn try_send(
        client: reqwest::Client,
        url: &str,
        api_key: Option<&str>,
        retry_policy: ExponentialBuilder,
        message: &MailMessage,
    ) -> Result<reqwest::Response, reqwest::Error> {
        (|| async {
            let mut req = client.post(url).json(message);
            if let Some(key) = api_key {
                req = req.bearer_auth(key);
            }
            let resp = req.send().await?;
            if resp.status().is_server_error() {
                let status = resp.status();
                error!("Mail relay server error (will retry): {}", status);
                return Err(resp.error_for_status().unwrap_err());
            }
            Ok(resp)
        })
        .retry(retry_policy)
        .await
    }
}
