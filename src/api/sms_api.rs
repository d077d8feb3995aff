use backon::{ExponentialBuilder, Retryable};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::error;

static SENDABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+?[1-9]\d{1,14}|0\d{9,13})$").expect("valid sendable phone regex")
});

/// True when the number can be handed to the SMS provider: international
/// form or a local number with its leading zero.
pub fn is_sendable_phone(raw: &str) -> bool {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    SENDABLE_RE.is_match(&cleaned)
}

/// Local form expected by sms.ir: digits only, leading `0`, no `98` prefix.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.starts_with('0') {
        digits
    } else if let Some(rest) = digits.strip_prefix("98") {
        format!("0{rest}")
    } else {
        format!("0{digits}")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSendRequest<'a> {
    pub line_number: u64,
    pub message_text: &'a str,
    pub mobiles: Vec<String>,
    pub send_date_time: Option<String>,
}

/// sms.ir reply envelope; `status == 1` means accepted.
#[derive(Debug, Deserialize)]
pub struct BulkSendResponse {
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl BulkSendResponse {
    pub fn accepted(&self) -> bool {
        self.status == 1
    }

    pub fn message_id(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        data.get("messageIds")
            .and_then(|ids| ids.get(0))
            .or_else(|| data.get("packId"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

pub struct SmsApi;

impl SmsApi {
    /// POST `{base}/send/bulk`, retrying server errors.
    pub async fn try_send_bulk(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        retry_policy: ExponentialBuilder,
        body: &BulkSendRequest<'_>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = format!("{}/send/bulk", base_url.trim_end_matches('/'));

        (|| async {
            let resp = client
                .post(url.as_str())
                .header("X-API-KEY", api_key)
                .header("Accept", "application/json")
                .json(body)
                .send()
                .await?;
            if resp.status().is_server_error() {
                let status = resp.status();
                error!("SMS provider server error (will retry): {}", status);
                return Err(resp.error_for_status().unwrap_err());
            }
            Ok(resp)
        })
        .retry(retry_policy)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_to_local_form() {
        assert_eq!(normalize_phone("0912 123 4567"), "09121234567");
        assert_eq!(normalize_phone("+98 912 123 4567"), "09121234567");
        assert_eq!(normalize_phone("9121234567"), "09121234567");
    }

    #[test]
    fn sendable_numbers() {
        assert!(is_sendable_phone("09121234567"));
        assert!(is_sendable_phone("+989121234567"));
        assert!(is_sendable_phone("0912-123-4567"));
        assert!(!is_sendable_phone("0"));
        assert!(!is_sendable_phone("hello"));
    }

    #[test]
    fn reads_message_id_from_reply() {
        let reply: BulkSendResponse = serde_json::from_value(json!({
            "status": 1,
            "message": "ok",
            "data": {"packId": "p-1", "messageIds": [88123], "cost": 1.0}
        }))
        .unwrap();
        assert!(reply.accepted());
        assert_eq!(reply.message_id().as_deref(), Some("88123"));
    }
}
