use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmsSendRequest {
    pub phone_number: Option<String>,
    pub visitor_name: Option<String>,
    pub exhibition_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailSendRequest {
    pub email_address: Option<String>,
    pub visitor_name: Option<String>,
    pub exhibition_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SmsTestQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailTestQuery {
    pub email: Option<String>,
}

/// Outcome of one SMS attempt. Provider failures are reported here rather
/// than as errors so callers can attach them to their own response.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SmsOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
