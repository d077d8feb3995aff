use crate::db::models::Visitor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Visitor form as posted by the browser. Fields stay loosely typed so that
/// numbers, booleans and nulls are all accepted and normalised during
/// validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VisitorPayload {
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub academic_degree: Option<Value>,
    pub company_name: Option<Value>,
    pub job_position: Option<Value>,
    pub field_of_activity: Option<Value>,
    pub is_manufacturer: Option<Value>,
    pub is_trader: Option<Value>,
    pub is_distributor: Option<Value>,
    pub note: Option<Value>,
    pub contacts: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactPayload {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub value: Option<Value>,
    pub label: Option<Value>,
}

/// Response of `POST /api/visitors`: the stored visitor plus the outcome of
/// the welcome notifications that were attempted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedVisitor {
    #[serde(flatten)]
    pub visitor: Visitor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl CreatedVisitor {
    pub fn new(visitor: Visitor) -> Self {
        Self {
            visitor,
            sms_sent: None,
            sms_error: None,
            email_sent: None,
            email_error: None,
        }
    }
}
