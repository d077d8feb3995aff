use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::sms_api::is_sendable_phone;
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::service::validation::is_valid_email;
use crate::types::notify::{
    EmailOutcome, EmailSendRequest, EmailTestQuery, SmsOutcome, SmsSendRequest, SmsTestQuery,
};
use crate::{DeskError, router::DeskState};

const TEST_VISITOR: &str = "Test Visitor";
const TEST_EXHIBITION: &str = "Test Exhibition";

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/sms/send
pub async fn sms_send(
    State(state): State<DeskState>,
    _user: CurrentUser,
    ApiJson(req): ApiJson<SmsSendRequest>,
) -> Result<Json<SmsOutcome>, DeskError> {
    let (Some(phone), Some(name)) = (required(req.phone_number), required(req.visitor_name)) else {
        return Err(DeskError::BadRequest(
            "Phone number and visitor name are required".to_string(),
        ));
    };
    if !is_sendable_phone(&phone) {
        return Err(DeskError::BadRequest("Invalid phone number format".to_string()));
    }
    let exhibition = required(req.exhibition_name);
    Ok(Json(
        state
            .notifier
            .send_sms(&phone, &name, exhibition.as_deref())
            .await,
    ))
}

/// GET /api/sms/test?phone=
pub async fn sms_test(
    State(state): State<DeskState>,
    _user: CurrentUser,
    Query(query): Query<SmsTestQuery>,
) -> Result<Json<SmsOutcome>, DeskError> {
    let phone = required(query.phone).ok_or_else(|| {
        DeskError::BadRequest("Phone number required as query parameter".to_string())
    })?;
    Ok(Json(
        state
            .notifier
            .send_sms(&phone, TEST_VISITOR, Some(TEST_EXHIBITION))
            .await,
    ))
}

/// POST /api/email/send
pub async fn email_send(
    State(state): State<DeskState>,
    _user: CurrentUser,
    ApiJson(req): ApiJson<EmailSendRequest>,
) -> Result<Json<EmailOutcome>, DeskError> {
    let (Some(email), Some(name)) = (required(req.email_address), required(req.visitor_name))
    else {
        return Err(DeskError::BadRequest(
            "Email address and visitor name are required".to_string(),
        ));
    };
    if !is_valid_email(&email) {
        return Err(DeskError::BadRequest("Invalid email format".to_string()));
    }
    let exhibition = required(req.exhibition_name);
    Ok(Json(
        state
            .notifier
            .send_email(&email, &name, exhibition.as_deref())
            .await,
    ))
}

/// GET /api/email/test?email=
pub async fn email_test(
    State(state): State<DeskState>,
    _user: CurrentUser,
    Query(query): Query<EmailTestQuery>,
) -> Result<Json<EmailOutcome>, DeskError> {
    let email = required(query.email).ok_or_else(|| {
        DeskError::BadRequest("Email address required as query parameter".to_string())
    })?;
    Ok(Json(
        state
            .notifier
            .send_email(&email, TEST_VISITOR, Some(TEST_EXHIBITION))
            .await,
    ))
}
