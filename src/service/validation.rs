//! Server-side checks for visitor, contact and user input.
//!
//! Every check runs and the failures are collected, so one response can
//! list all problems with a form.

use crate::db::models::{ContactPatch, ContactType, NewContact, NewVisitor, Role, VisitorPatch};
use crate::error::DeskError;
use crate::types::visitor::{ContactPayload, VisitorPayload};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const NAME_MAX: usize = 100;
const NOTE_MAX: usize = 500;
const CONTACT_VALUE_MAX: usize = 255;
const LABEL_MAX: usize = 100;

pub const PASSWORD_MIN: usize = 6;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Iranian mobile numbers: 091x, 092x (x≠0), 093x (x≠0), then seven digits.
static IR_MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^09(1[0-9]|3[1-9]|2[1-9])[0-9]{7}$").expect("valid mobile regex")
});

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Accepts a local mobile number or anything carrying 10 to 14 digits once
/// separators are dropped.
pub fn is_valid_phone(value: &str) -> bool {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    IR_MOBILE_RE.is_match(&digits) || (10..=14).contains(&digits.len())
}

/// Bare hosts are accepted and read as `https://`.
pub fn is_valid_website(value: &str) -> bool {
    let candidate = if value.starts_with("http") {
        value.to_string()
    } else {
        format!("https://{value}")
    };
    url::Url::parse(&candidate)
        .ok()
        .and_then(|u| u.host_str().map(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// `None` when the field was absent or null; otherwise the trimmed text cut
/// to `max` characters (possibly empty).
fn take_string(field: &Option<Value>, max: usize) -> Option<String> {
    let raw = match field.as_ref()? {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(raw.trim().chars().take(max).collect())
}

/// Like `take_string`, but an empty value counts as "no value".
fn take_optional(field: &Option<Value>, max: usize) -> Option<String> {
    take_string(field, max).filter(|s| !s.is_empty())
}

fn take_flag(field: &Option<Value>) -> Option<bool> {
    match field.as_ref()? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            Some(matches!(s.as_str(), "1" | "true" | "on" | "yes"))
        }
        _ => None,
    }
}

fn check_contact_value(kind: ContactType, value: &str, errors: &mut Vec<String>) {
    match kind {
        ContactType::Email if !is_valid_email(value) => {
            errors.push(format!("invalid email: {value}"))
        }
        ContactType::Phone if !is_valid_phone(value) => {
            errors.push(format!("invalid phone: {value}"))
        }
        ContactType::Website if !is_valid_website(value) => {
            errors.push(format!("invalid website: {value}"))
        }
        _ => {}
    }
}

fn contact_from_parts(
    kind: Option<&Value>,
    value: Option<&Value>,
    label: Option<&Value>,
    errors: &mut Vec<String>,
) -> Option<NewContact> {
    let kind_raw = take_string(&kind.cloned(), usize::MAX)
        .unwrap_or_default()
        .to_ascii_lowercase();
    let value = take_string(&value.cloned(), CONTACT_VALUE_MAX).unwrap_or_default();
    let label = take_optional(&label.cloned(), LABEL_MAX);

    let Some(kind) = ContactType::parse(&kind_raw) else {
        errors.push(format!("invalid contact type: {kind_raw}"));
        return None;
    };
    if value.is_empty() {
        errors.push(format!("contact value required for {kind_raw}"));
        return None;
    }
    check_contact_value(kind, &value, errors);
    Some(NewContact { kind, value, label })
}

fn take_contacts(field: &Option<Value>, errors: &mut Vec<String>) -> Option<Vec<NewContact>> {
    let value = field.as_ref()?;
    let Value::Array(items) = value else {
        errors.push("contacts must be an array".to_string());
        return None;
    };
    let contacts = items
        .iter()
        .filter_map(|item| {
            contact_from_parts(item.get("type"), item.get("value"), item.get("label"), errors)
        })
        .collect();
    Some(contacts)
}

fn finish<T>(value: T, errors: Vec<String>) -> Result<T, DeskError> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(DeskError::Validation(errors))
    }
}

pub fn validate_new_visitor(p: &VisitorPayload) -> Result<NewVisitor, DeskError> {
    let mut errors = Vec::new();
    let first_name = take_string(&p.first_name, NAME_MAX).unwrap_or_default();
    let last_name = take_string(&p.last_name, NAME_MAX).unwrap_or_default();
    if first_name.is_empty() {
        errors.push("first_name is required".to_string());
    }
    if last_name.is_empty() {
        errors.push("last_name is required".to_string());
    }
    let contacts = take_contacts(&p.contacts, &mut errors).unwrap_or_default();

    let visitor = NewVisitor {
        first_name,
        last_name,
        academic_degree: take_optional(&p.academic_degree, NAME_MAX),
        company_name: take_optional(&p.company_name, NAME_MAX),
        job_position: take_optional(&p.job_position, NAME_MAX),
        field_of_activity: take_optional(&p.field_of_activity, NAME_MAX),
        is_manufacturer: take_flag(&p.is_manufacturer).unwrap_or(false),
        is_trader: take_flag(&p.is_trader).unwrap_or(false),
        is_distributor: take_flag(&p.is_distributor).unwrap_or(false),
        note: take_optional(&p.note, NOTE_MAX),
        contacts,
    };
    finish(visitor, errors)
}

/// Absent fields keep their stored value. Empty optional fields also keep
/// it; names may not be blanked.
pub fn validate_visitor_patch(p: &VisitorPayload) -> Result<VisitorPatch, DeskError> {
    let mut errors = Vec::new();
    let first_name = take_string(&p.first_name, NAME_MAX);
    let last_name = take_string(&p.last_name, NAME_MAX);
    if first_name.as_deref() == Some("") {
        errors.push("first_name cannot be empty".to_string());
    }
    if last_name.as_deref() == Some("") {
        errors.push("last_name cannot be empty".to_string());
    }
    let contacts = take_contacts(&p.contacts, &mut errors);

    let patch = VisitorPatch {
        first_name,
        last_name,
        academic_degree: take_optional(&p.academic_degree, NAME_MAX),
        company_name: take_optional(&p.company_name, NAME_MAX),
        job_position: take_optional(&p.job_position, NAME_MAX),
        field_of_activity: take_optional(&p.field_of_activity, NAME_MAX),
        is_manufacturer: take_flag(&p.is_manufacturer),
        is_trader: take_flag(&p.is_trader),
        is_distributor: take_flag(&p.is_distributor),
        note: take_optional(&p.note, NOTE_MAX),
        contacts,
    };
    finish(patch, errors)
}

pub fn validate_contact(p: &ContactPayload) -> Result<NewContact, DeskError> {
    let mut errors = Vec::new();
    let contact = contact_from_parts(p.kind.as_ref(), p.value.as_ref(), p.label.as_ref(), &mut errors);
    match contact {
        Some(c) => finish(c, errors),
        None => Err(DeskError::Validation(errors)),
    }
}

/// Checks a contact update against the stored contact it modifies.
pub fn validate_contact_patch(
    p: &ContactPayload,
    current: &NewContact,
) -> Result<ContactPatch, DeskError> {
    let mut errors = Vec::new();
    let kind = match take_optional(&p.kind, usize::MAX) {
        Some(raw) => {
            let raw = raw.to_ascii_lowercase();
            match ContactType::parse(&raw) {
                Some(kind) => Some(kind),
                None => {
                    errors.push(format!("invalid contact type: {raw}"));
                    None
                }
            }
        }
        None => None,
    };
    let value = take_string(&p.value, CONTACT_VALUE_MAX);
    if value.as_deref() == Some("") {
        errors.push("contact value cannot be empty".to_string());
    }
    let effective_kind = kind.unwrap_or(current.kind);
    let effective_value = value.as_deref().unwrap_or(&current.value);
    if !effective_value.is_empty() {
        check_contact_value(effective_kind, effective_value, &mut errors);
    }

    let patch = ContactPatch {
        kind,
        value: value.filter(|v| !v.is_empty()),
        label: take_optional(&p.label, LABEL_MAX),
    };
    finish(patch, errors)
}

pub fn validate_username(raw: Option<&str>) -> Result<String, DeskError> {
    let username = raw.unwrap_or_default().trim().to_string();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(DeskError::Validation(vec![format!(
            "username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )]));
    }
    Ok(username)
}

pub fn validate_password(raw: Option<&str>) -> Result<&str, DeskError> {
    let password = raw.unwrap_or_default();
    if password.chars().count() < PASSWORD_MIN {
        return Err(DeskError::BadRequestKey {
            message: format!("Password must be at least {PASSWORD_MIN} characters long"),
            key: "users.passwordTooShort",
        });
    }
    Ok(password)
}

pub fn validate_role(raw: Option<&str>) -> Result<Role, DeskError> {
    raw.unwrap_or_default()
        .parse::<Role>()
        .map_err(|e| DeskError::Validation(vec![e]))
}
