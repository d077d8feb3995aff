use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

/// Public view of a user row; never carries the password hash.
#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: Option<NaiveDateTime>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: Option<NaiveDateTime>,
    pub visitor_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContactType {
    Email,
    Phone,
    Address,
    Website,
}

impl ContactType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(ContactType::Email),
            "phone" => Some(ContactType::Phone),
            "address" => Some(ContactType::Address),
            "website" => Some(ContactType::Website),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
pub struct Contact {
    pub id: i64,
    pub visitor_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: ContactType,
    pub value: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: i64,
    #[serde(skip)]
    pub visitor_id: i64,
    pub filename: String,
    pub url: String,
    pub original_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: i64,
    #[serde(skip)]
    pub visitor_id: i64,
    pub filename: String,
    pub url: String,
    pub mime_type: Option<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VisitorRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub academic_degree: Option<String>,
    pub company_name: Option<String>,
    pub job_position: Option<String>,
    pub field_of_activity: Option<String>,
    #[serde(serialize_with = "flag::serialize")]
    pub is_manufacturer: bool,
    #[serde(serialize_with = "flag::serialize")]
    pub is_trader: bool,
    #[serde(serialize_with = "flag::serialize")]
    pub is_distributor: bool,
    pub note: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A visitor with its live children attached.
#[derive(Debug, Clone, Serialize)]
pub struct Visitor {
    #[serde(flatten)]
    pub row: VisitorRow,
    pub contacts: Vec<Contact>,
    pub photos: Vec<Photo>,
    pub voices: Vec<Voice>,
}

impl Visitor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.row.first_name, self.row.last_name)
            .trim()
            .to_string()
    }

    pub fn first_contact(&self, kind: ContactType) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub kind: ContactType,
    pub value: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub kind: Option<ContactType>,
    pub value: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVisitor {
    pub first_name: String,
    pub last_name: String,
    pub academic_degree: Option<String>,
    pub company_name: Option<String>,
    pub job_position: Option<String>,
    pub field_of_activity: Option<String>,
    pub is_manufacturer: bool,
    pub is_trader: bool,
    pub is_distributor: bool,
    pub note: Option<String>,
    pub contacts: Vec<NewContact>,
}

/// Partial update; `None` keeps the stored value. `contacts: Some(..)`
/// replaces the whole contact set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub academic_degree: Option<String>,
    pub company_name: Option<String>,
    pub job_position: Option<String>,
    pub field_of_activity: Option<String>,
    pub is_manufacturer: Option<bool>,
    pub is_trader: Option<bool>,
    pub is_distributor: Option<bool>,
    pub note: Option<String>,
    pub contacts: Option<Vec<NewContact>>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub filename: String,
    pub url: String,
    pub original_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewVoice {
    pub filename: String,
    pub url: String,
    pub mime_type: Option<String>,
    pub duration_ms: Option<i64>,
}

/// Visibility of visitors for the calling user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Owner(i64),
}

impl Scope {
    pub fn for_user(user: &User) -> Self {
        if user.is_admin() {
            Scope::All
        } else {
            Scope::Owner(user.id)
        }
    }

    /// Bound twice as `(? IS NULL OR created_by = ?)`.
    pub fn owner(&self) -> Option<i64> {
        match self {
            Scope::All => None,
            Scope::Owner(id) => Some(*id),
        }
    }
}

/// Business flags travel as `0`/`1`, the way the browser pages compare them.
mod flag {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }
}
