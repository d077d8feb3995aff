//! Stateless clients for the outbound notification providers.

pub mod email_api;
pub mod sms_api;
