pub mod accounts;
pub mod notifier;
pub mod passwords;
pub mod uploads;
pub mod validation;
