pub mod auth;
pub mod contacts;
pub mod health;
pub mod media;
pub mod notify;
pub mod users;
pub mod visitors;
