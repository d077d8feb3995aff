pub mod notify;
pub mod user;
pub mod visitor;
