use crate::db::{Role, Storage};
use crate::error::DeskError;
use crate::service::passwords::hash_password;
use tracing::{info, warn};

pub const DEFAULT_ADMIN: &str = "admin";

/// Create the `admin` account on first start. Returns true when it was
/// created.
pub async fn seed_default_admin(storage: &Storage, password: &str) -> Result<bool, DeskError> {
    if storage.username_taken(DEFAULT_ADMIN).await? {
        return Ok(false);
    }
    let hash = hash_password(password).await?;
    storage.create_user(DEFAULT_ADMIN, &hash, Role::Admin).await?;
    info!(username = DEFAULT_ADMIN, "seeded default admin account");
    if password == "admin123" {
        warn!("default admin password in use; change it after the first login");
    }
    Ok(true)
}
