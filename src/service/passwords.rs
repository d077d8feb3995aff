//! bcrypt hashing, run on the blocking pool so request workers stay free.

use crate::error::DeskError;

/// Matches the cost of hashes written by earlier deployments.
pub const BCRYPT_COST: u32 = 10;

pub async fn hash_password(password: &str) -> Result<String, DeskError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await?
        .map_err(DeskError::from)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, DeskError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    Ok(verified.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("s3cret!").await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("s3cret!", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("s3cret!", "not-a-hash").await.unwrap());
    }
}
