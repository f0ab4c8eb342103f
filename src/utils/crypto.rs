use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::Error;

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

/// Hashing is CPU-bound, so it runs on the blocking pool instead of a runtime worker.
pub async fn hash_password_blocking(plain: String) -> crate::error::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(Error::from)
}

/// Rejects with `Unauthorized` on a mismatch.
pub async fn check_password(plain: String, hashed: String) -> crate::error::Result<()> {
    let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hashed))
        .await
        .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))??;
    if ok {
        Ok(())
    } else {
        Err(Error::Unauthorized("incorrect password".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("hunter22").unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(verify_password("hunter22", &hashed).unwrap());
        assert!(!verify_password("hunter23", &hashed).unwrap());
    }

    #[test]
    fn salts_differ_per_hash() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn check_password_reports_mismatch_as_unauthorized() {
        let hashed = hash_password_blocking("secret1".to_string()).await.unwrap();
        assert!(check_password("secret1".to_string(), hashed.clone()).await.is_ok());
        let err = check_password("nope".to_string(), hashed).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
