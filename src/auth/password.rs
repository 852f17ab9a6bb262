use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

/// bcrypt ignores everything past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// bcrypt hashing on the blocking pool
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_digest: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }

        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// A malformed digest verifies as false
    pub async fn verify(&self, password: &str, digest: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }

        let password = password.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest).unwrap_or(false))
            .await
            .unwrap_or(false)
    }

    /// Spend one verification on a throwaway digest so unknown accounts cost the same
    pub async fn verify_dummy(&self, password: &str) {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| self.hash("dummy-password-for-timing"))
            .await;

        match digest {
            Ok(digest) => {
                let _ = self.verify(password, digest).await;
            }
            Err(e) => tracing::warn!("Could not prepare dummy digest: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new(4);
        let digest = hasher.hash("correct horse").await.unwrap();
        assert_ne!(digest, "correct horse");
        assert!(hasher.verify("correct horse", &digest).await);
        assert!(!hasher.verify("wrong horse", &digest).await);
    }

    #[tokio::test]
    async fn only_the_original_password_verifies() {
        let hasher = PasswordHasher::new(4);
        let digest = hasher.hash("landlord123").await.unwrap();
        assert!(!hasher.verify("", &digest).await);
        assert!(!hasher.verify(&digest, &digest).await);
        assert!(!hasher.verify("landlord123 ", &digest).await);
        assert!(hasher.verify("landlord123", &digest).await);
    }

    #[tokio::test]
    async fn malformed_digest_is_false() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("anything", "not-a-bcrypt-digest").await);
        assert!(!hasher.verify("anything", "").await);
    }

    #[tokio::test]
    async fn overlong_passwords_are_rejected() {
        let hasher = PasswordHasher::new(4);
        let long = "a".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(hasher.hash(&long).await, Err(PasswordError::TooLong)));

        let exact = "a".repeat(MAX_PASSWORD_BYTES);
        assert!(hasher.hash(&exact).await.is_ok());
    }

    #[tokio::test]
    async fn dummy_verification_completes() {
        let hasher = PasswordHasher::new(4);
        hasher.verify_dummy("whatever").await;
        assert!(hasher.dummy_digest.get().is_some());
    }
}
