/// Token Revocation Ledger
///
/// Session tokens are stateless, so logout works by recording the token here.
/// Tokens are stored as SHA-256 digests (never plaintext); equal digests mean
/// equal token strings.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::error::AppError;

#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Record `token` as revoked. Revoking the same token again is a no-op.
    async fn revoke(&self, token: &str) -> Result<(), AppError>;

    /// Exact-match lookup.
    async fn is_revoked(&self, token: &str) -> Result<bool, AppError>;

    /// Drop entries revoked before `cutoff`. Returns how many were removed.
    async fn prune_revoked_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Hash a token using SHA-256
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Remove ledger entries that can no longer match a live token.
///
/// A token is revoked after it was issued, so anything revoked more than one
/// token lifetime ago refers to a token that has already expired.
pub async fn prune_expired_revocations(
    ledger: &dyn RevocationLedger,
    token_expiry_seconds: i64,
) -> Result<u64, AppError> {
    let cutoff = Utc::now() - Duration::seconds(token_expiry_seconds);
    let removed = ledger.prune_revoked_before(cutoff).await?;
    if removed > 0 {
        tracing::info!(removed = removed, "Pruned expired revocation entries");
    }
    Ok(removed)
}
