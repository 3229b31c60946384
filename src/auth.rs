use sha2::{Digest, Sha256};

pub trait PasswordHasher {
    fn hash(&self, raw: &str) -> String;

    fn verify(&self, raw: &str, digest: &str) -> bool {
        self.hash(raw).eq_ignore_ascii_case(digest.trim())
    }
}

/// Unsalted SHA-256, lowercase hex. Matches digests already stored by
/// earlier workspaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
