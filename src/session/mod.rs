//! Session lifecycle: the persisted token, the session state and the
//! injected context through which every transition goes.

pub mod context;
pub mod state;
pub mod storage;

pub use context::SessionContext;
pub use state::{Session, SessionPhase};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore};

use sha2::{Digest, Sha256};

/// Short, non-reversible identifier for a token, safe to log.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = fingerprint("abc123");
        assert_eq!(a.len(), 8);
        assert_eq!(a, fingerprint("abc123"));
        assert_ne!(a, fingerprint("abc124"));
        assert!(!a.contains("abc123"));
    }
}
