// Audit key minting with a best-effort, fail-open uniqueness check

use std::fmt::Display;
use std::future::Future;

use rand::Rng;
use tracing::{debug, warn};

/// Key symbols. Visually ambiguous glyphs (I, O, 0, 1) are left out.
pub const AUDIT_KEY_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const AUDIT_KEY_LENGTH: usize = 8;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct AuditKeyGenerator {
    max_attempts: u32,
}

impl Default for AuditKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditKeyGenerator {
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Eight symbols drawn uniformly, with replacement, from the alphabet
    pub fn generate_key(&self) -> String {
        let symbols = AUDIT_KEY_ALPHABET.as_bytes();
        let mut rng = rand::rng();
        (0..AUDIT_KEY_LENGTH)
            .map(|_| char::from(symbols[rng.random_range(0..symbols.len())]))
            .collect()
    }

    /// Mint a key that `exists_check` does not report as taken.
    ///
    /// Never fails. If the check itself errors the candidate is returned
    /// unverified. After `max_attempts` reported collisions a fresh,
    /// unchecked key is returned.
    pub async fn generate_unique_key<F, Fut, E>(&self, mut exists_check: F) -> String
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generate_key();
            match exists_check(candidate.clone()).await {
                Ok(false) => {
                    debug!(attempt, "Audit key verified unique");
                    return candidate;
                }
                Ok(true) => {
                    debug!(attempt, "Audit key collision, regenerating");
                }
                Err(e) => {
                    warn!(error = %e, "Audit key uniqueness check unavailable, using unverified key");
                    return candidate;
                }
            }
        }

        warn!(
            attempts = self.max_attempts,
            "Audit key collisions persisted, accepting unverified key"
        );
        self.generate_key()
    }
}

/// Canonical form of a user-typed key
pub fn normalize_key(input: &str) -> String {
    input.trim().to_uppercase()
}

pub fn is_well_formed_key(key: &str) -> bool {
    key.len() == AUDIT_KEY_LENGTH && key.chars().all(|c| AUDIT_KEY_ALPHABET.contains(c))
}
