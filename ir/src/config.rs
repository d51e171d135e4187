//! Graph construction settings.

use bon::bon;

/// Settings read by [`Graph`](crate::Graph) during node construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Collapse structurally equal nodes onto one canonical instance.
    pub dedup: bool,
    /// Check operand ordering (acyclicity) on every insertion.
    pub verify: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { dedup: true, verify: cfg!(debug_assertions) }
    }
}

#[bon]
impl GraphConfig {
    #[builder]
    pub fn builder(#[builder(default = true)] dedup: bool, #[builder(default = cfg!(debug_assertions))] verify: bool) -> Self {
        Self { dedup, verify }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `STRATA_NO_CSE` - Disable node deduplication if set
    /// * `STRATA_VERIFY_GRAPH` - `1` forces verification on, `0` forces it off
    pub fn from_env() -> Self {
        let dedup = std::env::var("STRATA_NO_CSE").is_err();
        let verify = match std::env::var("STRATA_VERIFY_GRAPH").as_deref() {
            Ok("0") => false,
            Ok(_) => true,
            Err(_) => cfg!(debug_assertions),
        };
        Self { dedup, verify }
    }
}
