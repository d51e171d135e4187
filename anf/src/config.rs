//! Pass pipeline settings.
//!
//! Provides [`PassContext`] with a bon builder and environment variable
//! fallbacks, read by every [`ModulePass`](crate::ModulePass).

use bon::bon;

use crate::pass::ModulePass;

const DEFAULT_OPT_LEVEL: u32 = 2;

/// Settings shared by the passes of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassContext {
    /// Passes with a higher level are skipped.
    pub opt_level: u32,
    /// Names of passes that never run.
    pub disabled: Vec<String>,
    /// Check module well-formedness after every pass.
    pub verify: bool,
    /// Function rewritten by function-level passes.
    pub entry: String,
}

impl Default for PassContext {
    fn default() -> Self {
        Self {
            opt_level: DEFAULT_OPT_LEVEL,
            disabled: Vec::new(),
            verify: cfg!(debug_assertions),
            entry: "main".to_string(),
        }
    }
}

#[bon]
impl PassContext {
    #[builder]
    pub fn builder(
        #[builder(default = DEFAULT_OPT_LEVEL)] opt_level: u32,
        #[builder(default)] disabled: Vec<String>,
        #[builder(default = cfg!(debug_assertions))] verify: bool,
        #[builder(default = "main".to_string())] entry: String,
    ) -> Self {
        Self { opt_level, disabled, verify, entry }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `STRATA_OPT_LEVEL` - Highest pass level to run (default: 2)
    /// * `STRATA_DISABLED_PASSES` - Comma-separated pass names to skip
    /// * `STRATA_VERIFY_ANF` - `1` forces verification on, `0` forces it off
    pub fn from_env() -> Self {
        let opt_level =
            std::env::var("STRATA_OPT_LEVEL").ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_OPT_LEVEL);
        let disabled = std::env::var("STRATA_DISABLED_PASSES")
            .map(|s| parse_pass_list(&s))
            .unwrap_or_default();
        let verify = match std::env::var("STRATA_VERIFY_ANF").as_deref() {
            Ok("0") => false,
            Ok(_) => true,
            Err(_) => cfg!(debug_assertions),
        };
        Self { opt_level, disabled, verify, ..Self::default() }
    }

    /// Whether `pass` runs under these settings.
    pub fn is_enabled(&self, pass: &dyn ModulePass) -> bool {
        pass.opt_level() <= self.opt_level && !self.disabled.iter().any(|name| name == pass.name())
    }
}

fn parse_pass_list(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_string).collect()
}
