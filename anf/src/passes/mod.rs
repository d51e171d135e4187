//! Built-in module passes.

mod canonicalize_backward;

use std::sync::Arc;

pub use canonicalize_backward::{CanonicalizeBackwardClosure, canonicalize_backward_closure};

use crate::error::Result;
use crate::registry::PassRegistry;

/// Register every built-in pass, in pipeline order.
pub fn register_builtin(registry: &mut PassRegistry) -> Result<()> {
    registry.register(Arc::new(CanonicalizeBackwardClosure))?;
    Ok(())
}
