//! Canonical dialect: trailing-slash URLs, pass-through shaping.

use super::NodeAdapter;

/// Adapter for peers that speak the canonical dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAdapter;

impl NodeAdapter for DefaultAdapter {
    fn name(&self) -> &'static str {
        "default"
    }
}
