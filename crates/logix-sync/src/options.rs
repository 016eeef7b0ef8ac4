//! Push options.

use serde::{Deserialize, Serialize};

/// How internal routines are paired between master and target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PushOptions {
    /// Fall back to fuzzy name matching when no routine has the exact name.
    pub use_similarity: bool,
    /// Lowest similarity ratio, in `0.0..=1.0`, accepted as a match.
    pub similarity_threshold: f64,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            use_similarity: true,
            similarity_threshold: 0.95,
        }
    }
}
