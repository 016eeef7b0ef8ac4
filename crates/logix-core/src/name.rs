//! Name validation.

use crate::error::{CoreError, Result};

const FORBIDDEN: &[char] = &[
    '.', ',', '-', '/', '\\', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '=', '+',
];

/// Check that `name` may be used as an object name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".into(),
        });
    }
    if let Some(c) = name.chars().find(|c| c.is_whitespace()) {
        return Err(CoreError::InvalidName {
            name: name.to_string(),
            reason: format!("contains whitespace {c:?}"),
        });
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(CoreError::InvalidName {
            name: name.to_string(),
            reason: format!("contains '{c}'"),
        });
    }
    Ok(())
}
