//! Publication visibility.

use serde::{Deserialize, Serialize};

/// Which blog rows a query may see.
///
/// Public routes read [`Visibility::Published`]; admin routes read
/// [`Visibility::All`]. Both share the same query code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only rows with `published = true`.
    #[default]
    Published,
    /// Every row regardless of publish state.
    All,
}

impl Visibility {
    /// Whether a row with the given publish flag is visible.
    #[must_use]
    pub const fn admits(self, published: bool) -> bool {
        match self {
            Self::Published => published,
            Self::All => true,
        }
    }
}
