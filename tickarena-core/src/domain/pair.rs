//! Trading pair identifiers (`base/quote`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed `base/quote` pair, e.g. `token_1/fiat`.
///
/// Buying a pair acquires `base` and pays `quote`; the candle price is quote per base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
}

impl Pair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Parse `base/quote`. Both sides must be non-empty and distinct.
    pub fn parse(id: &str) -> Option<Self> {
        let (base, quote) = id.split_once('/')?;
        let (base, quote) = (base.trim(), quote.trim());
        if base.is_empty() || quote.is_empty() || base == quote || quote.contains('/') {
            return None;
        }
        Some(Self::new(base, quote))
    }

    /// The canonical identifier, e.g. `token_1/fiat`.
    pub fn id(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
