//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Trading pair symbol - newtype for type safety.
///
/// Symbols are normalized to upper case without surrounding whitespace, so
/// `" btcusdt"` and `"BTCUSDT"` name the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PairSymbol(String);

impl PairSymbol {
    /// Create a new `PairSymbol`, normalizing case and whitespace.
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().trim().to_ascii_uppercase())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the symbol is empty after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PairSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PairSymbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PairSymbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for PairSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
