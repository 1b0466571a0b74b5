//! The twelve FAEST parameter sets.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::FfiError;

/// Key and signature sizes in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeySizes {
    pub public_key: usize,
    pub private_key: usize,
    pub signature: usize,
}

/// One FAEST parameter set: family (FAEST or FAEST-EM) × security level × fast/small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterSet {
    Faest128f,
    Faest128s,
    Faest192f,
    Faest192s,
    Faest256f,
    Faest256s,
    FaestEm128f,
    FaestEm128s,
    FaestEm192f,
    FaestEm192s,
    FaestEm256f,
    FaestEm256s,
}

impl ParameterSet {
    /// Every parameter set, in declaration order.
    pub const ALL: [ParameterSet; 12] = [
        ParameterSet::Faest128f,
        ParameterSet::Faest128s,
        ParameterSet::Faest192f,
        ParameterSet::Faest192s,
        ParameterSet::Faest256f,
        ParameterSet::Faest256s,
        ParameterSet::FaestEm128f,
        ParameterSet::FaestEm128s,
        ParameterSet::FaestEm192f,
        ParameterSet::FaestEm192s,
        ParameterSet::FaestEm256f,
        ParameterSet::FaestEm256s,
    ];

    /// Short name: `128f`, `em_256s`.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Faest128f => "128f",
            Self::Faest128s => "128s",
            Self::Faest192f => "192f",
            Self::Faest192s => "192s",
            Self::Faest256f => "256f",
            Self::Faest256s => "256s",
            Self::FaestEm128f => "em_128f",
            Self::FaestEm128s => "em_128s",
            Self::FaestEm192f => "em_192f",
            Self::FaestEm192s => "em_192s",
            Self::FaestEm256f => "em_256f",
            Self::FaestEm256s => "em_256s",
        }
    }

    /// Function-name prefix: `faest_em_128f`.
    pub fn symbol_prefix(self) -> String {
        format!("faest_{}", self.suffix())
    }

    /// Constant-name prefix: `FAEST_EM_128F`.
    pub fn constant_prefix(self) -> String {
        self.symbol_prefix().to_ascii_uppercase()
    }

    /// Header declaring this parameter set: `faest_em_128f.h`.
    pub fn header(self) -> String {
        format!("{}.h", self.symbol_prefix())
    }

    pub fn sizes(self) -> KeySizes {
        let (public_key, private_key, signature) = match self {
            Self::Faest128f => (32, 32, 5924),
            Self::Faest128s => (32, 32, 4506),
            Self::Faest192f => (48, 40, 14948),
            Self::Faest192s => (48, 40, 11260),
            Self::Faest256f => (48, 48, 26548),
            Self::Faest256s => (48, 48, 20696),
            Self::FaestEm128f => (32, 32, 5060),
            Self::FaestEm128s => (32, 32, 3906),
            Self::FaestEm192f => (48, 48, 12380),
            Self::FaestEm192s => (48, 48, 9340),
            Self::FaestEm256f => (64, 64, 23476),
            Self::FaestEm256s => (64, 64, 17984),
        };
        KeySizes {
            public_key,
            private_key,
            signature,
        }
    }
}

impl fmt::Display for ParameterSet {
    /// `FAEST-128f`, `FAEST-EM-256s`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.suffix();
        match suffix.strip_prefix("em_") {
            Some(rest) => write!(f, "FAEST-EM-{rest}"),
            None => write!(f, "FAEST-{suffix}"),
        }
    }
}

impl FromStr for ParameterSet {
    type Err = FfiError;

    /// Accepts `128f`, `em_128f`, `faest_em_128f`, and `FAEST-EM-128F` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let short = normalized
            .strip_prefix("faest_")
            .unwrap_or(normalized.as_str());
        Self::ALL
            .into_iter()
            .find(|set| set.suffix() == short)
            .ok_or_else(|| FfiError::UnknownParameterSet(s.to_string()))
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.suffix())
    }
}
