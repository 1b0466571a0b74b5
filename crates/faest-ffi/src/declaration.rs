//! The declaration table exposed to bindings.
//!
//! Three size constants and five entry points per parameter set, 36 constants
//! and 60 functions in total. The table is the same whichever tier supplied
//! the library.

use serde::Serialize;

use crate::csig::{CParam, CSignature, CType};
use crate::params::ParameterSet;

/// One of the five functions each parameter set exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPoint {
    Keygen,
    Sign,
    Verify,
    ValidateKeypair,
    ClearPrivateKey,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 5] = [
        EntryPoint::Keygen,
        EntryPoint::Sign,
        EntryPoint::Verify,
        EntryPoint::ValidateKeypair,
        EntryPoint::ClearPrivateKey,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Keygen => "keygen",
            Self::Sign => "sign",
            Self::Verify => "verify",
            Self::ValidateKeypair => "validate_keypair",
            Self::ClearPrivateKey => "clear_private_key",
        }
    }

    /// C symbol for `set`: `faest_128f_keygen`.
    pub fn symbol(self, set: ParameterSet) -> String {
        format!("{}_{}", set.symbol_prefix(), self.suffix())
    }

    /// The C declaration of this entry point for `set`.
    pub fn signature(self, set: ParameterSet) -> CSignature {
        let bytes = || CType::pointer_to(CType::UInt8);
        let const_bytes = || CType::pointer_to(CType::const_of(CType::UInt8));

        let (return_type, params) = match self {
            Self::Keygen => (
                CType::Int,
                vec![CParam::new(bytes(), "pk"), CParam::new(bytes(), "sk")],
            ),
            Self::Sign => (
                CType::Int,
                vec![
                    CParam::new(const_bytes(), "sk"),
                    CParam::new(const_bytes(), "message"),
                    CParam::new(CType::SizeT, "message_len"),
                    CParam::new(bytes(), "signature"),
                    CParam::new(CType::pointer_to(CType::SizeT), "signature_len"),
                ],
            ),
            Self::Verify => (
                CType::Int,
                vec![
                    CParam::new(const_bytes(), "pk"),
                    CParam::new(const_bytes(), "message"),
                    CParam::new(CType::SizeT, "message_len"),
                    CParam::new(const_bytes(), "signature"),
                    CParam::new(CType::SizeT, "signature_len"),
                ],
            ),
            Self::ValidateKeypair => (
                CType::Int,
                vec![
                    CParam::new(const_bytes(), "pk"),
                    CParam::new(const_bytes(), "sk"),
                ],
            ),
            Self::ClearPrivateKey => (CType::Void, vec![CParam::new(bytes(), "key")]),
        };
        CSignature::new(return_type, self.symbol(set), params)
    }
}

/// Which size a constant describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeKind {
    PublicKey,
    PrivateKey,
    Signature,
}

impl SizeKind {
    pub const ALL: [SizeKind; 3] = [SizeKind::PublicKey, SizeKind::PrivateKey, SizeKind::Signature];

    fn suffix(self) -> &'static str {
        match self {
            Self::PublicKey => "PUBLIC_KEY_SIZE",
            Self::PrivateKey => "PRIVATE_KEY_SIZE",
            Self::Signature => "SIGNATURE_SIZE",
        }
    }
}

/// A named integer constant (`#define FAEST_128F_SIGNATURE_SIZE 5924`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constant {
    pub name: String,
    pub value: usize,
    pub parameter_set: ParameterSet,
    pub kind: SizeKind,
}

impl Constant {
    fn new(set: ParameterSet, kind: SizeKind) -> Self {
        let sizes = set.sizes();
        let value = match kind {
            SizeKind::PublicKey => sizes.public_key,
            SizeKind::PrivateKey => sizes.private_key,
            SizeKind::Signature => sizes.signature,
        };
        Constant {
            name: format!("{}_{}", set.constant_prefix(), kind.suffix()),
            value,
            parameter_set: set,
            kind,
        }
    }
}

/// Constants and function declarations bindings are generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationTable {
    constants: Vec<Constant>,
    functions: Vec<CSignature>,
}

impl DeclarationTable {
    /// The full `libfaest` interface.
    pub fn standard() -> Self {
        Self::for_sets(&ParameterSet::ALL)
    }

    /// The interface restricted to `sets`, in the given order.
    pub fn for_sets(sets: &[ParameterSet]) -> Self {
        let constants = sets
            .iter()
            .flat_map(|&set| SizeKind::ALL.map(|kind| Constant::new(set, kind)))
            .collect();
        let functions = sets
            .iter()
            .flat_map(|&set| EntryPoint::ALL.map(|ep| ep.signature(set)))
            .collect();
        DeclarationTable {
            constants,
            functions,
        }
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn functions(&self) -> &[CSignature] {
        &self.functions
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&CSignature> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Parameter sets present in the table, in order.
    pub fn parameter_sets(&self) -> Vec<ParameterSet> {
        let mut sets: Vec<ParameterSet> = Vec::new();
        for c in &self.constants {
            if !sets.contains(&c.parameter_set) {
                sets.push(c.parameter_set);
            }
        }
        sets
    }

    /// `#include` lines for every parameter-set header.
    pub fn includes(&self) -> String {
        self.parameter_sets()
            .iter()
            .map(|set| format!("#include \"{}\"\n", set.header()))
            .collect()
    }

    /// C declaration text: a block per parameter set with its `#define`s
    /// followed by its prototypes.
    pub fn cdef(&self) -> String {
        let mut out = String::new();
        for set in self.parameter_sets() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("/* {set} */\n"));
            for c in self.constants.iter().filter(|c| c.parameter_set == set) {
                out.push_str(&format!("#define {} {}\n", c.name, c.value));
            }
            out.push('\n');
            let prefix = format!("{}_", set.symbol_prefix());
            for f in self.functions.iter().filter(|f| f.name.starts_with(&prefix)) {
                out.push_str(&format!("{f};\n"));
            }
        }
        out
    }
}
