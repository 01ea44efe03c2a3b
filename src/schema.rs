//! Schema model: ordered field declarations plus a two-part format version.
//!
//! Field order is load-bearing: the row layout on disk follows insertion
//! order exactly.  Schemas are append-only; there is no removal or
//! reordering.  The schema is never written into an Effi file; callers that
//! need to ship it alongside the data use the JSON sidecar helpers.
//!
//! ```
//! use effi::schema::{Schema, DataKind, Detection, Correction};
//! use effi::bits::bits_for_max_decimal;
//!
//! let schema = Schema::new()
//!     .add_field("Id", bits_for_max_decimal(1_000_000), DataKind::Decimal,
//!                Detection::None, Correction::None)?
//!     .add_text("Code", 4)?;
//! assert_eq!(schema.len(), 2);
//! # Ok::<(), effi::EffiError>(())
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{EffiError, Result};

pub const DEFAULT_MAJOR_VERSION: u32 = 1;
pub const DEFAULT_MINOR_VERSION: u32 = 0;

// ── Field attributes ──────────────────────────────────────────────────────────

/// How a field's declared width is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Declared width is a bit count.
    Decimal,
    /// Declared width is a character count; 7 bits per character.
    Text,
}

/// Bit-error detection policy.  Only `None` is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Detection {
    #[default]
    None,
    Parity,
    Crc,
}

/// Bit-error correction policy.  Only `None` is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Correction {
    #[default]
    None,
    Hamming,
    ReedSolomon,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::None   => write!(f, "no detection"),
            Detection::Parity => write!(f, "parity detection"),
            Detection::Crc    => write!(f, "CRC detection"),
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correction::None        => write!(f, "no correction"),
            Correction::Hamming     => write!(f, "Hamming correction"),
            Correction::ReedSolomon => write!(f, "Reed-Solomon correction"),
        }
    }
}

// ── FieldSpec ─────────────────────────────────────────────────────────────────

/// One column's declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name:           String,
    pub declared_width: u32,
    pub kind:           DataKind,
    #[serde(default)]
    pub detection:      Detection,
    #[serde(default)]
    pub correction:     Correction,
}

impl FieldSpec {
    fn validate(&self) -> Result<()> {
        if self.declared_width == 0 {
            return Err(EffiError::InvalidField {
                name:   self.name.clone(),
                reason: "declared width must be positive".into(),
            });
        }
        Ok(())
    }
}

// ── FormatVersion ─────────────────────────────────────────────────────────────

/// `major` is the official parser version, `minor` the derivative version
/// used by custom parser implementations.  They evolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self { major: DEFAULT_MAJOR_VERSION, minor: DEFAULT_MINOR_VERSION }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Schema {
    pub format_version: FormatVersion,
    fields:             Vec<FieldSpec>,
}

// Deserialization goes through the raw form so sidecar files get the same
// width validation as the builder.
#[derive(Deserialize)]
struct SchemaRaw {
    #[serde(default)]
    format_version: FormatVersion,
    fields:         Vec<FieldSpec>,
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = SchemaRaw::deserialize(deserializer)?;
        for field in &raw.fields {
            field.validate().map_err(serde::de::Error::custom)?;
        }
        Ok(Schema { format_version: raw.format_version, fields: raw.fields })
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(major: u32, minor: u32) -> Self {
        Self { format_version: FormatVersion { major, minor }, fields: Vec::new() }
    }

    /// Append a field and return the schema for chaining.
    ///
    /// Fails with [`EffiError::InvalidField`] if `declared_width` is zero.
    pub fn add_field(
        mut self,
        name:           impl Into<String>,
        declared_width: u32,
        kind:           DataKind,
        detection:      Detection,
        correction:     Correction,
    ) -> Result<Self> {
        let field = FieldSpec {
            name: name.into(),
            declared_width,
            kind,
            detection,
            correction,
        };
        field.validate()?;
        self.fields.push(field);
        Ok(self)
    }

    /// Append a plain decimal field occupying `bits` bits.
    pub fn add_decimal(self, name: impl Into<String>, bits: u32) -> Result<Self> {
        self.add_field(name, bits, DataKind::Decimal, Detection::None, Correction::None)
    }

    /// Append a plain text field holding up to `chars` 7-bit characters.
    pub fn add_text(self, name: impl Into<String>, chars: u32) -> Result<Self> {
        self.add_field(name, chars, DataKind::Text, Detection::None, Correction::None)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // ── JSON sidecar ──────────────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
