//! Size resolution: declared widths to on-disk bit widths.

use tracing::debug;

use crate::bits::TEXT_CHAR_BITS;
use crate::error::{EffiError, Result};
use crate::schema::{Correction, DataKind, Detection, Schema};

/// Per-field on-disk widths, one per schema field, in schema order.
///
/// Only produced by [`resolve`] or [`ResolvedWidths::from_bits`], so every
/// width is non-zero.  There is no upper bound per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWidths {
    widths: Vec<u32>,
}

impl ResolvedWidths {
    /// Build from raw bit widths, for callers that carry widths without a
    /// [`Schema`].
    pub fn from_bits(widths: Vec<u32>) -> Result<Self> {
        if widths.is_empty() {
            return Err(EffiError::Schema("schema has no fields".into()));
        }
        for (i, &w) in widths.iter().enumerate() {
            check_width(&format!("#{i}"), w)?;
        }
        Ok(Self { widths })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Sum of all field widths, excluding slot padding.
    pub fn sum_bits(&self) -> u64 {
        self.widths.iter().map(|&w| w as u64).sum()
    }
}

fn check_width(name: &str, width: u32) -> Result<()> {
    if width == 0 {
        return Err(EffiError::InvalidField {
            name:   name.to_owned(),
            reason: "resolved width is zero".into(),
        });
    }
    Ok(())
}

/// Resolve every field of `schema` to its on-disk bit width.
///
/// Decimal fields keep their declared width; text fields take 7 bits per
/// character.  Any field requesting detection or correction is refused with
/// [`EffiError::UnsupportedFeature`] rather than silently encoded without it.
pub fn resolve(schema: &Schema) -> Result<ResolvedWidths> {
    if schema.is_empty() {
        return Err(EffiError::Schema("schema has no fields".into()));
    }

    let mut widths = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        if field.detection != Detection::None {
            return Err(EffiError::UnsupportedFeature {
                field:   field.name.clone(),
                feature: field.detection.to_string(),
            });
        }
        if field.correction != Correction::None {
            return Err(EffiError::UnsupportedFeature {
                field:   field.name.clone(),
                feature: field.correction.to_string(),
            });
        }

        let width = match field.kind {
            DataKind::Decimal => field.declared_width,
            DataKind::Text    => field.declared_width.checked_mul(TEXT_CHAR_BITS).ok_or_else(|| {
                EffiError::Schema(format!(
                    "text field '{}' of {} characters is too wide",
                    field.name, field.declared_width
                ))
            })?,
        };
        check_width(&field.name, width)?;
        widths.push(width);
    }

    debug!(fields = widths.len(), ?widths, "resolved schema widths");
    Ok(ResolvedWidths { widths })
}
