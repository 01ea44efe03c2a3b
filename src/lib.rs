pub mod error;
pub mod schema;
pub mod bits;
pub mod value;
pub mod resolve;
pub mod bitpack;
pub mod codec;
pub mod text;
pub mod store;
pub mod file;
pub mod tabular;
pub mod compress;
pub mod bench;

pub use error::{EffiError, Result};
pub use schema::{Schema, FieldSpec, FormatVersion, DataKind, Detection, Correction};
pub use bits::{bits_for_max_decimal, bits_for_max_text};
pub use resolve::{resolve, ResolvedWidths};
pub use value::Value;
pub use codec::{encode, decode, Row, RowLayout};
pub use file::{EffiFile, EffiReader, EffiWriter, WriterOptions};
