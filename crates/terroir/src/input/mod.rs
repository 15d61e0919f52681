//! Survey sheet loading and the in-memory row table.

mod parser;
mod source;
mod table;

pub use parser::{Parser, ParserConfig};
pub use source::SourceMetadata;
pub use table::{is_null_value, MemberId, RowTable, Value};
