//! Core abstractions shared by the drivers and the engine.
//!
//! - [`schema`]: column descriptors and in-memory table contents
//! - [`value`]: SQL value representation
//! - [`traits`]: source, destination and introspection traits
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{ColumnDescriptor, TableData};
pub use traits::{Dialect, Introspect, SourceReader, TargetWriter};
pub use value::{row_preview, Row, SqlNullType, SqlValue};
