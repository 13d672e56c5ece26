//! PostgreSQL target driver.
//!
//! - [`PostgresWriter`]: the destination session
//! - `encode`: binary parameter encoding of `SqlValue` for the destination column type

mod encode;
mod writer;

pub use writer::{PostgresWriter, MAX_BIND_PARAMS};
