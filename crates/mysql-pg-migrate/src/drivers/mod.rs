//! Database driver implementations.
//!
//! - [`mysql`]: the MySQL source reader
//! - [`postgres`]: the PostgreSQL target writer and its value encoder
//! - [`common`]: TLS setup

pub mod common;
pub mod mysql;
pub mod postgres;

pub use common::{SslMode, TlsBuilder};
pub use mysql::MysqlReader;
pub use postgres::PostgresWriter;
