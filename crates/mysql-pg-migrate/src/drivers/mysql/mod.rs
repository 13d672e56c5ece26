//! MySQL/MariaDB source driver.
//!
//! Provides [`MysqlReader`], the source side of a migration. Supported
//! servers are MySQL 5.7+, 8.0+ and MariaDB 10.2+.

mod reader;

pub use reader::MysqlReader;
