use sqlx::{Postgres, Transaction, migrate::Migrator};

pub mod chapter;
pub mod comment;
pub mod error;
pub mod genre;
pub mod manga;
pub mod rating;
pub mod reader_manga;
pub mod report;
pub mod user;

/// Unit-of-work handle threaded through every catalog mutation.
pub type PostgresTransaction = Transaction<'static, Postgres>;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
