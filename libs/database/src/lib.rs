//! PostgreSQL plumbing shared by the service binaries: pool configuration,
//! connecting with retry, readiness checks and running migrations.
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use core_config::FromEnv;
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "products_api").await?;
//! ```

pub mod error;
pub mod postgres;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryConfig, retry_with_backoff};
