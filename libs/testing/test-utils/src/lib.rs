//! Shared test infrastructure for the domain crates.
//!
//! - `TestDatabase`: PostgreSQL container with the workspace migrations applied
//! - `TestDataBuilder`: deterministic identities and names derived from the test name
//! - `assertions`: small assertion helpers
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn creates_user() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("creates_user");
//!     let email = data.email("buyer");
//! }
//! ```

mod postgres;

pub use postgres::TestDatabase;

/// Deterministic test data, so parallel tests sharing a database never collide
/// and reruns produce the same values.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// An identity-provider style subject id.
    pub fn subject(&self, suffix: &str) -> String {
        format!("sub-{:016x}-{}", self.seed, suffix)
    }

    pub fn email(&self, local: &str) -> String {
        format!("{}.{:x}@example.test", local, self.seed)
    }

    pub fn username(&self, base: &str) -> String {
        format!("{}_{:x}", base, self.seed)
    }

    /// e.g. `test-product-1234-lamp`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

pub mod assertions {
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Asserts `result` failed and its message contains `needle`.
    pub fn assert_err_contains<T: std::fmt::Debug, E: std::fmt::Display>(
        result: Result<T, E>,
        needle: &str,
    ) {
        match result {
            Ok(value) => panic!("expected an error containing '{needle}', got Ok({value:?})"),
            Err(e) => assert!(
                e.to_string().contains(needle),
                "expected error containing '{needle}', got '{e}'"
            ),
        }
    }
}
