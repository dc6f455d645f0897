//! Table storage layer (hosted Postgres REST API).

pub mod postgrest;

pub use postgrest::RestProfileStore;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Coordinates, Profile};

/// Table names as constants.
pub mod tables {
    pub const PROFILES: &str = "profiles";
}

/// Typed operations on the `profiles` table.
///
/// Writes are last-write-wins; the row is only ever mutated by the
/// signed-in user and the admin console, so there is no optimistic
/// concurrency control.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile row by its ID (== auth provider user ID).
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError>;

    /// Create or update a profile row.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError>;

    /// Persist consented coordinates.
    async fn set_location(&self, id: &str, coords: Coordinates) -> Result<(), AppError>;

    /// Persist an explicit null for both coordinates (not "leave
    /// unchanged" - a denial is recorded as a value).
    async fn clear_location(&self, id: &str) -> Result<(), AppError>;
}
