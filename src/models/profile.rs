//! Community profile model for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Community role, in ascending order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Staff,
    Admin,
}

impl Role {
    /// Whether this role grants access to a route requiring `required`.
    ///
    /// Admin is treated as a superset of every other role.
    pub fn satisfies(&self, required: Role) -> bool {
        *self == required || *self == Role::Admin
    }
}

/// Per-user notification preferences (stored as a nested object).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NotificationFlags {
    #[serde(default)]
    pub announcements: bool,
    #[serde(default)]
    pub ticket_replies: bool,
}

/// Community-side user record stored in the `profiles` table.
///
/// A row exists only after the first successful sign-in has been
/// persisted; a live identity without a row is a valid transient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    /// Row ID, equal to the auth provider's user ID (1:1)
    pub id: String,
    #[validate(length(min = 2, max = 32))]
    pub username: String,
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
    /// Avatar URL (usually the federated provider's CDN)
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub banned: bool,
    /// Last consented latitude, if any
    pub latitude: Option<f64>,
    /// Last consented longitude, if any
    pub longitude: Option<f64>,
    #[serde(default)]
    pub notifications: NotificationFlags,
    #[serde(default)]
    pub can_edit_profile: bool,
    /// When the profile row was first created (RFC 3339)
    pub created_at: String,
}

impl Profile {
    /// Whether both coordinates are present.
    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// A latitude/longitude pair with range validation.
///
/// Values exactly at the poles/antimeridian are accepted; anything outside
/// is rejected before it ever reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coordinates {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Range check as a plain bool for call sites that do not need the
    /// field-level validation report.
    pub fn in_range(&self) -> bool {
        self.validate().is_ok()
    }
}
