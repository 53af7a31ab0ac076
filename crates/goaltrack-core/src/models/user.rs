use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Identity of a logged-in account.
///
/// The backend's user record also carries a password hash; it is never
/// deserialized into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default, deserialize_with = "super::deserialize_int_bool")]
    pub is_admin: bool,
}

impl User {
    /// Name shown in headers and listings, falling back to the username.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Registration {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password: String,
}

/// Body of `PATCH /api/users/{id}`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ProfileUpdate {
    pub username: String,
    pub name: String,
    pub password: String,
}

/// Body of `POST /api/users/assign` and `POST /api/users/unassign`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Assignment {
    pub user_id: String,
}

/// Body of `POST /api/log/update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct LogEntry {
    /// ISO-8601 UTC timestamp, e.g. `2021-03-04T08:47:19.000Z`
    pub timestamp: String,
}

impl LogEntry {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            timestamp: time.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }
}
