//! Data models for goaltrack entities.
//!
//! This module contains the payloads exchanged with the backend:
//!
//! - `User`: identity of an account (never carries the password)
//! - `Goal`, `Task`: daily goals and the tasks attached to them
//! - `Progress`: per-category completion counts
//! - Request bodies: `Registration`, `ProfileUpdate`, `Assignment`, `LogEntry`

pub mod goal;
pub mod progress;
pub mod user;

pub use goal::{Goal, GoalStatus, Task};
pub use progress::{CategoryProgress, Progress};
pub use user::{Assignment, LogEntry, ProfileUpdate, Registration, User};

// Helper to deserialize 0/1 integers (SQLite booleans) or actual bools
pub(crate) fn deserialize_int_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct BoolVisitor;

    impl<'de> de::Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a boolean or an integer 0/1")
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v != 0)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v != 0)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(BoolVisitor)
}
