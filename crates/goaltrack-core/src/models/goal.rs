use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Completion state of a goal. Sent over the wire as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalStatus {
    #[default]
    Pending,
    Done,
}

impl GoalStatus {
    pub fn as_int(self) -> u8 {
        match self {
            GoalStatus::Pending => 0,
            GoalStatus::Done => 1,
        }
    }

    pub fn display(self) -> &'static str {
        match self {
            GoalStatus::Pending => "Pending",
            GoalStatus::Done => "Done",
        }
    }
}

impl Serialize for GoalStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_int())
    }
}

impl<'de> Deserialize<'de> for GoalStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if super::deserialize_int_bool(deserializer)? {
            Ok(GoalStatus::Done)
        } else {
            Ok(GoalStatus::Pending)
        }
    }
}

/// A goal assigned to a user for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Goal {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub category: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub status: GoalStatus,
    pub user_id: String,
}

impl Goal {
    pub fn is_done(&self) -> bool {
        self.status == GoalStatus::Done
    }
}

/// A task belonging to a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hint: String,
    pub goal_id: String,
}
