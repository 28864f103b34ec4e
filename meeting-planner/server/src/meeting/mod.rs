use crate::entities::meeting;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveEnum, Iterable};

pub mod api;
pub mod schedule;
pub mod service;
pub mod store;

pub use crate::entities::sea_orm_active_enums::{MeetingType, PriorityType};

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Meeting {
    id: Option<i64>,
    meeting_type: MeetingType,
    priority_type: PriorityType,
    meeting_date: DateTime<Utc>,
}

impl Meeting {
    /// Creates a meeting that has not been saved yet.
    pub fn new(
        meeting_type: MeetingType,
        priority_type: PriorityType,
        meeting_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            meeting_type,
            priority_type,
            meeting_date,
        }
    }

    /// Returns a copy of this meeting carrying the given store-assigned ID.
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Returns the ID of the meeting, `None` until it has been saved.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Returns the meeting type.
    pub fn meeting_type(&self) -> MeetingType {
        self.meeting_type
    }

    /// Returns the priority.
    pub fn priority_type(&self) -> PriorityType {
        self.priority_type
    }

    /// Returns the normalized (UTC) meeting instant.
    pub fn meeting_date(&self) -> DateTime<Utc> {
        self.meeting_date
    }

    /// Overwrites the three mutable fields in place.
    pub(crate) fn reschedule(
        &mut self,
        meeting_type: MeetingType,
        priority_type: PriorityType,
        meeting_date: DateTime<Utc>,
    ) {
        self.meeting_type = meeting_type;
        self.priority_type = priority_type;
        self.meeting_date = meeting_date;
    }
}

impl From<meeting::Model> for Meeting {
    fn from(model: meeting::Model) -> Self {
        Meeting::new(model.meeting_type, model.priority_type, model.meeting_date).with_id(model.id)
    }
}

/// Raised when a token does not name a member of a closed enumeration.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: String,
}

/// Wire token of a meeting type or priority, e.g. `STAND_UP`.
pub fn token_of<E: ActiveEnum<Value = String>>(value: &E) -> String {
    value.to_value()
}

fn parse_token<E: ActiveEnum<Value = String>>(
    kind: &'static str,
    token: &str,
) -> Result<E, InvalidEnumValue> {
    E::try_from_value(&token.to_string()).map_err(|_| InvalidEnumValue {
        kind,
        value: token.to_string(),
    })
}

impl MeetingType {
    /// Parses an exact token such as `GROOMING`.
    pub fn from_token(token: &str) -> Result<Self, InvalidEnumValue> {
        parse_token("meeting type", token)
    }

    /// Every meeting type, in declaration order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }
}

impl PriorityType {
    /// Parses an exact token such as `HIGH`.
    pub fn from_token(token: &str) -> Result<Self, InvalidEnumValue> {
        parse_token("priority type", token)
    }

    /// Every priority, in declaration order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Wrong direction was passed: '{0}'")]
pub struct InvalidDirection(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl std::str::FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Ascending),
            "DESC" => Ok(Direction::Descending),
            _ => Err(InvalidDirection(s.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Meetings cannot be sorted by '{0}'")]
pub struct InvalidSortAttribute(pub String);

/// Orderable meeting fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortAttribute {
    Id,
    MeetingType,
    PriorityType,
    MeetingDate,
}

impl std::str::FromStr for SortAttribute {
    type Err = InvalidSortAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortAttribute::Id),
            "meetingType" | "meeting_type" => Ok(SortAttribute::MeetingType),
            "priorityType" | "priority_type" => Ok(SortAttribute::PriorityType),
            "meetingDate" | "meeting_date" => Ok(SortAttribute::MeetingDate),
            _ => Err(InvalidSortAttribute(s.to_string())),
        }
    }
}
