use crate::entities::meeting;
use crate::meeting::{Direction, Meeting, SortAttribute};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::*;

/// Error type for MeetingStore operations.
#[derive(Debug, thiserror::Error)]
pub enum MeetingStoreError {
    /// Another meeting already occupies this normalized instant.
    #[error("A meeting is already scheduled at {0}")]
    DuplicateDate(DateTime<Utc>),
    #[error("Meeting entry with ID {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Persistence for meetings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Inserts the meeting when it has no ID yet, otherwise overwrites the stored row.
    async fn save(&self, meeting: Meeting) -> Result<Meeting, MeetingStoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Meeting>, MeetingStoreError>;

    /// Every meeting, in insertion order.
    async fn find_all(&self) -> Result<Vec<Meeting>, MeetingStoreError>;

    /// Fails with `NotFound` when no row was removed.
    async fn delete_by_id(&self, id: i64) -> Result<(), MeetingStoreError>;

    /// Every meeting ordered by `attribute`, ties broken by insertion order.
    async fn find_all_sorted(
        &self,
        attribute: SortAttribute,
        direction: Direction,
    ) -> Result<Vec<Meeting>, MeetingStoreError>;
}

/// PostgreSQL backed store.
#[derive(Clone, Debug)]
pub struct SeaOrmMeetingStore {
    db: DatabaseConnection,
}

impl SeaOrmMeetingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn column_for(attribute: SortAttribute) -> meeting::Column {
    match attribute {
        SortAttribute::Id => meeting::Column::Id,
        SortAttribute::MeetingType => meeting::Column::MeetingType,
        SortAttribute::PriorityType => meeting::Column::PriorityType,
        SortAttribute::MeetingDate => meeting::Column::MeetingDate,
    }
}

fn order_for(direction: Direction) -> Order {
    match direction {
        Direction::Ascending => Order::Asc,
        Direction::Descending => Order::Desc,
    }
}

/// Translates a failed write into the store's error vocabulary.
fn write_error(err: DbErr, meeting: &Meeting) -> MeetingStoreError {
    if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
        return MeetingStoreError::DuplicateDate(meeting.meeting_date());
    }
    match (err, meeting.id()) {
        (DbErr::RecordNotUpdated, Some(id)) => MeetingStoreError::NotFound(id),
        (err, _) => MeetingStoreError::Database(err),
    }
}

#[async_trait]
impl MeetingStore for SeaOrmMeetingStore {
    #[tracing::instrument(skip(self))]
    async fn save(&self, meeting: Meeting) -> Result<Meeting, MeetingStoreError> {
        let mut active_model = meeting::ActiveModel {
            meeting_type: ActiveValue::Set(meeting.meeting_type()),
            priority_type: ActiveValue::Set(meeting.priority_type()),
            meeting_date: ActiveValue::Set(meeting.meeting_date()),
            ..Default::default()
        };
        let saved_model = match meeting.id() {
            Some(id) => {
                active_model.id = ActiveValue::Unchanged(id);
                active_model.update(&self.db).await
            }
            None => active_model.insert(&self.db).await,
        }
        .map_err(|err| write_error(err, &meeting))?;

        Ok(Meeting::from(saved_model))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Meeting>, MeetingStoreError> {
        let model = meeting::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Meeting::from))
    }

    #[tracing::instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Meeting>, MeetingStoreError> {
        let meetings = meeting::Entity::find()
            .order_by_asc(meeting::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Meeting::from)
            .collect();
        Ok(meetings)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: i64) -> Result<(), MeetingStoreError> {
        let result = meeting::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(MeetingStoreError::NotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_all_sorted(
        &self,
        attribute: SortAttribute,
        direction: Direction,
    ) -> Result<Vec<Meeting>, MeetingStoreError> {
        let meetings = meeting::Entity::find()
            .order_by(column_for(attribute), order_for(direction))
            .order_by_asc(meeting::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Meeting::from)
            .collect();
        Ok(meetings)
    }
}
