use crate::meeting::schedule::{self, ScheduleError};
use crate::meeting::store::{MeetingStore, MeetingStoreError};
use crate::meeting::{
    Direction, InvalidDirection, InvalidEnumValue, InvalidSortAttribute, Meeting, MeetingType,
    PriorityType, SortAttribute,
};
use chrono::{DateTime, Utc};

/// Error type for MeetingService operations.
#[derive(Debug, thiserror::Error)]
pub enum MeetingServiceError {
    #[error("Meeting entry with ID {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    InvalidEnumValue(#[from] InvalidEnumValue),
    #[error("Date '{0}' does not match the expected ISO-8601 format")]
    DateParse(String),
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error(transparent)]
    InvalidDirection(#[from] InvalidDirection),
    #[error(transparent)]
    InvalidSortAttribute(#[from] InvalidSortAttribute),
    #[error("A meeting is already scheduled at {0}")]
    DuplicateDate(DateTime<Utc>),
    #[error("Database error: {0}")]
    Database(#[source] sea_orm::DbErr),
}

impl From<ScheduleError> for MeetingServiceError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::DateParse(text) => MeetingServiceError::DateParse(text),
            ScheduleError::UnknownTimezone(name) => MeetingServiceError::UnknownTimezone(name),
        }
    }
}

impl From<MeetingStoreError> for MeetingServiceError {
    fn from(err: MeetingStoreError) -> Self {
        match err {
            MeetingStoreError::DuplicateDate(date) => MeetingServiceError::DuplicateDate(date),
            MeetingStoreError::NotFound(id) => MeetingServiceError::NotFound(id),
            MeetingStoreError::Database(err) => MeetingServiceError::Database(err),
        }
    }
}

/// Result of an update: either the existing meeting was overwritten, or the requested ID was
/// absent and a fresh meeting was inserted in its place.
#[derive(Debug, PartialEq, Clone)]
pub enum UpdateOutcome {
    Updated(Meeting),
    Created(Meeting),
}

impl UpdateOutcome {
    pub fn meeting(&self) -> &Meeting {
        match self {
            UpdateOutcome::Updated(meeting) | UpdateOutcome::Created(meeting) => meeting,
        }
    }

    pub fn into_meeting(self) -> Meeting {
        match self {
            UpdateOutcome::Updated(meeting) | UpdateOutcome::Created(meeting) => meeting,
        }
    }
}

pub struct MeetingService<'a, S: MeetingStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MeetingStore + ?Sized> MeetingService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        MeetingService { store }
    }

    /// Creates a new meeting.
    ///
    /// # Arguments
    ///
    /// * `meeting_type` - The kind of meeting.
    /// * `priority_type` - The priority of the meeting.
    /// * `date_text` - Local date-time (`2018-02-03T12:30:30`), or a plain date when no
    ///   timezone is given.
    /// * `timezone` - Optional IANA zone the local date-time is expressed in.
    ///
    /// # Returns
    ///
    /// A `Result` containing the saved `Meeting` with its assigned ID, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        meeting_type: MeetingType,
        priority_type: PriorityType,
        date_text: &str,
        timezone: Option<&str>,
    ) -> Result<Meeting, MeetingServiceError> {
        let meeting_date = schedule::normalize_meeting_date(date_text, timezone)?;
        let created = self
            .store
            .save(Meeting::new(meeting_type, priority_type, meeting_date))
            .await?;
        tracing::info!("Created meeting {:?}", created);
        Ok(created)
    }

    /// Overwrites the meeting with the given ID, or inserts a new meeting when the ID is
    /// unknown. The inserted meeting gets whatever ID the store assigns.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the meeting to update.
    /// * `meeting_type` - The new kind of meeting.
    /// * `priority_type` - The new priority.
    /// * `date_text` - The new date, same format rules as [`MeetingService::create`].
    /// * `timezone` - Optional IANA zone for `date_text`.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: i64,
        meeting_type: MeetingType,
        priority_type: PriorityType,
        date_text: &str,
        timezone: Option<&str>,
    ) -> Result<UpdateOutcome, MeetingServiceError> {
        let meeting_date = schedule::normalize_meeting_date(date_text, timezone)?;

        match self.store.find_by_id(id).await? {
            Some(mut existing) => {
                existing.reschedule(meeting_type, priority_type, meeting_date);
                let updated = self.store.save(existing).await?;
                tracing::info!("Updated meeting {:?}", updated);
                Ok(UpdateOutcome::Updated(updated))
            }
            None => {
                let created = self
                    .store
                    .save(Meeting::new(meeting_type, priority_type, meeting_date))
                    .await?;
                tracing::warn!(
                    requested_id = id,
                    assigned_id = ?created.id(),
                    "Meeting with ID {} was absent, created a new one",
                    id
                );
                Ok(UpdateOutcome::Created(created))
            }
        }
    }

    /// Deletes a meeting by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), MeetingServiceError> {
        self.store.delete_by_id(id).await?;
        tracing::info!("Deleted meeting with ID {}", id);
        Ok(())
    }

    /// Retrieves a meeting by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Meeting, MeetingServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(MeetingServiceError::NotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Meeting>, MeetingServiceError> {
        Ok(self.store.find_all().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn sort_by(
        &self,
        attribute: SortAttribute,
        direction: Direction,
    ) -> Result<Vec<Meeting>, MeetingServiceError> {
        Ok(self.store.find_all_sorted(attribute, direction).await?)
    }

    /// Meetings strictly after `start` and strictly before `end`, in store order.
    ///
    /// Scans every stored meeting.
    #[tracing::instrument(skip(self))]
    pub async fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Meeting>, MeetingServiceError> {
        let meetings = self.store.find_all().await?;
        Ok(retain_between(meetings, start, end))
    }
}

fn retain_between(
    meetings: Vec<Meeting>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Meeting> {
    meetings
        .into_iter()
        .filter(|meeting| meeting.meeting_date() > start && meeting.meeting_date() < end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::schedule::normalize_meeting_date;
    use crate::meeting::store::MockMeetingStore;
    use mockall::predicate::eq;

    fn zoned(date_text: &str, timezone: &str) -> DateTime<Utc> {
        normalize_meeting_date(date_text, Some(timezone)).unwrap()
    }

    fn paris() -> Meeting {
        Meeting::new(
            MeetingType::Demo,
            PriorityType::High,
            zoned("2017-01-03T12:30:30", "Europe/Paris"),
        )
        .with_id(1)
    }

    fn sao_paulo() -> Meeting {
        Meeting::new(
            MeetingType::StandUp,
            PriorityType::Low,
            zoned("2019-03-03T12:30:30", "America/Sao_Paulo"),
        )
        .with_id(2)
    }

    fn berlin() -> Meeting {
        Meeting::new(
            MeetingType::Grooming,
            PriorityType::Medium,
            zoned("2018-02-03T12:30:30", "Europe/Berlin"),
        )
        .with_id(3)
    }

    fn tokyo() -> Meeting {
        Meeting::new(
            MeetingType::Demo,
            PriorityType::High,
            zoned("2018-11-03T09:30:30", "Asia/Tokyo"),
        )
        .with_id(4)
    }

    fn los_angeles() -> Meeting {
        Meeting::new(
            MeetingType::Grooming,
            PriorityType::Medium,
            zoned("2019-11-11T19:30:30", "America/Los_Angeles"),
        )
        .with_id(5)
    }

    fn all_meetings() -> Vec<Meeting> {
        vec![los_angeles(), sao_paulo(), berlin(), tokyo(), paris()]
    }

    #[tokio::test]
    async fn can_create_meeting_with_normalized_date() {
        let mut store = MockMeetingStore::new();
        store
            .expect_save()
            .withf(|meeting| {
                meeting.id().is_none()
                    && meeting.meeting_date() == zoned("2018-02-03T12:30:30", "Europe/Berlin")
            })
            .times(1)
            .returning(|meeting| Ok(meeting.with_id(7)));
        let service = MeetingService::new(&store);

        let created = service
            .create(
                MeetingType::Grooming,
                PriorityType::Medium,
                "2018-02-03T12:30:30",
                Some("Europe/Berlin"),
            )
            .await
            .expect("Failed to create meeting");

        assert_eq!(created, berlin().with_id(7));
    }

    #[tokio::test]
    async fn does_not_touch_store_when_date_is_invalid() {
        let store = MockMeetingStore::new();
        let service = MeetingService::new(&store);

        let result = service
            .create(
                MeetingType::Demo,
                PriorityType::Low,
                "not-a-date",
                Some("Europe/Paris"),
            )
            .await;
        assert!(matches!(
            result,
            Err(MeetingServiceError::DateParse(text)) if text == "not-a-date"
        ));

        let result = service
            .create(
                MeetingType::Demo,
                PriorityType::Low,
                "2018-02-03T12:30:30",
                Some("Europe/Atlantis"),
            )
            .await;
        assert!(matches!(result, Err(MeetingServiceError::UnknownTimezone(_))));
    }

    #[tokio::test]
    async fn can_update_existing_meeting_in_place() {
        let mut store = MockMeetingStore::new();
        store
            .expect_find_by_id()
            .with(eq(3))
            .returning(|_| Ok(Some(berlin())));
        store
            .expect_save()
            .withf(|meeting| meeting.id() == Some(3))
            .times(1)
            .returning(Ok);
        let service = MeetingService::new(&store);

        let outcome = service
            .update(
                3,
                MeetingType::Demo,
                PriorityType::High,
                "2018-11-03T09:30:30",
                Some("Asia/Tokyo"),
            )
            .await
            .expect("Failed to update meeting");

        assert_eq!(outcome, UpdateOutcome::Updated(tokyo().with_id(3)));
    }

    #[tokio::test]
    async fn creates_new_meeting_when_updating_missing_id() {
        let mut store = MockMeetingStore::new();
        store
            .expect_find_by_id()
            .with(eq(42))
            .returning(|_| Ok(None));
        store
            .expect_save()
            .withf(|meeting| meeting.id().is_none())
            .times(1)
            .returning(|meeting| Ok(meeting.with_id(8)));
        let service = MeetingService::new(&store);

        let outcome = service
            .update(
                42,
                MeetingType::StandUp,
                PriorityType::Low,
                "2019-03-03T12:30:30",
                Some("America/Sao_Paulo"),
            )
            .await
            .expect("Failed to upsert meeting");

        assert_eq!(outcome, UpdateOutcome::Created(sao_paulo().with_id(8)));
        assert_eq!(outcome.meeting().id(), Some(8));
    }

    #[tokio::test]
    async fn can_handle_find_when_meeting_not_found() {
        let mut store = MockMeetingStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));
        let service = MeetingService::new(&store);

        let result = service.find_by_id(99).await;

        assert!(matches!(result, Err(MeetingServiceError::NotFound(99))));
    }

    #[tokio::test]
    async fn can_handle_delete_when_meeting_not_found() {
        let mut store = MockMeetingStore::new();
        store
            .expect_delete_by_id()
            .with(eq(99))
            .returning(|id| Err(MeetingStoreError::NotFound(id)));
        let service = MeetingService::new(&store);

        let result = service.delete(99).await;

        assert!(matches!(result, Err(MeetingServiceError::NotFound(99))));
    }

    #[tokio::test]
    async fn surfaces_duplicate_dates_from_store() {
        let mut store = MockMeetingStore::new();
        store
            .expect_save()
            .returning(|meeting| Err(MeetingStoreError::DuplicateDate(meeting.meeting_date())));
        let service = MeetingService::new(&store);

        let result = service
            .create(MeetingType::Demo, PriorityType::High, "2018-05-07", None)
            .await;

        assert!(matches!(result, Err(MeetingServiceError::DuplicateDate(_))));
    }

    #[tokio::test]
    async fn can_find_meetings_strictly_between_two_instants() {
        let mut store = MockMeetingStore::new();
        store.expect_find_all().returning(|| Ok(all_meetings()));
        let service = MeetingService::new(&store);

        let between = service
            .find_between(paris().meeting_date(), los_angeles().meeting_date())
            .await
            .expect("Failed to find meetings between dates");

        assert_eq!(between, vec![sao_paulo(), berlin(), tokyo()]);
    }

    #[test]
    fn excludes_meetings_on_either_bound() {
        let start = berlin().meeting_date();
        let end = tokyo().meeting_date();

        assert!(retain_between(all_meetings(), start, end).is_empty());
        assert_eq!(
            retain_between(all_meetings(), start - chrono::Duration::seconds(1), end),
            vec![berlin()]
        );
        assert!(retain_between(all_meetings(), end, start).is_empty());
    }

    #[tokio::test]
    async fn delegates_sorting_to_store() {
        let mut store = MockMeetingStore::new();
        store
            .expect_find_all_sorted()
            .with(eq(SortAttribute::MeetingDate), eq(Direction::Descending))
            .times(1)
            .returning(|_, _| Ok(vec![los_angeles(), sao_paulo()]));
        let service = MeetingService::new(&store);

        let sorted = service
            .sort_by(SortAttribute::MeetingDate, Direction::Descending)
            .await
            .expect("Failed to sort meetings");

        assert_eq!(sorted, vec![los_angeles(), sao_paulo()]);
    }
}
