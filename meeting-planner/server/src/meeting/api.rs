use crate::meeting::schedule;
use crate::meeting::service::{MeetingService, MeetingServiceError, UpdateOutcome};
use crate::meeting::store::MeetingStore;
use crate::meeting::{Direction, Meeting, MeetingType, PriorityType, SortAttribute};
use axum::{
    Json, Router,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

#[derive(Clone)]
pub struct MeetingState {
    pub store: Arc<dyn MeetingStore>,
}

impl MeetingState {
    pub fn new(store: Arc<dyn MeetingStore>) -> Self {
        Self { store }
    }
}

/// JSON representation of a Meeting for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeetingJson {
    /// Identifier assigned by the store
    id: Option<i64>,
    meeting_type: MeetingType,
    priority_type: PriorityType,
    /// Meeting instant normalized to UTC
    meeting_date: DateTime<Utc>,
}

impl From<Meeting> for MeetingJson {
    fn from(meeting: Meeting) -> Self {
        Self {
            id: meeting.id(),
            meeting_type: meeting.meeting_type(),
            priority_type: meeting.priority_type(),
            meeting_date: meeting.meeting_date(),
        }
    }
}

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for MeetingServiceError {
    fn into_response(self) -> Response {
        let (status_code, error) = match &self {
            MeetingServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "MEETING_NOT_FOUND"),
            MeetingServiceError::InvalidEnumValue(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_ENUM_VALUE")
            }
            MeetingServiceError::DateParse(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            MeetingServiceError::UnknownTimezone(_) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_TIMEZONE")
            }
            MeetingServiceError::InvalidDirection(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_DIRECTION")
            }
            MeetingServiceError::InvalidSortAttribute(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_SORT_ATTRIBUTE")
            }
            MeetingServiceError::DuplicateDate(_) => (StatusCode::CONFLICT, "DUPLICATE_DATE"),
            MeetingServiceError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        };

        let message = match &self {
            MeetingServiceError::Database(err) => {
                tracing::error!("Meeting request failed: {}", err);
                "An unexpected error occurred while processing your request. Please try again later."
                    .to_string()
            }
            other => other.to_string(),
        };

        (
            status_code,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Query string extractor that answers malformed or missing parameters with an
/// [`ErrorResponse`] instead of axum's plain-text rejection.
#[derive(Debug)]
pub struct MeetingQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for MeetingQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(params)) => Ok(Self(params)),
            Err(rejection) => {
                tracing::debug!("Rejected query string: {}", rejection.body_text());
                Err((
                    rejection.status(),
                    Json(ErrorResponse {
                        error: "INVALID_QUERY".to_string(),
                        message: rejection.body_text(),
                    }),
                ))
            }
        }
    }
}

/// Query parameters for creating a meeting.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CreateMeetingParams {
    /// Meeting type token, e.g. `GROOMING`
    meeting_type: String,
    /// Priority token, e.g. `HIGH`
    priority_type: String,
    /// Local date-time (`2018-02-03T12:30:30`), or plain date (`2018-05-07`) without timezone
    date: String,
    /// IANA timezone, e.g. `Europe/Paris`
    timezone: Option<String>,
}

/// Query parameters for updating a meeting.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UpdateMeetingParams {
    meeting_id: i64,
    meeting_type: String,
    priority_type: String,
    date: String,
    timezone: Option<String>,
}

/// Query parameter selecting a single meeting.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MeetingIdParams {
    meeting_id: i64,
}

/// Query parameters for the date range search. Both bounds are exclusive.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BetweenParams {
    /// RFC 3339 instant, local date-time or plain date
    start_date: String,
    /// RFC 3339 instant, local date-time or plain date
    end_date: String,
    /// IANA timezone for local bounds, UTC when absent
    timezone: Option<String>,
}

/// Query parameters for sorting.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SortParams {
    /// `id`, `meetingType`, `priorityType` or `meetingDate`
    attribute: String,
    /// `ASC` or `DESC`
    direction: String,
}

fn to_json(meetings: Vec<Meeting>) -> Json<Vec<MeetingJson>> {
    Json(meetings.into_iter().map(MeetingJson::from).collect())
}

/// Handler for POST /meeting/create.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/meeting/create",
    params(CreateMeetingParams),
    responses(
        (status = 201, description = "Meeting created", body = MeetingJson),
        (status = 400, description = "Invalid type, priority, date or timezone", body = ErrorResponse),
        (status = 409, description = "Another meeting is scheduled at the same instant", body = ErrorResponse)
    ),
    tag = "Meetings"
)]
pub async fn create_meeting_handler(
    State(state): State<MeetingState>,
    MeetingQuery(params): MeetingQuery<CreateMeetingParams>,
) -> Result<(StatusCode, Json<MeetingJson>), MeetingServiceError> {
    let meeting_type = MeetingType::from_token(&params.meeting_type)?;
    let priority_type = PriorityType::from_token(&params.priority_type)?;

    let service = MeetingService::new(state.store.as_ref());
    let created = service
        .create(
            meeting_type,
            priority_type,
            &params.date,
            params.timezone.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MeetingJson::from(created))))
}

/// Handler for GET /meeting/read.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/meeting/read",
    params(MeetingIdParams),
    responses(
        (status = 200, description = "Meeting found", body = MeetingJson),
        (status = 404, description = "Meeting does not exist", body = ErrorResponse)
    ),
    tag = "Meetings"
)]
pub async fn read_meeting_handler(
    State(state): State<MeetingState>,
    MeetingQuery(params): MeetingQuery<MeetingIdParams>,
) -> Result<Json<MeetingJson>, MeetingServiceError> {
    let service = MeetingService::new(state.store.as_ref());
    let meeting = service.find_by_id(params.meeting_id).await?;
    Ok(Json(MeetingJson::from(meeting)))
}

/// Handler for GET /meeting/all.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/meeting/all",
    responses((status = 200, description = "Every meeting", body = [MeetingJson])),
    tag = "Meetings"
)]
pub async fn all_meetings_handler(
    State(state): State<MeetingState>,
) -> Result<Json<Vec<MeetingJson>>, MeetingServiceError> {
    let service = MeetingService::new(state.store.as_ref());
    Ok(to_json(service.find_all().await?))
}

/// Handler for PUT /meeting/update. Answers 201 when the ID was absent and a new meeting was
/// created instead.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/meeting/update",
    params(UpdateMeetingParams),
    responses(
        (status = 200, description = "Meeting updated", body = MeetingJson),
        (status = 201, description = "Meeting was absent and has been created", body = MeetingJson),
        (status = 400, description = "Invalid type, priority, date or timezone", body = ErrorResponse),
        (status = 409, description = "Another meeting is scheduled at the same instant", body = ErrorResponse)
    ),
    tag = "Meetings"
)]
pub async fn update_meeting_handler(
    State(state): State<MeetingState>,
    MeetingQuery(params): MeetingQuery<UpdateMeetingParams>,
) -> Result<(StatusCode, Json<MeetingJson>), MeetingServiceError> {
    let meeting_type = MeetingType::from_token(&params.meeting_type)?;
    let priority_type = PriorityType::from_token(&params.priority_type)?;

    let service = MeetingService::new(state.store.as_ref());
    let outcome = service
        .update(
            params.meeting_id,
            meeting_type,
            priority_type,
            &params.date,
            params.timezone.as_deref(),
        )
        .await?;

    let status_code = match outcome {
        UpdateOutcome::Updated(_) => StatusCode::OK,
        UpdateOutcome::Created(_) => StatusCode::CREATED,
    };
    Ok((status_code, Json(MeetingJson::from(outcome.into_meeting()))))
}

/// Handler for DELETE /meeting/delete.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/meeting/delete",
    params(MeetingIdParams),
    responses(
        (status = 200, description = "Meeting deleted", body = String),
        (status = 404, description = "Meeting does not exist", body = ErrorResponse)
    ),
    tag = "Meetings"
)]
pub async fn delete_meeting_handler(
    State(state): State<MeetingState>,
    MeetingQuery(params): MeetingQuery<MeetingIdParams>,
) -> Result<String, MeetingServiceError> {
    let service = MeetingService::new(state.store.as_ref());
    service.delete(params.meeting_id).await?;
    Ok(format!(
        "Meeting with id: {} deleted successfully",
        params.meeting_id
    ))
}

/// Handler for GET /meeting/between.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/meeting/between",
    params(BetweenParams),
    responses(
        (status = 200, description = "Meetings strictly inside the range", body = [MeetingJson]),
        (status = 400, description = "Invalid bound or timezone", body = ErrorResponse)
    ),
    tag = "Meetings"
)]
pub async fn meetings_between_handler(
    State(state): State<MeetingState>,
    MeetingQuery(params): MeetingQuery<BetweenParams>,
) -> Result<Json<Vec<MeetingJson>>, MeetingServiceError> {
    let timezone = params.timezone.as_deref();
    let start = schedule::parse_range_bound(&params.start_date, timezone)?;
    let end = schedule::parse_range_bound(&params.end_date, timezone)?;

    let service = MeetingService::new(state.store.as_ref());
    Ok(to_json(service.find_between(start, end).await?))
}

/// Handler for GET /meeting/types.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/meeting/types",
    responses((status = 200, description = "Every meeting type", body = [MeetingType])),
    tag = "Meetings"
)]
pub async fn meeting_types_handler() -> Json<Vec<MeetingType>> {
    Json(MeetingType::all())
}

/// Handler for GET /meeting/priorities.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/meeting/priorities",
    responses((status = 200, description = "Every priority", body = [PriorityType])),
    tag = "Meetings"
)]
pub async fn priorities_handler() -> Json<Vec<PriorityType>> {
    Json(PriorityType::all())
}

/// Handler for GET /meeting/sort-by.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/meeting/sort-by",
    params(SortParams),
    responses(
        (status = 200, description = "Sorted meetings", body = [MeetingJson]),
        (status = 400, description = "Unknown attribute or direction", body = ErrorResponse)
    ),
    tag = "Meetings"
)]
pub async fn sort_meetings_handler(
    State(state): State<MeetingState>,
    MeetingQuery(params): MeetingQuery<SortParams>,
) -> Result<Json<Vec<MeetingJson>>, MeetingServiceError> {
    let attribute: SortAttribute = params.attribute.parse()?;
    let direction: Direction = params.direction.parse()?;

    let service = MeetingService::new(state.store.as_ref());
    Ok(to_json(service.sort_by(attribute, direction).await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_meeting_handler,
        read_meeting_handler,
        all_meetings_handler,
        update_meeting_handler,
        delete_meeting_handler,
        meetings_between_handler,
        meeting_types_handler,
        priorities_handler,
        sort_meetings_handler
    ),
    components(schemas(MeetingJson, ErrorResponse, MeetingType, PriorityType)),
    tags((name = "Meetings", description = "Meeting scheduling records"))
)]
pub struct MeetingApiDoc;

/// Creates and returns the meeting router with all meeting-related routes.
pub fn create_meeting_router(state: MeetingState) -> Router {
    Router::new()
        .route("/meeting/create", post(create_meeting_handler))
        .route("/meeting/read", get(read_meeting_handler))
        .route("/meeting/all", get(all_meetings_handler))
        .route("/meeting/update", put(update_meeting_handler))
        .route("/meeting/delete", delete(delete_meeting_handler))
        .route("/meeting/between", get(meetings_between_handler))
        .route("/meeting/types", get(meeting_types_handler))
        .route("/meeting/priorities", get(priorities_handler))
        .route("/meeting/sort-by", get(sort_meetings_handler))
        .with_state(state)
}
