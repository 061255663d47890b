use crate::api::AppState;
use crate::api::response::{JsonBody, Payload, created, ok};
use crate::database::models::Room;
use crate::services::scheduling::{AvailabilityQuery, CreateSessionRequest, SessionDetails};
use axum::extract::{Query, State};

pub async fn create_session(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateSessionRequest>,
) -> Payload<SessionDetails> {
    let session = state.scheduler.create_session(body).await?;
    created("Session created", session)
}

pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Payload<Vec<Room>> {
    let rooms = state.scheduler.available_rooms(&query).await?;
    ok("Rooms retrieved", rooms)
}
