use crate::api::AppState;
use crate::api::response::{JsonBody, Payload, created, ok};
use crate::database::models::{Room, Student};
use crate::services::registry::{CreateGroupRequest, CreateRoomRequest, CreateStudentRequest};
use crate::services::stats::GroupWithMembers;
use axum::extract::{Path, State};

pub async fn create_room(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateRoomRequest>,
) -> Payload<Room> {
    created("Room created", state.registry.create_room(body).await?)
}

pub async fn create_student(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateStudentRequest>,
) -> Payload<Student> {
    created("Student created", state.registry.create_student(body).await?)
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Payload<Student> {
    ok("Student retrieved", state.registry.student(student_id).await?)
}

pub async fn create_group(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateGroupRequest>,
) -> Payload<GroupWithMembers> {
    created("Group created", state.registry.create_group(body).await?)
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Payload<GroupWithMembers> {
    ok("Group retrieved", state.registry.group(group_id).await?)
}
