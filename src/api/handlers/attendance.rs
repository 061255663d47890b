use crate::api::AppState;
use crate::api::response::{JsonBody, Payload, created, ok};
use crate::services::attendance::{
    AttendanceWithStudent, BulkMarkRequest, CreateAttendanceRequest, QrScanRequest,
    ScannedAttendance,
};
use axum::extract::{Path, State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WriteCount {
    count: usize,
}

pub async fn mark_by_qr(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<QrScanRequest>,
) -> Payload<ScannedAttendance> {
    let attendance = state
        .recorder
        .mark_by_qr(&body.qr_data, body.session_id)
        .await?;
    ok("Attendance marked", attendance)
}

pub async fn mark_bulk(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<BulkMarkRequest>,
) -> Payload<WriteCount> {
    let count = state.recorder.mark_bulk(body).await?;
    ok("Attendance recorded", WriteCount { count })
}

pub async fn create_attendance(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateAttendanceRequest>,
) -> Payload<AttendanceWithStudent> {
    let attendance = state.recorder.create(body).await?;
    created("Attendance created", attendance)
}

pub async fn student_attendance(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Payload<Vec<AttendanceWithStudent>> {
    let rows = state.recorder.history_for_student(student_id).await?;
    ok("Attendance retrieved", rows)
}
