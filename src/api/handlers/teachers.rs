use crate::api::AppState;
use crate::api::response::{Payload, ok};
use crate::services::stats::{
    AttendanceSummary, SessionAttendanceStats, StudentAttendanceStats, TeacherGroup,
    TeacherSession,
};
use axum::extract::{Path, State};

pub async fn groups(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> Payload<Vec<TeacherGroup>> {
    ok("Groups retrieved", state.reports.groups(teacher_id).await?)
}

pub async fn sessions(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> Payload<Vec<TeacherSession>> {
    ok("Sessions retrieved", state.reports.sessions(teacher_id).await?)
}

pub async fn attendance_stats(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> Payload<AttendanceSummary> {
    ok(
        "Attendance stats retrieved",
        state.reports.summary(teacher_id).await?,
    )
}

pub async fn student_stats(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> Payload<Vec<StudentAttendanceStats>> {
    ok(
        "Student attendance stats retrieved",
        state.reports.per_student(teacher_id).await?,
    )
}

pub async fn session_stats(
    State(state): State<AppState>,
    Path(teacher_id): Path<i64>,
) -> Payload<Vec<SessionAttendanceStats>> {
    ok(
        "Session attendance stats retrieved",
        state.reports.per_session(teacher_id).await?,
    )
}
