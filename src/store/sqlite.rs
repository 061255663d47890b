use super::Store;
use crate::database::models::{
    Attendance, AttendanceStatus, Group, NewSession, Room, Session, Student,
};
use crate::database::queries;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_rooms(&self) -> Result<Vec<Room>> {
        queries::list_rooms(&self.pool).await
    }

    async fn find_room(&self, room_id: i64) -> Result<Option<Room>> {
        queries::get_room_by_id(&self.pool, room_id).await
    }

    async fn insert_room(&self, name: &str, capacity: i64) -> Result<Room> {
        queries::create_room(&self.pool, name, capacity).await
    }

    async fn find_student(&self, student_id: i64) -> Result<Option<Student>> {
        queries::get_student_by_id(&self.pool, student_id).await
    }

    async fn insert_student(&self, name: &str, surname: &str) -> Result<Student> {
        queries::create_student(&self.pool, name, surname).await
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        queries::get_group_by_id(&self.pool, group_id).await
    }

    async fn find_groups_by_teacher(&self, teacher_id: i64) -> Result<Vec<Group>> {
        queries::get_groups_by_teacher(&self.pool, teacher_id).await
    }

    async fn find_group_membership(&self, group_id: i64) -> Result<Vec<i64>> {
        queries::get_group_member_ids(&self.pool, group_id).await
    }

    async fn insert_group(
        &self,
        name: &str,
        teacher_id: i64,
        student_ids: &[i64],
    ) -> Result<Group> {
        queries::create_group(&self.pool, name, teacher_id, student_ids).await
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<Session>> {
        queries::get_session_by_id(&self.pool, session_id).await
    }

    async fn find_sessions_by_room_and_date(
        &self,
        room_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Session>> {
        queries::get_sessions_by_room_and_date(&self.pool, room_id, date).await
    }

    async fn find_sessions_by_date(&self, date: NaiveDate) -> Result<Vec<Session>> {
        queries::get_sessions_by_date(&self.pool, date).await
    }

    async fn find_sessions_by_teacher(&self, teacher_id: i64) -> Result<Vec<Session>> {
        queries::get_sessions_by_teacher(&self.pool, teacher_id).await
    }

    async fn find_sessions_by_group(&self, group_id: i64) -> Result<Vec<Session>> {
        queries::get_sessions_by_group(&self.pool, group_id).await
    }

    async fn insert_session(&self, session: &NewSession) -> Result<Session> {
        queries::create_session(&self.pool, session).await
    }

    async fn find_attendance(
        &self,
        student_id: i64,
        session_id: i64,
    ) -> Result<Option<Attendance>> {
        queries::get_attendance(&self.pool, student_id, session_id).await
    }

    async fn find_attendances_by_student(&self, student_id: i64) -> Result<Vec<Attendance>> {
        queries::get_attendances_by_student(&self.pool, student_id).await
    }

    async fn find_attendances_by_session(&self, session_id: i64) -> Result<Vec<Attendance>> {
        queries::get_attendances_by_session(&self.pool, session_id).await
    }

    async fn upsert_attendance(
        &self,
        student_id: i64,
        session_id: i64,
        status: AttendanceStatus,
    ) -> Result<Attendance> {
        queries::upsert_attendance(&self.pool, student_id, session_id, status).await
    }

    async fn insert_attendance_if_absent(
        &self,
        student_id: i64,
        session_id: i64,
        status: AttendanceStatus,
    ) -> Result<bool> {
        queries::insert_attendance_if_absent(&self.pool, student_id, session_id, status).await
    }

    async fn insert_attendances_if_absent(
        &self,
        session_id: i64,
        entries: &[(i64, AttendanceStatus)],
    ) -> Result<usize> {
        queries::insert_attendances_if_absent(&self.pool, session_id, entries).await
    }
}
