//! Persistence seam used by the scheduling and attendance services.
//!
//! Everything the services know about storage goes through [`Store`], so the
//! conflict and idempotence rules can be exercised against
//! [`memory::MemoryStore`] without a database.

#[cfg(test)]
pub mod memory;
pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::database::models::{
    Attendance, AttendanceStatus, Group, NewSession, Room, Session, Student,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<Room>>;
    async fn find_room(&self, room_id: i64) -> Result<Option<Room>>;
    async fn insert_room(&self, name: &str, capacity: i64) -> Result<Room>;

    async fn find_student(&self, student_id: i64) -> Result<Option<Student>>;
    async fn insert_student(&self, name: &str, surname: &str) -> Result<Student>;

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>>;
    async fn find_groups_by_teacher(&self, teacher_id: i64) -> Result<Vec<Group>>;
    /// Ids of the students enrolled in the group, ascending.
    async fn find_group_membership(&self, group_id: i64) -> Result<Vec<i64>>;
    async fn insert_group(&self, name: &str, teacher_id: i64, student_ids: &[i64])
    -> Result<Group>;

    async fn find_session(&self, session_id: i64) -> Result<Option<Session>>;
    async fn find_sessions_by_room_and_date(
        &self,
        room_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Session>>;
    async fn find_sessions_by_date(&self, date: NaiveDate) -> Result<Vec<Session>>;
    async fn find_sessions_by_teacher(&self, teacher_id: i64) -> Result<Vec<Session>>;
    async fn find_sessions_by_group(&self, group_id: i64) -> Result<Vec<Session>>;
    async fn insert_session(&self, session: &NewSession) -> Result<Session>;

    async fn find_attendance(&self, student_id: i64, session_id: i64)
    -> Result<Option<Attendance>>;
    async fn find_attendances_by_student(&self, student_id: i64) -> Result<Vec<Attendance>>;
    async fn find_attendances_by_session(&self, session_id: i64) -> Result<Vec<Attendance>>;
    /// Creates the (student, session) row or overwrites its status.
    async fn upsert_attendance(
        &self,
        student_id: i64,
        session_id: i64,
        status: AttendanceStatus,
    ) -> Result<Attendance>;
    /// Creates the row only if none exists; `true` when a row was written.
    async fn insert_attendance_if_absent(
        &self,
        student_id: i64,
        session_id: i64,
        status: AttendanceStatus,
    ) -> Result<bool>;
    /// Batch form of [`Store::insert_attendance_if_absent`] for one session.
    /// All-or-nothing; returns the number of rows written.
    async fn insert_attendances_if_absent(
        &self,
        session_id: i64,
        entries: &[(i64, AttendanceStatus)],
    ) -> Result<usize>;
}
