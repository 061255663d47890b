use super::Store;
use crate::database::models::{
    Attendance, AttendanceStatus, Group, NewSession, Room, Session, Student,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process store for tests. Each call takes the lock once, so single
/// operations are atomic but sequences of calls are not.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rooms: BTreeMap<i64, Room>,
    students: BTreeMap<i64, Student>,
    groups: BTreeMap<i64, Group>,
    members: BTreeMap<i64, BTreeSet<i64>>,
    sessions: BTreeMap<i64, Session>,
    attendances: BTreeMap<i64, Attendance>,
    /// Attendance inserts still allowed before writes start failing.
    insert_budget: Option<usize>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn attendance_for(&mut self, student_id: i64, session_id: i64) -> Option<&mut Attendance> {
        self.attendances
            .values_mut()
            .find(|a| a.student_id == student_id && a.session_id == session_id)
    }

    fn take_insert_budget(&mut self, rows: usize) -> Result<()> {
        if let Some(left) = self.insert_budget {
            if rows > left {
                bail!("disk I/O error");
            }
            self.insert_budget = Some(left - rows);
        }
        Ok(())
    }

    fn push_attendance(&mut self, student_id: i64, session_id: i64, status: AttendanceStatus) {
        let now = Utc::now();
        let row = Attendance {
            id: self.next_id(),
            student_id,
            session_id,
            status,
            created_at: now,
            updated_at: now,
        };
        self.attendances.insert(row.id, row);
    }

    fn sessions_where(&self, keep: impl Fn(&Session) -> bool) -> Vec<Session> {
        let mut sessions: Vec<Session> =
            self.sessions.values().filter(|s| keep(s)).cloned().collect();
        sessions.sort_by_key(|s| (s.date, s.start_time, s.id));
        sessions
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn attendance_count(&self) -> usize {
        self.lock().attendances.len()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Lets `rows` more attendance rows be inserted, then fails every
    /// insert the way a full disk would.
    pub fn fail_attendance_inserts_after(&self, rows: usize) {
        self.lock().insert_budget = Some(rows);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_rooms(&self) -> Result<Vec<Room>> {
        Ok(self.lock().rooms.values().cloned().collect())
    }

    async fn find_room(&self, room_id: i64) -> Result<Option<Room>> {
        Ok(self.lock().rooms.get(&room_id).cloned())
    }

    async fn insert_room(&self, name: &str, capacity: i64) -> Result<Room> {
        let mut inner = self.lock();
        let room = Room {
            id: inner.next_id(),
            name: name.to_string(),
            capacity,
        };
        inner.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_student(&self, student_id: i64) -> Result<Option<Student>> {
        Ok(self.lock().students.get(&student_id).cloned())
    }

    async fn insert_student(&self, name: &str, surname: &str) -> Result<Student> {
        let mut inner = self.lock();
        let student = Student {
            id: inner.next_id(),
            name: name.to_string(),
            surname: surname.to_string(),
        };
        inner.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.lock().groups.get(&group_id).cloned())
    }

    async fn find_groups_by_teacher(&self, teacher_id: i64) -> Result<Vec<Group>> {
        Ok(self
            .lock()
            .groups
            .values()
            .filter(|g| g.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn find_group_membership(&self, group_id: i64) -> Result<Vec<i64>> {
        Ok(self
            .lock()
            .members
            .get(&group_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn insert_group(
        &self,
        name: &str,
        teacher_id: i64,
        student_ids: &[i64],
    ) -> Result<Group> {
        let mut inner = self.lock();
        let group = Group {
            id: inner.next_id(),
            name: name.to_string(),
            teacher_id,
        };
        inner.groups.insert(group.id, group.clone());
        inner
            .members
            .insert(group.id, student_ids.iter().copied().collect());
        Ok(group)
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<Session>> {
        Ok(self.lock().sessions.get(&session_id).cloned())
    }

    async fn find_sessions_by_room_and_date(
        &self,
        room_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Session>> {
        Ok(self
            .lock()
            .sessions_where(|s| s.room_id == room_id && s.date == date))
    }

    async fn find_sessions_by_date(&self, date: NaiveDate) -> Result<Vec<Session>> {
        Ok(self.lock().sessions_where(|s| s.date == date))
    }

    async fn find_sessions_by_teacher(&self, teacher_id: i64) -> Result<Vec<Session>> {
        Ok(self.lock().sessions_where(|s| s.teacher_id == teacher_id))
    }

    async fn find_sessions_by_group(&self, group_id: i64) -> Result<Vec<Session>> {
        Ok(self.lock().sessions_where(|s| s.group_id == group_id))
    }

    async fn insert_session(&self, session: &NewSession) -> Result<Session> {
        let mut inner = self.lock();
        let session = Session {
            id: inner.next_id(),
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
            group_id: session.group_id,
            teacher_id: session.teacher_id,
            room_id: session.room_id,
            created_at: Utc::now(),
        };
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_attendance(
        &self,
        student_id: i64,
        session_id: i64,
    ) -> Result<Option<Attendance>> {
        Ok(self
            .lock()
            .attendance_for(student_id, session_id)
            .cloned())
    }

    async fn find_attendances_by_student(&self, student_id: i64) -> Result<Vec<Attendance>> {
        let mut rows: Vec<Attendance> = self
            .lock()
            .attendances
            .values()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_attendances_by_session(&self, session_id: i64) -> Result<Vec<Attendance>> {
        Ok(self
            .lock()
            .attendances
            .values()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn upsert_attendance(
        &self,
        student_id: i64,
        session_id: i64,
        status: AttendanceStatus,
    ) -> Result<Attendance> {
        let mut inner = self.lock();
        if let Some(existing) = inner.attendance_for(student_id, session_id) {
            existing.status = status;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let row = Attendance {
            id: inner.next_id(),
            student_id,
            session_id,
            status,
            created_at: now,
            updated_at: now,
        };
        inner.attendances.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_attendance_if_absent(
        &self,
        student_id: i64,
        session_id: i64,
        status: AttendanceStatus,
    ) -> Result<bool> {
        let mut inner = self.lock();
        if inner.attendance_for(student_id, session_id).is_some() {
            return Ok(false);
        }

        inner.take_insert_budget(1)?;
        inner.push_attendance(student_id, session_id, status);
        Ok(true)
    }

    async fn insert_attendances_if_absent(
        &self,
        session_id: i64,
        entries: &[(i64, AttendanceStatus)],
    ) -> Result<usize> {
        let mut inner = self.lock();

        let mut staged: Vec<(i64, AttendanceStatus)> = Vec::new();
        for &(student_id, status) in entries {
            let seen = staged.iter().any(|&(id, _)| id == student_id);
            if !seen && inner.attendance_for(student_id, session_id).is_none() {
                staged.push((student_id, status));
            }
        }

        inner.take_insert_budget(staged.len())?;
        for &(student_id, status) in &staged {
            inner.push_attendance(student_id, session_id, status);
        }
        Ok(staged.len())
    }
}
