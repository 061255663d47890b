use crate::database::models::{Attendance, AttendanceStatus, Group, Session, Student};
use crate::error::AppError;
use crate::store::Store;
use crate::utils::locks::KeyedLocks;
use crate::utils::token::parse_student_token;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrScanRequest {
    pub qr_data: String,
    pub session_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntry {
    pub student_id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMarkRequest {
    pub session_id: i64,
    pub attendances: Vec<BulkEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendanceRequest {
    pub student_id: i64,
    pub session_id: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWithGroup {
    #[serde(flatten)]
    pub session: Session,
    pub group: Group,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedAttendance {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student: Student,
    pub session: SessionWithGroup,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceWithStudent {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student: Student,
}

/// Writes attendance rows.
///
/// Every write path holds the (student, session) lock from its existence
/// check to its write, so a pair never gets two rows.
#[derive(Clone)]
pub struct AttendanceRecorder {
    store: Arc<dyn Store>,
    pair_locks: Arc<KeyedLocks<(i64, i64)>>,
}

impl AttendanceRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            pair_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Marks the scanned student present. Re-scans overwrite the existing
    /// row back to `present`.
    pub async fn mark_by_qr(
        &self,
        qr_data: &str,
        session_id: i64,
    ) -> Result<ScannedAttendance, AppError> {
        let student_id = parse_student_token(qr_data)?;

        let student = self
            .store
            .find_student(student_id)
            .await?
            .ok_or(AppError::NotFound("Student"))?;

        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(AppError::NotFound("Session"))?;
        let group = self
            .store
            .find_group(session.group_id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Session {} points at missing group {}",
                    session.id,
                    session.group_id
                )
            })?;
        let members = self.store.find_group_membership(group.id).await?;

        if !members.contains(&student_id) {
            tracing::warn!(
                "Student {} scanned for session {} outside group {}",
                student_id,
                session_id,
                group.id
            );
            return Err(AppError::Enrollment);
        }

        let attendance = {
            let _guard = self.pair_locks.lock((student_id, session_id)).await;
            match self.store.find_attendance(student_id, session_id).await? {
                Some(existing) if existing.status == AttendanceStatus::Present => {}
                Some(existing) => tracing::info!(
                    "Attendance {} for student {} corrected to present by scan",
                    existing.id,
                    student_id
                ),
                None => tracing::info!(
                    "Student {} marked present in session {}",
                    student_id,
                    session_id
                ),
            }
            self.store
                .upsert_attendance(student_id, session_id, AttendanceStatus::Present)
                .await?
        };

        Ok(ScannedAttendance {
            attendance,
            student,
            session: SessionWithGroup { session, group },
        })
    }

    /// Records a roster. Existing rows are left untouched, so the first
    /// status written for a student wins. Returns the number of new rows.
    pub async fn mark_bulk(&self, request: BulkMarkRequest) -> Result<usize, AppError> {
        let session = self
            .store
            .find_session(request.session_id)
            .await?
            .ok_or(AppError::NotFound("Session"))?;

        // Reject the whole roster before writing anything.
        let mut entries = Vec::with_capacity(request.attendances.len());
        for entry in &request.attendances {
            let status = match entry.status.as_deref() {
                Some(raw) => raw.parse::<AttendanceStatus>()?,
                None => AttendanceStatus::default(),
            };
            if self.store.find_student(entry.student_id).await?.is_none() {
                return Err(AppError::NotFound("Student"));
            }
            entries.push((entry.student_id, status));
        }

        // Ascending order so two overlapping rosters cannot deadlock.
        let mut student_ids: Vec<i64> = entries.iter().map(|&(id, _)| id).collect();
        student_ids.sort_unstable();
        student_ids.dedup();
        let mut guards = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            guards.push(self.pair_locks.lock((student_id, session.id)).await);
        }

        let written = self
            .store
            .insert_attendances_if_absent(session.id, &entries)
            .await?;
        drop(guards);

        tracing::info!(
            "Bulk marking for session {}: {} of {} rows written",
            session.id,
            written,
            request.attendances.len()
        );

        Ok(written)
    }

    /// Single explicit record. Refuses to create a second row for a pair.
    pub async fn create(
        &self,
        request: CreateAttendanceRequest,
    ) -> Result<AttendanceWithStudent, AppError> {
        let status = request.status.parse::<AttendanceStatus>()?;

        let student = self
            .store
            .find_student(request.student_id)
            .await?
            .ok_or(AppError::NotFound("Student"))?;
        let session = self
            .store
            .find_session(request.session_id)
            .await?
            .ok_or(AppError::NotFound("Session"))?;

        let _guard = self.pair_locks.lock((student.id, session.id)).await;
        if !self
            .store
            .insert_attendance_if_absent(student.id, session.id, status)
            .await?
        {
            return Err(AppError::Conflict(
                "Attendance already recorded for this student and session".to_string(),
            ));
        }

        let attendance = self
            .store
            .find_attendance(student.id, session.id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Attendance ({}, {}) vanished after insert",
                    student.id,
                    session.id
                )
            })?;

        Ok(AttendanceWithStudent {
            attendance,
            student,
        })
    }

    pub async fn history_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<AttendanceWithStudent>, AppError> {
        let student = self
            .store
            .find_student(student_id)
            .await?
            .ok_or(AppError::NotFound("Student"))?;

        let rows = self.store.find_attendances_by_student(student.id).await?;
        Ok(rows
            .into_iter()
            .map(|attendance| AttendanceWithStudent {
                attendance,
                student: student.clone(),
            })
            .collect())
    }
}
