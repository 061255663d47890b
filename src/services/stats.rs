use crate::database::models::{Attendance, AttendanceStatus, Group, Room, Session, Student};
use crate::error::AppError;
use crate::store::Store;
use crate::utils::validation::percentage;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    pub student_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSession {
    #[serde(flatten)]
    pub session: Session,
    pub group: GroupWithMembers,
    pub room: Option<Room>,
    pub attendances: Vec<Attendance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSession {
    #[serde(flatten)]
    pub session: Session,
    pub room: Option<Room>,
    pub attendances: Vec<Attendance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherGroup {
    #[serde(flatten)]
    pub group: Group,
    pub students: Vec<Student>,
    pub sessions: Vec<GroupSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_sessions: usize,
    pub total_students: usize,
    pub total_present: usize,
    pub total_absent: usize,
    pub average_attendance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceStats {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub total_sessions: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAttendanceStats {
    pub id: i64,
    pub date: NaiveDate,
    pub group_name: String,
    pub present_count: usize,
    pub absent_count: usize,
    pub total_students: usize,
    pub attendance_rate: u32,
}

fn count_status(rows: &[Attendance], status: AttendanceStatus) -> usize {
    rows.iter().filter(|a| a.status == status).count()
}

/// Read-only views over a teacher's sessions and their attendance.
#[derive(Clone)]
pub struct TeacherReports {
    store: Arc<dyn Store>,
}

impl TeacherReports {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn group_with_members(&self, group_id: i64) -> Result<GroupWithMembers, AppError> {
        let group = self.store.find_group(group_id).await?.ok_or_else(|| {
            anyhow::anyhow!("Session references missing group {}", group_id)
        })?;
        let student_ids = self.store.find_group_membership(group_id).await?;
        Ok(GroupWithMembers { group, student_ids })
    }

    /// Groups owned by `teacher_id` with their students and every session
    /// of the group, each carrying its room and attendance rows.
    pub async fn groups(&self, teacher_id: i64) -> Result<Vec<TeacherGroup>, AppError> {
        let mut groups = Vec::new();
        for group in self.store.find_groups_by_teacher(teacher_id).await? {
            let mut students = Vec::new();
            for student_id in self.store.find_group_membership(group.id).await? {
                if let Some(student) = self.store.find_student(student_id).await? {
                    students.push(student);
                }
            }

            let mut sessions = Vec::new();
            for session in self.store.find_sessions_by_group(group.id).await? {
                let room = self.store.find_room(session.room_id).await?;
                let attendances = self.store.find_attendances_by_session(session.id).await?;
                sessions.push(GroupSession {
                    session,
                    room,
                    attendances,
                });
            }

            groups.push(TeacherGroup {
                group,
                students,
                sessions,
            });
        }

        Ok(groups)
    }

    /// Sessions taught by `teacher_id`, by date then start time.
    pub async fn sessions(&self, teacher_id: i64) -> Result<Vec<TeacherSession>, AppError> {
        let sessions = self.store.find_sessions_by_teacher(teacher_id).await?;

        let mut groups: HashMap<i64, GroupWithMembers> = HashMap::new();
        let mut detailed = Vec::with_capacity(sessions.len());
        for session in sessions {
            let group = match groups.get(&session.group_id) {
                Some(group) => group.clone(),
                None => {
                    let group = self.group_with_members(session.group_id).await?;
                    groups.insert(session.group_id, group.clone());
                    group
                }
            };
            let room = self.store.find_room(session.room_id).await?;
            let attendances = self.store.find_attendances_by_session(session.id).await?;
            detailed.push(TeacherSession {
                session,
                group,
                room,
                attendances,
            });
        }

        Ok(detailed)
    }

    pub async fn summary(&self, teacher_id: i64) -> Result<AttendanceSummary, AppError> {
        let sessions = self.sessions(teacher_id).await?;

        let total_students = sessions
            .iter()
            .flat_map(|s| s.group.student_ids.iter().copied())
            .collect::<HashSet<i64>>()
            .len();
        let total_present: usize = sessions
            .iter()
            .map(|s| count_status(&s.attendances, AttendanceStatus::Present))
            .sum();
        let total_absent: usize = sessions
            .iter()
            .map(|s| count_status(&s.attendances, AttendanceStatus::Absent))
            .sum();

        let average_attendance = if sessions.is_empty() {
            0
        } else {
            percentage(total_present, (total_present + total_absent).max(1))
        };

        Ok(AttendanceSummary {
            total_sessions: sessions.len(),
            total_students,
            total_present,
            total_absent,
            average_attendance,
        })
    }

    /// One line per student of the teacher's groups; students sitting in
    /// several groups are folded into a single line.
    pub async fn per_student(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<StudentAttendanceStats>, AppError> {
        let mut lines: Vec<StudentAttendanceStats> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        for group in self.store.find_groups_by_teacher(teacher_id).await? {
            let sessions = self.store.find_sessions_by_group(group.id).await?;
            let mut rows = Vec::new();
            for session in &sessions {
                rows.extend(self.store.find_attendances_by_session(session.id).await?);
            }

            for student_id in self.store.find_group_membership(group.id).await? {
                let Some(student) = self.store.find_student(student_id).await? else {
                    continue;
                };
                let own: Vec<Attendance> = rows
                    .iter()
                    .filter(|a| a.student_id == student_id)
                    .cloned()
                    .collect();
                let present = count_status(&own, AttendanceStatus::Present);
                let absent = count_status(&own, AttendanceStatus::Absent);

                match index.get(&student_id).copied() {
                    Some(at) => {
                        let line = &mut lines[at];
                        line.total_sessions += sessions.len();
                        line.present_count += present;
                        line.absent_count += absent;
                        line.attendance_rate =
                            percentage(line.present_count, line.total_sessions);
                    }
                    None => {
                        index.insert(student_id, lines.len());
                        lines.push(StudentAttendanceStats {
                            id: student.id,
                            name: student.name,
                            surname: student.surname,
                            total_sessions: sessions.len(),
                            present_count: present,
                            absent_count: absent,
                            attendance_rate: percentage(present, sessions.len()),
                        });
                    }
                }
            }
        }

        Ok(lines)
    }

    /// One line per session, most recent date first.
    pub async fn per_session(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<SessionAttendanceStats>, AppError> {
        let mut sessions = self.sessions(teacher_id).await?;
        sessions.sort_by(|a, b| {
            b.session
                .date
                .cmp(&a.session.date)
                .then(a.session.start_time.cmp(&b.session.start_time))
        });

        Ok(sessions
            .into_iter()
            .map(|s| {
                let present_count = count_status(&s.attendances, AttendanceStatus::Present);
                let total_students = s.group.student_ids.len();
                SessionAttendanceStats {
                    id: s.session.id,
                    date: s.session.date,
                    group_name: s.group.group.name,
                    present_count,
                    absent_count: count_status(&s.attendances, AttendanceStatus::Absent),
                    total_students,
                    attendance_rate: percentage(present_count, total_students),
                }
            })
            .collect())
    }
}
