use crate::database::models::{
    Attendance, AttendanceStatus, Group, NewSession, Room, Session, Student,
};
use crate::utils::time::ClockTime;
use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

const SESSION_COLUMNS: &str =
    "id, date, start_time, end_time, group_id, teacher_id, room_id, created_at";
const ATTENDANCE_COLUMNS: &str = "id, student_id, session_id, status, created_at, updated_at";

fn room_from_row(row: &SqliteRow) -> Result<Room> {
    Ok(Room {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        capacity: row.try_get("capacity")?,
    })
}

fn student_from_row(row: &SqliteRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        surname: row.try_get("surname")?,
    })
}

fn group_from_row(row: &SqliteRow) -> Result<Group> {
    Ok(Group {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        teacher_id: row.try_get("teacher_id")?,
    })
}

fn clock_column(row: &SqliteRow, column: &str) -> Result<ClockTime> {
    let raw: String = row.try_get(column)?;
    raw.parse::<ClockTime>()
        .map_err(|e| anyhow::anyhow!("Corrupt {} value '{}': {}", column, raw, e))
}

fn session_from_row(row: &SqliteRow) -> Result<Session> {
    Ok(Session {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        start_time: clock_column(row, "start_time")?,
        end_time: clock_column(row, "end_time")?,
        group_id: row.try_get("group_id")?,
        teacher_id: row.try_get("teacher_id")?,
        room_id: row.try_get("room_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn attendance_from_row(row: &SqliteRow) -> Result<Attendance> {
    let status: String = row.try_get("status")?;
    Ok(Attendance {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        session_id: row.try_get("session_id")?,
        status: status
            .parse::<AttendanceStatus>()
            .map_err(|e| anyhow::anyhow!("Corrupt status value '{}': {}", status, e))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// Room queries
pub async fn create_room(pool: &SqlitePool, name: &str, capacity: i64) -> Result<Room> {
    let result = sqlx::query("INSERT INTO rooms (name, capacity) VALUES (?, ?)")
        .bind(name)
        .bind(capacity)
        .execute(pool)
        .await?;

    let room_id = result.last_insert_rowid();
    get_room_by_id(pool, room_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Room {} vanished after insert", room_id))
}

pub async fn get_room_by_id(pool: &SqlitePool, room_id: i64) -> Result<Option<Room>> {
    let row = sqlx::query("SELECT id, name, capacity FROM rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(room_from_row).transpose()
}

pub async fn list_rooms(pool: &SqlitePool) -> Result<Vec<Room>> {
    let rows = sqlx::query("SELECT id, name, capacity FROM rooms ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(room_from_row).collect()
}

// Student queries
pub async fn create_student(pool: &SqlitePool, name: &str, surname: &str) -> Result<Student> {
    let result = sqlx::query("INSERT INTO students (name, surname) VALUES (?, ?)")
        .bind(name)
        .bind(surname)
        .execute(pool)
        .await?;

    let student_id = result.last_insert_rowid();
    get_student_by_id(pool, student_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Student {} vanished after insert", student_id))
}

pub async fn get_student_by_id(pool: &SqlitePool, student_id: i64) -> Result<Option<Student>> {
    let row = sqlx::query("SELECT id, name, surname FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(student_from_row).transpose()
}

// Group queries
pub async fn create_group(
    pool: &SqlitePool,
    name: &str,
    teacher_id: i64,
    student_ids: &[i64],
) -> Result<Group> {
    let mut tx = pool.begin().await?;

    let group_id = sqlx::query("INSERT INTO groups (name, teacher_id) VALUES (?, ?)")
        .bind(name)
        .bind(teacher_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    for &student_id in student_ids {
        sqlx::query("INSERT OR IGNORE INTO group_students (group_id, student_id) VALUES (?, ?)")
            .bind(group_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    get_group_by_id(pool, group_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Group {} vanished after insert", group_id))
}

pub async fn get_group_by_id(pool: &SqlitePool, group_id: i64) -> Result<Option<Group>> {
    let row = sqlx::query("SELECT id, name, teacher_id FROM groups WHERE id = ?")
        .bind(group_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(group_from_row).transpose()
}

pub async fn get_groups_by_teacher(pool: &SqlitePool, teacher_id: i64) -> Result<Vec<Group>> {
    let rows =
        sqlx::query("SELECT id, name, teacher_id FROM groups WHERE teacher_id = ? ORDER BY id ASC")
            .bind(teacher_id)
            .fetch_all(pool)
            .await?;

    rows.iter().map(group_from_row).collect()
}

pub async fn get_group_member_ids(pool: &SqlitePool, group_id: i64) -> Result<Vec<i64>> {
    let rows = sqlx::query(
        "SELECT student_id FROM group_students WHERE group_id = ? ORDER BY student_id ASC",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| row.try_get::<i64, _>("student_id").map_err(anyhow::Error::from))
        .collect()
}

// Session queries
pub async fn create_session(pool: &SqlitePool, session: &NewSession) -> Result<Session> {
    let result = sqlx::query(
        "INSERT INTO sessions (date, start_time, end_time, group_id, teacher_id, room_id)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(session.date)
    .bind(session.start_time.to_string())
    .bind(session.end_time.to_string())
    .bind(session.group_id)
    .bind(session.teacher_id)
    .bind(session.room_id)
    .execute(pool)
    .await?;

    let session_id = result.last_insert_rowid();
    get_session_by_id(pool, session_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Session {} vanished after insert", session_id))
}

pub async fn get_session_by_id(pool: &SqlitePool, session_id: i64) -> Result<Option<Session>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE id = ?",
        SESSION_COLUMNS
    ))
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

pub async fn get_sessions_by_room_and_date(
    pool: &SqlitePool,
    room_id: i64,
    date: NaiveDate,
) -> Result<Vec<Session>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE room_id = ? AND date = ? ORDER BY start_time ASC",
        SESSION_COLUMNS
    ))
    .bind(room_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn get_sessions_by_date(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Session>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE date = ? ORDER BY room_id ASC, start_time ASC",
        SESSION_COLUMNS
    ))
    .bind(date)
    .fetch_all(pool)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn get_sessions_by_teacher(pool: &SqlitePool, teacher_id: i64) -> Result<Vec<Session>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE teacher_id = ? ORDER BY date ASC, start_time ASC, id ASC",
        SESSION_COLUMNS
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(session_from_row).collect()
}

pub async fn get_sessions_by_group(pool: &SqlitePool, group_id: i64) -> Result<Vec<Session>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM sessions WHERE group_id = ? ORDER BY date ASC, start_time ASC, id ASC",
        SESSION_COLUMNS
    ))
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(session_from_row).collect()
}

// Attendance queries
pub async fn get_attendance(
    pool: &SqlitePool,
    student_id: i64,
    session_id: i64,
) -> Result<Option<Attendance>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM attendances WHERE student_id = ? AND session_id = ?",
        ATTENDANCE_COLUMNS
    ))
    .bind(student_id)
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(attendance_from_row).transpose()
}

/// Inserts the row, or overwrites the status of the existing one.
pub async fn upsert_attendance(
    pool: &SqlitePool,
    student_id: i64,
    session_id: i64,
    status: AttendanceStatus,
) -> Result<Attendance> {
    sqlx::query(
        "INSERT INTO attendances (student_id, session_id, status) VALUES (?, ?, ?)
         ON CONFLICT (student_id, session_id)
         DO UPDATE SET status = excluded.status, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(student_id)
    .bind(session_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    get_attendance(pool, student_id, session_id)
        .await?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Attendance ({}, {}) vanished after upsert",
                student_id,
                session_id
            )
        })
}

/// Inserts the row unless one already exists; returns whether it wrote.
pub async fn insert_attendance_if_absent(
    pool: &SqlitePool,
    student_id: i64,
    session_id: i64,
    status: AttendanceStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO attendances (student_id, session_id, status) VALUES (?, ?, ?)
         ON CONFLICT (student_id, session_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(session_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Inserts every missing (student, session) row in one transaction.
/// Returns how many rows were written; nothing is kept on error.
pub async fn insert_attendances_if_absent(
    pool: &SqlitePool,
    session_id: i64,
    entries: &[(i64, AttendanceStatus)],
) -> Result<usize> {
    let mut tx = pool.begin().await?;

    let mut written = 0;
    for &(student_id, status) in entries {
        let result = sqlx::query(
            "INSERT INTO attendances (student_id, session_id, status) VALUES (?, ?, ?)
             ON CONFLICT (student_id, session_id) DO NOTHING",
        )
        .bind(student_id)
        .bind(session_id)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected() as usize;
    }

    tx.commit().await?;
    Ok(written)
}

pub async fn get_attendances_by_student(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<Attendance>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM attendances WHERE student_id = ? ORDER BY created_at DESC, id DESC",
        ATTENDANCE_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(attendance_from_row).collect()
}

pub async fn get_attendances_by_session(
    pool: &SqlitePool,
    session_id: i64,
) -> Result<Vec<Attendance>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM attendances WHERE session_id = ? ORDER BY id ASC",
        ATTENDANCE_COLUMNS
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(attendance_from_row).collect()
}
