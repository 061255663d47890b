use crate::database::models::{Group, NewSession, Room, Session};
use crate::error::AppError;
use crate::store::Store;
use crate::utils::locks::KeyedLocks;
use crate::utils::time::{TimeSlot, parse_date_string, parse_time_string};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub group_id: i64,
    pub room_id: i64,
    pub teacher_id: i64,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetails {
    #[serde(flatten)]
    pub session: Session,
    pub group: Group,
    pub room: Room,
}

/// Raw availability filter; all three parts must be present to filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Books rooms for sessions.
///
/// Session creation is serialized per (room, date) so two overlapping
/// requests can never both pass the conflict check.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn Store>,
    room_locks: Arc<KeyedLocks<(i64, NaiveDate)>>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            room_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Whether any session already in `room_id` on `date` overlaps `slot`.
    pub async fn has_conflict(
        &self,
        room_id: i64,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<bool, AppError> {
        let sessions = self
            .store
            .find_sessions_by_room_and_date(room_id, date)
            .await?;

        Ok(sessions.iter().any(|existing| session_slot(existing).overlaps(&slot)))
    }

    pub async fn available_rooms(&self, query: &AvailabilityQuery) -> Result<Vec<Room>, AppError> {
        let (Some(date), Some(start), Some(end)) =
            (&query.date, &query.start_time, &query.end_time)
        else {
            return Ok(self.store.list_rooms().await?);
        };

        let date = parse_date_string(date)?;
        let slot = TimeSlot::new(parse_time_string(start)?, parse_time_string(end)?)?;

        let mut busy: HashMap<i64, Vec<TimeSlot>> = HashMap::new();
        for session in self.store.find_sessions_by_date(date).await? {
            busy.entry(session.room_id)
                .or_default()
                .push(session_slot(&session));
        }

        let rooms = self.store.list_rooms().await?;
        Ok(rooms
            .into_iter()
            .filter(|room| {
                busy.get(&room.id)
                    .is_none_or(|slots| !slots.iter().any(|taken| taken.overlaps(&slot)))
            })
            .collect())
    }

    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SessionDetails, AppError> {
        let date = parse_date_string(&request.date)?;
        let slot = TimeSlot::new(
            parse_time_string(&request.start_time)?,
            parse_time_string(&request.end_time)?,
        )?;

        let room = self
            .store
            .find_room(request.room_id)
            .await?
            .ok_or(AppError::NotFound("Room"))?;
        let group = self
            .store
            .find_group(request.group_id)
            .await?
            .ok_or(AppError::NotFound("Group"))?;

        let _guard = self.room_locks.lock((room.id, date)).await;

        if self.has_conflict(room.id, date, slot).await? {
            tracing::info!(
                "Rejected booking of room {} on {} {}-{}: slot taken",
                room.id,
                date,
                slot.start,
                slot.end
            );
            return Err(AppError::Conflict(
                "Room is already booked for this time slot".to_string(),
            ));
        }

        let session = self
            .store
            .insert_session(&NewSession {
                date,
                start_time: slot.start,
                end_time: slot.end,
                group_id: group.id,
                teacher_id: request.teacher_id,
                room_id: room.id,
            })
            .await?;

        tracing::info!(
            "Booked room {} on {} {}-{} as session {}",
            room.id,
            session.date,
            session.start_time,
            session.end_time,
            session.id
        );

        Ok(SessionDetails {
            session,
            group,
            room,
        })
    }
}

fn session_slot(session: &Session) -> TimeSlot {
    TimeSlot {
        start: session.start_time,
        end: session.end_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        scheduler: Scheduler,
        room: Room,
        other_room: Room,
        group: Group,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let room = store.insert_room("101", 30).await.unwrap();
        let other_room = store.insert_room("102", 20).await.unwrap();
        let group = store.insert_group("Maths A", 1, &[]).await.unwrap();
        let scheduler = Scheduler::new(store.clone());
        Fixture {
            store,
            scheduler,
            room,
            other_room,
            group,
        }
    }

    fn request(f: &Fixture, room_id: i64, start: &str, end: &str) -> CreateSessionRequest {
        CreateSessionRequest {
            group_id: f.group.id,
            room_id,
            teacher_id: 1,
            date: "2026-01-10".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[tokio::test]
    async fn overlapping_booking_is_rejected() {
        let f = fixture().await;
        f.scheduler
            .create_session(request(&f, f.room.id, "14:00", "15:30"))
            .await
            .unwrap();

        let inside = f
            .scheduler
            .create_session(request(&f, f.room.id, "14:30", "15:00"))
            .await;
        assert!(matches!(inside, Err(AppError::Conflict(_))));

        let tail = f
            .scheduler
            .create_session(request(&f, f.room.id, "15:00", "16:00"))
            .await;
        assert!(matches!(tail, Err(AppError::Conflict(_))));

        assert_eq!(f.store.session_count(), 1);
    }

    #[tokio::test]
    async fn back_to_back_booking_is_accepted() {
        let f = fixture().await;
        f.scheduler
            .create_session(request(&f, f.room.id, "14:00", "15:30"))
            .await
            .unwrap();

        let next = f
            .scheduler
            .create_session(request(&f, f.room.id, "15:30", "16:30"))
            .await
            .unwrap();
        assert_eq!(next.session.start_time.to_string(), "15:30");
        assert_eq!(next.room.name, "101");
        assert_eq!(next.group.name, "Maths A");
    }

    #[tokio::test]
    async fn same_slot_in_another_room_or_day_is_free() {
        let f = fixture().await;
        f.scheduler
            .create_session(request(&f, f.room.id, "14:00", "15:30"))
            .await
            .unwrap();

        f.scheduler
            .create_session(request(&f, f.other_room.id, "14:00", "15:30"))
            .await
            .unwrap();

        let mut next_day = request(&f, f.room.id, "14:00", "15:30");
        next_day.date = "2026-01-11".to_string();
        f.scheduler.create_session(next_day).await.unwrap();
    }

    #[tokio::test]
    async fn inverted_or_empty_interval_is_a_validation_error() {
        let f = fixture().await;
        for (start, end) in [("15:00", "14:00"), ("15:00", "15:00")] {
            let result = f
                .scheduler
                .create_session(request(&f, f.room.id, start, end))
                .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert_eq!(f.store.session_count(), 0);
    }

    #[tokio::test]
    async fn malformed_date_or_time_is_a_validation_error() {
        let f = fixture().await;
        let mut bad_date = request(&f, f.room.id, "14:00", "15:00");
        bad_date.date = "10/01/2026".to_string();
        for bad in [
            request(&f, f.room.id, "25:00", "26:00"),
            request(&f, f.room.id, "14:00", "noon"),
            bad_date,
        ] {
            let result = f.scheduler.create_session(bad).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert_eq!(f.store.session_count(), 0);
    }

    #[tokio::test]
    async fn conflicts_are_detected_through_sqlite() {
        let pool = crate::database::create_memory_connection().await.unwrap();
        let store = Arc::new(crate::store::SqliteStore::new(pool));
        let room = store.insert_room("101", 30).await.unwrap();
        let group = store.insert_group("Maths A", 1, &[]).await.unwrap();
        let scheduler = Scheduler::new(store.clone());
        let book = |start: &str, end: &str| CreateSessionRequest {
            group_id: group.id,
            room_id: room.id,
            teacher_id: 1,
            date: "2026-01-10".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        };

        scheduler.create_session(book("9:30", "11:00")).await.unwrap();

        let overlap = scheduler.create_session(book("10:00", "10:30")).await;
        assert!(matches!(overlap, Err(AppError::Conflict(_))));

        let after = scheduler.create_session(book("11:00", "12:00")).await.unwrap();
        assert_eq!(after.session.start_time.to_string(), "11:00");

        let day = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let stored = store
            .find_sessions_by_room_and_date(room.id, day)
            .await
            .unwrap();
        let slots: Vec<String> = stored
            .iter()
            .map(|s| format!("{}-{}", s.start_time, s.end_time))
            .collect();
        assert_eq!(slots, vec!["09:30-11:00", "11:00-12:00"]);
    }

    #[tokio::test]
    async fn unknown_room_or_group_is_not_found() {
        let f = fixture().await;
        let result = f
            .scheduler
            .create_session(request(&f, 999, "08:00", "09:00"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound("Room"))));

        let mut orphan = request(&f, f.room.id, "08:00", "09:00");
        orphan.group_id = 999;
        let result = f.scheduler.create_session(orphan).await;
        assert!(matches!(result, Err(AppError::NotFound("Group"))));
    }

    #[tokio::test]
    async fn unpadded_hours_compare_numerically() {
        let f = fixture().await;
        f.scheduler
            .create_session(request(&f, f.room.id, "9:30", "10:30"))
            .await
            .unwrap();

        let result = f
            .scheduler
            .create_session(request(&f, f.room.id, "10:00", "11:00"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_for_one_slot_admit_exactly_one() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for _ in 0..16 {
            let scheduler = f.scheduler.clone();
            let req = request(&f, f.room.id, "10:00", "11:00");
            handles.push(tokio::spawn(
                async move { scheduler.create_session(req).await },
            ));
        }

        let mut booked = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => booked += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(booked, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(f.store.session_count(), 1);
    }

    #[tokio::test]
    async fn availability_without_full_filter_lists_every_room() {
        let f = fixture().await;
        f.scheduler
            .create_session(request(&f, f.room.id, "14:00", "15:30"))
            .await
            .unwrap();

        let query = AvailabilityQuery {
            date: Some("2026-01-10".into()),
            start_time: Some("14:00".into()),
            end_time: None,
        };
        let rooms = f.scheduler.available_rooms(&query).await.unwrap();
        assert_eq!(rooms.len(), 2);
    }

    #[tokio::test]
    async fn availability_hides_booked_rooms() {
        let f = fixture().await;
        f.scheduler
            .create_session(request(&f, f.room.id, "14:00", "15:30"))
            .await
            .unwrap();

        let busy = AvailabilityQuery {
            date: Some("2026-01-10".into()),
            start_time: Some("15:00".into()),
            end_time: Some("16:00".into()),
        };
        let rooms = f.scheduler.available_rooms(&busy).await.unwrap();
        assert_eq!(rooms, vec![f.other_room.clone()]);

        let after = AvailabilityQuery {
            date: Some("2026-01-10".into()),
            start_time: Some("15:30".into()),
            end_time: Some("16:30".into()),
        };
        let rooms = f.scheduler.available_rooms(&after).await.unwrap();
        assert_eq!(rooms, vec![f.room.clone(), f.other_room.clone()]);
    }

    #[tokio::test]
    async fn availability_rejects_malformed_filters() {
        let f = fixture().await;
        let bad = AvailabilityQuery {
            date: Some("tomorrow".into()),
            start_time: Some("15:00".into()),
            end_time: Some("16:00".into()),
        };
        assert!(matches!(
            f.scheduler.available_rooms(&bad).await,
            Err(AppError::Validation(_))
        ));

        let inverted = AvailabilityQuery {
            date: Some("2026-01-10".into()),
            start_time: Some("16:00".into()),
            end_time: Some("15:00".into()),
        };
        assert!(matches!(
            f.scheduler.available_rooms(&inverted).await,
            Err(AppError::Validation(_))
        ));
    }
}
