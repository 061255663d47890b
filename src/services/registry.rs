use crate::database::models::{Room, Student};
use crate::error::AppError;
use crate::services::stats::GroupWithMembers;
use crate::store::Store;
use crate::utils::validation::{validate_capacity, validate_non_empty};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub teacher_id: i64,
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

/// Reference data the scheduler and recorder read: rooms, students, groups.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn Store>,
}

impl Registry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_room(&self, request: CreateRoomRequest) -> Result<Room, AppError> {
        let name = validate_non_empty("Room name", &request.name)?;
        let capacity = validate_capacity(request.capacity)?;
        let room = self.store.insert_room(&name, capacity).await?;
        tracing::info!("Created room {} ({})", room.id, room.name);
        Ok(room)
    }

    pub async fn create_student(&self, request: CreateStudentRequest) -> Result<Student, AppError> {
        let name = validate_non_empty("Name", &request.name)?;
        let surname = validate_non_empty("Surname", &request.surname)?;
        Ok(self.store.insert_student(&name, &surname).await?)
    }

    pub async fn student(&self, student_id: i64) -> Result<Student, AppError> {
        self.store
            .find_student(student_id)
            .await?
            .ok_or(AppError::NotFound("Student"))
    }

    pub async fn create_group(
        &self,
        request: CreateGroupRequest,
    ) -> Result<GroupWithMembers, AppError> {
        let name = validate_non_empty("Group name", &request.name)?;

        let student_ids: Vec<i64> = request
            .student_ids
            .iter()
            .copied()
            .collect::<BTreeSet<i64>>()
            .into_iter()
            .collect();
        for &student_id in &student_ids {
            if self.store.find_student(student_id).await?.is_none() {
                return Err(AppError::NotFound("Student"));
            }
        }

        let group = self
            .store
            .insert_group(&name, request.teacher_id, &student_ids)
            .await?;
        tracing::info!(
            "Created group {} with {} students",
            group.id,
            student_ids.len()
        );

        Ok(GroupWithMembers { group, student_ids })
    }

    pub async fn group(&self, group_id: i64) -> Result<GroupWithMembers, AppError> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or(AppError::NotFound("Group"))?;
        let student_ids = self.store.find_group_membership(group.id).await?;
        Ok(GroupWithMembers { group, student_ids })
    }
}
