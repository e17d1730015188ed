//! Calendar schedules.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use models::{schedule, validation};
use crate::errors::ServiceError;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ScheduleRange {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ScheduleInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

fn check_span(start: DateTime<FixedOffset>, end: Option<DateTime<FixedOffset>>) -> Result<(), ServiceError> {
    match end {
        Some(e) if e < start => Err(ServiceError::Validation("end_time 不能早于 start_time".into())),
        _ => Ok(()),
    }
}

/// Schedules starting inside `[start, end]`; open ends are unbounded.
#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, range: &ScheduleRange) -> Result<Vec<schedule::Model>, ServiceError> {
    let mut find = schedule::Entity::find();
    if let Some(s) = range.start {
        find = find.filter(schedule::Column::StartTime.gte(s));
    }
    if let Some(e) = range.end {
        find = find.filter(schedule::Column::StartTime.lte(e));
    }
    find.order_by_asc(schedule::Column::StartTime).all(db).await.map_err(ServiceError::from_db)
}

pub async fn create(db: &DatabaseConnection, input: ScheduleInput) -> Result<schedule::Model, ServiceError> {
    let title = validation::non_blank(input.title.as_deref()).ok_or_else(|| ServiceError::required("title"))?;
    let start = input.start_time.ok_or_else(|| ServiceError::required("start_time"))?;
    check_span(start, input.end_time)?;
    let category = schedule::normalize_category(input.category.as_deref())?;
    let now = Utc::now().into();
    schedule::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        category: Set(category),
        start_time: Set(start),
        end_time: Set(input.end_time),
        location: Set(validation::non_blank(input.location.as_deref())),
        description: Set(validation::non_blank(input.description.as_deref())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)
}

pub async fn update(db: &DatabaseConnection, id: Uuid, input: ScheduleInput) -> Result<schedule::Model, ServiceError> {
    let existing = schedule::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("schedule"))?;
    let start = input.start_time.unwrap_or(existing.start_time);
    let end = input.end_time.or(existing.end_time);
    check_span(start, end)?;
    let mut am: schedule::ActiveModel = existing.into();
    if let Some(t) = validation::non_blank(input.title.as_deref()) { am.title = Set(t); }
    if input.category.is_some() { am.category = Set(schedule::normalize_category(input.category.as_deref())?); }
    am.start_time = Set(start);
    am.end_time = Set(end);
    if let Some(v) = input.location { am.location = Set(validation::non_blank(Some(&v))); }
    if let Some(v) = input.description { am.description = Set(validation::non_blank(Some(&v))); }
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(ServiceError::from_db)
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = schedule::Entity::delete_by_id(id).exec(db).await.map_err(ServiceError::from_db)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("schedule"));
    }
    Ok(())
}
