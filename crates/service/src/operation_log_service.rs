use sea_orm::{sea_query::Condition, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use tracing::warn;

use common::types::Page;
use models::operation_log::{self, Column, Entity};
use crate::{context::Operator, errors::ServiceError, pagination::{Pagination, SortOrder}, query::{contains_ci, filled}};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct OperationLogQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub operator: Option<String>,
    pub target_type: Option<String>,
    pub action: Option<String>,
    pub search: Option<String>,
    pub sort_order: Option<String>,
}

/// Append an audit row for `op`.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    op: &Operator,
    action: &str,
    target_type: &str,
    target_id: &str,
    description: &str,
) -> Result<(), ServiceError> {
    operation_log::insert(db, Some(&op.email), Some(&op.name), action, target_type, Some(target_id), Some(description)).await?;
    Ok(())
}

/// Like [`record`] but never fails the caller; used outside transactions.
pub async fn record_quietly<C: ConnectionTrait>(db: &C, op: &Operator, action: &str, target_type: &str, target_id: &str, description: &str) {
    if let Err(e) = record(db, op, action, target_type, target_id, description).await {
        warn!(error = %e, target_type, target_id, "operation log write failed");
    }
}

pub async fn list<C: ConnectionTrait>(db: &C, q: &OperationLogQuery) -> Result<Page<operation_log::Model>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(who) = filled(&q.operator) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci((Entity, Column::OperatorEmail), who))
                .add(contains_ci((Entity, Column::OperatorName), who)),
        );
    }
    if let Some(t) = filled(&q.target_type) {
        cond = cond.add(Column::TargetType.eq(t));
    }
    if let Some(a) = filled(&q.action) {
        cond = cond.add(Column::Action.eq(a.to_ascii_uppercase()));
    }
    if let Some(s) = filled(&q.search) {
        cond = cond.add(contains_ci((Entity, Column::Description), s));
    }
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = Entity::find()
        .filter(cond)
        .order_by(Column::CreatedAt, order.order())
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let list = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;
    Ok(pg.page_of(total, list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::operation_log::ACTION_UPDATE;

    #[tokio::test]
    async fn record_then_filter() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let tag = uuid::Uuid::new_v4().simple().to_string();
        let op = Operator { user_id: None, email: format!("{tag}@ops.io"), name: "Log Tester".into(), role: "admin".into(), permissions: vec![] };
        record(&db, &op, ACTION_UPDATE, "payer", "payer_x", &format!("touched {tag}")).await?;

        let q = OperationLogQuery { operator: Some(tag.to_uppercase()), action: Some("update".into()), ..Default::default() };
        let page = list(&db, &q).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].target_type, "payer");

        let q = OperationLogQuery { search: Some(tag.clone()), target_type: Some("account".into()), ..Default::default() };
        assert_eq!(list(&db, &q).await?.total, 0);
        Ok(())
    }
}
