//! Internal knowledge base articles.

use chrono::Utc;
use sea_orm::{sea_query::Condition, ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use common::types::Page;
use models::{knowledge_article as article, operation_log::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE}, validation};
use crate::query::{contains_ci, filled};
use crate::{context::Operator, errors::ServiceError, operation_log_service, pagination::{Pagination, SortOrder}};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ArticleQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub sort_order: Option<String>,
}

/// Categories, tags and keywords arrive as comma separated strings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ArticleInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub keywords: Option<String>,
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &ArticleQuery) -> Result<Page<article::Model>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filled(&q.search) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci((article::Entity, article::Column::Title), s))
                .add(contains_ci((article::Entity, article::Column::Author), s))
                .add(contains_ci((article::Entity, article::Column::Content), s)),
        );
    }
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = article::Entity::find()
        .filter(cond)
        .order_by(article::Column::CreatedAt, order.order())
        .order_by_asc(article::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let list = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;
    Ok(pg.page_of(total, list))
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<article::Model, ServiceError> {
    article::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("article"))
}

pub async fn create(db: &DatabaseConnection, op: &Operator, input: ArticleInput) -> Result<article::Model, ServiceError> {
    let title = validation::non_blank(input.title.as_deref()).ok_or_else(|| ServiceError::required("title"))?;
    let now = Utc::now().into();
    let saved = article::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        author: Set(validation::non_blank(input.author.as_deref())),
        content: Set(input.content.unwrap_or_default()),
        categories: Set(validation::split_csv(input.categories.as_deref())),
        tags: Set(validation::split_csv(input.tags.as_deref())),
        keywords: Set(validation::split_csv(input.keywords.as_deref())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_CREATE, "knowledge", &saved.id.to_string(), &format!("新增文章: {}", saved.title)).await;
    Ok(saved)
}

/// Full replacement of the editable fields.
pub async fn update(db: &DatabaseConnection, op: &Operator, id: Uuid, input: ArticleInput) -> Result<article::Model, ServiceError> {
    let title = validation::non_blank(input.title.as_deref()).ok_or_else(|| ServiceError::required("title"))?;
    let mut am: article::ActiveModel = get(db, id).await?.into();
    am.title = Set(title);
    am.author = Set(validation::non_blank(input.author.as_deref()));
    am.content = Set(input.content.unwrap_or_default());
    am.categories = Set(validation::split_csv(input.categories.as_deref()));
    am.tags = Set(validation::split_csv(input.tags.as_deref()));
    am.keywords = Set(validation::split_csv(input.keywords.as_deref()));
    am.updated_at = Set(Utc::now().into());
    let saved = am.update(db).await.map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_UPDATE, "knowledge", &id.to_string(), &format!("更新文章: {}", saved.title)).await;
    Ok(saved)
}

pub async fn delete(db: &DatabaseConnection, op: &Operator, id: Uuid) -> Result<(), ServiceError> {
    let res = article::Entity::delete_by_id(id).exec(db).await.map_err(ServiceError::from_db)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("article"));
    }
    operation_log_service::record_quietly(db, op, ACTION_DELETE, "knowledge", &id.to_string(), "删除文章").await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, get_db, tag};

    #[tokio::test]
    async fn csv_fields_and_search() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let op = admin();
        let t = tag();
        let a = create(&db, &op, ArticleInput {
            title: Some(format!("Rotate keys {t}")),
            content: Some("steps".into()),
            categories: Some("ops, security,".into()),
            tags: Some(" iam ".into()),
            ..Default::default()
        })
        .await?;
        assert_eq!(a.categories, vec!["ops".to_string(), "security".to_string()]);
        assert_eq!(a.tags, vec!["iam".to_string()]);
        assert!(a.keywords.is_empty());

        let page = list(&db, &ArticleQuery { search: Some(format!("ROTATE KEYS {t}")), ..Default::default() }).await?;
        assert_eq!(page.total, 1);

        assert_eq!(update(&db, &op, a.id, ArticleInput::default()).await.unwrap_err().code(), 400);
        let upd = update(&db, &op, a.id, ArticleInput { title: Some("New".into()), keywords: Some("a,b".into()), ..Default::default() }).await?;
        assert_eq!(upd.keywords.len(), 2);
        assert!(upd.categories.is_empty());

        delete(&db, &op, a.id).await?;
        assert_eq!(get(&db, a.id).await.unwrap_err().code(), 404);
        Ok(())
    }
}
