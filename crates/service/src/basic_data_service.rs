//! Reference data: cloud providers, partner BDs and credit cards.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{
    account, cloud_provider,
    credit_card::{self, validate_four_digits},
    operation_log::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE},
    partner_bd, validation,
};
use crate::crypto::{masked_last4, random_card_ref};
use crate::{context::Operator, errors::ServiceError, operation_log_service};

const STATUS_ACTIVE: &str = "active";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CloudProviderInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PartnerBdInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreditCardInput {
    pub bank_name: Option<String>,
    pub holder_name: Option<String>,
    pub first_four_digits: Option<String>,
    pub last_four_digits: Option<String>,
    pub expiration_date: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditCardView {
    pub id: Uuid,
    pub card_id: String,
    pub bank_name: String,
    pub holder_name: Option<String>,
    pub first_four_digits: String,
    pub last_four_digits: String,
    pub expiration_date: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub linked_account_count: u64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl CreditCardView {
    fn new(c: credit_card::Model, linked_account_count: u64) -> Self {
        Self {
            id: c.id,
            card_id: c.card_id,
            bank_name: c.bank_name,
            holder_name: c.holder_name,
            first_four_digits: c.first_four_digits,
            last_four_digits: c.last_four_digits,
            expiration_date: c.expiration_date,
            status: c.status,
            description: c.description,
            linked_account_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

fn now() -> DateTime<FixedOffset> { Utc::now().into() }

// ---- cloud providers ----

pub async fn list_cloud_providers(db: &DatabaseConnection) -> Result<Vec<cloud_provider::Model>, ServiceError> {
    cloud_provider::Entity::find()
        .order_by_asc(cloud_provider::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from_db)
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn create_cloud_provider(db: &DatabaseConnection, op: &Operator, input: CloudProviderInput) -> Result<cloud_provider::Model, ServiceError> {
    let name = validation::non_blank(input.name.as_deref()).ok_or_else(|| ServiceError::required("name"))?;
    let code = validation::non_blank(input.code.as_deref()).ok_or_else(|| ServiceError::required("code"))?;
    let status = cloud_provider::normalize_status(input.status.as_deref())?;
    let ts = now();
    let saved = cloud_provider::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        code: Set(code),
        status: Set(status),
        description: Set(validation::non_blank(input.description.as_deref())),
        created_at: Set(ts),
        updated_at: Set(ts),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_CREATE, "cloud_provider", &saved.id.to_string(), &format!("新增云厂商: {}", saved.name)).await;
    Ok(saved)
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn update_cloud_provider(db: &DatabaseConnection, op: &Operator, id: Uuid, input: CloudProviderInput) -> Result<cloud_provider::Model, ServiceError> {
    let existing = cloud_provider::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("cloud provider"))?;
    let mut am: cloud_provider::ActiveModel = existing.into();
    if let Some(v) = validation::non_blank(input.name.as_deref()) { am.name = Set(v); }
    if let Some(v) = validation::non_blank(input.code.as_deref()) { am.code = Set(v); }
    if input.status.is_some() { am.status = Set(cloud_provider::normalize_status(input.status.as_deref())?); }
    am.description = Set(validation::non_blank(input.description.as_deref()));
    am.updated_at = Set(now());
    let saved = am.update(db).await.map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_UPDATE, "cloud_provider", &saved.id.to_string(), &format!("更新云厂商: {}", saved.name)).await;
    Ok(saved)
}

pub async fn delete_cloud_provider(db: &DatabaseConnection, op: &Operator, id: Uuid) -> Result<(), ServiceError> {
    let res = cloud_provider::Entity::delete_by_id(id).exec(db).await.map_err(ServiceError::from_db)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("cloud provider"));
    }
    operation_log_service::record_quietly(db, op, ACTION_DELETE, "cloud_provider", &id.to_string(), "删除云厂商").await;
    Ok(())
}

// ---- partner BDs ----

pub async fn list_partner_bds(db: &DatabaseConnection) -> Result<Vec<partner_bd::Model>, ServiceError> {
    partner_bd::Entity::find()
        .order_by_asc(partner_bd::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from_db)
}

pub async fn create_partner_bd(db: &DatabaseConnection, op: &Operator, input: PartnerBdInput) -> Result<partner_bd::Model, ServiceError> {
    let name = validation::non_blank(input.name.as_deref()).ok_or_else(|| ServiceError::required("name"))?;
    let email = validation::non_blank(input.email.as_deref());
    if let Some(e) = &email {
        validation::validate_email(e)?;
    }
    let ts = now();
    let saved = partner_bd::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        phone: Set(validation::non_blank(input.phone.as_deref())),
        status: Set(validation::non_blank(input.status.as_deref()).unwrap_or_else(|| STATUS_ACTIVE.into())),
        description: Set(validation::non_blank(input.description.as_deref())),
        created_at: Set(ts),
        updated_at: Set(ts),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_CREATE, "partner_bd", &saved.id.to_string(), &format!("新增 BD: {}", saved.name)).await;
    Ok(saved)
}

pub async fn update_partner_bd(db: &DatabaseConnection, op: &Operator, id: Uuid, input: PartnerBdInput) -> Result<partner_bd::Model, ServiceError> {
    let existing = partner_bd::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("partner bd"))?;
    let mut am: partner_bd::ActiveModel = existing.into();
    if let Some(v) = validation::non_blank(input.name.as_deref()) { am.name = Set(v); }
    let email = validation::non_blank(input.email.as_deref());
    if let Some(e) = &email {
        validation::validate_email(e)?;
    }
    am.email = Set(email);
    am.phone = Set(validation::non_blank(input.phone.as_deref()));
    if let Some(v) = validation::non_blank(input.status.as_deref()) { am.status = Set(v); }
    am.description = Set(validation::non_blank(input.description.as_deref()));
    am.updated_at = Set(now());
    let saved = am.update(db).await.map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_UPDATE, "partner_bd", &saved.id.to_string(), &format!("更新 BD: {}", saved.name)).await;
    Ok(saved)
}

pub async fn delete_partner_bd(db: &DatabaseConnection, op: &Operator, id: Uuid) -> Result<(), ServiceError> {
    let res = partner_bd::Entity::delete_by_id(id).exec(db).await.map_err(ServiceError::from_db)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("partner bd"));
    }
    operation_log_service::record_quietly(db, op, ACTION_DELETE, "partner_bd", &id.to_string(), "删除 BD").await;
    Ok(())
}

// ---- credit cards ----

/// Cards with the number of accounts whose masked card ends in the same four digits.
pub async fn list_credit_cards(db: &DatabaseConnection) -> Result<Vec<CreditCardView>, ServiceError> {
    let cards = credit_card::Entity::find()
        .order_by_asc(credit_card::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from_db)?;
    let masks: Vec<String> = cards.iter().map(|c| masked_last4(&c.last_four_digits)).collect();
    let counts: HashMap<String, i64> = account::Entity::find()
        .select_only()
        .column(account::Column::BoundCreditCardMasked)
        .column_as(Expr::col(account::Column::Id).count(), "n")
        .filter(account::Column::BoundCreditCardMasked.is_in(masks))
        .group_by(account::Column::BoundCreditCardMasked)
        .into_tuple::<(Option<String>, i64)>()
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .filter_map(|(m, n)| m.map(|m| (m, n)))
        .collect();
    Ok(cards
        .into_iter()
        .map(|c| {
            let n = counts.get(&masked_last4(&c.last_four_digits)).copied().unwrap_or(0).max(0) as u64;
            CreditCardView::new(c, n)
        })
        .collect())
}

fn required_digits(field: &str, v: Option<&str>) -> Result<String, ServiceError> {
    let d = validation::non_blank(v).ok_or_else(|| ServiceError::required(field))?;
    validate_four_digits(field, &d)?;
    Ok(d)
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn create_credit_card(db: &DatabaseConnection, op: &Operator, input: CreditCardInput) -> Result<CreditCardView, ServiceError> {
    let bank_name = validation::non_blank(input.bank_name.as_deref()).ok_or_else(|| ServiceError::required("bank_name"))?;
    let first = required_digits("first_four_digits", input.first_four_digits.as_deref())?;
    let last = required_digits("last_four_digits", input.last_four_digits.as_deref())?;
    let ts = now();
    let saved = credit_card::ActiveModel {
        id: Set(Uuid::new_v4()),
        card_id: Set(random_card_ref()),
        bank_name: Set(bank_name),
        holder_name: Set(validation::non_blank(input.holder_name.as_deref())),
        first_four_digits: Set(first),
        last_four_digits: Set(last),
        expiration_date: Set(validation::non_blank(input.expiration_date.as_deref())),
        status: Set(validation::non_blank(input.status.as_deref()).unwrap_or_else(|| STATUS_ACTIVE.into())),
        description: Set(validation::non_blank(input.description.as_deref())),
        created_at: Set(ts),
        updated_at: Set(ts),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)?;
    info!(card_id = %saved.card_id, "credit card stored");
    operation_log_service::record_quietly(db, op, ACTION_CREATE, "credit_card", &saved.card_id, &format!("新增信用卡: {}", masked_last4(&saved.last_four_digits))).await;
    Ok(CreditCardView::new(saved, 0))
}

pub async fn update_credit_card(db: &DatabaseConnection, op: &Operator, id: Uuid, input: CreditCardInput) -> Result<CreditCardView, ServiceError> {
    let existing = credit_card::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("credit card"))?;
    let mut am: credit_card::ActiveModel = existing.into();
    if let Some(v) = validation::non_blank(input.bank_name.as_deref()) { am.bank_name = Set(v); }
    if input.first_four_digits.is_some() { am.first_four_digits = Set(required_digits("first_four_digits", input.first_four_digits.as_deref())?); }
    if input.last_four_digits.is_some() { am.last_four_digits = Set(required_digits("last_four_digits", input.last_four_digits.as_deref())?); }
    am.holder_name = Set(validation::non_blank(input.holder_name.as_deref()));
    am.expiration_date = Set(validation::non_blank(input.expiration_date.as_deref()));
    if let Some(v) = validation::non_blank(input.status.as_deref()) { am.status = Set(v); }
    am.description = Set(validation::non_blank(input.description.as_deref()));
    am.updated_at = Set(now());
    let saved = am.update(db).await.map_err(ServiceError::from_db)?;
    let linked = account::Entity::find()
        .filter(account::Column::BoundCreditCardMasked.eq(masked_last4(&saved.last_four_digits)))
        .count(db)
        .await
        .map_err(ServiceError::from_db)?;
    operation_log_service::record_quietly(db, op, ACTION_UPDATE, "credit_card", &saved.card_id, "更新信用卡").await;
    Ok(CreditCardView::new(saved, linked))
}

pub async fn delete_credit_card(db: &DatabaseConnection, op: &Operator, id: Uuid) -> Result<(), ServiceError> {
    let res = credit_card::Entity::delete_by_id(id).exec(db).await.map_err(ServiceError::from_db)?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("credit card"));
    }
    operation_log_service::record_quietly(db, op, ACTION_DELETE, "credit_card", &id.to_string(), "删除信用卡").await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, get_db, tag};

    #[tokio::test]
    async fn provider_crud_and_missing_ids() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let op = admin();
        let t = tag();
        let p = create_cloud_provider(&db, &op, CloudProviderInput { name: Some(format!("GCP {t}")), code: Some(format!("gcp_{t}")), ..Default::default() }).await?;
        assert_eq!(p.status, "Enabled");
        let upd = update_cloud_provider(&db, &op, p.id, CloudProviderInput { status: Some("disabled".into()), ..Default::default() }).await?;
        assert_eq!(upd.status, "Disabled");
        assert_eq!(upd.name, p.name);
        assert!(create_cloud_provider(&db, &op, CloudProviderInput { name: Some(format!("GCP {t}")), code: Some(format!("x_{t}")), ..Default::default() }).await.is_err());
        delete_cloud_provider(&db, &op, p.id).await?;
        assert_eq!(delete_cloud_provider(&db, &op, p.id).await.unwrap_err().code(), 404);
        assert_eq!(update_partner_bd(&db, &op, Uuid::new_v4(), PartnerBdInput::default()).await.unwrap_err().code(), 404);
        Ok(())
    }

    #[tokio::test]
    async fn credit_card_reference_and_validation() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let op = admin();
        let bad = CreditCardInput { bank_name: Some("Bank".into()), first_four_digits: Some("41".into()), last_four_digits: Some("1234".into()), ..Default::default() };
        assert_eq!(create_credit_card(&db, &op, bad).await.unwrap_err().code(), 400);
        let card = create_credit_card(&db, &op, CreditCardInput {
            bank_name: Some(format!("Bank {}", tag())),
            first_four_digits: Some("4111".into()),
            last_four_digits: Some("9876".into()),
            ..Default::default()
        })
        .await?;
        assert_eq!(card.card_id.len(), 8);
        assert_eq!(card.status, "active");
        let listed = list_credit_cards(&db).await?;
        assert!(listed.iter().any(|c| c.id == card.id));
        delete_credit_card(&db, &op, card.id).await?;
        Ok(())
    }
}
