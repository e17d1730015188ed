use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::{account, customer, email, operation_log::{ACTION_CREATE, ACTION_UPDATE}, payer, validation};
use super::links::{link_email_to_account, require_active_customer, require_payer, resolve_email};
use super::rules::{self, candidate_address, card_update, monitor_url_for_update, validate_new};
use super::{AccountCreated, AccountDetail, AccountInput, AccountQuery, AccountRow, CustomerRef, EmailRef, PayerRef};
use crate::crypto::{mask_card, CardCipher};
use crate::internal_id::{next_internal_id, IdKind};
use crate::query::{array_contains, contains_ci, filled};
use crate::{context::Operator, errors::ServiceError, operation_log_service, pagination::{Pagination, SortOrder}};
use crate::payer_service::PayerSummary;

fn require_manage(op: &Operator) -> Result<(), ServiceError> {
    if !op.can_manage_accounts() {
        return Err(ServiceError::Forbidden("无账号管理权限".into()));
    }
    Ok(())
}

fn list_condition(q: &AccountQuery) -> Condition {
    let mut cond = Condition::all();
    if let Some(s) = filled(&q.search) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci((account::Entity, account::Column::AccountName), s))
                .add(contains_ci((account::Entity, account::Column::Uid), s))
                .add(contains_ci((account::Entity, account::Column::AccountInternalId), s)),
        );
    }
    if let Some(v) = filled(&q.vendor) {
        cond = cond.add(account::Column::Vendor.eq(v));
    }
    if let Some(c) = filled(&q.account_type).or(filled(&q.account_category)) {
        cond = cond.add(account::Column::AccountCategory.eq(c));
    }
    if let Some(src) = filled(&q.account_source) {
        cond = cond.add(account::Column::AccountSource.eq(src));
    }
    if let Some(label) = filled(&q.label) {
        cond = cond.add(array_contains("\"account\".\"labels\"", label));
    }
    cond
}

async fn rows_page(db: &DatabaseConnection, q: &AccountQuery, extra: Condition) -> Result<Page<AccountRow>, ServiceError> {
    let sort_col = match q.sort_by.as_deref().map(str::trim) {
        Some("account_name") => account::Column::AccountName,
        Some("uid") => account::Column::Uid,
        Some("account_internal_id") => account::Column::AccountInternalId,
        _ => account::Column::CreatedAt,
    };
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = account::Entity::find()
        .filter(list_condition(q).add(extra))
        .order_by(sort_col, order.order())
        .order_by_asc(account::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let accounts = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;

    let payer_ids: Vec<Uuid> = accounts.iter().filter_map(|a| a.payer_id).collect();
    let customer_ids: Vec<Uuid> = accounts.iter().filter_map(|a| a.customer_id).collect();
    let payers: HashMap<Uuid, payer::Model> = payer::Entity::find()
        .filter(payer::Column::Id.is_in(payer_ids))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let customers: HashMap<Uuid, customer::Model> = customer::Entity::find()
        .filter(customer::Column::Id.is_in(customer_ids))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let list = accounts
        .into_iter()
        .map(|a| {
            let payer = a.payer_id.and_then(|id| payers.get(&id)).map(|p| PayerRef {
                payer_id: p.payer_internal_id.clone(),
                payer_name: p.payer_name.clone(),
            });
            let customer = a.customer_id.and_then(|id| customers.get(&id)).map(|c| CustomerRef {
                customer_id: c.customer_internal_id.clone(),
                customer_name: c.customer_name.clone(),
            });
            let is_monitored_sp = a.is_sp();
            AccountRow {
                account_internal_id: a.account_internal_id,
                uid: a.uid,
                account_name: a.account_name,
                vendor: a.vendor,
                account_type: a.account_category.clone(),
                account_category: a.account_category,
                account_source: a.account_source,
                is_submitted: a.is_submitted,
                is_monitored_sp,
                labels: a.labels,
                created_at: a.created_at,
                payer,
                customer,
            }
        })
        .collect();
    Ok(pg.page_of(total, list))
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &AccountQuery) -> Result<Page<AccountRow>, ServiceError> {
    rows_page(db, q, Condition::all()).await
}

/// Accounts monitored for the service provider.
#[instrument(skip(db))]
pub async fn sp_list(db: &DatabaseConnection, q: &AccountQuery) -> Result<Page<AccountRow>, ServiceError> {
    let sp = Condition::any()
        .add(account::Column::IsMonitoredSp.eq(true))
        .add(account::Column::AccountCategory.eq(account::CATEGORY_SP));
    rows_page(db, q, Condition::all().add(sp)).await
}

async fn build_detail<C: ConnectionTrait>(db: &C, a: account::Model) -> Result<AccountDetail, ServiceError> {
    let payer = match a.payer_id {
        Some(id) => payer::Entity::find_by_id(id).one(db).await.map_err(ServiceError::from_db)?,
        None => None,
    };
    let customer = match a.customer_id {
        Some(id) => customer::Entity::find_by_id(id).one(db).await.map_err(ServiceError::from_db)?,
        None => None,
    };
    let email = match a.linked_email_id {
        Some(id) => email::Entity::find_by_id(id).one(db).await.map_err(ServiceError::from_db)?,
        None => None,
    };
    let (vendor, account_type) = a.display_vendor_category();
    let is_monitored_sp = a.is_sp();
    Ok(AccountDetail {
        account_internal_id: a.account_internal_id,
        uid: a.uid,
        account_name: a.account_name,
        vendor,
        account_type,
        account_category: a.account_category,
        mfa_status: a.mfa_status,
        account_source: a.account_source,
        account_attribution: a.account_attribution,
        monitor_email: a.monitor_email,
        monitor_url: a.monitor_url,
        is_monitored_sp,
        monitor_bill_group: a.monitor_bill_group,
        send_po: a.send_po,
        bound_credit_card: a.bound_credit_card_masked,
        bound_email: a.bound_email,
        risk_discount: a.risk_discount,
        cost_discount: a.cost_discount,
        bd_name: a.bd_name,
        remarks: a.remarks,
        is_submitted: a.is_submitted,
        is_new: a.is_new,
        labels: a.labels,
        created_at: a.created_at,
        payer: payer.as_ref().map(PayerSummary::from),
        customer: customer.map(|c| CustomerRef { customer_id: c.customer_internal_id, customer_name: c.customer_name }),
        email: email.map(|e| EmailRef { email_id: e.email_internal_id, email_address: e.email_address }),
    })
}

/// Detail by internal id, falling back to uid.
pub async fn detail(db: &DatabaseConnection, account_id: Option<&str>, uid: Option<&str>) -> Result<AccountDetail, ServiceError> {
    let account_id = account_id.map(str::trim).filter(|s| !s.is_empty());
    let uid = uid.map(str::trim).filter(|s| !s.is_empty());
    let found = match (account_id, uid) {
        (Some(id), _) => account::Entity::find().filter(account::Column::AccountInternalId.eq(id)).one(db).await,
        (None, Some(uid)) => account::Entity::find().filter(account::Column::Uid.eq(uid)).one(db).await,
        (None, None) => return Err(ServiceError::Validation("account_id 或 uid 必填其一".into())),
    }
    .map_err(ServiceError::from_db)?
    .ok_or_else(|| ServiceError::NotFound("账号不存在".into()))?;
    build_detail(db, found).await
}

#[instrument(skip(db, cipher, op, input), fields(operator = %op.email))]
pub async fn add_account(db: &DatabaseConnection, cipher: &CardCipher, op: &Operator, input: AccountInput) -> Result<AccountCreated, ServiceError> {
    require_manage(op)?;
    let new = validate_new(&input)?;

    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let exists = account::Entity::find()
        .filter(account::Column::Uid.eq(new.uid.as_str()))
        .count(&txn)
        .await
        .map_err(ServiceError::from_db)?;
    if exists > 0 {
        return Err(ServiceError::UidExists("UID 已存在".into()));
    }
    let payer = require_payer(&txn, &new.payer_key).await?;
    let customer = match validation::non_blank(input.customer_id.as_deref()) {
        Some(cid) => Some(require_active_customer(&txn, &cid).await?),
        None => None,
    };
    let mailbox = resolve_email(
        &txn,
        input.email_id.as_deref(),
        candidate_address(&input).as_deref(),
        Some(payer.id),
        &new.uid,
        None,
    )
    .await?;

    let internal_id = next_internal_id::<account::Entity, _>(&txn, account::Column::AccountInternalId, IdKind::Account).await?;
    let now = Utc::now().into();
    let saved = account::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_internal_id: Set(internal_id),
        uid: Set(new.uid.clone()),
        account_name: Set(new.account_name.clone()),
        vendor: Set(Some(new.vendor.clone())),
        account_category: Set(Some(new.category.clone())),
        account_source: Set(Some(new.account_source.clone())),
        account_attribution: Set(Some(new.account_attribution.clone())),
        monitor_email: Set(Some(new.monitor_email.clone())),
        monitor_url: Set(Some(new.monitor_url.clone())),
        mfa_status: Set(validation::non_blank(input.mfa_status.as_deref())),
        is_monitored_sp: Set(new.is_monitored_sp),
        monitor_bill_group: Set(Some(new.monitor_bill_group.clone())),
        send_po: Set(input.send_po.unwrap_or(false)),
        bound_credit_card_encrypted: Set(Some(cipher.encrypt(&new.bound_credit_card)?)),
        bound_credit_card_masked: Set(Some(mask_card(&new.bound_credit_card))),
        bound_email: Set(Some(new.bound_email.clone())),
        risk_discount: Set(Some(new.risk_discount)),
        cost_discount: Set(Some(new.cost_discount)),
        bd_name: Set(validation::non_blank(input.bd_name.as_deref())),
        remarks: Set(validation::non_blank(input.remarks.as_deref())),
        is_submitted: Set(input.is_submitted.unwrap_or(false)),
        is_new: Set(input.is_new.unwrap_or(true)),
        labels: Set(input.labels.clone().unwrap_or_default()),
        payer_id: Set(Some(payer.id)),
        customer_id: Set(customer.as_ref().map(|c| c.id)),
        linked_email_id: Set(mailbox.as_ref().map(|e| e.id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(ServiceError::from_db)?;

    let mailbox = match mailbox {
        Some(e) => Some(link_email_to_account(&txn, e, &saved).await?),
        None => None,
    };
    operation_log_service::record(&txn, op, ACTION_CREATE, "account", &saved.account_internal_id, &format!("新增账号: {}", saved.account_name)).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(account_internal_id = %saved.account_internal_id, uid = %saved.uid, "account created");

    Ok(AccountCreated {
        account_id: saved.account_internal_id,
        uid: saved.uid,
        account_name: saved.account_name,
        vendor: saved.vendor,
        account_type: saved.account_category.clone(),
        account_category: saved.account_category,
        mfa_status: saved.mfa_status,
        account_source: saved.account_source,
        account_attribution: saved.account_attribution,
        is_monitored_sp: saved.is_monitored_sp,
        is_new: saved.is_new,
        monitor_bill_group: saved.monitor_bill_group,
        send_po: saved.send_po,
        bound_credit_card: saved.bound_credit_card_masked,
        bound_email: saved.bound_email,
        monitor_email: saved.monitor_email,
        monitor_url: saved.monitor_url,
        risk_discount: saved.risk_discount,
        cost_discount: saved.cost_discount,
        remarks: saved.remarks,
        is_submitted: saved.is_submitted,
        payer_id: payer.payer_internal_id,
        payer_name: payer.payer_name,
        customer_id: customer.as_ref().map(|c| c.customer_internal_id.clone()),
        customer_name: customer.map(|c| c.customer_name),
        email_id: mailbox.as_ref().map(|e| e.email_internal_id.clone()),
        email_address: mailbox.map(|e| e.email_address),
        created_at: saved.created_at,
    })
}

#[instrument(skip(db, cipher, op, input), fields(operator = %op.email))]
pub async fn update_account(db: &DatabaseConnection, cipher: &CardCipher, op: &Operator, uid: &str, input: AccountInput) -> Result<AccountDetail, ServiceError> {
    require_manage(op)?;
    let uid = uid.trim();
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let existing = account::Entity::find()
        .filter(account::Column::Uid.eq(uid))
        .one(&txn)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::NotFound("账号不存在".into()))?;

    let text = |v: &Option<String>| validation::non_blank(v.as_deref());
    let mut payer_id = existing.payer_id;
    let stored_url = existing.monitor_url.clone();
    let new_category = validation::non_blank(input.account_type.as_deref());
    let category_is_sp = new_category
        .clone()
        .or_else(|| existing.account_category.clone())
        .map(|c| rules::is_sp_category(&c))
        .unwrap_or(false);
    let current_payer = match existing.payer_id {
        Some(id) => payer::Entity::find_by_id(id).one(&txn).await.map_err(ServiceError::from_db)?,
        None => None,
    };
    let current_customer = match existing.customer_id {
        Some(id) => customer::Entity::find_by_id(id).one(&txn).await.map_err(ServiceError::from_db)?,
        None => None,
    };
    let mut am: account::ActiveModel = existing.into();

    if let Some(v) = text(&input.monitor_email) { am.monitor_email = Set(Some(v)); }
    if let Some(url) = monitor_url_for_update(uid, input.monitor_url.as_deref(), stored_url.as_deref()) {
        am.monitor_url = Set(Some(url));
    }
    if let Some(v) = text(&input.account_name) { am.account_name = Set(v); }
    if let Some(v) = text(&input.vendor) { am.vendor = Set(Some(v)); }
    if let Some(v) = new_category {
        am.account_category = Set(Some(v));
    }
    if let Some(v) = text(&input.mfa_status) { am.mfa_status = Set(Some(v)); }
    if let Some(v) = text(&input.account_source) { am.account_source = Set(Some(v)); }
    if let Some(v) = text(&input.account_attribution) { am.account_attribution = Set(Some(v)); }
    if let Some(v) = text(&input.bd_name) { am.bd_name = Set(Some(v)); }
    match input.is_monitored_sp {
        Some(flag) => am.is_monitored_sp = Set(flag || category_is_sp),
        None if category_is_sp => am.is_monitored_sp = Set(true),
        None => {}
    }
    if let Some(v) = text(&input.monitor_bill_group) { am.monitor_bill_group = Set(Some(v)); }
    if let Some(v) = input.send_po { am.send_po = Set(v); }
    if let Some(v) = text(&input.bound_email) { am.bound_email = Set(Some(v)); }
    if let Some(v) = input.risk_discount {
        validation::validate_percentage("risk_discount", v)?;
        am.risk_discount = Set(Some(v));
    }
    if let Some(v) = input.cost_discount {
        validation::validate_percentage("cost_discount", v)?;
        am.cost_discount = Set(Some(v));
    }
    if let Some(v) = input.remarks.clone() { am.remarks = Set(validation::non_blank(Some(&v))); }
    if let Some(v) = input.is_submitted { am.is_submitted = Set(v); }
    if let Some(v) = input.is_new { am.is_new = Set(v); }
    if let Some(v) = input.labels.clone() { am.labels = Set(v); }
    if let Some(card) = card_update(input.bound_credit_card.as_deref()) {
        am.bound_credit_card_encrypted = Set(Some(cipher.encrypt(&card)?));
        am.bound_credit_card_masked = Set(Some(mask_card(&card)));
    }

    if let Some(key) = text(&input.payer_id) {
        let same = current_payer.as_ref().map(|p| p.payer_internal_id == key).unwrap_or(false);
        if !same {
            let p = require_payer(&txn, &key).await?;
            payer_id = Some(p.id);
            am.payer_id = Set(Some(p.id));
        }
    }
    if let Some(cid) = text(&input.customer_id) {
        let same = current_customer.as_ref().map(|c| c.customer_internal_id == cid).unwrap_or(false);
        if !same {
            let c = require_active_customer(&txn, &cid).await?;
            am.customer_id = Set(Some(c.id));
        }
    }
    let mailbox = resolve_email(&txn, input.email_id.as_deref(), candidate_address(&input).as_deref(), payer_id, uid, Some(uid)).await?;
    if let Some(e) = &mailbox {
        am.linked_email_id = Set(Some(e.id));
    }

    am.updated_at = Set(Utc::now().into());
    let saved = am.update(&txn).await.map_err(ServiceError::from_db)?;
    if let Some(e) = mailbox {
        link_email_to_account(&txn, e, &saved).await?;
    }
    operation_log_service::record(&txn, op, ACTION_UPDATE, "account", &saved.account_internal_id, &format!("更新账号: {}", saved.account_name)).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(account_internal_id = %saved.account_internal_id, "account updated");
    build_detail(db, saved).await
}
