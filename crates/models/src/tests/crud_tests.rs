use anyhow::Result;
use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::db::connect;
use crate::{account, customer, customer_uid, errors::ModelError, operation_log, payer, user, user_credentials};

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn new_payer<C: sea_orm::ConnectionTrait>(db: &C) -> Result<payer::Model> {
    let now = Utc::now().into();
    let s = suffix();
    let p = payer::ActiveModel {
        id: Set(Uuid::new_v4()),
        payer_internal_id: Set(format!("payer_test_{s}")),
        payer_name: Set(format!("Payer {s}")),
        payer_id: Set(format!("P{s}")),
        signin_url: Set(None),
        iam_username: Set(None),
        password_hash: Set(None),
        contact_email: Set(None),
        remarks: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(p)
}

/// payer -> account relation and text[] labels round trip
#[tokio::test]
async fn test_payer_account_relation() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let p = new_payer(&db).await?;
    let now = Utc::now().into();
    let s = suffix();
    let a = account::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_internal_id: Set(format!("acc_test_{s}")),
        uid: Set(format!("U{s}")),
        account_name: Set("relation test".into()),
        vendor: Set(Some("AWS".into())),
        account_category: Set(None),
        account_source: Set(None),
        account_attribution: Set(None),
        monitor_email: Set(None),
        monitor_url: Set(None),
        mfa_status: Set(None),
        is_monitored_sp: Set(false),
        monitor_bill_group: Set(None),
        send_po: Set(false),
        bound_credit_card_encrypted: Set(None),
        bound_credit_card_masked: Set(None),
        bound_email: Set(None),
        risk_discount: Set(Some(5.0)),
        cost_discount: Set(Some(10.0)),
        bd_name: Set(None),
        remarks: Set(None),
        is_submitted: Set(false),
        is_new: Set(true),
        labels: Set(vec!["vip".into(), "cn".into()]),
        payer_id: Set(Some(p.id)),
        customer_id: Set(None),
        linked_email_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await?;

    let accounts = p.find_related(account::Entity).all(&db).await?;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].labels, vec!["vip".to_string(), "cn".to_string()]);

    let (_, owner) = account::Entity::find_by_id(a.id)
        .find_also_related(payer::Entity)
        .one(&db)
        .await?
        .expect("account exists");
    assert_eq!(owner.map(|o| o.id), Some(p.id));

    // FK is SET NULL on payer delete
    payer::Entity::delete_by_id(p.id).exec(&db).await?;
    let after = account::Entity::find_by_id(a.id).one(&db).await?.expect("account kept");
    assert!(after.payer_id.is_none());
    account::Entity::delete_by_id(a.id).exec(&db).await?;
    Ok(())
}

/// customer uids cascade with their customer
#[tokio::test]
async fn test_customer_uid_cascade() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let now = Utc::now().into();
    let s = suffix();
    let c = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_internal_id: Set(format!("cus_test_{s}")),
        customer_name: Set(format!("Customer {s}")),
        email: Set(format!("c_{s}@example.com")),
        payer_id: Set(None),
        permissions: Set(vec![]),
        original_billing_percentage: Set(Some(90.0)),
        products_used: Set(vec!["EC2".into()]),
        delivery_time: Set(None),
        company: Set(None),
        status: Set(customer::STATUS_ACTIVE.into()),
        labels: Set(vec![]),
        remarks: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await?;
    customer_uid::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(c.id),
        uid: Set("123456789012".into()),
        uid_type: Set("AWS".into()),
        is_primary: Set(true),
        description: Set(None),
        created_at: Set(now),
    }
    .insert(&db)
    .await?;

    assert_eq!(c.find_related(customer_uid::Entity).all(&db).await?.len(), 1);
    customer::Entity::delete_by_id(c.id).exec(&db).await?;
    let left = customer_uid::Entity::find()
        .filter(customer_uid::Column::CustomerId.eq(c.id))
        .all(&db)
        .await?;
    assert!(left.is_empty());
    Ok(())
}

/// duplicate user email surfaces as a conflict; credentials upsert in place
#[tokio::test]
async fn test_user_and_credentials() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;

    let email = format!("model_{}@example.com", suffix());
    let u = user::create(&db, &email, "Model User", user::ROLE_USER, user::STATUS_ACTIVE, vec![]).await?;
    let dup = user::create(&db, &email, "Again", user::ROLE_USER, user::STATUS_ACTIVE, vec![]).await;
    assert!(matches!(dup, Err(ModelError::Conflict(_))));

    let first = user_credentials::upsert_password(&db, u.id, "hash-1".into(), "argon2").await?;
    let second = user_credentials::upsert_password(&db, u.id, "hash-2".into(), "argon2").await?;
    assert_eq!(first.id, second.id);
    assert_eq!(second.password_hash, "hash-2");

    let log = operation_log::insert(&db, Some(&email), Some("Model User"), operation_log::ACTION_CREATE, "user", Some(&u.id.to_string()), Some("created")).await?;
    assert_eq!(log.action, "CREATE");

    operation_log::Entity::delete_by_id(log.id).exec(&db).await?;
    user::Entity::delete_by_id(u.id).exec(&db).await?;
    Ok(())
}
