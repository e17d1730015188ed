#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};

use crate::context::Operator;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_init(|| async {
            let db = connect_with_config(&DatabaseConfig::from_env()).await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
            drop(db);
        })
        .await;

    // Return a fresh connection for the current test's runtime
    let mut cfg = DatabaseConfig::from_env();
    cfg.max_connections = cfg.max_connections.max(20);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    let db = connect_with_config(&cfg).await?;
    Ok(db)
}

pub fn admin() -> Operator {
    Operator {
        user_id: None,
        email: "tester@example.com".into(),
        name: "Tester".into(),
        role: "admin".into(),
        permissions: vec![],
    }
}

/// Short random token for unique test data.
pub fn tag() -> String { uuid::Uuid::new_v4().simple().to_string()[..10].to_string() }

/// Random twelve-digit uid.
pub fn aws_uid() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 1_000_000_000_000;
    format!("{n:012}")
}

/// Insert a bare account row, bypassing the account rules.
pub async fn insert_account(
    db: &DatabaseConnection,
    uid: &str,
    vendor: Option<&str>,
    cost_discount: Option<f64>,
    customer_id: Option<uuid::Uuid>,
) -> Result<models::account::Model, anyhow::Error> {
    use sea_orm::{ActiveModelTrait, Set};
    let now = chrono::Utc::now().into();
    let acc = models::account::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        account_internal_id: Set(format!("acc_test_{}", tag())),
        uid: Set(uid.to_string()),
        account_name: Set(format!("Account {uid}")),
        vendor: Set(vendor.map(str::to_string)),
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
        risk_discount: Set(None),
        cost_discount: Set(cost_discount),
        bd_name: Set(None),
        remarks: Set(None),
        is_submitted: Set(false),
        is_new: Set(true),
        labels: Set(vec![]),
        payer_id: Set(None),
        customer_id: Set(customer_id),
        linked_email_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(acc)
}

/// Insert an active customer with a unique name.
pub async fn insert_customer(db: &DatabaseConnection, name_prefix: &str) -> Result<models::customer::Model, anyhow::Error> {
    use sea_orm::{ActiveModelTrait, Set};
    let now = chrono::Utc::now().into();
    let t = tag();
    let c = models::customer::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        customer_internal_id: Set(format!("cus_test_{t}")),
        customer_name: Set(format!("{name_prefix} {t}")),
        email: Set(format!("c_{t}@example.com")),
        payer_id: Set(None),
        permissions: Set(vec![]),
        original_billing_percentage: Set(Some(100.0)),
        products_used: Set(vec![]),
        delivery_time: Set(None),
        company: Set(None),
        status: Set(models::customer::STATUS_ACTIVE.into()),
        labels: Set(vec![]),
        remarks: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(c)
}
