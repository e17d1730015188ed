//! One-off data fixes applied at startup.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

use models::{account, cloud_provider};
use crate::errors::ServiceError;

/// Remove the pseudo vendor `Customer Account` from the provider list.
pub async fn remove_legacy_provider(db: &DatabaseConnection) -> Result<u64, ServiceError> {
    let res = cloud_provider::Entity::delete_many()
        .filter(cloud_provider::Column::Name.eq(account::LEGACY_CUSTOMER_ACCOUNT))
        .exec(db)
        .await
        .map_err(ServiceError::from_db)?;
    if res.rows_affected > 0 {
        info!(removed = res.rows_affected, "legacy cloud provider removed");
    }
    Ok(res.rows_affected)
}

/// Corrected (vendor, category) for a legacy account, or `None` when nothing changes.
pub fn legacy_fix(acc: &account::Model) -> Option<(Option<String>, Option<String>)> {
    if acc.vendor.as_deref() != Some(account::LEGACY_CUSTOMER_ACCOUNT) {
        return None;
    }
    let (vendor, category) = acc.display_vendor_category();
    let category = category.filter(|c| !c.trim().is_empty()).or_else(|| Some(account::LEGACY_CUSTOMER_ACCOUNT.to_string()));
    if vendor == acc.vendor && category == acc.account_category {
        return None;
    }
    Some((vendor, category))
}

/// Rewrite accounts still carrying `Customer Account` as their vendor.
pub async fn migrate_legacy_accounts(db: &DatabaseConnection) -> Result<u64, ServiceError> {
    let legacy = account::Entity::find()
        .filter(account::Column::Vendor.eq(account::LEGACY_CUSTOMER_ACCOUNT))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?;
    let mut fixed = 0;
    for acc in legacy {
        if let Some((vendor, category)) = legacy_fix(&acc) {
            let mut am: account::ActiveModel = acc.into();
            am.vendor = Set(vendor);
            am.account_category = Set(category);
            am.update(db).await.map_err(ServiceError::from_db)?;
            fixed += 1;
        }
    }
    if fixed > 0 {
        info!(fixed, "legacy accounts migrated");
    }
    Ok(fixed)
}

pub async fn run(db: &DatabaseConnection) -> Result<(), ServiceError> {
    remove_legacy_provider(db).await?;
    migrate_legacy_accounts(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{aws_uid, get_db, insert_account};

    #[tokio::test]
    async fn legacy_accounts_get_real_vendor() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let aws = insert_account(&db, &aws_uid(), Some(account::LEGACY_CUSTOMER_ACCOUNT), None, None).await?;
        let other = insert_account(&db, &format!("az-{}", aws_uid()), Some(account::LEGACY_CUSTOMER_ACCOUNT), None, None).await?;

        assert!(legacy_fix(&aws).is_some());
        migrate_legacy_accounts(&db).await?;

        let aws = account::Entity::find_by_id(aws.id).one(&db).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(aws.vendor.as_deref(), Some("AWS"));
        assert_eq!(aws.account_category.as_deref(), Some(account::LEGACY_CUSTOMER_ACCOUNT));
        let other = account::Entity::find_by_id(other.id).one(&db).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(other.vendor.as_deref(), Some(account::LEGACY_CUSTOMER_ACCOUNT));
        assert_eq!(other.account_category.as_deref(), Some(account::LEGACY_CUSTOMER_ACCOUNT));
        assert!(legacy_fix(&other).is_none());

        account::Entity::delete_many().filter(account::Column::Id.is_in([aws.id, other.id])).exec(&db).await?;
        Ok(())
    }
}
