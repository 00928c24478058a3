//! Named settings store for external-service configuration.
//!
//! Values are arbitrary JSON, keyed by a unique name.

use crate::{
    entities::{Setting, setting},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

fn check_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("setting name is required"));
    }
    Ok(name)
}

/// Reads one setting.
pub async fn get_setting(db: &DatabaseConnection, name: &str) -> Result<setting::Model> {
    Setting::find()
        .filter(setting::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Setting", name))
}

/// Creates or replaces a setting.
pub async fn set_setting(db: &DatabaseConnection, name: &str, value: Json) -> Result<setting::Model> {
    let name = check_name(name)?;
    let now = Utc::now();
    let existing = Setting::find()
        .filter(setting::Column::Name.eq(name))
        .one(db)
        .await?;
    let saved = match existing {
        Some(found) => {
            let mut active: setting::ActiveModel = found.into();
            active.key_value = Set(value);
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            setting::ActiveModel {
                name: Set(name.to_string()),
                key_value: Set(value),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    info!(name, "Setting saved");
    Ok(saved)
}

/// All settings by name.
pub async fn list_settings(db: &DatabaseConnection) -> Result<Vec<setting::Model>> {
    Setting::find()
        .order_by_asc(setting::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a setting.
pub async fn delete_setting(db: &DatabaseConnection, name: &str) -> Result<()> {
    let result = Setting::delete_many()
        .filter(setting::Column::Name.eq(name))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Setting", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_is_upsert() -> Result<()> {
        let db = setup_test_db().await?;
        let first = set_setting(&db, "payment", json!({"clientId": "abc"})).await?;
        let second = set_setting(&db, "payment", json!({"clientId": "xyz"})).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(get_setting(&db, "payment").await?.key_value["clientId"], "xyz");
        assert_eq!(list_settings(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_missing() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, "smtp", json!({"host": "mail"})).await?;
        delete_setting(&db, "smtp").await?;

        assert!(matches!(
            get_setting(&db, "smtp").await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            delete_setting(&db, "smtp").await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            set_setting(&db, "  ", json!(1)).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }
}
