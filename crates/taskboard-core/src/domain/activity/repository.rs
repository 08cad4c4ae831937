//! Activity log persistence

use sqlx::Row;

use super::entity::{ActivityAction, ActivityEntry, Actor, EntityType};
use crate::Result;
use crate::storage::Database;

/// Append-only activity log store
pub struct ActivityRepository<'a> {
    db: &'a Database,
}

impl<'a> ActivityRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append an entry
    pub async fn record(&self, entry: &ActivityEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, user_id, action, entity_type, entity_id, description, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(&entry.entity_id)
        .bind(&entry.description)
        .bind(entry.metadata.to_string())
        .bind(entry.created_at)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(
            action = entry.action.as_str(),
            entity_id = %entry.entity_id,
            "Recorded activity"
        );
        Ok(())
    }

    /// Entries about one entity, newest first, with the actor's name
    pub async fn list_for_entity(&self, entity_id: &str) -> Result<Vec<ActivityEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.user_id, a.action, a.entity_type, a.entity_id, a.description,
                   a.metadata, a.created_at, u.name AS user_name
            FROM activities a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.entity_id = ?
            ORDER BY a.created_at DESC, a.rowid DESC
            "#,
        )
        .bind(entity_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let action: String = row.get("action");
            let entity_type: String = row.get("entity_type");
            let metadata: String = row.get("metadata");
            let user_name: Option<String> = row.get("user_name");

            let (Some(action), Some(entity_type)) =
                (ActivityAction::parse(&action), EntityType::parse(&entity_type))
            else {
                tracing::warn!(action = %action, "Skipping activity with unknown action");
                continue;
            };

            entries.push(ActivityEntry {
                id: row.get("id"),
                user_id: row.get("user_id"),
                action,
                entity_type,
                entity_id: row.get("entity_id"),
                description: row.get("description"),
                metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
                created_at: row.get("created_at"),
                user: user_name.map(|name| Actor { name }),
            });
        }
        Ok(entries)
    }
}
