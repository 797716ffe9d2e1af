//! User profile documents with upsert semantics.
//!
//! A profile is a JSON object keyed by `user_id`. Updates merge field by
//! field: keys present in the update overwrite, keys absent are left alone.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::{Map, Value};
use tracing::debug;

use crate::sqlite::{db_err, now_millis, SqliteStore};
use crate::types::UserProfile;
use mindful_core::{Error, Result};

/// Result of an upsert, mirroring "upserted / modified / matched only".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

impl UpsertOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

/// Fields the store manages itself and never accepts from clients.
const RESERVED_FIELDS: &[&str] = &["user_id", "_id"];

impl SqliteStore {
    /// Fetch a profile by user id.
    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn.lock();
        let profile = read_profile(&conn, user_id)?;
        Ok(profile)
    }

    /// Merge `updates` into the profile for `user_id`, creating it if needed.
    /// The read and the write happen in one immediate transaction, so
    /// concurrent updates to the same user never drop each other's fields.
    pub fn upsert_profile(&self, user_id: &str, updates: &Map<String, Value>) -> Result<UpsertOutcome> {
        if user_id.trim().is_empty() {
            return Err(Error::Validation("No user_id provided".into()));
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let existing = read_profile(&tx, user_id)?;
        let mut fields = existing
            .as_ref()
            .map(|p| p.fields.clone())
            .unwrap_or_default();
        for (k, v) in updates {
            if RESERVED_FIELDS.contains(&k.as_str()) {
                continue;
            }
            fields.insert(k.clone(), v.clone());
        }

        let outcome = match &existing {
            None => UpsertOutcome::Created,
            Some(p) if p.fields == fields => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Updated,
        };

        if outcome.changed() {
            let json = serde_json::to_string(&fields)?;
            tx.execute(
                "INSERT INTO user_profiles (user_id, profile_json, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?3) \
                 ON CONFLICT(user_id) DO UPDATE SET \
                   profile_json = excluded.profile_json, updated_at = excluded.updated_at",
                params![user_id, json, now_millis()],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;

        debug!("Profile upsert for {}: {:?}", user_id, outcome);
        Ok(outcome)
    }
}

fn read_profile(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>> {
    let row: Option<(String, i64)> = conn
        .prepare_cached("SELECT profile_json, updated_at FROM user_profiles WHERE user_id = ?1")
        .map_err(db_err)?
        .query_row(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()
        .map_err(db_err)?;

    match row {
        Some((json, updated_at)) => {
            let fields: Map<String, Value> = serde_json::from_str(&json)?;
            Ok(Some(UserProfile {
                user_id: user_id.to_string(),
                fields,
                updated_at,
            }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("profiles.db"), 8).unwrap();
        (store, dir)
    }

    #[test]
    fn test_upsert_creates_then_merges() {
        let (store, _dir) = test_store();

        let outcome = store
            .upsert_profile("u1", &obj(json!({"age": 29, "goals": ["sleep better"]})))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let outcome = store
            .upsert_profile("u1", &obj(json!({"occupation": "nurse"})))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let profile = store.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.field("age"), Some(&json!(29)));
        assert_eq!(profile.field("occupation"), Some(&json!("nurse")));
        assert_eq!(profile.field("goals"), Some(&json!(["sleep better"])));
    }

    #[test]
    fn test_same_values_are_unchanged() {
        let (store, _dir) = test_store();
        let fields = obj(json!({"gender": "female"}));
        store.upsert_profile("u2", &fields).unwrap();
        assert_eq!(store.upsert_profile("u2", &fields).unwrap(), UpsertOutcome::Unchanged);
    }

    #[test]
    fn test_reserved_fields_ignored() {
        let (store, _dir) = test_store();
        store
            .upsert_profile("u3", &obj(json!({"user_id": "other", "_id": 7, "age": 40})))
            .unwrap();
        let doc = store.get_profile("u3").unwrap().unwrap().to_document();
        assert_eq!(doc, json!({"user_id": "u3", "age": 40}));
    }

    #[test]
    fn test_missing_profile() {
        let (store, _dir) = test_store();
        assert!(store.get_profile("nobody").unwrap().is_none());
        assert!(matches!(
            store.upsert_profile(" ", &Map::new()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_concurrent_updates_keep_every_field() {
        let (store, _dir) = test_store();
        let store = std::sync::Arc::new(store);

        for round in 0..20 {
            let user = format!("u{}", round);
            std::thread::scope(|scope| {
                for i in 0..16 {
                    let store = store.clone();
                    let user = user.clone();
                    scope.spawn(move || {
                        let mut update = Map::new();
                        update.insert(format!("field_{}", i), json!(i));
                        store.upsert_profile(&user, &update).unwrap();
                    });
                }
            });
            let profile = store.get_profile(&user).unwrap().unwrap();
            assert_eq!(profile.fields.len(), 16, "round {} lost fields", round);
        }
    }
}
