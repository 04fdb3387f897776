//! SQLite-backed [`UserStore`].

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use socialgate_auth::store::generate_user_id;
use socialgate_auth::{NewUser, StoreError, User, UserQuery, UserStore};

use crate::database::DbConnection;

pub struct SqliteUserStore {
    db: DbConnection,
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        google_id: row.get(2)?,
        facebook_id: row.get(3)?,
    })
}

/// Translate a query into a WHERE clause, pushing its bind values
fn where_clause(query: &UserQuery, values: &mut Vec<String>) -> String {
    match query {
        UserQuery::GoogleId(id) => {
            values.push(id.clone());
            "google_id = ?".to_string()
        }
        UserQuery::FacebookId(id) => {
            values.push(id.clone());
            "facebook_id = ?".to_string()
        }
        UserQuery::Username(name) => {
            values.push(name.clone());
            "username = ?".to_string()
        }
        UserQuery::AnyOf(queries) if queries.is_empty() => "0".to_string(),
        UserQuery::AnyOf(queries) => {
            let parts: Vec<String> = queries.iter().map(|q| where_clause(q, values)).collect();
            format!("({})", parts.join(" OR "))
        }
    }
}

impl SqliteUserStore {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_one(&self, query: &UserQuery) -> Result<Option<User>, StoreError> {
        let mut values = Vec::new();
        let clause = where_clause(query, &mut values);
        let sql = format!(
            "SELECT id, username, google_id, facebook_id FROM users WHERE {} ORDER BY rowid LIMIT 1",
            clause
        );

        let conn = self.db.lock().await;
        conn.query_row(&sql, params_from_iter(values.iter()), user_from_row)
            .optional()
            .map_err(backend)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.db.lock().await;
        conn.query_row(
            "SELECT id, username, google_id, facebook_id FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(backend)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: generate_user_id(),
            username: user.username,
            google_id: user.google_id,
            facebook_id: user.facebook_id,
        };

        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO users (id, username, google_id, facebook_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.username,
                user.google_id,
                user.facebook_id,
                chrono::Utc::now().timestamp()
            ],
        )
        .map_err(backend)?;

        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let conn = self.db.lock().await;
        let changed = conn
            .execute(
                "UPDATE users SET username = ?2, google_id = ?3, facebook_id = ?4 WHERE id = ?1",
                params![user.id, user.username, user.google_id, user.facebook_id],
            )
            .map_err(backend)?;

        if changed == 0 {
            return Err(StoreError::NotFound(user.id.clone()));
        }
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{init_database, init_memory_database};
    use socialgate_auth::{reconcile, ExternalProfile, Provider};
    use tempfile::NamedTempFile;

    fn store() -> SqliteUserStore {
        SqliteUserStore::new(init_memory_database().unwrap())
    }

    #[test]
    fn test_where_clause_for_any_of() {
        let query = UserQuery::AnyOf(vec![
            UserQuery::FacebookId("fb-1".to_string()),
            UserQuery::Username("ada".to_string()),
        ]);
        let mut values = Vec::new();
        assert_eq!(where_clause(&query, &mut values), "(facebook_id = ? OR username = ?)");
        assert_eq!(values, vec!["fb-1".to_string(), "ada".to_string()]);
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = store();
        let created = store
            .create(NewUser {
                username: "ada".to_string(),
                google_id: Some("g-1".to_string()),
                facebook_id: None,
            })
            .await
            .unwrap();

        let by_google = store
            .find_one(&UserQuery::GoogleId("g-1".to_string()))
            .await
            .unwrap();
        assert_eq!(by_google, Some(created.clone()));
        assert_eq!(store.find_by_id(&created.id).await.unwrap(), Some(created));
        assert!(store
            .find_one(&UserQuery::FacebookId("g-1".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_any_of_returns_oldest_match() {
        let store = store();
        let first = store
            .create(NewUser {
                username: "ada".to_string(),
                ..NewUser::default()
            })
            .await
            .unwrap();
        store
            .create(NewUser {
                username: "grace".to_string(),
                facebook_id: Some("fb-1".to_string()),
                ..NewUser::default()
            })
            .await
            .unwrap();

        let query = UserQuery::AnyOf(vec![
            UserQuery::FacebookId("fb-1".to_string()),
            UserQuery::Username("ada".to_string()),
        ]);
        assert_eq!(store.find_one(&query).await.unwrap().unwrap().id, first.id);
        assert!(store.find_one(&UserQuery::AnyOf(vec![])).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_updates_and_rejects_unknown() {
        let store = store();
        let mut user = store
            .create(NewUser {
                username: "ada".to_string(),
                ..NewUser::default()
            })
            .await
            .unwrap();
        user.facebook_id = Some("fb-1".to_string());
        store.save(&user).await.unwrap();
        assert_eq!(store.find_by_id(&user.id).await.unwrap(), Some(user.clone()));

        user.id = "missing".to_string();
        assert!(matches!(store.save(&user).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reconcile_persists_across_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let profile = ExternalProfile {
            provider: Provider::Facebook,
            id: "fb-1".to_string(),
            display_name: "Grace Hopper".to_string(),
        };

        let created = {
            let store = SqliteUserStore::new(init_database(temp_file.path()).unwrap());
            reconcile(&store, &profile).await.unwrap()
        };

        let store = SqliteUserStore::new(init_database(temp_file.path()).unwrap());
        let again = reconcile(&store, &profile).await.unwrap();
        assert_eq!(again, created);
        assert_eq!(again.facebook_id.as_deref(), Some("fb-1"));
    }
}
