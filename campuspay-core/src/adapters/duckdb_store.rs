//! DuckDB-backed session store
//!
//! The session lives in a single row of `sys_session` inside `session.duckdb`.
//! When a passphrase is supplied the file is encrypted with DuckDB's native
//! encryption, keyed by [`EncryptionService`].

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use duckdb::{params, Connection};

use crate::domain::result::{Error, Result};
use crate::domain::{Argon2Params, Session, SessionKey};
use crate::migrations::MIGRATIONS;
use crate::ports::SessionStore;
use crate::services::{EncryptionService, MigrationService};

/// Session database file name
pub const SESSION_DB_FILE: &str = "session.duckdb";

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
        || lower.contains("file is already open")
}

fn now_naive() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Persistent session store
pub struct DuckDbSessionStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    encrypted: bool,
}

impl DuckDbSessionStore {
    /// Open (or create) the session database in `dir`
    pub fn open(dir: &Path, passphrase: Option<&str>) -> anyhow::Result<Self> {
        Self::open_with_params(dir, passphrase, Argon2Params::default())
    }

    /// Open with explicit key-derivation parameters for a new encrypted store
    pub fn open_with_params(
        dir: &Path,
        passphrase: Option<&str>,
        params: Argon2Params,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let db_path = dir.join(SESSION_DB_FILE);
        let encryption = EncryptionService::new(dir).with_params(params);
        let new_encryption = passphrase.is_some() && !encryption.is_encrypted();
        if new_encryption && db_path.is_file() {
            anyhow::bail!(
                "Session store {} is not encrypted; unset the passphrase or remove the file to start over",
                db_path.display()
            );
        }

        let key = match passphrase {
            Some(passphrase) => Some(encryption.key_for_passphrase(passphrase)?),
            None if encryption.is_encrypted() => {
                anyhow::bail!("Session store is encrypted, a passphrase is required")
            }
            None => None,
        };

        let conn = match Self::open_migrated(&db_path, key.as_deref()) {
            Ok(conn) => conn,
            Err(e) => {
                if new_encryption {
                    // Nothing existed before this call; leave the directory as we found it
                    let _ = std::fs::remove_file(encryption.encryption_file());
                    let _ = std::fs::remove_file(&db_path);
                    let _ = std::fs::remove_file(db_path.with_extension("duckdb.wal"));
                }
                return Err(e);
            }
        };

        log::debug!(
            "[SessionStore] Opened {} (encrypted: {})",
            db_path.display(),
            key.is_some()
        );

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            encrypted: key.is_some(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn open_migrated(db_path: &Path, key: Option<&str>) -> anyhow::Result<Connection> {
        let conn = Self::open_connection(db_path, key)?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .context("Failed to migrate session database")?;
        super::restrict_permissions(db_path)?;
        Ok(conn)
    }

    fn open_connection(db_path: &Path, key: Option<&str>) -> anyhow::Result<Connection> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path, key) {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        log::warn!(
                            "[SessionStore] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    fn try_open_connection(db_path: &Path, key: Option<&str>) -> anyhow::Result<Connection> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = if let Some(key) = key {
            let conn = Connection::open_in_memory_with_flags(config)?;
            conn.execute(
                &format!(
                    "ATTACH '{}' AS main_db (ENCRYPTION_KEY '{}')",
                    db_path.display().to_string().replace('\'', "''"),
                    key
                ),
                [],
            )?;
            conn.execute("USE main_db", [])?;
            conn
        } else {
            Connection::open_with_flags(db_path, config)?
        };
        Ok(conn)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> duckdb::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::storage(format!("Session store lock poisoned: {}", e)))?;
        f(&conn).map_err(|e| Error::storage(e.to_string()))
    }

    fn read(&self, key: SessionKey) -> Result<Option<String>> {
        let sql = match key {
            SessionKey::AccessToken => "SELECT access_token FROM sys_session WHERE id = 1",
            SessionKey::UserType => "SELECT user_type FROM sys_session WHERE id = 1",
        };
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => row.get::<_, Option<String>>(0),
                None => Ok(None),
            }
        })
    }
}

#[async_trait]
impl SessionStore for DuckDbSessionStore {
    async fn get(&self, key: SessionKey) -> Option<String> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[SessionStore] Failed to read {}: {}", key.as_str(), e);
                None
            }
        }
    }

    async fn set(&self, key: SessionKey, value: Option<&str>) -> Result<()> {
        let sql = match key {
            SessionKey::AccessToken => {
                "INSERT INTO sys_session (id, access_token, updated_at) VALUES (1, ?, CAST(? AS TIMESTAMP))
                 ON CONFLICT (id) DO UPDATE SET
                    access_token = EXCLUDED.access_token,
                    updated_at = EXCLUDED.updated_at"
            }
            SessionKey::UserType => {
                if let Some(raw) = value {
                    raw.parse::<crate::domain::UserType>()?;
                }
                "INSERT INTO sys_session (id, user_type, updated_at) VALUES (1, ?, CAST(? AS TIMESTAMP))
                 ON CONFLICT (id) DO UPDATE SET
                    user_type = EXCLUDED.user_type,
                    updated_at = EXCLUDED.updated_at"
            }
        };
        let now = now_naive();
        self.with_conn(|conn| conn.execute(sql, params![value, now]))?;
        Ok(())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let (token, user_type) = session.to_parts();
        let user_type = user_type.map(|u| u.as_str());
        let now = now_naive();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sys_session (id, access_token, user_type, updated_at)
                 VALUES (1, ?, ?, CAST(? AS TIMESTAMP))
                 ON CONFLICT (id) DO UPDATE SET
                    access_token = EXCLUDED.access_token,
                    user_type = EXCLUDED.user_type,
                    updated_at = EXCLUDED.updated_at",
                params![token, user_type, now],
            )
        })?;
        log::debug!("[SessionStore] Saved {:?}", session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserType;
    use crate::services::encryption::fast_params;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fresh_store_is_unauthenticated() {
        let dir = tempdir().unwrap();
        let store = DuckDbSessionStore::open(dir.path(), None).unwrap();

        assert!(store.get(SessionKey::AccessToken).await.is_none());
        assert!(store.get(SessionKey::UserType).await.is_none());
        assert_eq!(store.load().await, Session::Unauthenticated);
        assert!(!store.is_encrypted());
    }

    #[tokio::test]
    async fn test_set_and_get_each_key() {
        let dir = tempdir().unwrap();
        let store = DuckDbSessionStore::open(dir.path(), None).unwrap();

        store.set(SessionKey::AccessToken, Some("tok")).await.unwrap();
        store.set(SessionKey::UserType, Some("normal")).await.unwrap();
        assert_eq!(store.get(SessionKey::AccessToken).await.as_deref(), Some("tok"));
        assert_eq!(store.get(SessionKey::UserType).await.as_deref(), Some("normal"));

        store.set(SessionKey::AccessToken, None).await.unwrap();
        assert!(store.get(SessionKey::AccessToken).await.is_none());
        assert_eq!(store.get(SessionKey::UserType).await.as_deref(), Some("normal"));
    }

    #[tokio::test]
    async fn test_set_rejects_unknown_user_type() {
        let dir = tempdir().unwrap();
        let store = DuckDbSessionStore::open(dir.path(), None).unwrap();

        let err = store
            .set(SessionKey::UserType, Some("admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.get(SessionKey::UserType).await.is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_session() {
        let dir = tempdir().unwrap();
        let store = DuckDbSessionStore::open(dir.path(), None).unwrap();

        store.save(&Session::registered("tok")).await.unwrap();
        assert_eq!(store.load().await, Session::registered("tok"));

        store.save(&Session::Guest).await.unwrap();
        assert!(store.get(SessionKey::AccessToken).await.is_none());
        assert_eq!(
            store.get(SessionKey::UserType).await.as_deref(),
            Some(UserType::Guest.as_str())
        );
    }

    #[tokio::test]
    async fn test_encrypted_store_requires_passphrase() {
        let dir = tempdir().unwrap();
        {
            let store =
                DuckDbSessionStore::open_with_params(dir.path(), Some("pw"), fast_params())
                    .unwrap();
            assert!(store.is_encrypted());
            store.save(&Session::registered("secret")).await.unwrap();
        }

        assert!(DuckDbSessionStore::open(dir.path(), None).is_err());

        let store =
            DuckDbSessionStore::open_with_params(dir.path(), Some("pw"), fast_params()).unwrap();
        assert_eq!(store.load().await, Session::registered("secret"));
    }

    #[cfg(unix)]
    #[test]
    fn test_database_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = DuckDbSessionStore::open(dir.path(), None).unwrap();
        let mode = std::fs::metadata(store.db_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
