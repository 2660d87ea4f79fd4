//! Integration tests for the DuckDB session store
//!
//! Exercise the store through its public API against real database files.
//!
//! Run with: cargo test --test session_store_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use tempfile::TempDir;

use campuspay_core::adapters::duckdb_store::{DuckDbSessionStore, SESSION_DB_FILE};
use campuspay_core::domain::Argon2Params;
use campuspay_core::services::encryption::ENCRYPTION_FILE;
use campuspay_core::{Session, SessionKey, SessionStore};

fn fast_params() -> Argon2Params {
    Argon2Params {
        time_cost: 1,
        memory_cost: 1024,
        parallelism: 1,
        hash_len: 32,
    }
}

#[tokio::test]
async fn test_session_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = DuckDbSessionStore::open(temp_dir.path(), None).unwrap();
        store.save(&Session::registered("persisted")).await.unwrap();
    }

    let store = DuckDbSessionStore::open(temp_dir.path(), None).unwrap();
    assert_eq!(store.load().await, Session::registered("persisted"));
    assert!(temp_dir.path().join(SESSION_DB_FILE).exists());
}

#[tokio::test]
async fn test_guest_then_registered_transitions() {
    let temp_dir = TempDir::new().unwrap();
    let store = DuckDbSessionStore::open(temp_dir.path(), None).unwrap();

    store.save(&Session::Guest).await.unwrap();
    assert_eq!(store.load().await, Session::Guest);

    store.save(&Session::registered("upgraded")).await.unwrap();
    assert_eq!(
        store.get(SessionKey::AccessToken).await.as_deref(),
        Some("upgraded")
    );
    assert_eq!(store.get(SessionKey::UserType).await.as_deref(), Some("normal"));

    store.save(&Session::Unauthenticated).await.unwrap();
    assert!(store.get(SessionKey::AccessToken).await.is_none());
    assert!(store.get(SessionKey::UserType).await.is_none());
}

#[tokio::test]
async fn test_encrypted_session_round_trip() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store =
            DuckDbSessionStore::open_with_params(temp_dir.path(), Some("correct"), fast_params())
                .unwrap();
        store.save(&Session::registered("locked-away")).await.unwrap();
    }

    // The token must not appear in the file in plain text
    let raw = std::fs::read(temp_dir.path().join(SESSION_DB_FILE)).unwrap();
    assert!(!raw
        .windows(b"locked-away".len())
        .any(|w| w == b"locked-away"));

    let store =
        DuckDbSessionStore::open_with_params(temp_dir.path(), Some("correct"), fast_params())
            .unwrap();
    assert_eq!(store.load().await, Session::registered("locked-away"));
}

#[test]
fn test_wrong_passphrase_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    {
        DuckDbSessionStore::open_with_params(temp_dir.path(), Some("correct"), fast_params())
            .unwrap();
    }

    let result =
        DuckDbSessionStore::open_with_params(temp_dir.path(), Some("wrong"), fast_params());
    assert!(result.is_err());
}

#[tokio::test]
async fn test_passphrase_on_plaintext_store_leaves_it_usable() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = DuckDbSessionStore::open(temp_dir.path(), None).unwrap();
        store.save(&Session::registered("plain")).await.unwrap();
    }

    let err = DuckDbSessionStore::open_with_params(temp_dir.path(), Some("pw"), fast_params())
        .err()
        .expect("encrypting an existing plaintext store should fail");
    assert!(err.to_string().contains("not encrypted"));
    assert!(!temp_dir.path().join(ENCRYPTION_FILE).exists());

    let store = DuckDbSessionStore::open(temp_dir.path(), None).unwrap();
    assert!(!store.is_encrypted());
    assert_eq!(store.load().await, Session::registered("plain"));
}

#[test]
fn test_failed_first_encrypted_open_leaves_no_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let blocked = temp_dir.path().join(SESSION_DB_FILE);
    // A directory in place of the database file makes the open fail
    std::fs::create_dir(&blocked).unwrap();

    let result = DuckDbSessionStore::open_with_params(temp_dir.path(), Some("pw"), fast_params());
    assert!(result.is_err());
    assert!(!temp_dir.path().join(ENCRYPTION_FILE).exists());
}

/// Several handles opening an existing store at the same time all succeed
#[test]
fn test_concurrent_opens() {
    let temp_dir = TempDir::new().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    {
        let store = DuckDbSessionStore::open(temp_dir.path(), None).unwrap();
        rt.block_on(store.save(&Session::registered("shared")))
            .unwrap();
    }

    let barrier = Arc::new(Barrier::new(3));
    let dir = Arc::new(temp_dir.path().to_path_buf());
    let mut handles = vec![];

    for i in 0..3 {
        let barrier = Arc::clone(&barrier);
        let dir = Arc::clone(&dir);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let start = Instant::now();
            let result = DuckDbSessionStore::open(&dir, None).map_err(|e| e.to_string());
            println!("Thread {}: open finished after {:?}", i, start.elapsed());
            result.map(|store| {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                rt.block_on(store.load())
            })
        }));
    }

    for handle in handles {
        let session = handle.join().unwrap().expect("open should succeed");
        assert_eq!(session, Session::registered("shared"));
    }
}
