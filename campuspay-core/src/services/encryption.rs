//! Encryption service - key management for the session database
//!
//! The session database uses DuckDB's native AES-256-GCM encryption. The key
//! is derived from a passphrase with Argon2id; the random salt and parameters
//! live in `session_encryption.json` next to the database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use rand::Rng;

use crate::domain::{Argon2Params, EncryptionMetadata};

/// Name of the key-derivation metadata file
pub const ENCRYPTION_FILE: &str = "session_encryption.json";

/// Derives and manages the session database encryption key
pub struct EncryptionService {
    data_dir: PathBuf,
    params: Argon2Params,
}

impl EncryptionService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            params: Argon2Params::default(),
        }
    }

    /// Use custom Argon2 parameters for newly created metadata
    pub fn with_params(mut self, params: Argon2Params) -> Self {
        self.params = params;
        self
    }

    pub fn encryption_file(&self) -> PathBuf {
        self.data_dir.join(ENCRYPTION_FILE)
    }

    /// Whether the session database has been set up for encryption
    pub fn is_encrypted(&self) -> bool {
        self.encryption_file().exists()
    }

    /// Read existing metadata
    pub fn load_metadata(&self) -> Result<Option<EncryptionMetadata>> {
        let path = self.encryption_file();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let metadata = serde_json::from_str(&content).context("Invalid encryption metadata")?;
        Ok(Some(metadata))
    }

    /// Derive the hex-encoded database key, creating metadata on first use
    pub fn key_for_passphrase(&self, passphrase: &str) -> Result<String> {
        if passphrase.is_empty() {
            anyhow::bail!("Session passphrase cannot be empty");
        }

        let metadata = match self.load_metadata()? {
            Some(metadata) => metadata,
            None => self.create_metadata()?,
        };

        let salt = base64::engine::general_purpose::STANDARD
            .decode(&metadata.salt)
            .context("Invalid salt in encryption metadata")?;

        let key = derive_key(passphrase, &salt, &metadata.argon2_params)?;
        Ok(hex::encode(key))
    }

    fn create_metadata(&self) -> Result<EncryptionMetadata> {
        let salt: [u8; 16] = rand::thread_rng().gen();
        let salt_b64 = base64::engine::general_purpose::STANDARD.encode(salt);
        let metadata = EncryptionMetadata::new(salt_b64, self.params.clone());

        fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(&metadata)?;
        fs::write(self.encryption_file(), content)
            .context("Failed to write encryption metadata")?;
        crate::adapters::restrict_permissions(&self.encryption_file())?;

        Ok(metadata)
    }
}

/// Derive an encryption key from a passphrase using Argon2id
fn derive_key(passphrase: &str, salt: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
    let argon2_params = argon2::Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(params.hash_len as usize),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create argon2 params: {:?}", e))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut key = vec![0u8; params.hash_len as usize];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow::anyhow!("Failed to derive key: {:?}", e))?;

    Ok(key)
}

#[cfg(test)]
pub(crate) fn fast_params() -> Argon2Params {
    Argon2Params {
        time_cost: 1,
        memory_cost: 1024,
        parallelism: 1,
        hash_len: 32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_is_stable_for_same_passphrase() {
        let dir = tempdir().unwrap();
        let service = EncryptionService::new(dir.path()).with_params(fast_params());

        assert!(!service.is_encrypted());
        let first = service.key_for_passphrase("hunter2").unwrap();
        assert!(service.is_encrypted());
        let second = service.key_for_passphrase("hunter2").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let dir = tempdir().unwrap();
        let service = EncryptionService::new(dir.path()).with_params(fast_params());

        let a = service.key_for_passphrase("one").unwrap();
        let b = service.key_for_passphrase("two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_differs_between_installs() {
        let a_dir = tempdir().unwrap();
        let b_dir = tempdir().unwrap();
        let a = EncryptionService::new(a_dir.path()).with_params(fast_params());
        let b = EncryptionService::new(b_dir.path()).with_params(fast_params());

        assert_ne!(
            a.key_for_passphrase("same").unwrap(),
            b.key_for_passphrase("same").unwrap()
        );
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let dir = tempdir().unwrap();
        let service = EncryptionService::new(dir.path());
        assert!(service.key_for_passphrase("").is_err());
        assert!(!service.is_encrypted());
    }
}
