//! Encrypted on-device vault backing [`HealthStore`](crate::store::HealthStore).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use zeroize::Zeroizing;

use crate::crypto::{self, SealingKey};
use crate::models::HealthData;
use crate::store::{HealthDocument, StoreError, StoreResult};

const VAULT_DIR: &str = "cyclewell";
const VAULT_FILE: &str = "vault.cwv";

/// Health data sealed under a passphrase in a single file.
///
/// The vault starts locked. While unlocked the decrypted data and the
/// derived key live in memory and every write is sealed back to disk before
/// it is visible to readers.
pub struct VaultStore {
    path: PathBuf,
    state: Mutex<Option<Unlocked>>,
}

struct Unlocked {
    key: SealingKey,
    data: HealthData,
}

impl VaultStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Vault in the platform's local data directory.
    pub fn default_location() -> StoreResult<Self> {
        let dir = dirs::data_local_dir()
            .ok_or(StoreError::NoDataDir)?
            .join(VAULT_DIR);
        Ok(Self::at(dir.join(VAULT_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a vault file exists (i.e. the tracker has been set up).
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn is_unlocked(&self) -> bool {
        self.state_even_if_poisoned().is_some()
    }

    /// Create an empty vault and leave it unlocked.
    pub fn create(&self, passphrase: &str) -> StoreResult<()> {
        if self.exists() {
            return Err(StoreError::AlreadyExists);
        }
        let key = SealingKey::generate(passphrase)?;
        let data = HealthData::default();
        save(&self.path, &key, &data)?;
        tracing::info!(path = %self.path.display(), "created vault");
        self.install(Unlocked { key, data })
    }

    /// Decrypt the vault into memory.
    pub fn unlock(&self, passphrase: &str) -> StoreResult<()> {
        let unlocked = load(&self.path, passphrase).map_err(|e| {
            tracing::warn!(error = %e, "vault unlock failed");
            e
        })?;
        tracing::debug!(
            cycles = unlocked.data.cycles.len(),
            summaries = unlocked.data.summaries.len(),
            "vault unlocked"
        );
        self.install(unlocked)
    }

    /// Drop the decrypted data and zeroize the key.
    ///
    /// Runs even if another thread panicked while holding the vault; the
    /// cleared state is consistent again afterwards.
    pub fn lock(&self) {
        *self.state_even_if_poisoned() = None;
        self.state.clear_poison();
        tracing::debug!("vault locked");
    }

    /// Pretty-printed plaintext export of everything in the vault.
    pub fn export_json(&self) -> StoreResult<String> {
        let json = self.read(|d| serde_json::to_string_pretty(d))??;
        Ok(json)
    }

    /// Lock and delete the vault file permanently.
    pub fn wipe(&self) -> StoreResult<()> {
        self.lock();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::info!(path = %self.path.display(), "vault wiped");
        }
        Ok(())
    }

    fn install(&self, unlocked: Unlocked) -> StoreResult<()> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        *state = Some(unlocked);
        Ok(())
    }

    fn state_even_if_poisoned(&self) -> MutexGuard<'_, Option<Unlocked>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HealthDocument for VaultStore {
    fn read<R>(&self, f: impl FnOnce(&HealthData) -> R) -> StoreResult<R> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let unlocked = state.as_ref().ok_or(StoreError::Locked)?;
        Ok(f(&unlocked.data))
    }

    fn write<R>(&self, f: impl FnOnce(&mut HealthData) -> R) -> StoreResult<R> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let unlocked = state.as_mut().ok_or(StoreError::Locked)?;

        let mut next = unlocked.data.clone();
        let result = f(&mut next);
        save(&self.path, &unlocked.key, &next)?;
        unlocked.data = next;
        Ok(result)
    }
}

/// Seal and write atomically through a sibling temp file.
fn save(path: &Path, key: &SealingKey, data: &HealthData) -> StoreResult<()> {
    let json = Zeroizing::new(serde_json::to_vec(data)?);
    let sealed = key.seal(&json)?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, sealed)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn load(path: &Path, passphrase: &str) -> StoreResult<Unlocked> {
    let sealed = fs::read(path)?;
    let (key, json) = crypto::open(passphrase, &sealed)?;
    let data = serde_json::from_slice(&json)?;
    Ok(Unlocked { key, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityUpdate, CycleRecord};
    use crate::store::HealthStore;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn temp_vault() -> VaultStore {
        let path = std::env::temp_dir()
            .join(format!("cyclewell-test-{}", Uuid::new_v4()))
            .join(VAULT_FILE);
        VaultStore::at(path)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn data_survives_lock_and_unlock() {
        let vault = temp_vault();
        vault.create("hunter2").unwrap();
        assert!(vault.exists());

        let user = Uuid::new_v4();
        vault
            .insert_cycle(CycleRecord::new(user, date("2026-02-01")))
            .unwrap();
        vault
            .upsert_activity(user, date("2026-02-03"), &ActivityUpdate::water(1.0).unwrap())
            .unwrap();

        vault.lock();
        assert!(!vault.is_unlocked());
        assert!(matches!(vault.recent_cycles(user, 10), Err(StoreError::Locked)));

        vault.unlock("hunter2").unwrap();
        assert_eq!(vault.recent_cycles(user, 10).unwrap().len(), 1);
        let activity = vault.activity(user, date("2026-02-03")).unwrap().unwrap();
        assert_eq!(activity.water_intake, 1.0);

        vault.wipe().unwrap();
    }

    #[test]
    fn wrong_passphrase_keeps_vault_locked() {
        let vault = temp_vault();
        vault.create("right").unwrap();
        vault.lock();

        let err = vault.unlock("wrong").unwrap_err();
        assert!(matches!(err, StoreError::Crypto(crypto::CryptoError::Decryption)));
        assert!(!vault.is_unlocked());

        vault.wipe().unwrap();
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let vault = temp_vault();
        vault.create("pass").unwrap();
        assert!(matches!(vault.create("pass"), Err(StoreError::AlreadyExists)));
        vault.wipe().unwrap();
        assert!(!vault.exists());
    }

    #[test]
    fn lock_clears_a_poisoned_vault() {
        let vault = temp_vault();
        vault.create("pass").unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = vault.state.lock().unwrap();
            panic!("writer died while holding the vault");
        }));
        assert!(vault.state.is_poisoned());
        assert!(vault.is_unlocked());
        assert!(matches!(vault.settings(), Err(StoreError::Poisoned)));

        vault.lock();
        assert!(!vault.is_unlocked());
        assert!(matches!(vault.settings(), Err(StoreError::Locked)));

        vault.unlock("pass").unwrap();
        assert!(vault.is_unlocked());
        vault.wipe().unwrap();
    }

    #[test]
    fn many_writes_stay_readable_after_reopen() {
        let vault = temp_vault();
        vault.create("pass").unwrap();
        let user = Uuid::new_v4();
        let day = date("2026-02-03");
        for _ in 0..20 {
            vault
                .upsert_activity(user, day, &ActivityUpdate::water(0.25).unwrap())
                .unwrap();
        }

        vault.lock();
        vault.unlock("pass").unwrap();
        let activity = vault.activity(user, day).unwrap().unwrap();
        assert_eq!(activity.water_intake, 5.0);
        vault.wipe().unwrap();
    }

    #[test]
    fn export_contains_plaintext_records() {
        let vault = temp_vault();
        vault.create("pass").unwrap();
        let user = Uuid::new_v4();
        vault
            .insert_cycle(CycleRecord::new(user, date("2026-02-01")))
            .unwrap();

        let json = vault.export_json().unwrap();
        assert!(json.contains("2026-02-01"));
        assert!(json.contains(&user.to_string()));

        vault.wipe().unwrap();
    }
}
