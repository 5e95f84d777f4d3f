//! The credential store: allow-list, password hashes, and policy.
//!
//! # Durability
//!
//! Every save writes the full document to a temp file in the same
//! directory, renames it over the primary file, then copies the primary
//! over the backup. A crash at any point leaves at least one intact file:
//!
//! ```text
//! write warden.json.tmp ──→ rename → warden.json ──→ copy → warden_backup.json
//!        (crash: primary       (crash: backup           (done)
//!         untouched)            one save behind)
//! ```
//!
//! Loading walks the same chain backwards: primary, then backup, then
//! defaults. Each fallback is logged, none of them is fatal.
//!
//! # Concurrency note
//!
//! All state sits behind a single `parking_lot::Mutex`. Join events,
//! command execution and the heartbeat all call into the store, and a
//! reader must never see a record set that is halfway through an update.
//! Saves run while the lock is held so two saves can't interleave their
//! temp-file writes.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use warden_types::IdentityKey;

use crate::document::{CredentialRecord, StoreDocument, decode_entry, encode_entry};
use crate::policy::{CommandAccess, PolicyConfig, RawPolicy};
use crate::StoreError;

/// File name of the primary store document.
pub const PRIMARY_FILE: &str = "warden.json";
/// File name of the backup copy.
pub const BACKUP_FILE: &str = "warden_backup.json";

/// Which file the last [`CredentialStore::load`] took its state from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Primary,
    Backup,
    /// Neither file was usable; the store started empty.
    Defaults,
}

// ---------------------------------------------------------------------------
// In-memory state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<IdentityKey, CredentialRecord>,
    policy: PolicyConfig,
    commands: CommandAccess,
}

impl StoreState {
    fn from_document(doc: StoreDocument) -> Self {
        let policy = doc.policy.unwrap_or_default().sanitize();
        let commands = doc.commands.unwrap_or_default();

        // Later duplicates win, same as inserting into a map in file order.
        let records = doc
            .users
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|entry| decode_entry(&entry))
            .collect();

        Self {
            records,
            policy,
            commands,
        }
    }

    fn to_document(&self) -> StoreDocument {
        let mut records: Vec<&CredentialRecord> = self.records.values().collect();
        records.sort_by_cached_key(|r| r.display_name.to_lowercase());

        StoreDocument {
            policy: Some(RawPolicy::from(self.policy)),
            commands: Some(self.commands),
            users: Some(records.into_iter().map(|r| Some(encode_entry(r))).collect()),
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Durable mapping from identity key to credential record, plus policy.
///
/// Every name-taking method accepts a raw display name and normalizes it
/// with [`IdentityKey::from_name`]. Names that don't normalize (blank,
/// whitespace, delimiter) are simply "not there": lookups return
/// `false`/`None` and mutations are no-ops.
pub struct CredentialStore {
    dir: PathBuf,
    primary: PathBuf,
    backup: PathBuf,
    state: Mutex<StoreState>,
}

impl CredentialStore {
    /// Opens the store in `dir` and loads it (see [`load`](Self::load)).
    ///
    /// Never fails: the worst case is an empty store with default policy,
    /// logged at `warn`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let store = Self {
            primary: dir.join(PRIMARY_FILE),
            backup: dir.join(BACKUP_FILE),
            dir,
            state: Mutex::new(StoreState::default()),
        };
        store.load();
        store
    }

    /// Replaces the in-memory state with what's on disk.
    ///
    /// Tries the primary file, then the backup, then defaults. Whatever
    /// was loaded is sanitized and immediately written back, so a
    /// recovered backup becomes the new primary.
    pub fn load(&self) -> LoadSource {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            error!(dir = %self.dir.display(), error = %e, "failed to create store directory");
        }

        let mut state = self.state.lock();

        let source = if let Some(doc) = read_logged(&self.primary) {
            *state = StoreState::from_document(doc);
            LoadSource::Primary
        } else if let Some(doc) = read_logged(&self.backup) {
            *state = StoreState::from_document(doc);
            warn!(
                backup = %self.backup.display(),
                "primary store unavailable, restored from backup"
            );
            LoadSource::Backup
        } else {
            *state = StoreState::default();
            warn!(dir = %self.dir.display(), "no usable store found, starting empty");
            LoadSource::Defaults
        };

        info!(
            users = state.records.len(),
            ?source,
            min_password_length = state.policy.min_password_length,
            max_login_attempts = state.policy.max_login_attempts,
            login_timeout_secs = state.policy.login_timeout_secs,
            "credential store loaded"
        );

        if let Err(e) = self.persist(&state) {
            error!(error = %e, "failed to persist store after load");
        }
        source
    }

    /// Writes the current in-memory state to disk.
    ///
    /// On error the in-memory state is untouched and keeps serving; the
    /// caller decides whether to log or surface the failure.
    pub fn save(&self) -> Result<(), StoreError> {
        let state = self.state.lock();
        self.persist(&state)
    }

    // -- Allow-list --------------------------------------------------------

    /// Returns `true` if `name` is on the allow-list.
    pub fn is_allowed(&self, name: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        self.state.lock().records.contains_key(&key)
    }

    /// Adds `name` to the allow-list without a password.
    ///
    /// Returns `true` if a record was created. If the identity is already
    /// present its stored casing is refreshed and `false` is returned;
    /// that's not an error.
    pub fn add(&self, name: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        let display = name.trim();
        match self.state.lock().records.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().display_name = display.to_string();
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(CredentialRecord::new(display));
                true
            }
        }
    }

    /// Removes `name` and its password. Returns whether it was present.
    pub fn remove(&self, name: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        self.state.lock().records.remove(&key).is_some()
    }

    // -- Passwords ---------------------------------------------------------

    /// Stores `hash` for `name`, creating the record if it doesn't exist.
    ///
    /// Returns `false` only if `name` is not a valid name.
    pub fn set_password_hash(&self, name: &str, hash: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        let display = name.trim();
        let mut state = self.state.lock();
        let record = state
            .records
            .entry(key)
            .or_insert_with(|| CredentialRecord::new(display));
        record.display_name = display.to_string();
        record.password_hash = Some(hash.to_string());
        true
    }

    /// Stores `hash` for `name` only if the record exists and has no
    /// password yet. Check and write happen under one lock, so of two
    /// racing registrations exactly one wins.
    pub fn set_password_hash_if_absent(&self, name: &str, hash: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        let mut state = self.state.lock();
        match state.records.get_mut(&key) {
            Some(record) if !record.has_password() => {
                record.display_name = name.trim().to_string();
                record.password_hash = Some(hash.to_string());
                true
            }
            _ => false,
        }
    }

    /// Forgets the password for `name`; the player will have to register
    /// again. Returns whether a record was found.
    pub fn clear_password_hash(&self, name: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        match self.state.lock().records.get_mut(&key) {
            Some(record) => {
                record.password_hash = None;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `name` has a non-blank password hash.
    pub fn has_password_hash(&self, name: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        self.state
            .lock()
            .records
            .get(&key)
            .is_some_and(CredentialRecord::has_password)
    }

    /// The stored hash for `name`, if any.
    pub fn password_hash(&self, name: &str) -> Option<String> {
        let key = IdentityKey::from_name(name)?;
        self.state
            .lock()
            .records
            .get(&key)
            .filter(|r| r.has_password())
            .and_then(|r| r.password_hash.clone())
    }

    /// Updates the stored casing of `name` without touching the hash.
    /// Returns whether a record was found.
    pub fn refresh_display_name(&self, name: &str) -> bool {
        let Some(key) = IdentityKey::from_name(name) else {
            return false;
        };
        match self.state.lock().records.get_mut(&key) {
            Some(record) => {
                record.display_name = name.trim().to_string();
                true
            }
            None => false,
        }
    }

    // -- Snapshots & policy ------------------------------------------------

    /// A consistent copy of every record, sorted by lower-cased name.
    pub fn records(&self) -> Vec<(IdentityKey, CredentialRecord)> {
        let state = self.state.lock();
        let mut records: Vec<_> = state
            .records
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    /// Number of allow-listed identities.
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Returns `true` if the allow-list is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// All three policy values, read together.
    pub fn policy(&self) -> PolicyConfig {
        self.state.lock().policy
    }

    pub fn min_password_length(&self) -> u32 {
        self.state.lock().policy.min_password_length
    }

    pub fn max_login_attempts(&self) -> u32 {
        self.state.lock().policy.max_login_attempts
    }

    pub fn login_timeout(&self) -> Duration {
        self.state.lock().policy.login_timeout()
    }

    /// Defaults for the allow-list administration permission checks.
    pub fn command_access(&self) -> CommandAccess {
        self.state.lock().commands
    }

    /// Path of the primary store file.
    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    /// Path of the backup store file.
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    // -- Persistence -------------------------------------------------------

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{PRIMARY_FILE}.tmp"))
    }

    /// Writes `state` via temp file + rename, then refreshes the backup.
    ///
    /// Takes the already-locked state so callers holding the lock can
    /// persist without re-entering it.
    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(StoreError::io(&self.dir))?;

        let json = serde_json::to_string_pretty(&state.to_document())
            .map_err(StoreError::Serialize)?;

        let temp = self.temp_path();
        {
            let mut file = File::create(&temp).map_err(StoreError::io(&temp))?;
            file.write_all(json.as_bytes())
                .map_err(StoreError::io(&temp))?;
            file.sync_all().map_err(StoreError::io(&temp))?;
        }

        if let Err(e) = fs::rename(&temp, &self.primary) {
            // Some filesystems refuse to replace an existing file
            // atomically. Overwrite in place instead.
            debug!(error = %e, "atomic replace unavailable, overwriting primary");
            fs::copy(&temp, &self.primary).map_err(StoreError::io(&self.primary))?;
            if let Err(e) = fs::remove_file(&temp) {
                debug!(error = %e, "failed to remove temp store file");
            }
        }

        fs::copy(&self.primary, &self.backup).map_err(StoreError::io(&self.backup))?;

        debug!(users = state.records.len(), "credential store persisted");
        Ok(())
    }
}

/// Reads and parses one store file. A missing file is `Ok(None)`.
fn read_document(path: &Path) -> Result<Option<StoreDocument>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path)(e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// [`read_document`] with errors logged and flattened to `None`.
fn read_logged(path: &Path) -> Option<StoreDocument> {
    match read_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            error!(error = %e, "store file unusable");
            None
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Store tests run against a fresh `TempDir` each, so the files on
    //! disk are part of what's being checked.

    use tempfile::TempDir;

    use super::*;

    fn open_temp() -> (TempDir, CredentialStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = CredentialStore::open(dir.path());
        (dir, store)
    }

    fn write(path: &Path, text: &str) {
        fs::write(path, text).expect("write fixture");
    }

    // =====================================================================
    // open() / load()
    // =====================================================================

    #[test]
    fn test_open_empty_dir_uses_defaults_and_persists() {
        let (dir, store) = open_temp();

        assert!(store.is_empty());
        assert_eq!(store.policy(), PolicyConfig::default());
        assert!(dir.path().join(PRIMARY_FILE).exists());
        assert!(dir.path().join(BACKUP_FILE).exists());
        assert!(!dir.path().join("warden.json.tmp").exists());
    }

    #[test]
    fn test_load_corrupt_primary_recovers_from_backup() {
        let (dir, store) = open_temp();
        store.add("Alice");
        store.set_password_hash("Alice", "hash-a");
        store.save().unwrap();

        // Truncated write left the primary as invalid JSON.
        write(&dir.path().join(PRIMARY_FILE), "{ \"policy\": { \"minPass");

        let reopened = CredentialStore::open(dir.path());
        assert!(reopened.is_allowed("alice"));
        assert_eq!(reopened.password_hash("ALICE").as_deref(), Some("hash-a"));
        assert_eq!(reopened.load(), LoadSource::Primary, "backup was promoted");
    }

    #[test]
    fn test_load_reports_backup_source() {
        let (dir, store) = open_temp();
        store.add("Alice");
        store.save().unwrap();
        fs::remove_file(dir.path().join(PRIMARY_FILE)).unwrap();

        assert_eq!(store.load(), LoadSource::Backup);
        assert!(store.is_allowed("Alice"));
    }

    #[test]
    fn test_load_both_corrupt_starts_from_defaults() {
        let (dir, store) = open_temp();
        store.add("Alice");
        store.save().unwrap();
        write(&dir.path().join(PRIMARY_FILE), "not json");
        write(&dir.path().join(BACKUP_FILE), "{ \"users\": [");

        assert_eq!(store.load(), LoadSource::Defaults);
        assert!(store.is_empty());
        // Defaults were written back, so the next load is clean.
        assert_eq!(store.load(), LoadSource::Primary);
    }

    #[test]
    fn test_load_clamps_out_of_range_policy() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join(PRIMARY_FILE),
            r#"{
                "policy": { "minPasswordLength": 200, "maxLoginAttempts": -3, "loginTimeoutSeconds": 2 },
                "users": []
            }"#,
        );

        let store = CredentialStore::open(dir.path());
        assert_eq!(store.min_password_length(), 72);
        assert_eq!(store.max_login_attempts(), 1);
        assert_eq!(store.login_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_fractional_policy_value_keeps_primary_edits() {
        let (dir, store) = open_temp();
        store.add("Alice");
        store.save().unwrap();
        write(
            &dir.path().join(PRIMARY_FILE),
            r#"{
                "policy": { "minPasswordLength": 8, "maxLoginAttempts": 3, "loginTimeoutSeconds": 120.5 },
                "users": ["Alice:", "Carol:"]
            }"#,
        );

        assert_eq!(store.load(), LoadSource::Primary);
        assert_eq!(store.min_password_length(), 8);
        assert_eq!(store.max_login_attempts(), 3);
        assert_eq!(store.login_timeout(), Duration::from_secs(120));
        assert!(store.is_allowed("carol"));
    }

    #[test]
    fn test_load_drops_malformed_entries_keeps_rest() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join(PRIMARY_FILE),
            r#"{ "users": ["Alice:", ":orphan-hash", "", null, "Bob:h"] }"#,
        );

        let store = CredentialStore::open(dir.path());
        assert_eq!(store.len(), 2);
        assert!(store.is_allowed("alice"));
        assert!(store.has_password_hash("bob"));
    }

    #[test]
    fn test_load_reads_command_access() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join(PRIMARY_FILE),
            r#"{ "commands": { "allowAddForEveryone": false, "allowRemoveForEveryone": true } }"#,
        );

        let store = CredentialStore::open(dir.path());
        let access = store.command_access();
        assert!(!access.allow_add_for_everyone);
        assert!(access.allow_remove_for_everyone);
    }

    // =====================================================================
    // Round trip
    // =====================================================================

    #[test]
    fn test_save_then_open_round_trips_records_and_policy() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join(PRIMARY_FILE),
            r#"{ "policy": { "minPasswordLength": 8, "maxLoginAttempts": 3, "loginTimeoutSeconds": 60 } }"#,
        );
        let store = CredentialStore::open(dir.path());
        store.add("Alice");
        store.add("bob");
        store.set_password_hash("bob", "hash-b");
        store.save().unwrap();

        let reopened = CredentialStore::open(dir.path());
        assert_eq!(reopened.policy(), store.policy());
        assert_eq!(reopened.records(), store.records());
        assert!(!reopened.has_password_hash("alice"));
        assert!(reopened.has_password_hash("bob"));
    }

    #[test]
    fn test_save_writes_sorted_delimited_entries() {
        let (dir, store) = open_temp();
        store.add("charlie");
        store.add("Alice");
        store.set_password_hash("Bob", "h");
        store.save().unwrap();

        let text = fs::read_to_string(dir.path().join(PRIMARY_FILE)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            doc["users"],
            serde_json::json!(["Alice:", "Bob:h", "charlie:"])
        );
        assert_eq!(doc["policy"]["minPasswordLength"], 5);
    }

    #[test]
    fn test_save_keeps_backup_identical_to_primary() {
        let (dir, store) = open_temp();
        store.add("Alice");
        store.save().unwrap();

        let primary = fs::read(dir.path().join(PRIMARY_FILE)).unwrap();
        let backup = fs::read(dir.path().join(BACKUP_FILE)).unwrap();
        assert_eq!(primary, backup);
    }

    // =====================================================================
    // Allow-list operations
    // =====================================================================

    #[test]
    fn test_is_allowed_case_insensitive() {
        let (_dir, store) = open_temp();
        store.add("Alice");

        assert!(store.is_allowed("Alice"));
        assert!(store.is_allowed("aLICE"));
        assert!(!store.is_allowed("Bob"));
    }

    #[test]
    fn test_is_allowed_blank_name_never_allowed() {
        let (_dir, store) = open_temp();
        assert!(!store.add("   "));
        assert!(!store.is_allowed(""));
        assert!(!store.is_allowed("  "));
    }

    #[test]
    fn test_add_twice_different_casing_single_record() {
        let (_dir, store) = open_temp();

        assert!(store.add("alice"));
        assert!(!store.add("ALICE"), "second add is a refresh");

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.display_name, "ALICE");
    }

    #[test]
    fn test_add_existing_keeps_password_hash() {
        let (_dir, store) = open_temp();
        store.set_password_hash("Alice", "h");

        store.add("alice");

        assert!(store.has_password_hash("Alice"));
    }

    #[test]
    fn test_remove_reports_presence() {
        let (_dir, store) = open_temp();
        store.add("Alice");

        assert!(store.remove("ALICE"));
        assert!(!store.remove("alice"));
        assert!(!store.is_allowed("Alice"));
    }

    // =====================================================================
    // Password operations
    // =====================================================================

    #[test]
    fn test_set_password_hash_creates_missing_record() {
        let (_dir, store) = open_temp();

        assert!(store.set_password_hash("Eve", "h"));

        assert!(store.is_allowed("eve"));
        assert_eq!(store.password_hash("eve").as_deref(), Some("h"));
    }

    #[test]
    fn test_set_password_hash_if_absent_first_write_wins() {
        let (_dir, store) = open_temp();
        store.add("Alice");

        assert!(store.set_password_hash_if_absent("Alice", "first"));
        assert!(!store.set_password_hash_if_absent("alice", "second"));

        assert_eq!(store.password_hash("Alice").as_deref(), Some("first"));
    }

    #[test]
    fn test_set_password_hash_if_absent_replaces_blank_hash() {
        let (_dir, store) = open_temp();
        store.set_password_hash("Alice", "  ");

        assert!(store.set_password_hash_if_absent("Alice", "h"));
        assert_eq!(store.password_hash("Alice").as_deref(), Some("h"));
    }

    #[test]
    fn test_set_password_hash_if_absent_never_creates_record() {
        let (_dir, store) = open_temp();

        assert!(!store.set_password_hash_if_absent("Eve", "h"));
        assert!(!store.is_allowed("Eve"));
    }

    #[test]
    fn test_clear_password_hash_keeps_allow_listing() {
        let (_dir, store) = open_temp();
        store.set_password_hash("Alice", "h");

        assert!(store.clear_password_hash("alice"));

        assert!(store.is_allowed("Alice"));
        assert!(!store.has_password_hash("Alice"));
        assert_eq!(store.password_hash("Alice"), None);
    }

    #[test]
    fn test_has_password_hash_blank_counts_as_absent() {
        let (_dir, store) = open_temp();
        store.set_password_hash("Alice", "   ");

        assert!(!store.has_password_hash("Alice"));
        assert_eq!(store.password_hash("Alice"), None);
    }

    #[test]
    fn test_refresh_display_name_keeps_hash() {
        let (_dir, store) = open_temp();
        store.set_password_hash("alice", "h");

        assert!(store.refresh_display_name("AlIcE"));

        let records = store.records();
        assert_eq!(records[0].1.display_name, "AlIcE");
        assert_eq!(records[0].1.password_hash.as_deref(), Some("h"));
    }

    #[test]
    fn test_refresh_display_name_unknown_is_noop() {
        let (_dir, store) = open_temp();
        assert!(!store.refresh_display_name("ghost"));
        assert!(store.is_empty());
    }
}
