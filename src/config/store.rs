//! Persistent key/value configuration store
//!
//! Entries are kept in a single JSON object on disk. Reads overlay the
//! environment on top of the stored values; writes replace the whole file
//! atomically.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::{Environment, Settings, env_var_name, write_atomic};

/// Where an effective value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// An environment variable overrode the stored value
    Environment,
    /// The value was read from the store file
    Store,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "env"),
            Self::Store => write!(f, "store"),
        }
    }
}

/// A value after environment precedence has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub value: String,
    pub source: ValueSource,
}

/// One `(key, effective value)` pair yielded by [`ConfigStore::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub source: ValueSource,
}

/// Key/value store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    env: Environment,
    env_prefix: String,
}

impl ConfigStore {
    /// Create a store at `path` resolving overrides against `env`
    pub fn new(path: impl Into<PathBuf>, env: Environment) -> Self {
        Self {
            path: path.into(),
            env,
            env_prefix: Settings::default().env_prefix,
        }
    }

    /// Create a store from resolved tool settings
    pub fn from_settings(settings: &Settings, env: Environment) -> Result<Self> {
        Ok(Self::new(settings.store_path()?, env).with_env_prefix(&settings.env_prefix))
    }

    /// Override the environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Location of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment variable that overrides `key`
    pub fn env_var_name(&self, key: &str) -> String {
        env_var_name(&self.env_prefix, key)
    }

    /// Store `value` under `key`
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        if value.trim().is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()).into());
        }

        let mut data = self.read()?;
        data.insert(key.to_string(), value.to_string());
        self.write(&data)?;

        info!("Saved config key '{}'", key);
        Ok(())
    }

    /// Effective value for `key`, or `None` when neither env nor store has it
    pub fn get(&self, key: &str) -> Result<Option<ResolvedValue>> {
        validate_key(key)?;
        let env_name = self.env_var_name(key);
        if let Some(value) = self.env.get(&env_name) {
            debug!("'{}' resolved from ${}", key, env_name);
            return Ok(Some(ResolvedValue {
                value: value.to_string(),
                source: ValueSource::Environment,
            }));
        }

        Ok(self.read()?.remove(key).map(|value| ResolvedValue {
            value,
            source: ValueSource::Store,
        }))
    }

    /// Like [`get`](Self::get) but an unset key is an error
    pub fn require(&self, key: &str) -> Result<ResolvedValue> {
        self.get(key)?
            .ok_or_else(|| ConfigError::NotFound(key.to_string()).into())
    }

    /// Effective values of all stored keys, sorted by key
    ///
    /// Every call re-reads the store; the returned iterator resolves
    /// environment overrides as it is advanced.
    pub fn list(&self) -> Result<Entries<'_>> {
        Ok(Entries {
            inner: self.read()?.into_iter(),
            store: self,
        })
    }

    /// Remove `key` from the store, returning whether it was present
    pub fn unset(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let mut data = self.read()?;
        if data.remove(key).is_none() {
            return Ok(false);
        }
        self.write(&data)?;

        info!("Removed config key '{}'", key);
        Ok(true)
    }

    fn read(&self) -> Result<BTreeMap<String, String>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config store at {}, starting empty", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(ConfigError::storage(&self.path, e).into()),
        };

        // Invalid UTF-8 is a parse failure too, not an I/O one
        serde_json::from_slice(&content).map_err(|e| {
            ConfigError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn write(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let mut content = serde_json::to_string_pretty(data).map_err(|e| {
            ConfigError::storage(&self.path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        content.push('\n');

        write_atomic(&self.path, content.as_bytes())
            .map_err(|e| ConfigError::storage(&self.path, e))?;
        Ok(())
    }
}

/// Lazy iterator over effective store entries
pub struct Entries<'a> {
    inner: btree_map::IntoIter<String, String>,
    store: &'a ConfigStore,
}

impl Iterator for Entries<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        let (key, stored) = self.inner.next()?;
        let entry = match self.store.env.get(&self.store.env_var_name(&key)) {
            Some(value) => Entry {
                value: value.to_string(),
                source: ValueSource::Environment,
                key,
            },
            None => Entry {
                key,
                value: stored,
                source: ValueSource::Store,
            },
        };
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn validate_key(key: &str) -> Result<()> {
    let reason = if key.trim().is_empty() {
        "key is empty"
    } else if key.chars().any(char::is_whitespace) {
        "key contains whitespace"
    } else if key.contains('=') {
        "key contains '='"
    } else {
        return Ok(());
    };

    Err(ConfigError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into())
}

/// Hide all but `keep` characters at each end of `value`
pub fn mask(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let shown = keep.saturating_mul(2);
    if chars.len() <= shown {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - shown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn isolated_store(temp_dir: &TempDir) -> ConfigStore {
        ConfigStore::new(temp_dir.path().join("config.json"), Environment::default())
    }

    fn with_env(store: &ConfigStore, pairs: &[(&str, &str)]) -> ConfigStore {
        ConfigStore::new(
            store.path(),
            Environment::from_pairs(pairs.iter().copied()),
        )
    }

    #[test]
    fn test_set_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);

        store.set("api-key", "ABC123").unwrap();
        let resolved = store.get("api-key").unwrap().unwrap();
        assert_eq!(resolved.value, "ABC123");
        assert_eq!(resolved.source, ValueSource::Store);
    }

    #[test]
    fn test_set_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);

        store.set("model", "a").unwrap();
        store.set("model", "b").unwrap();
        assert_eq!(store.require("model").unwrap().value, "b");
        assert_eq!(store.list().unwrap().count(), 1);
    }

    #[test]
    fn test_env_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        store.set("api-key", "ABC123").unwrap();

        let store = with_env(&store, &[("UR_API_KEY", "XYZ")]);
        let resolved = store.get("api-key").unwrap().unwrap();
        assert_eq!(resolved.value, "XYZ");
        assert_eq!(resolved.source, ValueSource::Environment);

        // The override is never written back
        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains("ABC123"));
        assert!(!on_disk.contains("XYZ"));
    }

    #[test]
    fn test_env_only_key_resolves() {
        let temp_dir = TempDir::new().unwrap();
        let store = with_env(&isolated_store(&temp_dir), &[("UR_MODEL", "gemini-2.5-pro")]);

        assert_eq!(store.require("model").unwrap().value, "gemini-2.5-pro");
        assert!(!store.path().exists());
    }

    #[test]
    fn test_custom_env_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let store = with_env(&isolated_store(&temp_dir), &[("URBAN_API_KEY", "k")])
            .with_env_prefix("URBAN_");
        assert_eq!(store.env_var_name("api-key"), "URBAN_API_KEY");
        assert_eq!(store.require("api-key").unwrap().source, ValueSource::Environment);
    }

    #[test]
    fn test_get_unset() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);

        assert_eq!(store.get("missing").unwrap(), None);
        assert!(matches!(
            store.require("missing"),
            Err(Error::Config(ConfigError::NotFound(key))) if key == "missing"
        ));
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);

        for key in ["", "   ", "api key", "a=b"] {
            assert!(
                matches!(
                    store.set(key, "v"),
                    Err(Error::Config(ConfigError::InvalidKey { .. }))
                ),
                "key {key:?} should be rejected"
            );
        }
        assert!(!store.path().exists());
    }

    #[test]
    fn test_blank_value_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);

        assert!(matches!(
            store.set("api-key", "  "),
            Err(Error::Config(ConfigError::EmptyValue(_)))
        ));
    }

    #[test]
    fn test_corrupt_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(
            store.get("api-key"),
            Err(Error::Config(ConfigError::Corrupt { .. }))
        ));
        assert!(matches!(
            store.list(),
            Err(Error::Config(ConfigError::Corrupt { .. }))
        ));
        // No repair: a write must not clobber the broken file
        assert!(store.set("api-key", "v").is_err());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_invalid_utf8_store_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        std::fs::write(store.path(), b"{\"a\": \"\xff\xfe\"}").unwrap();

        let err = store.get("a").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Corrupt { .. })));
        assert!(err.to_string().contains("fix or delete"));
    }

    #[test]
    fn test_non_string_values_are_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        std::fs::write(store.path(), r#"{"retries": 3}"#).unwrap();

        assert!(matches!(
            store.get("retries"),
            Err(Error::Config(ConfigError::Corrupt { .. }))
        ));
    }

    #[test]
    fn test_storage_error_when_unwritable() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = ConfigStore::new(blocker.join("config.json"), Environment::default());

        assert!(matches!(
            store.set("api-key", "v"),
            Err(Error::Config(ConfigError::Storage { .. }))
        ));
    }

    #[test]
    fn test_list_overlays_env_and_is_restartable() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        store.set("model", "gemini-2.5-pro").unwrap();
        store.set("api-key", "ABC123").unwrap();

        let store = with_env(&store, &[("UR_API_KEY", "XYZ"), ("UR_OTHER", "ignored")]);
        let entries: Vec<Entry> = store.list().unwrap().collect();
        assert_eq!(
            entries,
            vec![
                Entry {
                    key: "api-key".to_string(),
                    value: "XYZ".to_string(),
                    source: ValueSource::Environment,
                },
                Entry {
                    key: "model".to_string(),
                    value: "gemini-2.5-pro".to_string(),
                    source: ValueSource::Store,
                },
            ]
        );

        store.set("notes-dir", "notes").unwrap();
        let keys: Vec<String> = store.list().unwrap().map(|e| e.key).collect();
        assert_eq!(keys, vec!["api-key", "model", "notes-dir"]);
    }

    #[test]
    fn test_unset() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        store.set("api-key", "ABC123").unwrap();

        assert!(store.unset("api-key").unwrap());
        assert_eq!(store.get("api-key").unwrap(), None);
        assert!(!store.unset("api-key").unwrap());
    }

    #[test]
    fn test_store_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let store = isolated_store(&temp_dir);
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk, "{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}\n");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("ABC123", 2), "AB**23");
        assert_eq!(mask("abcd", 2), "****");
        assert_eq!(mask("", 2), "");
        assert_eq!(mask("서울특별시청", 1), "서****청");
        assert_eq!(mask("secret", 0), "******");
        assert_eq!(mask("abc", usize::MAX), "***");
        assert_eq!(mask("abc", usize::MAX / 2 + 1), "***");
    }

    proptest! {
        #[test]
        fn prop_set_then_get_returns_value(
            key in "[a-z][a-z0-9._-]{0,15}",
            value in "[A-Za-z0-9]{1,32}",
        ) {
            let temp_dir = TempDir::new().unwrap();
            let store = isolated_store(&temp_dir);
            store.set(&key, &value).unwrap();
            let resolved = store.get(&key).unwrap().unwrap();
            prop_assert_eq!(resolved.value, value);
            prop_assert_eq!(resolved.source, ValueSource::Store);
        }

        #[test]
        fn prop_env_always_wins(
            key in "[a-z][a-z0-9-]{0,15}",
            stored in "[A-Za-z0-9]{1,16}",
            overridden in "[A-Za-z0-9]{1,16}",
        ) {
            let temp_dir = TempDir::new().unwrap();
            let store = isolated_store(&temp_dir);
            store.set(&key, &stored).unwrap();

            let name = store.env_var_name(&key);
            let store = with_env(&store, &[(name.as_str(), overridden.as_str())]);
            prop_assert_eq!(store.require(&key).unwrap().value, overridden);
        }
    }
}
