//! Persisted settings: the provider aggregate and the custom instruction list.
//!
//! The settings surfaces are the only writers. Readers always go back to the
//! store instead of caching, and can subscribe to change notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::Display;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::instructions::{Instruction, InstructionSet};
use crate::providers::configs::ProvidersConfig;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum StorageKey {
    #[serde(rename = "aiProvidersConfigs")]
    #[strum(serialize = "aiProvidersConfigs")]
    ProvidersConfig,
    #[serde(rename = "customContextMenuItems")]
    #[strum(serialize = "customContextMenuItems")]
    CustomInstructions,
}

impl StorageKey {
    pub const ALL: [StorageKey; 2] = [StorageKey::ProvidersConfig, StorageKey::CustomInstructions];
}

/// One optional field per [`StorageKey`]. Used both as a full snapshot and as a
/// partial update where only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    #[serde(rename = "aiProvidersConfigs", default, skip_serializing_if = "Option::is_none")]
    pub ai_providers_configs: Option<ProvidersConfig>,
    #[serde(rename = "customContextMenuItems", default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<Vec<Instruction>>,
}

impl StorageData {
    pub fn keys(&self) -> Vec<StorageKey> {
        let mut keys = Vec::new();
        if self.ai_providers_configs.is_some() {
            keys.push(StorageKey::ProvidersConfig);
        }
        if self.custom_instructions.is_some() {
            keys.push(StorageKey::CustomInstructions);
        }
        keys
    }

    fn only(mut self, keys: &[StorageKey]) -> Self {
        if !keys.contains(&StorageKey::ProvidersConfig) {
            self.ai_providers_configs = None;
        }
        if !keys.contains(&StorageKey::CustomInstructions) {
            self.custom_instructions = None;
        }
        self
    }

    fn merge(&mut self, partial: StorageData) {
        if let Some(configs) = partial.ai_providers_configs {
            self.ai_providers_configs = Some(configs);
        }
        if let Some(customs) = partial.custom_instructions {
            self.custom_instructions = Some(customs);
        }
    }
}

/// Fired after a successful [`ConfigStore::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub keys: Vec<StorageKey>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored settings are not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, keys: &[StorageKey]) -> Result<StorageData, StoreError>;

    async fn set(&self, partial: StorageData) -> Result<(), StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

pub async fn load_providers_config(store: &dyn ConfigStore) -> Result<ProvidersConfig, StoreError> {
    let data = store.get(&[StorageKey::ProvidersConfig]).await?;
    Ok(data.ai_providers_configs.unwrap_or_default())
}

pub async fn save_providers_config(
    store: &dyn ConfigStore,
    configs: ProvidersConfig,
) -> Result<(), StoreError> {
    store
        .set(StorageData {
            ai_providers_configs: Some(configs),
            ..Default::default()
        })
        .await
}

pub async fn load_instruction_set(store: &dyn ConfigStore) -> Result<InstructionSet, StoreError> {
    let data = store.get(&[StorageKey::CustomInstructions]).await?;
    Ok(InstructionSet::new(data.custom_instructions.unwrap_or_default()))
}

pub async fn save_instruction_set(
    store: &dyn ConfigStore,
    set: InstructionSet,
) -> Result<(), StoreError> {
    store
        .set(StorageData {
            custom_instructions: Some(set.into_customs()),
            ..Default::default()
        })
        .await
}

fn notify(sender: &broadcast::Sender<StorageChange>, keys: Vec<StorageKey>) {
    if keys.is_empty() {
        return;
    }
    tracing::debug!(?keys, "settings changed");
    // No subscribers is fine.
    let _ = sender.send(StorageChange { keys });
}

/// Process-local store, used by tests and dry runs.
pub struct MemoryStore {
    data: RwLock<StorageData>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(StorageData::default())
    }

    pub fn with_data(data: StorageData) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: RwLock::new(data),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, keys: &[StorageKey]) -> Result<StorageData, StoreError> {
        Ok(self.data.read().await.clone().only(keys))
    }

    async fn set(&self, partial: StorageData) -> Result<(), StoreError> {
        let keys = partial.keys();
        self.data.write().await.merge(partial);
        notify(&self.changes, keys);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// A single JSON document on disk. Every read goes to the file so edits made by
/// another process are picked up.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// `<config dir>/ait/storage.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ait")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<StorageData, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(StorageData::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StorageData::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, data: &StorageData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(data)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    async fn get(&self, keys: &[StorageKey]) -> Result<StorageData, StoreError> {
        Ok(self.read_all().await?.only(keys))
    }

    async fn set(&self, partial: StorageData) -> Result<(), StoreError> {
        let keys = partial.keys();
        let _guard = self.write_lock.lock().await;
        let mut data = self.read_all().await?;
        data.merge(partial);
        self.write_all(&data).await?;
        notify(&self.changes, keys);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::configs::{ProviderConfig, ProviderType};
    use anyhow::Result;
    use tempfile::tempdir;

    fn openai_configs() -> ProvidersConfig {
        let mut configs = ProvidersConfig {
            active_provider: ProviderType::OpenAi,
            ..Default::default()
        };
        configs.upsert(&ProviderConfig {
            api_key: "sk-test".into(),
            ..ProviderConfig::default_for(ProviderType::OpenAi)
        });
        configs
    }

    #[tokio::test]
    async fn test_memory_store_defaults_when_empty() -> Result<()> {
        let store = MemoryStore::new();
        assert_eq!(load_providers_config(&store).await?, ProvidersConfig::default());
        assert!(load_instruction_set(&store).await?.customs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_set_leaves_other_keys_alone() -> Result<()> {
        let store = MemoryStore::new();
        save_providers_config(&store, openai_configs()).await?;

        let mut set = InstructionSet::default();
        set.add_custom("Haiku", "Rewrite as a haiku.")?;
        save_instruction_set(&store, set).await?;

        let all = store.get(&StorageKey::ALL).await?;
        assert_eq!(all.ai_providers_configs, Some(openai_configs()));
        assert_eq!(all.custom_instructions.map(|c| c.len()), Some(1));

        let only_configs = store.get(&[StorageKey::ProvidersConfig]).await?;
        assert!(only_configs.custom_instructions.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_notifies_subscribers_with_changed_keys() -> Result<()> {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();
        save_providers_config(&store, openai_configs()).await?;

        let change = changes.recv().await?;
        assert_eq!(change.keys, vec![StorageKey::ProvidersConfig]);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("storage.json");
        let store = JsonFileStore::new(&path);

        assert_eq!(load_providers_config(&store).await?, ProvidersConfig::default());
        save_providers_config(&store, openai_configs()).await?;

        let reopened = JsonFileStore::new(&path);
        let configs = load_providers_config(&reopened).await?;
        assert_eq!(configs, openai_configs());
        assert_eq!(configs.active().api_key, "sk-test");

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
        assert_eq!(raw["aiProvidersConfigs"]["activeProvider"], "openai");
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_reports_corruption() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json")?;

        let store = JsonFileStore::new(&path);
        let err = load_providers_config(&store).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        Ok(())
    }

    #[test]
    fn test_storage_key_names() {
        assert_eq!(StorageKey::ProvidersConfig.to_string(), "aiProvidersConfigs");
        assert_eq!(
            serde_json::to_value(StorageKey::CustomInstructions).unwrap(),
            "customContextMenuItems"
        );
    }
}
