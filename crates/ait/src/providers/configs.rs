use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString};

use super::anthropic::{ANTHROPIC_HOST, ANTHROPIC_MODEL};
use super::deepseek::{DEEPSEEK_HOST, DEEPSEEK_MODEL};
use super::gemini::{GEMINI_HOST, GEMINI_MODEL};
use super::openai::{OPENAI_HOST, OPENAI_MODEL};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    OpenAi,
    Anthropic,
    DeepSeek,
}

/// Fully resolved settings for one provider, as handed to an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub name: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub get_api_key_url: String,
}

impl ProviderConfig {
    /// Compiled-in defaults. The API key is always empty.
    pub fn default_for(provider_type: ProviderType) -> Self {
        let (name, base_url, model, get_api_key_url) = match provider_type {
            ProviderType::Gemini => (
                "Gemini",
                GEMINI_HOST,
                GEMINI_MODEL,
                "https://aistudio.google.com/app/apikey",
            ),
            ProviderType::OpenAi => (
                "OpenAI",
                OPENAI_HOST,
                OPENAI_MODEL,
                "https://platform.openai.com/api-keys",
            ),
            ProviderType::Anthropic => (
                "Anthropic",
                ANTHROPIC_HOST,
                ANTHROPIC_MODEL,
                "https://console.anthropic.com/settings/keys",
            ),
            ProviderType::DeepSeek => (
                "DeepSeek",
                DEEPSEEK_HOST,
                DEEPSEEK_MODEL,
                "https://platform.deepseek.com/api_keys",
            ),
        };

        Self {
            provider_type,
            name: name.to_string(),
            api_key: String::new(),
            model: model.to_string(),
            base_url: base_url.to_string(),
            get_api_key_url: get_api_key_url.to_string(),
        }
    }
}

/// Per-provider settings as persisted: every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_api_key_url: Option<String>,
}

impl From<&ProviderConfig> for StoredProviderConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            name: Some(config.name.clone()),
            api_key: Some(config.api_key.clone()),
            model: Some(config.model.clone()),
            base_url: Some(config.base_url.clone()),
            get_api_key_url: Some(config.get_api_key_url.clone()),
        }
    }
}

/// The persisted aggregate: which provider is active plus one entry per type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    pub active_provider: ProviderType,
    #[serde(default)]
    pub providers: BTreeMap<ProviderType, StoredProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            active_provider: ProviderType::Gemini,
            providers: BTreeMap::new(),
        }
    }
}

impl ProvidersConfig {
    /// Merge the stored entry for `provider_type` over the compiled-in defaults.
    ///
    /// A field that was explicitly stored wins even when empty, so clearing an
    /// API key in settings is honoured and rejected later by the adapter.
    pub fn resolve(&self, provider_type: ProviderType) -> ProviderConfig {
        let defaults = ProviderConfig::default_for(provider_type);
        let Some(stored) = self.providers.get(&provider_type) else {
            return defaults;
        };

        ProviderConfig {
            provider_type,
            name: stored.name.clone().unwrap_or(defaults.name),
            api_key: stored.api_key.clone().unwrap_or(defaults.api_key),
            model: stored.model.clone().unwrap_or(defaults.model),
            base_url: stored.base_url.clone().unwrap_or(defaults.base_url),
            get_api_key_url: stored
                .get_api_key_url
                .clone()
                .unwrap_or(defaults.get_api_key_url),
        }
    }

    pub fn active(&self) -> ProviderConfig {
        self.resolve(self.active_provider)
    }

    /// Overwrite the entry for the config's type with every field it carries.
    pub fn upsert(&mut self, config: &ProviderConfig) {
        self.providers
            .insert(config.provider_type, StoredProviderConfig::from(config));
    }
}
