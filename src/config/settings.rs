use crate::adapters::gemini::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use crate::core::ConfigProvider;
use crate::domain::model::{Credential, CredentialPool};
use crate::report::{Asset, AssetResolver};
use crate::utils::error::{LegalEaseError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Numbered keys are read as `GENAI_API_KEY_1`, `GENAI_API_KEY_2`, ... until the first gap.
pub const CREDENTIAL_ENV_PREFIX: &str = "GENAI_API_KEY_";
pub const SINGLE_CREDENTIAL_ENV: &str = "GENAI_API_KEY";

const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder pattern"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub output: OutputSettings,
    pub assets: AssetSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub api_base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub rotate_on_generation_quota: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 120,
            rotate_on_generation_quota: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: "./output".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub directory: String,
    /// 邏輯名稱 -> 檔名，例如 header_logo = "brand.png"
    pub files: BTreeMap<String, String>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            directory: "./assets".to_string(),
            files: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定，先替換 ${VAR}
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Asset resolver for the configured directory and file overrides.
    pub fn asset_resolver(&self) -> Result<AssetResolver> {
        let mut resolver = AssetResolver::new(&self.assets.directory);
        for (name, file) in &self.assets.files {
            let asset = Asset::from_logical_name(name).ok_or_else(|| {
                LegalEaseError::InvalidConfigValueError {
                    field: format!("assets.files.{}", name),
                    value: file.clone(),
                    reason: "Unknown asset name".to_string(),
                }
            })?;
            resolver = resolver.with_file(asset, file.clone());
        }
        Ok(resolver)
    }
}

/// 替換環境變數 (例如 ${API_BASE})，未設定的保持原樣
fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}

/// Credential pool from the process environment.
pub fn credentials_from_env() -> Result<CredentialPool> {
    credentials_from(|name| std::env::var(name).ok())
}

/// Credential pool from any variable lookup, in slot order.
pub fn credentials_from<F>(lookup: F) -> Result<CredentialPool>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    let mut credentials: Vec<Credential> = (1..)
        .map_while(|index| present(&format!("{}{}", CREDENTIAL_ENV_PREFIX, index)))
        .map(|secret| Credential::new(secret.trim()))
        .collect();

    if credentials.is_empty() {
        if let Some(secret) = present(SINGLE_CREDENTIAL_ENV) {
            credentials.push(Credential::new(secret.trim()));
        }
    }

    tracing::debug!("🔑 Loaded {} credential(s) from environment", credentials.len());
    CredentialPool::new(credentials)
}

impl ConfigProvider for Settings {
    fn api_base_url(&self) -> &str {
        &self.service.api_base_url
    }

    fn model_name(&self) -> &str {
        &self.service.model
    }

    fn output_path(&self) -> &str {
        &self.output.directory
    }

    fn assets_dir(&self) -> &str {
        &self.assets.directory
    }

    fn request_timeout_secs(&self) -> u64 {
        self.service.request_timeout_secs
    }

    fn rotate_on_generation_quota(&self) -> bool {
        self.service.rotate_on_generation_quota
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("service.api_base_url", &self.service.api_base_url)?;
        validate_non_empty_string("service.model", &self.service.model)?;
        validate_range(
            "service.request_timeout_secs",
            self.service.request_timeout_secs,
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;
        validate_path("output.directory", &self.output.directory)?;
        validate_path("assets.directory", &self.assets.directory)?;
        self.asset_resolver()?;
        Ok(())
    }
}
