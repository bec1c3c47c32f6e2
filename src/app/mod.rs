// 組裝層：依設定把 Gemini client、儲存與報表組起來

use crate::adapters::{GeminiClient, LopdfExtractor};
use crate::config::{LocalStorage, Settings};
use crate::core::assistant::LegalAssistant;
use crate::core::dispatcher::Dispatcher;
use crate::core::ConfigProvider;
use crate::domain::model::CredentialPool;
use crate::report::{Asset, AssetResolver, ReportAssembler};
use crate::utils::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub type CliAssistant = LegalAssistant<GeminiClient, LocalStorage>;

/// Wire the Gemini-backed assistant from settings and a credential pool.
pub fn build_assistant(settings: &Settings, pool: CredentialPool) -> Result<CliAssistant> {
    let timeout = Duration::from_secs(settings.request_timeout_secs());
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    let client = GeminiClient::with_client(http, settings.api_base_url(), settings.model_name());

    tracing::info!(
        "🤖 Using model {} with {} credential(s)",
        settings.model_name(),
        pool.len()
    );
    let dispatcher = Dispatcher::new(client, pool)
        .with_generation_rotation(settings.rotate_on_generation_quota());
    let assembler = ReportAssembler::new(settings.asset_resolver()?);
    let storage = LocalStorage::new(settings.output_path());

    Ok(
        LegalAssistant::new(dispatcher, assembler, storage, Arc::new(LopdfExtractor))
            .with_request_timeout(timeout),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStatus {
    pub asset: Asset,
    pub path: Option<PathBuf>,
    /// Pixel size when the file exists and decodes.
    pub dimensions: Option<(u32, u32)>,
}

pub fn asset_statuses(resolver: &AssetResolver) -> Vec<AssetStatus> {
    Asset::ALL
        .iter()
        .map(|&asset| AssetStatus {
            asset,
            path: resolver.path_for(asset),
            dimensions: resolver
                .resolve(asset)
                .map(|image| (image.width, image.height)),
        })
        .collect()
}
