use crate::domain::model::{Credential, ModelHandle, ServiceError};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn model_name(&self) -> &str;
    fn output_path(&self) -> &str;
    fn assets_dir(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn rotate_on_generation_quota(&self) -> bool;
}

/// Generative-AI text service.
///
/// `bind` checks that a credential can currently be used for the configured
/// model; `generate` performs one generation request with a bound handle.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    fn model_name(&self) -> &str;

    async fn bind(&self, credential: &Credential) -> std::result::Result<(), ServiceError>;

    async fn generate(
        &self,
        handle: &ModelHandle,
        prompt: &str,
    ) -> std::result::Result<String, ServiceError>;
}

/// Per-page text source for an uploaded document.
pub trait TextExtractor: Send + Sync {
    /// Text of every page in page order; `None` for a page whose text could not be read.
    fn page_texts(&self, document: &[u8]) -> Result<Vec<Option<String>>>;
}
