use crate::domain::model::{CredentialPool, ModelHandle, ServiceError};
use crate::domain::ports::GenerativeService;
use crate::utils::error::{LegalEaseError, Result};
use tokio::sync::Mutex;

/// Hands out model handles from a credential pool, rotating past keys the
/// service rejects for quota or validity reasons.
///
/// The cursor is sticky: after a successful bind it stays on the working
/// credential, so the next acquisition starts there. Reading and advancing the
/// cursor happens under one lock, so concurrent sessions never rotate past a
/// credential another session has just found to be valid.
pub struct Dispatcher<S: GenerativeService> {
    service: S,
    pool: CredentialPool,
    cursor: Mutex<usize>,
    rotate_on_generation_quota: bool,
}

impl<S: GenerativeService> Dispatcher<S> {
    pub fn new(service: S, pool: CredentialPool) -> Self {
        Self {
            service,
            pool,
            cursor: Mutex::new(0),
            rotate_on_generation_quota: false,
        }
    }

    /// Also rotate when a quota error shows up during generation, not only while binding.
    pub fn with_generation_rotation(mut self, enabled: bool) -> Self {
        self.rotate_on_generation_quota = enabled;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub async fn cursor(&self) -> usize {
        *self.cursor.lock().await
    }

    pub async fn acquire_handle(&self) -> Result<ModelHandle> {
        let mut cursor = self.cursor.lock().await;
        let pool_size = self.pool.len();

        for attempt in 1..=pool_size {
            let slot = *cursor;
            let credential = self.pool.get(slot).ok_or_else(|| LegalEaseError::ConfigError {
                message: format!("credential cursor {} outside pool of {}", slot, pool_size),
            })?;

            match self.service.bind(credential).await {
                Ok(()) => {
                    tracing::debug!("🔑 Bound handle to credential slot {}", slot);
                    return Ok(ModelHandle::new(
                        slot,
                        credential.clone(),
                        self.service.model_name(),
                    ));
                }
                Err(e) if e.is_credential_rejection() => {
                    tracing::warn!(
                        "Credential slot {} rejected ({}), attempt {}/{}",
                        slot,
                        e,
                        attempt,
                        pool_size
                    );
                    *cursor = (slot + 1) % pool_size;
                }
                Err(e) => {
                    tracing::error!("❌ Binding credential slot {} failed: {}", slot, e);
                    return Err(generation_error(e));
                }
            }
        }

        tracing::error!("❌ All {} credentials rejected", pool_size);
        Err(LegalEaseError::CredentialsExhausted {
            attempts: pool_size,
        })
    }

    /// One generation request with an already bound handle. Never retried here.
    pub async fn generate(&self, handle: &ModelHandle, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Sending prompt ({} chars) with credential slot {}",
            prompt.len(),
            handle.slot()
        );
        self.service
            .generate(handle, prompt)
            .await
            .map_err(generation_error)
    }

    /// Acquire a handle and generate in one step.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let attempts = if self.rotate_on_generation_quota {
            self.pool.len()
        } else {
            1
        };

        for _ in 0..attempts {
            let handle = self.acquire_handle().await?;
            match self.service.generate(&handle, prompt).await {
                Ok(text) => return Ok(text),
                Err(e @ ServiceError::QuotaExceeded { .. }) if self.rotate_on_generation_quota => {
                    tracing::warn!(
                        "Credential slot {} ran out of quota while generating: {}",
                        handle.slot(),
                        e
                    );
                    self.retire(&handle).await;
                }
                Err(e) => return Err(generation_error(e)),
            }
        }

        Err(LegalEaseError::CredentialsExhausted { attempts })
    }

    // 只在游標仍指向該金鑰時才前進，避免越過其他 session 剛確認可用的金鑰
    async fn retire(&self, handle: &ModelHandle) {
        let mut cursor = self.cursor.lock().await;
        if *cursor == handle.slot() {
            *cursor = (handle.slot() + 1) % self.pool.len();
        }
    }
}

fn generation_error(e: ServiceError) -> LegalEaseError {
    LegalEaseError::Generation {
        cause: e.to_string(),
    }
}
