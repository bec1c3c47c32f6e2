pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, Settings};

pub use adapters::{GeminiClient, LopdfExtractor};
pub use core::{assistant::LegalAssistant, dispatcher::Dispatcher};
pub use domain::model::{Artifact, CredentialPool, SessionState};
pub use report::{AssetResolver, ReportAssembler};
pub use utils::error::{LegalEaseError, Result};
