pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub use cli::LocalStorage;
pub use settings::Settings;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "legalease")]
#[command(about = "Summarize, explain and question legal PDFs, exporting branded reports")]
pub struct CliConfig {
    #[arg(long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory for exported PDFs")]
    pub output_dir: Option<String>,

    #[arg(long, global = true, help = "Directory holding logos and icons")]
    pub assets_dir: Option<String>,

    #[arg(long, global = true, help = "Generative model name")]
    pub model: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage after each action")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Summarize a legal document
    Summarize { pdf: String },
    /// Explain the important clauses of a legal document
    Clauses { pdf: String },
    /// Ask a question about a legal document
    Ask { pdf: String, question: String },
    /// Summary, clauses and an optional answer in one combined report
    Report {
        pdf: String,
        #[arg(long)]
        question: Option<String>,
    },
    /// Interactive session over one document, read from stdin
    Session { pdf: String },
    /// Show which branding assets resolve
    Assets,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Settings file (or defaults) with command-line overrides applied.
    pub fn load_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Settings::from_file(path)?
            }
            None => Settings::default(),
        };

        if let Some(dir) = &self.output_dir {
            settings.output.directory = dir.clone();
        }
        if let Some(dir) = &self.assets_dir {
            settings.assets.directory = dir.clone();
        }
        if let Some(model) = &self.model {
            settings.service.model = model.clone();
        }
        Ok(settings)
    }
}
