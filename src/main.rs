use clap::Parser;
use legalease::app::{asset_statuses, build_assistant, CliAssistant};
use legalease::config::settings::credentials_from_env;
use legalease::config::{CliConfig, Command};
use legalease::core::extract::ExtractedText;
use legalease::domain::model::{Artifact, BlockKind, SessionState};
use legalease::utils::error::{LegalEaseError, Result};
use legalease::utils::monitor::SystemMonitor;
use legalease::utils::validation::{validate_file_extension, Validate};
use legalease::utils::logger;
use legalease::Settings;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting legalease CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ legalease failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        for line in e.cli_report() {
            eprintln!("{}", line);
        }

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let settings = config.load_settings()?;

    // 驗證配置
    settings.validate()?;

    if let Command::Assets = config.command {
        return check_assets(&settings);
    }

    let monitor = SystemMonitor::new(config.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pool = credentials_from_env()?;
    let assistant = build_assistant(&settings, pool)?;

    match &config.command {
        Command::Summarize { pdf } => {
            let document = load(&assistant, pdf).await?;
            let mut session = SessionState::new();
            let artifact = assistant.summarize(&document.text, &mut session).await?;
            print_block(&session, BlockKind::Summary);
            save(&assistant, &settings, &artifact).await?;
            monitor.log_action("Summarize");
        }
        Command::Clauses { pdf } => {
            let document = load(&assistant, pdf).await?;
            let mut session = SessionState::new();
            let artifact = assistant.explain_clauses(&document.text, &mut session).await?;
            print_block(&session, BlockKind::Clauses);
            save(&assistant, &settings, &artifact).await?;
            monitor.log_action("Clauses");
        }
        Command::Ask { pdf, question } => {
            let document = load(&assistant, pdf).await?;
            let mut session = SessionState::new();
            let artifact = assistant.answer(&document.text, question, &mut session).await?;
            print_block(&session, BlockKind::QaAnswer);
            save(&assistant, &settings, &artifact).await?;
            monitor.log_action("Ask");
        }
        Command::Report { pdf, question } => {
            let document = load(&assistant, pdf).await?;
            let mut session = SessionState::new();
            // 只產生內容，分段 PDF 不輸出
            assistant.record_summary(&document.text, &mut session).await?;
            assistant.record_clauses(&document.text, &mut session).await?;
            if let Some(question) = question {
                assistant
                    .record_answer(&document.text, question, &mut session)
                    .await?;
            }
            let artifact = assistant.full_report(&session)?;
            save(&assistant, &settings, &artifact).await?;
            monitor.log_action("Report");
        }
        Command::Session { pdf } => {
            let document = load(&assistant, pdf).await?;
            interactive_session(&assistant, &settings, &document, &monitor).await?;
        }
        // 已在載入金鑰前處理
        Command::Assets => {}
    }

    monitor.log_final_stats();
    Ok(())
}

async fn load(assistant: &CliAssistant, pdf: &str) -> Result<ExtractedText> {
    validate_file_extension("document", pdf, &["pdf"])?;
    // 絕對路徑才不會被接到輸出目錄底下
    let path = std::path::absolute(pdf)?;
    let document = assistant.load_document(&path.to_string_lossy()).await?;
    tracing::info!(
        "📄 Extracted {} chars from {} page(s)",
        document.text.len(),
        document.page_count
    );
    Ok(document)
}

async fn save(assistant: &CliAssistant, settings: &Settings, artifact: &Artifact) -> Result<()> {
    let path = assistant.save(artifact).await?;
    let full_path = std::path::Path::new(&settings.output.directory).join(&path);
    tracing::info!("📁 Output saved to: {}", full_path.display());
    println!("✅ {} saved to {}", artifact.title, full_path.display());
    Ok(())
}

fn print_block(session: &SessionState, kind: BlockKind) {
    if let Some(block) = session.get(kind) {
        println!("\n## {}\n\n{}\n", kind.heading(), block.text);
    }
}

const SESSION_HELP: &str = "Commands: summary | clauses | ask <question> | report | help | quit";

async fn interactive_session(
    assistant: &CliAssistant,
    settings: &Settings,
    document: &ExtractedText,
    monitor: &SystemMonitor,
) -> Result<()> {
    let mut session = SessionState::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", SESSION_HELP);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        let outcome = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{}", SESSION_HELP);
                continue;
            }
            "summary" => assistant
                .summarize(&document.text, &mut session)
                .await
                .map(|artifact| (artifact, Some(BlockKind::Summary))),
            "clauses" => assistant
                .explain_clauses(&document.text, &mut session)
                .await
                .map(|artifact| (artifact, Some(BlockKind::Clauses))),
            "ask" => assistant
                .answer(&document.text, rest, &mut session)
                .await
                .map(|artifact| (artifact, Some(BlockKind::QaAnswer))),
            "report" => assistant.full_report(&session).map(|artifact| (artifact, None)),
            other => {
                println!("Unknown command '{}'. {}", other, SESSION_HELP);
                continue;
            }
        };

        match outcome {
            Ok((artifact, kind)) => {
                if let Some(kind) = kind {
                    print_block(&session, kind);
                }
                save(assistant, settings, &artifact).await?;
                monitor.log_action(command);
            }
            Err(e) if is_session_recoverable(&e) => {
                tracing::warn!("⚠️ {} failed: {}", command, e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!("👋 Session ended");
    Ok(())
}

/// 生成或輸入錯誤只影響這次操作，session 繼續
fn is_session_recoverable(e: &LegalEaseError) -> bool {
    matches!(
        e,
        LegalEaseError::EmptyQuestion
            | LegalEaseError::Generation { .. }
            | LegalEaseError::CredentialsExhausted { .. }
    )
}

fn check_assets(settings: &Settings) -> Result<()> {
    let resolver = settings.asset_resolver()?;
    println!("Assets directory: {}", settings.assets.directory);
    for status in asset_statuses(&resolver) {
        let path = status
            .path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        match status.dimensions {
            Some((width, height)) => println!(
                "✅ {:<20} {} ({}x{})",
                status.asset.logical_name(),
                path,
                width,
                height
            ),
            None => println!(
                "⚠️ {:<20} {} (missing or unreadable, will be skipped)",
                status.asset.logical_name(),
                path
            ),
        }
    }
    Ok(())
}
