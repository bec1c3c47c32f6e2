use crate::core::dispatcher::Dispatcher;
use crate::core::extract::{extract_document_text, ExtractedText};
use crate::core::prompts::{clauses_prompt, question_prompt, summary_prompt};
use crate::domain::model::{Artifact, BlockKind, ExportKind, GeneratedBlock, SessionState};
use crate::domain::ports::{GenerativeService, Storage, TextExtractor};
use crate::report::ReportAssembler;
use crate::utils::error::{LegalEaseError, Result};
use std::sync::Arc;
use std::time::Duration;

pub const SUMMARY_TITLE: &str = "Legal Document Summary";
pub const CLAUSES_TITLE: &str = "Clause Explanations";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// One user action end to end: prompt, generate, remember, render.
pub struct LegalAssistant<S: GenerativeService, T: Storage> {
    dispatcher: Dispatcher<S>,
    assembler: ReportAssembler,
    storage: T,
    extractor: Arc<dyn TextExtractor>,
    request_timeout: Duration,
}

impl<S: GenerativeService, T: Storage> LegalAssistant<S, T> {
    pub fn new(
        dispatcher: Dispatcher<S>,
        assembler: ReportAssembler,
        storage: T,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            dispatcher,
            assembler,
            storage,
            extractor,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    pub fn assembler(&self) -> &ReportAssembler {
        &self.assembler
    }

    /// Read an uploaded PDF through storage and extract its text.
    pub async fn load_document(&self, path: &str) -> Result<ExtractedText> {
        tracing::info!("📄 Loading document {}", path);
        let bytes = self.storage.read_file(path).await?;
        extract_document_text(self.extractor.as_ref(), &bytes)
    }

    pub async fn summarize(&self, document: &str, session: &mut SessionState) -> Result<Artifact> {
        let text = self.record_summary(document, session).await?;
        self.render(ExportKind::Summary, SUMMARY_TITLE.to_string(), &text)
    }

    pub async fn explain_clauses(
        &self,
        document: &str,
        session: &mut SessionState,
    ) -> Result<Artifact> {
        let text = self.record_clauses(document, session).await?;
        self.render(ExportKind::Clauses, CLAUSES_TITLE.to_string(), &text)
    }

    pub async fn answer(
        &self,
        document: &str,
        question: &str,
        session: &mut SessionState,
    ) -> Result<Artifact> {
        let text = self.record_answer(document, question, session).await?;
        self.render(
            ExportKind::Answer,
            format!("Answer to: {}", question.trim()),
            &text,
        )
    }

    /// Generate the summary into the session without rendering a PDF.
    pub async fn record_summary(
        &self,
        document: &str,
        session: &mut SessionState,
    ) -> Result<String> {
        let text = self.generate(&summary_prompt(document)).await?;
        session.store(GeneratedBlock::new(BlockKind::Summary, text.clone()));
        Ok(text)
    }

    pub async fn record_clauses(
        &self,
        document: &str,
        session: &mut SessionState,
    ) -> Result<String> {
        let text = self.generate(&clauses_prompt(document)).await?;
        session.store(GeneratedBlock::new(BlockKind::Clauses, text.clone()));
        Ok(text)
    }

    pub async fn record_answer(
        &self,
        document: &str,
        question: &str,
        session: &mut SessionState,
    ) -> Result<String> {
        let prompt = question_prompt(document, question)?;
        let text = self.generate(&prompt).await?;
        session.store(GeneratedBlock::answer(question.trim(), text.clone()));
        Ok(text)
    }

    /// Combined report over every populated block of the session.
    pub fn full_report(&self, session: &SessionState) -> Result<Artifact> {
        let sections = self.assembler.sections_from_session(session);
        tracing::info!("🗂️ Building full report with {} section(s)", sections.len());
        let bytes = self.assembler.render_combined(&sections)?;
        Ok(Artifact {
            kind: ExportKind::FullReport,
            title: crate::report::FULL_REPORT_TITLE.to_string(),
            bytes,
        })
    }

    /// Write the artifact under its download name; returns the relative path.
    pub async fn save(&self, artifact: &Artifact) -> Result<String> {
        let path = artifact.file_name();
        self.storage.write_file(&path, &artifact.bytes).await?;
        tracing::info!("💾 Saved {} ({} bytes)", path, artifact.bytes.len());
        Ok(path)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.request_timeout, self.dispatcher.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("⏱️ Generation timed out after {:?}", self.request_timeout);
                Err(LegalEaseError::Generation {
                    cause: format!("request timed out after {:?}", self.request_timeout),
                })
            }
        }
    }

    fn render(&self, kind: ExportKind, title: String, text: &str) -> Result<Artifact> {
        let bytes = self.assembler.render_single(&title, text)?;
        tracing::info!("📝 Rendered '{}' ({} bytes)", title, bytes.len());
        Ok(Artifact { kind, title, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Credential, CredentialPool, ModelHandle, ServiceError};
    use crate::report::AssetResolver;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// Echoes the first line of the prompt, or fails every request.
    struct EchoService {
        fail_with: Option<ServiceError>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl GenerativeService for EchoService {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn bind(&self, _credential: &Credential) -> std::result::Result<(), ServiceError> {
            Ok(())
        }

        async fn generate(
            &self,
            _handle: &ModelHandle,
            prompt: &str,
        ) -> std::result::Result<String, ServiceError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(format!("Generated for: {}", prompt.lines().next().unwrap_or(""))),
            }
        }
    }

    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                LegalEaseError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "File not found",
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct OnePage;

    impl TextExtractor for OnePage {
        fn page_texts(&self, _document: &[u8]) -> Result<Vec<Option<String>>> {
            Ok(vec![Some("Lease agreement.".to_string())])
        }
    }

    fn assistant(service: EchoService) -> (LegalAssistant<EchoService, MockStorage>, Arc<Mutex<HashMap<String, Vec<u8>>>>) {
        let files = Arc::new(Mutex::new(HashMap::new()));
        let pool = CredentialPool::new(vec![Credential::new("k1")]).unwrap();
        let assistant = LegalAssistant::new(
            Dispatcher::new(service, pool),
            ReportAssembler::new(AssetResolver::empty()),
            MockStorage {
                files: files.clone(),
            },
            Arc::new(OnePage),
        );
        (assistant, files)
    }

    fn working() -> EchoService {
        EchoService {
            fail_with: None,
            delay: None,
        }
    }

    #[tokio::test]
    async fn test_summarize_stores_block_and_renders_pdf() {
        let (assistant, _) = assistant(working());
        let mut session = SessionState::new();

        let artifact = assistant.summarize("Lease text", &mut session).await.unwrap();

        assert_eq!(artifact.file_name(), "Legal_Summary.pdf");
        assert_eq!(artifact.title, SUMMARY_TITLE);
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(
            session.get(BlockKind::Summary).unwrap().text,
            "Generated for: Summarize this legal document:"
        );
    }

    #[tokio::test]
    async fn test_answer_title_and_question_recorded() {
        let (assistant, _) = assistant(working());
        let mut session = SessionState::new();

        let artifact = assistant
            .answer("Lease text", "  Who pays repairs? ", &mut session)
            .await
            .unwrap();

        assert_eq!(artifact.title, "Answer to: Who pays repairs?");
        assert_eq!(artifact.file_name(), "AI_Answer.pdf");
        let block = session.get(BlockKind::QaAnswer).unwrap();
        assert_eq!(block.query.as_deref(), Some("Who pays repairs?"));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_before_generation() {
        let (assistant, _) = assistant(working());
        let mut session = SessionState::new();

        let err = assistant.answer("Lease text", "   ", &mut session).await.unwrap_err();

        assert!(matches!(err, LegalEaseError::EmptyQuestion));
        assert_eq!(session, SessionState::new());
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_session_untouched() {
        let (assistant, _) = assistant(EchoService {
            fail_with: Some(ServiceError::Unavailable {
                message: "backend down".to_string(),
            }),
            delay: None,
        });
        let mut session = SessionState::new();
        session.store(GeneratedBlock::new(BlockKind::Clauses, "Earlier clauses."));
        let before = session.clone();

        let err = assistant.explain_clauses("Lease text", &mut session).await.unwrap_err();

        assert!(matches!(err, LegalEaseError::Generation { .. }));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_generation_timeout_is_a_generation_error() {
        let (assistant, _) = assistant(EchoService {
            fail_with: None,
            delay: Some(Duration::from_millis(200)),
        });
        let assistant = assistant.with_request_timeout(Duration::from_millis(10));
        let mut session = SessionState::new();

        let err = assistant.summarize("Lease text", &mut session).await.unwrap_err();

        assert!(matches!(err, LegalEaseError::Generation { .. }));
        assert!(session.summary.is_none());
    }

    #[tokio::test]
    async fn test_full_report_and_save() {
        let (assistant, files) = assistant(working());
        let mut session = SessionState::new();
        assistant.summarize("Lease text", &mut session).await.unwrap();

        let report = assistant.full_report(&session).unwrap();
        let path = assistant.save(&report).await.unwrap();

        assert_eq!(path, "Full_Legal_Report.pdf");
        let files = files.lock().await;
        assert_eq!(files.get(&path).unwrap(), &report.bytes);
    }

    #[tokio::test]
    async fn test_record_fills_session_without_writing_files() {
        let (assistant, files) = assistant(working());
        let mut session = SessionState::new();

        assistant.record_summary("Lease text", &mut session).await.unwrap();
        assistant.record_clauses("Lease text", &mut session).await.unwrap();
        let answer = assistant
            .record_answer("Lease text", " Term? ", &mut session)
            .await
            .unwrap();

        assert!(answer.starts_with("Generated for:"));
        assert!(session.summary.is_some());
        assert!(session.get(BlockKind::Clauses).is_some());
        assert_eq!(
            session.get(BlockKind::QaAnswer).unwrap().query.as_deref(),
            Some("Term?")
        );
        assert!(files.lock().await.is_empty());

        let report = assistant.full_report(&session).unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_load_document_reads_through_storage() {
        let (assistant, files) = assistant(working());
        files
            .lock()
            .await
            .insert("lease.pdf".to_string(), b"%PDF-1.5".to_vec());

        let extracted = assistant.load_document("lease.pdf").await.unwrap();

        assert_eq!(extracted.text, "Lease agreement.");
        assert!(assistant.load_document("missing.pdf").await.is_err());
    }
}
