use crate::utils::error::{LegalEaseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Media type of every exported artifact.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// 不透明的 API 金鑰，Debug 輸出時不會洩漏內容
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Ordered, non-empty set of credentials fixed at startup.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Result<Self> {
        if credentials.is_empty() {
            return Err(LegalEaseError::MissingConfigError {
                field: "GENAI_API_KEY_1".to_string(),
            });
        }
        Ok(Self { credentials })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Credential> {
        self.credentials.get(slot)
    }
}

/// 綁定單一金鑰的請求能力，每次生成請求使用一個
#[derive(Debug, Clone)]
pub struct ModelHandle {
    slot: usize,
    credential: Credential,
    model: String,
}

impl ModelHandle {
    pub fn new(slot: usize, credential: Credential, model: impl Into<String>) -> Self {
        Self {
            slot,
            credential,
            model: model.into(),
        }
    }

    /// Pool index of the credential this handle is bound to.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Failure reported by a generative service adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("credential rejected: {message}")]
    InvalidCredential { message: String },

    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    #[error("request rejected: {message}")]
    Rejected { message: String },
}

impl ServiceError {
    /// Problems tied to the credential itself; switching keys can fix these.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(
            self,
            ServiceError::QuotaExceeded { .. } | ServiceError::InvalidCredential { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Summary,
    Clauses,
    QaAnswer,
}

impl BlockKind {
    /// Fixed order of sections in the combined report.
    pub const REPORT_ORDER: [BlockKind; 3] =
        [BlockKind::Summary, BlockKind::Clauses, BlockKind::QaAnswer];

    pub fn heading(&self) -> &'static str {
        match self {
            BlockKind::Summary => "Summary",
            BlockKind::Clauses => "Clause Explanations",
            BlockKind::QaAnswer => "Questions & Answers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBlock {
    pub kind: BlockKind,
    pub text: String,
    /// Originating question, only set for [`BlockKind::QaAnswer`].
    pub query: Option<String>,
}

impl GeneratedBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            query: None,
        }
    }

    pub fn answer(query: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::QaAnswer,
            text: text.into(),
            query: Some(query.into()),
        }
    }

    /// Body shown in the combined report; answers are prefixed with their question.
    pub fn report_body(&self) -> String {
        match &self.query {
            Some(query) => format!("Question: {}\n\n{}", query, self.text),
            None => self.text.clone(),
        }
    }
}

/// Latest generated block per kind for one interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub summary: Option<GeneratedBlock>,
    pub clauses: Option<GeneratedBlock>,
    pub qa_answer: Option<GeneratedBlock>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以新結果覆蓋同類型的舊結果
    pub fn store(&mut self, block: GeneratedBlock) {
        match block.kind {
            BlockKind::Summary => self.summary = Some(block),
            BlockKind::Clauses => self.clauses = Some(block),
            BlockKind::QaAnswer => self.qa_answer = Some(block),
        }
    }

    pub fn get(&self, kind: BlockKind) -> Option<&GeneratedBlock> {
        match kind {
            BlockKind::Summary => self.summary.as_ref(),
            BlockKind::Clauses => self.clauses.as_ref(),
            BlockKind::QaAnswer => self.qa_answer.as_ref(),
        }
    }

    /// Blocks with non-blank text, in report order.
    pub fn populated(&self) -> Vec<&GeneratedBlock> {
        BlockKind::REPORT_ORDER
            .iter()
            .filter_map(|kind| self.get(*kind))
            .filter(|block| !block.text.trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    Summary,
    Clauses,
    Answer,
    FullReport,
}

impl ExportKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            ExportKind::Summary => "Legal_Summary",
            ExportKind::Clauses => "Clause_Explanations",
            ExportKind::Answer => "AI_Answer",
            ExportKind::FullReport => "Full_Legal_Report",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.file_stem())
    }
}

/// A rendered document ready for download.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ExportKind,
    pub title: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn file_name(&self) -> String {
        self.kind.file_name()
    }

    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }
}
