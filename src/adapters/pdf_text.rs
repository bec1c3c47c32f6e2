use crate::domain::ports::TextExtractor;
use crate::utils::error::{LegalEaseError, Result};
use lopdf::Document;

/// Page text extraction backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn page_texts(&self, document: &[u8]) -> Result<Vec<Option<String>>> {
        let doc = Document::load_mem(document).map_err(|e| LegalEaseError::Extraction {
            message: format!("failed to load PDF: {}", e),
        })?;

        let pages = doc
            .get_pages()
            .into_keys()
            .map(|page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("⚠️ Could not extract text from page {}: {}", page_number, e);
                    None
                }
            })
            .collect();

        Ok(pages)
    }
}
