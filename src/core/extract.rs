use crate::domain::ports::TextExtractor;
use crate::utils::error::Result;

/// Concatenated document text plus the pages that contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
    /// 1-based numbers of pages with missing or empty text.
    pub empty_pages: Vec<usize>,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Join page texts in order. Pages without text add nothing, not even a separator.
pub fn extract_document_text<E: TextExtractor + ?Sized>(
    extractor: &E,
    document: &[u8],
) -> Result<ExtractedText> {
    let pages = extractor.page_texts(document)?;
    let page_count = pages.len();
    let mut text = String::new();
    let mut empty_pages = Vec::new();

    for (index, page) in pages.into_iter().enumerate() {
        match page {
            Some(page_text) if !page_text.is_empty() => text.push_str(&page_text),
            Some(_) => empty_pages.push(index + 1),
            None => {
                tracing::warn!("⚠️ Page {} text could not be extracted, treating as empty", index + 1);
                empty_pages.push(index + 1);
            }
        }
    }

    if text.trim().is_empty() {
        tracing::warn!("⚠️ No text found in {} page(s); the document may be scanned", page_count);
    } else {
        tracing::debug!(
            "Extracted {} chars from {} page(s), {} empty",
            text.len(),
            page_count,
            empty_pages.len()
        );
    }

    Ok(ExtractedText {
        text,
        page_count,
        empty_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<Option<String>>);

    impl TextExtractor for FixedPages {
        fn page_texts(&self, _document: &[u8]) -> Result<Vec<Option<String>>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_missing_page_adds_no_placeholder() {
        let extractor = FixedPages(vec![
            Some("Page one. ".to_string()),
            None,
            Some("Page three.".to_string()),
        ]);

        let extracted = extract_document_text(&extractor, b"%PDF").unwrap();

        assert_eq!(extracted.text, "Page one. Page three.");
        assert_eq!(extracted.page_count, 3);
        assert_eq!(extracted.empty_pages, vec![2]);
    }

    #[test]
    fn test_empty_string_page_is_counted_as_empty() {
        let extractor = FixedPages(vec![Some(String::new()), Some("text".to_string())]);

        let extracted = extract_document_text(&extractor, b"%PDF").unwrap();

        assert_eq!(extracted.text, "text");
        assert_eq!(extracted.empty_pages, vec![1]);
        assert!(!extracted.is_empty());
    }

    #[test]
    fn test_document_without_text_still_succeeds() {
        let extractor = FixedPages(vec![None, None]);

        let extracted = extract_document_text(&extractor, b"%PDF").unwrap();

        assert!(extracted.is_empty());
        assert_eq!(extracted.empty_pages, vec![1, 2]);
    }
}
