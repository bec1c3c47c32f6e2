use crate::utils::error::{LegalEaseError, Result};

pub fn summary_prompt(document: &str) -> String {
    format!("Summarize this legal document:\n\n{}", document)
}

pub fn clauses_prompt(document: &str) -> String {
    format!(
        "Explain the important clauses in this legal document:\n\n{}",
        document
    )
}

/// Blank questions are rejected before any request is made.
pub fn question_prompt(document: &str, question: &str) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(LegalEaseError::EmptyQuestion);
    }
    Ok(format!(
        "Answer the following question based on this legal document:\n\n{}\n\nQuestion: {}",
        document, question
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_prompt_appends_question() {
        let prompt = question_prompt("Lease text", "  Are there hidden fees? ").unwrap();
        assert!(prompt.starts_with("Answer the following question"));
        assert!(prompt.ends_with("Lease text\n\nQuestion: Are there hidden fees?"));
    }

    #[test]
    fn test_blank_question_is_rejected() {
        assert!(matches!(
            question_prompt("Lease text", "   "),
            Err(LegalEaseError::EmptyQuestion)
        ));
    }
}
