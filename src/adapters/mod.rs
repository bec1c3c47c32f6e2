// Adapters layer: concrete implementations for external systems (generative service, PDF text).

pub mod gemini;
pub mod pdf_text;

pub use gemini::GeminiClient;
pub use pdf_text::LopdfExtractor;
