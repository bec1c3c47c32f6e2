pub mod assistant;
pub mod dispatcher;
pub mod extract;
pub mod prompts;

pub use crate::domain::ports::{ConfigProvider, GenerativeService, Storage, TextExtractor};
pub use crate::utils::error::Result;
