pub mod assembler;
pub mod assets;
pub mod layout;
pub mod pdf;
pub mod text;

pub use assembler::{ComposedReport, ReportAssembler, ReportSection, DISCLAIMER, FULL_REPORT_TITLE};
pub use assets::{Asset, AssetResolver, ImageAsset};
