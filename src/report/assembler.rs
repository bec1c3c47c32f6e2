use crate::domain::model::SessionState;
use crate::report::assets::{Asset, AssetResolver, ImageAsset};
use crate::report::layout::{layout, Block, ImageId, Layout, PageGeometry, ParagraphStyle};
use crate::report::pdf::{write_pdf, PdfMetadata};
use crate::report::text::clean_generated_text;
use crate::utils::error::Result;
use chrono::{DateTime, Local};

pub const DISCLAIMER: &str = "Disclaimer: This AI-generated document is intended for educational and \
informational purposes only. It is not legal advice. The content may be \
incomplete, inaccurate, or outdated. For legal decisions, consult a qualified \
legal professional.";

pub const FULL_REPORT_TITLE: &str = "Full Legal Report";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SPACER: f32 = 12.0;
const STICKER_SIZE: f32 = 25.0;
const ICON_SIZE: f32 = 18.0;

/// One named block of the combined report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub icon: Option<ImageAsset>,
    pub heading: String,
    pub body: String,
}

/// A laid-out report before serialization.
#[derive(Debug, Clone)]
pub struct ComposedReport {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub layout: Layout,
    pub images: Vec<ImageAsset>,
    pub header: Option<ImageId>,
}

impl ComposedReport {
    pub fn image_names(&self) -> Vec<&str> {
        self.images.iter().map(|image| image.name.as_str()).collect()
    }

    pub fn to_pdf(&self, geometry: &PageGeometry) -> Result<Vec<u8>> {
        write_pdf(
            &self.layout,
            &self.images,
            self.header,
            geometry,
            &PdfMetadata {
                title: &self.title,
                created_at: self.generated_at,
            },
        )
    }
}

enum ReportBody<'a> {
    Single(&'a str),
    Sections(&'a [ReportSection]),
}

/// Builds branded, paginated PDF reports from generated text.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    assets: AssetResolver,
    geometry: PageGeometry,
}

impl ReportAssembler {
    pub fn new(assets: AssetResolver) -> Self {
        Self {
            assets,
            geometry: PageGeometry::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn assets(&self) -> &AssetResolver {
        &self.assets
    }

    pub fn render_single(&self, title: &str, body: &str) -> Result<Vec<u8>> {
        self.compose_single(title, body, Local::now())?
            .to_pdf(&self.geometry)
    }

    pub fn render_combined(&self, sections: &[ReportSection]) -> Result<Vec<u8>> {
        self.compose_combined(sections, Local::now())?
            .to_pdf(&self.geometry)
    }

    /// Sections for every populated session block, in report order, with their icons.
    pub fn sections_from_session(&self, session: &SessionState) -> Vec<ReportSection> {
        session
            .populated()
            .into_iter()
            .map(|block| ReportSection {
                icon: self.assets.resolve(Asset::section_icon(block.kind)),
                heading: block.kind.heading().to_string(),
                body: block.report_body(),
            })
            .collect()
    }

    pub fn compose_single(
        &self,
        title: &str,
        body: &str,
        generated_at: DateTime<Local>,
    ) -> Result<ComposedReport> {
        self.compose(title, ReportBody::Single(body), generated_at)
    }

    pub fn compose_combined(
        &self,
        sections: &[ReportSection],
        generated_at: DateTime<Local>,
    ) -> Result<ComposedReport> {
        self.compose(FULL_REPORT_TITLE, ReportBody::Sections(sections), generated_at)
    }

    fn compose(
        &self,
        title: &str,
        body: ReportBody<'_>,
        generated_at: DateTime<Local>,
    ) -> Result<ComposedReport> {
        let mut images = Vec::new();
        let mut blocks = Vec::new();

        let header = self.assets.resolve(Asset::HeaderLogo).map(|logo| {
            images.push(logo);
            images.len() - 1
        });

        blocks.push(Block::Paragraph {
            style: ParagraphStyle::TITLE,
            text: title.to_string(),
        });
        blocks.push(Block::Spacer(SPACER));

        match body {
            ReportBody::Single(text) => {
                blocks.push(Block::Paragraph {
                    style: ParagraphStyle::BODY,
                    text: clean_generated_text(text),
                });
                blocks.push(Block::Spacer(SPACER));
            }
            ReportBody::Sections(sections) => {
                for section in sections.iter().filter(|s| !s.body.trim().is_empty()) {
                    let icon = section.icon.clone().map(|icon| {
                        images.push(icon);
                        images.len() - 1
                    });
                    blocks.push(Block::Heading {
                        icon,
                        icon_size: ICON_SIZE,
                        style: ParagraphStyle::HEADING,
                        text: section.heading.clone(),
                    });
                    blocks.push(Block::Spacer(SPACER / 2.0));
                    blocks.push(Block::Paragraph {
                        style: ParagraphStyle::BODY,
                        text: clean_generated_text(&section.body),
                    });
                    blocks.push(Block::Spacer(SPACER));
                }
            }
        }

        blocks.push(Block::Paragraph {
            style: ParagraphStyle::NOTE,
            text: format!("Generated on: {}", generated_at.format(TIMESTAMP_FORMAT)),
        });
        blocks.push(Block::Spacer(SPACER));

        if let Some(sticker) = self.assets.resolve(Asset::DisclaimerSticker) {
            images.push(sticker);
            blocks.push(Block::Image {
                id: images.len() - 1,
                width: STICKER_SIZE,
                height: STICKER_SIZE,
            });
        }
        blocks.push(Block::Paragraph {
            style: ParagraphStyle::NOTE,
            text: DISCLAIMER.to_string(),
        });

        let layout = layout(&blocks, &self.geometry)?;
        tracing::debug!(
            "Composed '{}' into {} page(s) with {} image(s)",
            title,
            layout.pages.len(),
            images.len()
        );

        Ok(ComposedReport {
            title: title.to_string(),
            generated_at,
            layout,
            images,
            header,
        })
    }
}
