//! Serializes a laid-out report into PDF bytes with `lopdf`.

use crate::report::assets::ImageAsset;
use crate::report::layout::{FontStyle, ImageId, Layout, Mark, PageGeometry};
use crate::report::text::encode_win_ansi;
use crate::utils::error::{LegalEaseError, Result};
use chrono::{DateTime, Local};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

const PRODUCER: &str = concat!("legalease ", env!("CARGO_PKG_VERSION"));

/// Box the header logo is fitted into, measured from the top-left page corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderBox {
    pub left: f32,
    pub top_offset: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for HeaderBox {
    fn default() -> Self {
        Self {
            left: 40.0,
            top_offset: 20.0,
            width: 180.0,
            height: 80.0,
        }
    }
}

impl HeaderBox {
    /// Placement `(x, y, width, height)` keeping the image aspect ratio, centred in the box.
    pub fn fit(&self, geometry: &PageGeometry, image: &ImageAsset) -> (f32, f32, f32, f32) {
        let box_y = geometry.height - self.top_offset - self.height;
        if image.width == 0 || image.height == 0 {
            return (self.left, box_y, self.width, self.height);
        }
        let scale = (self.width / image.width as f32).min(self.height / image.height as f32);
        let (w, h) = (image.width as f32 * scale, image.height as f32 * scale);
        (
            self.left + (self.width - w) / 2.0,
            box_y + (self.height - h) / 2.0,
            w,
            h,
        )
    }
}

pub struct PdfMetadata<'a> {
    pub title: &'a str,
    pub created_at: DateTime<Local>,
}

pub fn write_pdf(
    layout: &Layout,
    images: &[ImageAsset],
    header: Option<ImageId>,
    geometry: &PageGeometry,
    metadata: &PdfMetadata<'_>,
) -> Result<Vec<u8>> {
    geometry.validate()?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for style in FontStyle::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => style.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(style.resource_name(), font_id);
    }

    let mut xobjects = Dictionary::new();
    for (id, image) in images.iter().enumerate() {
        let image_id = add_image(&mut doc, image)?;
        xobjects.set(image_resource_name(id), image_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let header_image = header.and_then(|id| images.get(id).map(|image| (id, image)));
    let header_box = HeaderBox::default();
    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());

    for page in &layout.pages {
        let mut operations = Vec::new();

        // 每一頁都畫上頁首 logo
        if let Some((id, image)) = header_image {
            let (x, y, w, h) = header_box.fit(geometry, image);
            draw_image(&mut operations, id, x, y, w, h);
        }

        for mark in &page.marks {
            match mark {
                Mark::Text {
                    font,
                    size,
                    x,
                    y,
                    text,
                } => {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new(
                        "Tf",
                        vec![font.resource_name().into(), (*size).into()],
                    ));
                    operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
                Mark::Image {
                    id,
                    x,
                    y,
                    width,
                    height,
                } => draw_image(&mut operations, *id, *x, *y, *width, *height),
            }
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), geometry.width.into(), geometry.height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(metadata.title), StringFormat::Literal),
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(pdf_date(&metadata.created_at)),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| LegalEaseError::Render {
        message: format!("could not write PDF buffer: {}", e),
    })?;
    tracing::debug!(
        "Rendered '{}' ({} page(s), {} bytes)",
        metadata.title,
        page_count,
        buffer.len()
    );
    Ok(buffer)
}

pub fn image_resource_name(id: ImageId) -> String {
    format!("Im{}", id)
}

fn draw_image(operations: &mut Vec<Operation>, id: ImageId, x: f32, y: f32, w: f32, h: f32) {
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "cm",
        vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
    ));
    operations.push(Operation::new(
        "Do",
        vec![Object::Name(image_resource_name(id).into_bytes())],
    ));
    operations.push(Operation::new("Q", vec![]));
}

fn add_image(doc: &mut Document, image: &ImageAsset) -> Result<ObjectId> {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if let Some(alpha) = &image.alpha {
        let mask_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(alpha)?,
        ));
        dict.set("SMask", mask_id);
    }

    Ok(doc.add_object(Stream::new(dict, deflate(&image.rgb)?)))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn pdf_date(at: &DateTime<Local>) -> String {
    format!("D:{}", at.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::layout::{layout, Block, ParagraphStyle};

    fn sample_layout(text: &str) -> Layout {
        let blocks = vec![Block::Paragraph {
            style: ParagraphStyle::BODY,
            text: text.to_string(),
        }];
        layout(&blocks, &PageGeometry::default()).unwrap()
    }

    fn tiny_image(name: &str, alpha: bool) -> ImageAsset {
        ImageAsset {
            name: name.to_string(),
            width: 2,
            height: 1,
            rgb: vec![255, 0, 0, 0, 0, 255],
            alpha: alpha.then(|| vec![255, 0]),
        }
    }

    fn metadata() -> PdfMetadata<'static> {
        PdfMetadata {
            title: "Test",
            created_at: Local::now(),
        }
    }

    #[test]
    fn test_output_is_loadable_pdf() {
        let bytes = write_pdf(
            &sample_layout("Hello (world)"),
            &[],
            None,
            &PageGeometry::default(),
            &metadata(),
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_header_is_drawn_on_every_page() {
        let text = vec!["clause"; 150].join("\n");
        let layout = sample_layout(&text);
        let images = vec![tiny_image("header_logo", true)];

        let bytes = write_pdf(&layout, &images, Some(0), &PageGeometry::default(), &metadata())
            .unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages().len();
        assert!(pages > 1);
        let draws = bytes.windows(7).filter(|w| w == b"/Im0 Do").count();
        assert_eq!(draws, pages);
    }

    #[test]
    fn test_header_fit_preserves_aspect_ratio() {
        let image = ImageAsset {
            name: "header_logo".to_string(),
            width: 400,
            height: 100,
            rgb: vec![],
            alpha: None,
        };
        let (x, y, w, h) = HeaderBox::default().fit(&PageGeometry::default(), &image);
        assert!((w - 180.0).abs() < 0.01);
        assert!((h - 45.0).abs() < 0.01);
        assert!((x - 40.0).abs() < 0.01);
        assert!((y - 709.5).abs() < 0.01);
    }

    #[test]
    fn test_pdf_date_format() {
        let at = chrono::TimeZone::with_ymd_and_hms(&Local, 2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(pdf_date(&at), "D:20240305140709");
    }
}
