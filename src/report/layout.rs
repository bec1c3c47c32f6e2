//! Flow layout: turns a sequence of blocks into positioned marks on pages.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.

use crate::report::text::text_width;
use crate::utils::error::{LegalEaseError, Result};

/// US Letter.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// Index into the image table of a composed report.
pub type ImageId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            margin_left: 72.0,
            margin_right: 72.0,
            // content starts below the header logo band
            margin_top: 120.0,
            margin_bottom: 72.0,
        }
    }
}

impl PageGeometry {
    pub fn frame_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn frame_top(&self) -> f32 {
        self.height - self.margin_top
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            self.width,
            self.height,
            self.margin_left,
            self.margin_right,
            self.margin_top,
            self.margin_bottom,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid_geometry("dimensions must be finite and non-negative"));
        }
        // 版面至少要能放下一行標題與一個圖示列
        if self.frame_width() < 72.0 {
            return Err(invalid_geometry("content frame is narrower than 72pt"));
        }
        if self.frame_top() - self.margin_bottom < 72.0 {
            return Err(invalid_geometry("content frame is shorter than 72pt"));
        }
        Ok(())
    }
}

fn invalid_geometry(reason: &str) -> LegalEaseError {
    LegalEaseError::Render {
        message: format!("invalid page geometry: {}", reason),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

impl FontStyle {
    pub const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Oblique];

    pub fn resource_name(&self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Oblique => "F3",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Oblique => "Helvetica-Oblique",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub font: FontStyle,
    pub size: f32,
    pub leading: f32,
    pub align: Align,
}

impl ParagraphStyle {
    pub const TITLE: ParagraphStyle = ParagraphStyle {
        font: FontStyle::Bold,
        size: 18.0,
        leading: 22.0,
        align: Align::Center,
    };
    pub const HEADING: ParagraphStyle = ParagraphStyle {
        font: FontStyle::Bold,
        size: 14.0,
        leading: 18.0,
        align: Align::Left,
    };
    pub const BODY: ParagraphStyle = ParagraphStyle {
        font: FontStyle::Regular,
        size: 10.0,
        leading: 12.0,
        align: Align::Left,
    };
    pub const NOTE: ParagraphStyle = ParagraphStyle {
        font: FontStyle::Oblique,
        size: 10.0,
        leading: 12.0,
        align: Align::Left,
    };

    fn width_of(&self, text: &str) -> f32 {
        text_width(text, self.size, self.font == FontStyle::Bold)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Text with `\n` kept as hard line breaks.
    Paragraph { style: ParagraphStyle, text: String },
    Spacer(f32),
    Image { id: ImageId, width: f32, height: f32 },
    /// Heading row with an optional icon drawn to the left of the text.
    Heading {
        icon: Option<ImageId>,
        icon_size: f32,
        style: ParagraphStyle,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Text {
        font: FontStyle,
        size: f32,
        x: f32,
        y: f32,
        text: String,
    },
    Image {
        id: ImageId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub marks: Vec<Mark>,
}

impl Page {
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().filter_map(|mark| match mark {
            Mark::Text { text, .. } => Some(text.as_str()),
            Mark::Image { .. } => None,
        })
    }

    pub fn image_ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.marks.iter().filter_map(|mark| match mark {
            Mark::Image { id, .. } => Some(*id),
            Mark::Text { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    /// All text in reading order, lines joined by single spaces.
    pub fn flattened_text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|page| page.text_lines())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

struct Cursor<'a> {
    geometry: &'a PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(geometry: &'a PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.frame_top(),
        }
    }

    fn at_page_top(&self) -> bool {
        self.y >= self.geometry.frame_top()
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= self.geometry.margin_bottom
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.geometry.frame_top();
    }

    /// Start a new page unless `height` fits (or we are already at the top).
    fn reserve(&mut self, height: f32) {
        if !self.fits(height) && !self.at_page_top() {
            self.new_page();
        }
    }

    fn push(&mut self, mark: Mark) {
        if let Some(page) = self.pages.last_mut() {
            page.marks.push(mark);
        }
    }

    fn line(&mut self, style: &ParagraphStyle, text: String) {
        self.reserve(style.leading);
        if !text.is_empty() {
            let x = match style.align {
                Align::Left => self.geometry.margin_left,
                Align::Center => {
                    let free = self.geometry.frame_width() - style.width_of(&text);
                    self.geometry.margin_left + (free / 2.0).max(0.0)
                }
            };
            self.push(Mark::Text {
                font: style.font,
                size: style.size,
                x,
                y: self.y - style.size,
                text,
            });
        }
        self.y -= style.leading;
    }
}

pub fn layout(blocks: &[Block], geometry: &PageGeometry) -> Result<Layout> {
    geometry.validate()?;
    let frame_width = geometry.frame_width();
    let mut cursor = Cursor::new(geometry);

    for block in blocks {
        match block {
            Block::Paragraph { style, text } => {
                for line in wrap_text(text, style, frame_width) {
                    cursor.line(style, line);
                }
            }
            Block::Spacer(height) => {
                // 換頁後的頁首不保留間距
                if cursor.fits(*height) {
                    cursor.y -= height;
                } else if !cursor.at_page_top() {
                    cursor.new_page();
                }
            }
            Block::Image { id, width, height } => {
                let (width, height) = (width.min(frame_width), *height);
                cursor.reserve(height);
                cursor.push(Mark::Image {
                    id: *id,
                    x: geometry.margin_left,
                    y: cursor.y - height,
                    width,
                    height,
                });
                cursor.y -= height + 4.0;
            }
            Block::Heading {
                icon,
                icon_size,
                style,
                text,
            } => {
                let row = match icon {
                    Some(_) => icon_size.max(style.leading),
                    None => style.leading,
                };
                let text_x = match icon {
                    Some(_) => geometry.margin_left + icon_size + 6.0,
                    None => geometry.margin_left,
                };
                let available = (frame_width - (text_x - geometry.margin_left)).max(1.0);
                let lines = wrap_text(text, style, available);
                let extra = lines.len().saturating_sub(1) as f32 * style.leading;
                // 標題整段連同下一行內文一起換頁，不可單獨留在頁尾
                cursor.reserve(row + extra + ParagraphStyle::BODY.leading);
                if let Some(id) = icon {
                    cursor.push(Mark::Image {
                        id: *id,
                        x: geometry.margin_left,
                        y: cursor.y - (row + icon_size) / 2.0,
                        width: *icon_size,
                        height: *icon_size,
                    });
                }
                let baseline = cursor.y - (row + style.size) / 2.0;
                for (i, line) in lines.into_iter().enumerate() {
                    cursor.push(Mark::Text {
                        font: style.font,
                        size: style.size,
                        x: text_x,
                        y: baseline - i as f32 * style.leading,
                        text: line,
                    });
                    if i > 0 {
                        cursor.y -= style.leading;
                    }
                }
                cursor.y -= row;
            }
        }
    }

    Ok(Layout {
        pages: cursor.pages,
    })
}

/// Greedy word wrap. Hard line breaks are kept; blank lines stay as empty lines.
pub fn wrap_text(text: &str, style: &ParagraphStyle, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }

    for hard_line in text.split('\n') {
        let mut current = String::new();
        for word in hard_line.split_whitespace() {
            for piece in split_long_word(word, style, max_width) {
                let candidate = if current.is_empty() {
                    piece.clone()
                } else {
                    format!("{} {}", current, piece)
                };
                if current.is_empty() || style.width_of(&candidate) <= max_width {
                    current = candidate;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = piece;
                }
            }
        }
        lines.push(current);
    }

    lines
}

fn split_long_word(word: &str, style: &ParagraphStyle, max_width: f32) -> Vec<String> {
    if style.width_of(word) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if style.width_of(&current) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
