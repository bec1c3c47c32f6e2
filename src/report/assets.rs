use crate::domain::model::BlockKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Logical names of the branding images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    HeaderLogo,
    SidebarLogo,
    DisclaimerSticker,
    SummaryIcon,
    ClausesIcon,
    QaIcon,
}

impl Asset {
    pub const ALL: [Asset; 6] = [
        Asset::HeaderLogo,
        Asset::SidebarLogo,
        Asset::DisclaimerSticker,
        Asset::SummaryIcon,
        Asset::ClausesIcon,
        Asset::QaIcon,
    ];

    pub fn logical_name(&self) -> &'static str {
        match self {
            Asset::HeaderLogo => "header_logo",
            Asset::SidebarLogo => "sidebar_logo",
            Asset::DisclaimerSticker => "disclaimer_sticker",
            Asset::SummaryIcon => "summary_icon",
            Asset::ClausesIcon => "clauses_icon",
            Asset::QaIcon => "qa_icon",
        }
    }

    pub fn default_file(&self) -> &'static str {
        match self {
            Asset::HeaderLogo => "logo.png",
            Asset::SidebarLogo => "sidebar_logo.png",
            Asset::DisclaimerSticker => "warning.png",
            Asset::SummaryIcon => "summary.png",
            Asset::ClausesIcon => "clauses.png",
            Asset::QaIcon => "qa.png",
        }
    }

    pub fn section_icon(kind: BlockKind) -> Asset {
        match kind {
            BlockKind::Summary => Asset::SummaryIcon,
            BlockKind::Clauses => Asset::ClausesIcon,
            BlockKind::QaAnswer => Asset::QaIcon,
        }
    }

    pub fn from_logical_name(name: &str) -> Option<Asset> {
        Asset::ALL.into_iter().find(|a| a.logical_name() == name)
    }
}

/// Decoded image ready to embed: 8-bit RGB samples plus an optional alpha plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

impl ImageAsset {
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> Option<Self> {
        let name = name.into();
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!("Image {} could not be decoded: {}", name, e);
                return None;
            }
        };

        let alpha = if image.color().has_alpha() {
            Some(image.to_rgba8().pixels().map(|p| p.0[3]).collect())
        } else {
            None
        };
        let rgb = image.to_rgb8();

        Some(Self {
            name,
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
            alpha,
        })
    }
}

/// Resolves branding images by logical name from an assets directory.
///
/// Every lookup returns `None` rather than failing: a missing or unreadable
/// image only drops that decoration from the document.
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    root: Option<PathBuf>,
    files: HashMap<Asset, String>,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            files: HashMap::new(),
        }
    }

    /// A resolver that never finds anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Override the file name used for one asset.
    pub fn with_file(mut self, asset: Asset, file: impl Into<String>) -> Self {
        self.files.insert(asset, file.into());
        self
    }

    pub fn path_for(&self, asset: Asset) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let file = self
            .files
            .get(&asset)
            .map(String::as_str)
            .unwrap_or_else(|| asset.default_file());
        Some(resolve_under(root, file))
    }

    pub fn resolve(&self, asset: Asset) -> Option<ImageAsset> {
        let path = self.path_for(asset)?;
        match std::fs::read(&path) {
            Ok(bytes) => ImageAsset::decode(asset.logical_name(), &bytes),
            Err(e) => {
                tracing::debug!(
                    "Asset {} not available at {}: {}",
                    asset.logical_name(),
                    path.display(),
                    e
                );
                None
            }
        }
    }
}

fn resolve_under(root: &Path, file: &str) -> PathBuf {
    let file_path = Path::new(file);
    if file_path.is_absolute() {
        file_path.to_path_buf()
    } else {
        root.join(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_png(dir: &Path, file: &str, with_alpha: bool) {
        let path = dir.join(file);
        if with_alpha {
            image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 128]))
                .save(path)
                .unwrap();
        } else {
            image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
                .save(path)
                .unwrap();
        }
    }

    #[test]
    fn test_missing_asset_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let resolver = AssetResolver::new(dir.path());
        assert!(resolver.resolve(Asset::HeaderLogo).is_none());
        assert!(AssetResolver::empty().resolve(Asset::HeaderLogo).is_none());
    }

    #[test]
    fn test_resolves_default_and_overridden_files() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "warning.png", false);
        write_png(dir.path(), "brand.png", true);

        let resolver = AssetResolver::new(dir.path()).with_file(Asset::HeaderLogo, "brand.png");

        let sticker = resolver.resolve(Asset::DisclaimerSticker).unwrap();
        assert_eq!((sticker.width, sticker.height), (3, 2));
        assert_eq!(sticker.rgb.len(), 3 * 2 * 3);
        assert!(sticker.alpha.is_none());

        let logo = resolver.resolve(Asset::HeaderLogo).unwrap();
        assert_eq!(logo.name, "header_logo");
        assert_eq!(logo.alpha.as_deref(), Some(&[128u8; 6][..]));
    }

    #[test]
    fn test_corrupt_image_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"not a png").unwrap();
        assert!(AssetResolver::new(dir.path()).resolve(Asset::HeaderLogo).is_none());
    }

    #[test]
    fn test_logical_name_lookup() {
        assert_eq!(Asset::from_logical_name("qa_icon"), Some(Asset::QaIcon));
        assert_eq!(Asset::from_logical_name("unknown"), None);
    }
}
