//! # 贴图属性
//!
//! 属性由两类来源修改：用户编辑，以及新接受图片后推导出的默认值。
//! 宽高统一以厘米保存。

use super::category::{CategoryCatalog, TexturesCategory};
use super::source::ImageReference;
use super::units::LengthUnit;
use super::ImportConfig;

/// 贴图属性。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureAttributes {
    pub name: Option<String>,
    pub category: Option<TexturesCategory>,
    pub creator: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl TextureAttributes {
    /// 新图片被接受后的默认属性。
    ///
    /// `image_width` / `image_height` 为最终采用（可能已缩小）的像素尺寸，
    /// 高度按该宽高比由默认宽度推出。
    pub fn defaults_for_image(
        label: &str,
        image_width: u32,
        image_height: u32,
        catalog: &mut CategoryCatalog,
        config: &ImportConfig,
    ) -> Self {
        let width = config.default_width();
        let height = width * image_height as f32 / image_width.max(1) as f32;

        Self {
            name: Some(label.to_string()),
            category: Some(catalog.lookup_or_insert(&config.user_category)),
            creator: None,
            width: Some(width),
            height: Some(height),
        }
    }

    /// 从已有目录贴图复制属性。
    pub fn from_catalog(texture: &CatalogTexture) -> Self {
        Self {
            name: Some(texture.name.clone()),
            category: Some(texture.category.clone()),
            creator: texture.creator.clone(),
            width: Some(texture.width),
            height: Some(texture.height),
        }
    }

    /// 属性是否足以生成贴图。
    pub fn is_complete(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
            && self.category.is_some()
            && self.width.is_some_and(|w| w > 0.0)
            && self.height.is_some_and(|h| h > 0.0)
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.trim().to_string());
    }

    /// 空白创作者视为未设置。
    pub fn set_creator(&mut self, creator: &str) {
        let creator = creator.trim();
        self.creator = if creator.is_empty() {
            None
        } else {
            Some(creator.to_string())
        };
    }

    /// 空白名称保留当前分类。
    pub fn set_category_name(&mut self, name: &str, catalog: &mut CategoryCatalog) {
        if name.trim().is_empty() {
            return;
        }
        self.category = Some(catalog.lookup_or_insert(name));
    }

    pub fn set_width(&mut self, width: f32, unit: LengthUnit) {
        self.width = Some(unit.clamp(width));
    }

    pub fn set_height(&mut self, height: f32, unit: LengthUnit) {
        self.height = Some(unit.clamp(height));
    }
}

/// 目录中已有的贴图，用于“修改贴图”入口。
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTexture {
    pub name: String,
    pub category: TexturesCategory,
    pub creator: Option<String>,
    pub width: f32,
    pub height: f32,
    pub image: ImageReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_defaults_keep_image_aspect_ratio() {
        let mut catalog = CategoryCatalog::new();
        let config = ImportConfig::default();

        let attributes = TextureAttributes::defaults_for_image("brick", 800, 400, &mut catalog, &config);

        assert_eq!(attributes.name.as_deref(), Some("brick"));
        assert_eq!(attributes.width, Some(20.0));
        assert_eq!(attributes.height, Some(10.0));
        assert_eq!(attributes.creator, None);
        assert_eq!(
            attributes.category.as_ref().map(|c| c.name()),
            Some(config.user_category.as_str())
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn defaults_reuse_existing_user_category() {
        let mut config = ImportConfig::default();
        config.user_category = "My textures".to_string();
        let mut catalog = CategoryCatalog::with_names(["MY TEXTURES", "Wood"]);

        let attributes = TextureAttributes::defaults_for_image("tile", 10, 10, &mut catalog, &config);

        assert_eq!(attributes.category.as_ref().map(|c| c.name()), Some("MY TEXTURES"));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn imperial_defaults_use_eight_inches() {
        let mut catalog = CategoryCatalog::new();
        let mut config = ImportConfig::default();
        config.length_unit = LengthUnit::Inch;

        let attributes = TextureAttributes::defaults_for_image("tile", 100, 200, &mut catalog, &config);

        let width = attributes.width.expect("width is set");
        let height = attributes.height.expect("height is set");
        assert!((width - 20.32).abs() < 1e-4);
        assert!((height - 40.64).abs() < 1e-3);
    }

    #[test]
    fn user_edits_are_trimmed_and_clamped() {
        let mut catalog = CategoryCatalog::with_names(["Wood"]);
        let mut attributes = TextureAttributes::default();

        attributes.set_name("  Oak  ");
        attributes.set_creator("   ");
        attributes.set_category_name("wood", &mut catalog);
        attributes.set_width(0.0, LengthUnit::Centimeter);
        attributes.set_height(50.0, LengthUnit::Centimeter);

        assert_eq!(attributes.name.as_deref(), Some("Oak"));
        assert_eq!(attributes.creator, None);
        assert_eq!(attributes.category.as_ref().map(|c| c.name()), Some("Wood"));
        assert_eq!(attributes.width, Some(0.1));
        assert!(attributes.is_complete());
    }

    #[test]
    fn blank_category_keeps_previous_one() {
        let mut catalog = CategoryCatalog::with_names(["Wood"]);
        let mut attributes = TextureAttributes::default();
        attributes.set_category_name("Wood", &mut catalog);

        attributes.set_category_name("  ", &mut catalog);

        assert_eq!(attributes.category.as_ref().map(|c| c.name()), Some("Wood"));
    }
}
