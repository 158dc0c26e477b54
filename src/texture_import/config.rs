//! # 配置模块
//!
//! ## 设计思路
//!
//! 将贴图导入链路中所有“产品常量”集中到 `ImportConfig`：
//! 大图阈值、缩小后的像素预算、宽高比分界、默认宽度、用户分类名等。
//!
//! ## 实现思路
//!
//! - `Default` 提供默认值（640×640 阈值、512×512 预算）。
//! - 通过 `serde` + `#[serde(default)]` 支持从 JSON 局部覆盖。
//! - `validate` 在加载后统一做范围校验，避免非法参数进入工作线程。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::units::LengthUnit;
use super::ImportError;

/// 缩小图片时使用的重采样滤镜。
///
/// 只提供面向画质的卷积滤镜，不提供最近邻。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeQuality {
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ResizeQuality {
    /// 对应的 `image` 回退滤镜。
    pub(crate) fn image_filter(self) -> FilterType {
        match self {
            Self::Bilinear => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    /// 对应的 `fast_image_resize` 卷积滤镜。
    pub(crate) fn fast_filter(self) -> fast_image_resize::FilterType {
        match self {
            Self::Bilinear => fast_image_resize::FilterType::Bilinear,
            Self::CatmullRom => fast_image_resize::FilterType::CatmullRom,
            Self::Lanczos3 => fast_image_resize::FilterType::Lanczos3,
        }
    }

    pub fn from_str(value: &str) -> Result<Self, ImportError> {
        match value.trim().to_lowercase().as_str() {
            "bilinear" => Ok(Self::Bilinear),
            "catmull_rom" | "catmullrom" => Ok(Self::CatmullRom),
            "lanczos3" => Ok(Self::Lanczos3),
            other => Err(ImportError::InvalidConfig(format!(
                "未知缩放滤镜：{}（可选：bilinear / catmull_rom / lanczos3）",
                other
            ))),
        }
    }
}

/// 贴图导入配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 超过该像素数（`width * height`）时询问是否缩小。
    pub large_image_pixel_threshold: u64,
    /// 接近正方形时缩小后的最长边。
    pub preferred_max_size: u32,
    /// 宽高比低于该值视为“远离正方形”。
    pub min_square_ratio: f64,
    /// 宽高比高于该值视为“远离正方形”。
    pub max_square_ratio: f64,
    /// 缩小滤镜。
    pub resize_quality: ResizeQuality,
    /// 缩小后 JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 读取引用时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 当前长度单位。
    pub length_unit: LengthUnit,
    /// 公制单位下的默认宽度（厘米）。
    pub default_metric_width: f32,
    /// 非公制单位下的默认宽度（英寸）。
    pub default_imperial_width_inches: f32,
    /// 新导入贴图默认归入的分类名。
    pub user_category: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            large_image_pixel_threshold: 640 * 640,
            preferred_max_size: 512,
            min_square_ratio: 0.5,
            max_square_ratio: 2.0,
            resize_quality: ResizeQuality::CatmullRom,
            jpeg_quality: 90,
            max_file_size: 50 * 1024 * 1024,
            length_unit: LengthUnit::Centimeter,
            default_metric_width: 20.0,
            default_imperial_width_inches: 8.0,
            user_category: "我的贴图".to_string(),
        }
    }
}

impl ImportConfig {
    /// 缩小后的像素预算（`preferred_max_size²`）。
    pub fn max_pixel_count(&self) -> u64 {
        self.preferred_max_size as u64 * self.preferred_max_size as u64
    }

    /// 按当前长度单位给出默认宽度（厘米）。
    pub fn default_width(&self) -> f32 {
        if self.length_unit.is_metric() {
            self.default_metric_width
        } else {
            LengthUnit::inch_to_centimeter(self.default_imperial_width_inches)
        }
    }

    /// 校验参数范围。
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.preferred_max_size == 0 {
            return Err(ImportError::InvalidConfig("preferred_max_size 必须大于 0".to_string()));
        }
        if self.large_image_pixel_threshold < self.max_pixel_count() {
            return Err(ImportError::InvalidConfig(format!(
                "large_image_pixel_threshold（{}）不能小于缩小后的像素预算（{}）",
                self.large_image_pixel_threshold,
                self.max_pixel_count()
            )));
        }
        if !(self.min_square_ratio > 0.0 && self.min_square_ratio <= 1.0) {
            return Err(ImportError::InvalidConfig("min_square_ratio 必须在 (0, 1] 之间".to_string()));
        }
        if self.max_square_ratio < 1.0 {
            return Err(ImportError::InvalidConfig("max_square_ratio 不能小于 1".to_string()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ImportError::InvalidConfig("jpeg_quality 必须在 1~100 之间".to_string()));
        }
        if self.max_file_size == 0 {
            return Err(ImportError::InvalidConfig("max_file_size 必须大于 0".to_string()));
        }
        if !(self.default_metric_width > 0.0 && self.default_imperial_width_inches > 0.0) {
            return Err(ImportError::InvalidConfig("默认宽度必须为正数".to_string()));
        }
        if self.user_category.trim().is_empty() {
            return Err(ImportError::InvalidConfig("user_category 不能为空".to_string()));
        }
        Ok(())
    }
}
