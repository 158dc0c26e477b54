//! # 解码与缩小流水线模块
//!
//! ## 设计思路
//!
//! 将“引用 → 位图”与“大图 → 缩小图”的纯计算部分集中在这里，
//! 不涉及线程与界面，方便单独测试。
//!
//! ## 实现思路
//!
//! 1. 读取 header 尺寸，按像素阈值判断是否需要询问缩小
//! 2. 计算目标尺寸（远离正方形按像素预算开方，否则按最长边适配）
//! 3. 使用 `fast_image_resize` 卷积缩放，失败时回退 `image::resize_exact`
//! 4. 不透明图编码为 JPEG，带 alpha 的图编码为 PNG

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader, Rgb, Rgba};
use std::io::{BufReader, Cursor};

use super::config::ResizeQuality;
use super::source::{ContentResolver, DecodedImage, ImageReference};
use super::{ImportConfig, ImportError};

/// 是否超过大图阈值。像素数以 `u64` 计算，不会溢出。
pub fn exceeds_threshold(width: u32, height: u32, config: &ImportConfig) -> bool {
    width as u64 * height as u64 > config.large_image_pixel_threshold
}

/// 缩小方案：原始尺寸、目标尺寸与缩放系数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionPlan {
    pub original_width: u32,
    pub original_height: u32,
    pub reduced_width: u32,
    pub reduced_height: u32,
    pub factor: f64,
}

impl ReductionPlan {
    /// 计算保持宽高比、落在像素预算内的目标尺寸。
    pub fn compute(width: u32, height: u32, config: &ImportConfig) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let ratio = width as f64 / height as f64;
        let max_size = config.preferred_max_size as f64;

        let factor = if ratio < config.min_square_ratio || ratio > config.max_square_ratio {
            (config.max_pixel_count() as f64 / (width as u64 * height as u64) as f64).sqrt()
        } else if ratio < 1.0 {
            max_size / height as f64
        } else {
            max_size / width as f64
        };

        let reduced_width = ((width as f64 * factor).round() as u32).max(1);
        let reduced_height = ((height as f64 * factor).round() as u32).max(1);

        Self {
            original_width: width,
            original_height: height,
            reduced_width,
            reduced_height,
            factor,
        }
    }

    pub fn question(&self) -> ReductionQuestion {
        ReductionQuestion {
            original_width: self.original_width,
            original_height: self.original_height,
            reduced_width: self.reduced_width,
            reduced_height: self.reduced_height,
        }
    }
}

/// 发给 UI 上下文的缩小确认问题。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionQuestion {
    pub original_width: u32,
    pub original_height: u32,
    pub reduced_width: u32,
    pub reduced_height: u32,
}

impl ReductionQuestion {
    pub fn title(&self) -> &'static str {
        "缩小图片尺寸"
    }

    pub fn message(&self) -> String {
        format!(
            "图片尺寸为 {}×{} 像素，作为贴图过大。是否缩小为 {}×{} 像素？",
            self.original_width, self.original_height, self.reduced_width, self.reduced_height
        )
    }
}

/// 用户对缩小确认的回答。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionDecision {
    Reduce,
    #[default]
    KeepUnchanged,
    Cancel,
}

impl ReductionDecision {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "reduce" | "r" => Some(Self::Reduce),
            "keep" | "k" | "" => Some(Self::KeepUnchanged),
            "cancel" | "c" => Some(Self::Cancel),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reduce => "reduce",
            Self::KeepUnchanged => "keep",
            Self::Cancel => "cancel",
        }
    }
}

/// 完整解码引用内容。
///
/// 流无法打开或字节不是受支持的位图格式时返回 `ImportError::Decode`。
pub fn decode(
    resolver: &dyn ContentResolver,
    reference: &ImageReference,
) -> Result<DecodedImage, ImportError> {
    let stream = resolver
        .open_stream(reference)
        .map_err(|e| ImportError::Decode(e.to_string()))?;

    let decoded = ImageReader::new(BufReader::new(stream))
        .with_guessed_format()
        .map_err(|e| ImportError::Decode(format!("无法识别图片格式：{}", e)))?
        .decode()
        .map_err(|e| ImportError::Decode(format!("图片解码失败：{}", e)))?;

    Ok(DecodedImage::new(decoded))
}

/// 缩放到精确的目标尺寸，保留原图是否带 alpha。
pub fn resize(
    image: &DecodedImage,
    target_width: u32,
    target_height: u32,
    quality: ResizeQuality,
) -> Result<DecodedImage, ImportError> {
    let target_width = target_width.max(1);
    let target_height = target_height.max(1);

    match resize_with_fast_image_resize(image, target_width, target_height, quality) {
        Ok(resized) => Ok(DecodedImage::new(resized)),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}", err);
            let resized =
                image
                    .pixels()
                    .resize_exact(target_width, target_height, quality.image_filter());
            let resized = if image.is_opaque() {
                DynamicImage::ImageRgb8(resized.to_rgb8())
            } else {
                DynamicImage::ImageRgba8(resized.to_rgba8())
            };
            Ok(DecodedImage::new(resized))
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DecodedImage,
    target_width: u32,
    target_height: u32,
    quality: ResizeQuality,
) -> Result<DynamicImage, ImportError> {
    let (src_width, src_height) = image.dimensions();
    let (buffer, pixel_type) = if image.is_opaque() {
        (image.pixels().to_rgb8().into_raw(), fr::PixelType::U8x3)
    } else {
        (image.pixels().to_rgba8().into_raw(), fr::PixelType::U8x4)
    };

    let src_image = fr::images::Image::from_vec_u8(src_width, src_height, buffer, pixel_type)
        .map_err(|e| ImportError::Encode(format!("构建源图像缓冲失败：{}", e)))?;
    let mut dst_image = fr::images::Image::new(target_width, target_height, pixel_type);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(quality.fast_filter()));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImportError::Encode(format!("fast_image_resize 执行失败：{}", e)))?;

    let raw = dst_image.into_vec();
    if image.is_opaque() {
        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(target_width, target_height, raw)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ImportError::Encode("fast_image_resize 输出缓冲长度异常".to_string()))
    } else {
        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, raw)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| ImportError::Encode("fast_image_resize 输出缓冲长度异常".to_string()))
    }
}

/// 编码为持久化格式，返回字节与扩展名。
///
/// 不透明图使用 JPEG，带 alpha 的图使用 PNG。
pub fn encode_for_storage(
    image: &DecodedImage,
    jpeg_quality: u8,
) -> Result<(Vec<u8>, &'static str), ImportError> {
    let mut cursor = Cursor::new(Vec::new());

    if image.is_opaque() {
        let rgb = DynamicImage::ImageRgb8(image.pixels().to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut cursor, jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| ImportError::Encode(format!("JPEG 编码失败：{}", e)))?;
        Ok((cursor.into_inner(), "jpg"))
    } else {
        image
            .pixels()
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| ImportError::Encode(format!("PNG 编码失败：{}", e)))?;
        Ok((cursor.into_inner(), "png"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{RgbImage, RgbaImage};

    fn opaque(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 128])
        })))
    }

    fn translucent(width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
            Rgba([200, 10, 10, (x % 255) as u8])
        })))
    }

    #[test]
    fn threshold_is_strictly_greater() {
        let config = ImportConfig::default();

        assert!(!exceeds_threshold(640, 640, &config));
        assert!(!exceeds_threshold(800, 400, &config));
        assert!(exceeds_threshold(641, 640, &config));
        assert!(exceeds_threshold(u32::MAX, u32::MAX, &config));
    }

    #[test]
    fn wide_image_uses_pixel_budget() {
        let plan = ReductionPlan::compute(2000, 500, &ImportConfig::default());

        assert!((plan.factor - 0.512).abs() < 1e-9);
        assert_eq!((plan.reduced_width, plan.reduced_height), (1024, 256));
    }

    #[test]
    fn square_image_fits_width() {
        let plan = ReductionPlan::compute(1000, 1000, &ImportConfig::default());

        assert_eq!((plan.reduced_width, plan.reduced_height), (512, 512));
    }

    #[test]
    fn portrait_image_fits_height() {
        let plan = ReductionPlan::compute(900, 1200, &ImportConfig::default());

        assert_eq!((plan.reduced_width, plan.reduced_height), (384, 512));
    }

    #[test]
    fn extreme_strip_keeps_one_pixel() {
        let plan = ReductionPlan::compute(10_000_000, 1, &ImportConfig::default());

        assert_eq!(plan.reduced_height, 1);
        assert!(plan.reduced_width < 10_000_000);
    }

    #[test]
    fn question_message_mentions_both_sizes() {
        let question = ReductionPlan::compute(2000, 500, &ImportConfig::default()).question();

        let message = question.message();
        assert!(message.contains("2000×500"));
        assert!(message.contains("1024×256"));
    }

    #[test]
    fn resize_produces_exact_dimensions_and_keeps_opacity() {
        let resized = resize(&opaque(300, 200), 150, 100, ResizeQuality::CatmullRom)
            .expect("resize should succeed");
        assert_eq!(resized.dimensions(), (150, 100));
        assert!(resized.is_opaque());

        let resized = resize(&translucent(300, 200), 31, 17, ResizeQuality::Lanczos3)
            .expect("resize should succeed");
        assert_eq!(resized.dimensions(), (31, 17));
        assert!(!resized.is_opaque());
    }

    #[test]
    fn encode_picks_jpeg_for_opaque_and_png_for_alpha() {
        let (jpeg, ext) = encode_for_storage(&opaque(16, 16), 90).expect("jpeg encode failed");
        assert_eq!(ext, "jpg");
        assert_eq!(image::guess_format(&jpeg).ok(), Some(ImageFormat::Jpeg));

        let (png, ext) = encode_for_storage(&translucent(16, 16), 90).expect("png encode failed");
        assert_eq!(ext, "png");
        assert_eq!(image::guess_format(&png).ok(), Some(ImageFormat::Png));
    }

    #[test]
    fn decision_parses_console_answers() {
        assert_eq!(ReductionDecision::from_str("R"), Some(ReductionDecision::Reduce));
        assert_eq!(ReductionDecision::from_str(""), Some(ReductionDecision::KeepUnchanged));
        assert_eq!(ReductionDecision::from_str("cancel"), Some(ReductionDecision::Cancel));
        assert_eq!(ReductionDecision::from_str("maybe"), None);
        assert_eq!(ReductionDecision::default(), ReductionDecision::KeepUnchanged);
    }
}
