//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部引用”和“流水线中间结果”解耦：
//! - `ImageReference` 表示不可变的图片来源句柄
//! - `ContentResolver` 抽象打开、探测、命名、临时复制等外部能力
//! - `DecodedImage` 表示已解码、可直接显示的位图

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use super::ImportError;

/// 图片引用。创建后不可变，克隆开销很小。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// 本地文件路径。
    File(PathBuf),
    /// 目录内嵌的图片字节。
    Embedded { name: String, bytes: Arc<[u8]> },
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64 { name: String, data: String },
    /// 进程级临时存储中的文件。
    Temporary(PathBuf),
}

impl ImageReference {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn embedded(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Embedded {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// 文件类引用对应的路径。
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) | Self::Temporary(path) => Some(path),
            Self::Embedded { .. } | Self::Base64 { .. } => None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// 日志用的简短描述。
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => format!("file:{}", path.display()),
            Self::Temporary(path) => format!("temp:{}", path.display()),
            Self::Embedded { name, bytes } => format!("embedded:{}（{} 字节）", name, bytes.len()),
            Self::Base64 { name, data } => format!("base64:{}（{} 字符）", name, data.len()),
        }
    }
}

/// 可读可定位的字节流。
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

pub type ContentStream = Box<dyn ReadSeek>;

/// 引用解析协作者。
///
/// 实现必须是线程安全的：所有方法都会在图片加载线程上调用，
/// `is_acceptable` 与 `presentation_label` 也会在 UI 线程调用。
pub trait ContentResolver: Send + Sync {
    /// 打开引用对应的字节流。
    fn open_stream(&self, reference: &ImageReference) -> Result<ContentStream, ImportError>;

    /// 仅读取头信息获得像素宽高。
    fn probe_dimensions(&self, reference: &ImageReference) -> Result<(u32, u32), ImportError>;

    /// 面向用户的名称，用作默认贴图名。
    fn presentation_label(&self, reference: &ImageReference) -> String;

    /// 引用是否可以作为图片导入。
    fn is_acceptable(&self, reference: &ImageReference) -> bool;

    /// 将引用内容复制到临时存储，使其在原引用失效后仍可访问。
    fn copy_to_temporary(&self, reference: &ImageReference) -> Result<ImageReference, ImportError>;

    /// 将已编码的字节写入临时存储。
    fn store_temporary(&self, bytes: &[u8], extension: &str) -> Result<ImageReference, ImportError>;
}

/// 已解码位图。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    opaque: bool,
    pixels: DynamicImage,
}

impl DecodedImage {
    pub fn new(pixels: DynamicImage) -> Self {
        let (width, height) = pixels.dimensions();
        let opaque = !pixels.color().has_alpha();
        Self {
            width,
            height,
            opaque,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 没有 alpha 通道时为 `true`。
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{RgbImage, RgbaImage};

    #[test]
    fn decoded_image_tracks_alpha_channel() {
        let rgb = DecodedImage::new(DynamicImage::ImageRgb8(RgbImage::new(4, 2)));
        let rgba = DecodedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(4, 2)));

        assert!(rgb.is_opaque());
        assert!(!rgba.is_opaque());
        assert_eq!(rgb.dimensions(), (4, 2));
    }

    #[test]
    fn temporary_reference_exposes_path() {
        let reference = ImageReference::Temporary(PathBuf::from("/tmp/texture_1.png"));

        assert!(reference.is_temporary());
        assert_eq!(reference.path(), Some(Path::new("/tmp/texture_1.png")));
        assert!(ImageReference::embedded("wood", vec![1u8, 2, 3]).path().is_none());
    }
}
