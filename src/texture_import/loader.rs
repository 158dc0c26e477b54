//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! `LocalContentResolver` 是 `ContentResolver` 的本地实现：
//! 文件、内嵌字节与 Base64 三种来源统一打开为可定位字节流，
//! 并在复制到临时存储前做体积限制，尽快失败。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 复制。
//! - Base64：格式解析 + 预估体积限制 + 解码。
//! - 可接受性：已知扩展名直接接受，否则读取文件头用 `infer` 识别。
//! - 尺寸探测只读取 header，不做完整解码。

use base64::{Engine as _, engine::general_purpose};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use image::ImageReader;

use super::source::{ContentResolver, ContentStream, ImageReference};
use super::ImportError;
use crate::storage::TemporaryStore;

const SIGNATURE_PROBE_BYTES: u64 = 8 * 1024;
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "wbmp", "tif", "tiff", "webp", "tga", "ico",
];

/// 基于本地文件系统的引用解析器。
#[derive(Debug, Clone)]
pub struct LocalContentResolver {
    store: Arc<TemporaryStore>,
    max_file_size: u64,
}

impl LocalContentResolver {
    pub fn new(store: Arc<TemporaryStore>, max_file_size: u64) -> Self {
        Self {
            store,
            max_file_size,
        }
    }

    pub fn store(&self) -> &TemporaryStore {
        &self.store
    }

    fn check_file(&self, path: &Path) -> Result<(), ImportError> {
        if !path.exists() {
            return Err(ImportError::ReferenceUnreadable(format!(
                "文件不存在：{}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ImportError::ReferenceUnreadable(format!("无法读取文件信息：{}", e)))?;

        if !metadata.is_file() {
            return Err(ImportError::ReferenceUnreadable(format!(
                "不是普通文件：{}",
                path.display()
            )));
        }

        if metadata.len() > self.max_file_size {
            return Err(ImportError::ReferenceUnreadable(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                self.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn has_image_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// 读取文件开头若干字节做签名识别。
    fn sniff_file_is_image(path: &Path) -> bool {
        let Ok(file) = File::open(path) else {
            return false;
        };
        let mut head = Vec::with_capacity(SIGNATURE_PROBE_BYTES as usize);
        if file.take(SIGNATURE_PROBE_BYTES).read_to_end(&mut head).is_err() {
            return false;
        }
        Self::is_image_signature(&head)
    }

    /// 通过文件签名（magic bytes）判断是否为图片。
    fn is_image_signature(bytes: &[u8]) -> bool {
        infer::get(bytes)
            .map(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .unwrap_or(false)
    }

    /// 按签名推断扩展名，无法识别时使用 `tmp`。
    fn extension_for(bytes: &[u8]) -> &'static str {
        infer::get(bytes)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .map(|kind| kind.extension())
            .unwrap_or("tmp")
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImportError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ImportError::ReferenceUnreadable("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ImportError::ReferenceUnreadable("Base64 解码体积估算溢出".to_string()))
    }

    pub(crate) fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, ImportError> {
        let normalized = data.trim();

        let base64_data = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| ImportError::ReferenceUnreadable("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;
        if estimated_len > max_file_size {
            return Err(ImportError::ReferenceUnreadable(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(base64_data)
            .map_err(|e| ImportError::ReferenceUnreadable(format!("Base64 解码失败：{}", e)))
    }
}

impl ContentResolver for LocalContentResolver {
    fn open_stream(&self, reference: &ImageReference) -> Result<ContentStream, ImportError> {
        match reference {
            ImageReference::File(path) | ImageReference::Temporary(path) => {
                let file = File::open(path).map_err(|e| {
                    ImportError::ReferenceUnreadable(format!("无法打开 '{}'：{}", path.display(), e))
                })?;
                Ok(Box::new(file))
            }
            ImageReference::Embedded { bytes, .. } => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
            ImageReference::Base64 { data, .. } => {
                let bytes = Self::parse_base64_with_limit(data, self.max_file_size)?;
                Ok(Box::new(Cursor::new(bytes)))
            }
        }
    }

    fn probe_dimensions(&self, reference: &ImageReference) -> Result<(u32, u32), ImportError> {
        let stream = self.open_stream(reference)?;
        let reader = ImageReader::new(BufReader::new(stream))
            .with_guessed_format()
            .map_err(|e| ImportError::Decode(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| ImportError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn presentation_label(&self, reference: &ImageReference) -> String {
        match reference {
            ImageReference::File(path) | ImageReference::Temporary(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            ImageReference::Embedded { name, .. } | ImageReference::Base64 { name, .. } => {
                name.clone()
            }
        }
    }

    fn is_acceptable(&self, reference: &ImageReference) -> bool {
        match reference {
            ImageReference::File(path) | ImageReference::Temporary(path) => {
                path.is_file() && (Self::has_image_extension(path) || Self::sniff_file_is_image(path))
            }
            ImageReference::Embedded { bytes, .. } => Self::is_image_signature(bytes),
            ImageReference::Base64 { data, .. } => {
                Self::parse_base64_with_limit(data, self.max_file_size)
                    .map(|bytes| Self::is_image_signature(&bytes))
                    .unwrap_or(false)
            }
        }
    }

    fn copy_to_temporary(&self, reference: &ImageReference) -> Result<ImageReference, ImportError> {
        match reference {
            ImageReference::Temporary(_) => Ok(reference.clone()),
            ImageReference::File(path) => {
                self.check_file(path)?;
                let copied = self.store.copy_file(path).map_err(|e| {
                    ImportError::ReferenceUnreadable(e.to_string())
                })?;
                log::debug!("📁 已复制到临时存储 - {} -> {}", path.display(), copied.display());
                Ok(ImageReference::Temporary(copied))
            }
            ImageReference::Embedded { bytes, .. } => {
                if bytes.len() as u64 > self.max_file_size {
                    return Err(ImportError::ReferenceUnreadable(format!(
                        "内嵌图片过大：{} 字节",
                        bytes.len()
                    )));
                }
                self.store_temporary(bytes, Self::extension_for(bytes))
                    .map_err(|e| ImportError::ReferenceUnreadable(e.to_string()))
            }
            ImageReference::Base64 { data, .. } => {
                let bytes = Self::parse_base64_with_limit(data, self.max_file_size)?;
                self.store_temporary(&bytes, Self::extension_for(&bytes))
                    .map_err(|e| ImportError::ReferenceUnreadable(e.to_string()))
            }
        }
    }

    fn store_temporary(&self, bytes: &[u8], extension: &str) -> Result<ImageReference, ImportError> {
        let path = self.store.write(bytes, extension)?;
        Ok(ImageReference::Temporary(path))
    }
}
