//! 临时图片存储模块
//!
//! # 设计思路
//!
//! 导入的图片要在原始引用失效后依然可读（例如用户删除了源文件），
//! 因此先复制到一个随进程存活的临时目录，缩小后的图片也写入这里。
//!
//! # 实现思路
//!
//! - 目录由 `tempfile::TempDir` 创建，最后一个持有者释放时整体删除。
//! - 文件名由时间戳 + 进程内递增序号组成，保证同一毫秒内也不冲突。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use tempfile::TempDir;

use crate::texture_import::ImportError;

/// 进程级临时存储。
#[derive(Debug)]
pub struct TemporaryStore {
    dir: TempDir,
    sequence: AtomicU64,
}

impl TemporaryStore {
    /// 在系统临时目录下创建存储目录。
    pub fn new() -> Result<Self, ImportError> {
        let dir = tempfile::Builder::new()
            .prefix("texture-import-")
            .tempdir()
            .map_err(|e| ImportError::FileSystem(format!("创建临时目录失败: {}", e)))?;
        log::debug!("🗃️ 临时存储目录: {}", dir.path().display());
        Ok(Self {
            dir,
            sequence: AtomicU64::new(0),
        })
    }

    /// 在指定父目录下创建存储目录（测试与自定义目录使用）。
    pub fn new_in(parent: &Path) -> Result<Self, ImportError> {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                ImportError::FileSystem(format!("创建目录 '{}' 失败: {}", parent.display(), e))
            })?;
        }
        let dir = tempfile::Builder::new()
            .prefix("texture-import-")
            .tempdir_in(parent)
            .map_err(|e| ImportError::FileSystem(format!("创建临时目录失败: {}", e)))?;
        Ok(Self {
            dir,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// 生成一个新的、尚未使用的文件路径。
    pub fn next_path(&self, extension: &str) -> PathBuf {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let timestamp = Local::now().format("%Y%m%d%H%M%S%3f");
        let extension = extension.trim_start_matches('.');
        let file_name = if extension.is_empty() {
            format!("texture_{}_{}.tmp", timestamp, sequence)
        } else {
            format!("texture_{}_{}.{}", timestamp, sequence, extension)
        };
        self.dir.path().join(file_name)
    }

    /// 写入字节并返回新文件路径。
    pub fn write(&self, bytes: &[u8], extension: &str) -> Result<PathBuf, ImportError> {
        let path = self.next_path(extension);
        fs::write(&path, bytes).map_err(|e| {
            ImportError::FileSystem(format!("写入临时文件 '{}' 失败: {}", path.display(), e))
        })?;
        Ok(path)
    }

    /// 复制已有文件并返回新文件路径。
    pub fn copy_file(&self, source: &Path) -> Result<PathBuf, ImportError> {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("tmp")
            .to_string();
        let path = self.next_path(&extension);
        fs::copy(source, &path).map_err(|e| {
            ImportError::FileSystem(format!("复制 '{}' 到临时目录失败: {}", source.display(), e))
        })?;
        Ok(path)
    }

    /// 当前存储的文件数与总字节数。
    pub fn usage(&self) -> (u64, u64) {
        let mut total_size: u64 = 0;
        let mut file_count: u64 = 0;

        if let Ok(entries) = fs::read_dir(self.dir.path()) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        total_size += metadata.len();
                        file_count += 1;
                    }
                }
            }
        }

        (file_count, total_size)
    }
}
