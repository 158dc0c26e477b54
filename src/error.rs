//! 应用级错误类型模块
//!
//! # 设计思路
//!
//! 库内部的导入链路使用 `ImportError`，命令行入口与配置读写再包一层 `AppError`，
//! 让 `main` 只处理一种错误类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImportError` 与 `std::io::Error` 提供 `From` 转换，`?` 直接可用。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 输出结果。

use serde::Serialize;

use crate::texture_import::ImportError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 贴图导入链路错误（读取 / 解码 / 缩小）
    #[error("{0}")]
    Import(#[from] ImportError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件无法解析或不合法
    #[error("配置错误: {0}")]
    Config(String),

    /// 命令行参数不合法
    #[error("参数错误: {0}")]
    Usage(String),
}

impl AppError {
    /// 进程退出码。
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Config(_) => 3,
            Self::Io(_) | Self::Import(_) => 1,
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
