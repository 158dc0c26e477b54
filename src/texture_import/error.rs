//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载导入链路中的所有错误来源。
//! 工作线程在任务边界把错误转换为 `TaskOutcome`，错误不会越过任务边界继续传播。

/// 贴图导入统一错误类型。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    /// 无法打开或复制引用内容。
    #[error("无法读取图片：{0}")]
    ReferenceUnreadable(String),

    /// 字节不是受支持的位图格式，或读取流失败。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 用户在缩小确认中选择了取消。
    #[error("已取消导入")]
    ReductionCancelled,

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),

    /// 图片加载线程已退出。
    #[error("图片加载线程不可用：{0}")]
    WorkerUnavailable(String),

    /// 只允许在 UI 上下文中调用的操作被其他线程调用。
    #[error("线程错误：{0} 只能在 UI 线程调用")]
    WrongThread(&'static str),
}

impl ImportError {
    /// 稳定错误码，便于日志检索与界面映射。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReferenceUnreadable(_) => "E_UNREADABLE",
            Self::Decode(_) => "E_DECODE",
            Self::ReductionCancelled => "E_CANCELLED",
            Self::Encode(_) => "E_ENCODE",
            Self::FileSystem(_) => "E_FS",
            Self::InvalidConfig(_) => "E_CONFIG",
            Self::WorkerUnavailable(_) => "E_WORKER",
            Self::WrongThread(_) => "E_THREAD",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ReferenceUnreadable(_) | Self::FileSystem(_) => "load",
            Self::Decode(_) => "decode",
            Self::ReductionCancelled | Self::Encode(_) => "reduce",
            Self::InvalidConfig(_) => "config",
            Self::WorkerUnavailable(_) | Self::WrongThread(_) => "dispatch",
        }
    }
}
