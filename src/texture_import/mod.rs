//! # 贴图导入模块（texture_import）
//!
//! ## 设计思路
//!
//! 贴图导入向导的“选择图片”步骤：接受一个图片引用，在后台读取与解码，
//! 大图征求用户同意后缩小，最后把结果交回 UI 线程生成默认属性。
//!
//! - `wizard`：UI 线程上的状态与步骤切换
//! - `service`：任务提交与结果转换
//! - `handler`：单个任务的完整编排 + 阶段耗时日志
//! - `worker`：单线程 FIFO 图片加载器
//! - `ui`：UI 上下文、消息与同步确认
//! - `loader`：本地文件 / 内嵌字节 / Base64 的读取与安全校验
//! - `pipeline`：缩小计划、解码、缩放、编码
//! - `preview`：等待图与属性页预览
//! - `attributes/category/units`：属性、分类目录、长度单位
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! TextureImportWizard::select_image / import_drop（UI 线程）
//!    ↓
//! ImportService::submit_import（分配任务编号）
//!    ↓
//! ImageLoader（加载线程，FIFO）
//!    ↓
//! ImportHandler::import_reference
//!    ├─ loader.rs（复制到临时存储 + 探测尺寸）
//!    ├─ UiHandle::confirm_reduction（超过阈值时同步询问）
//!    └─ pipeline.rs（解码 + 缩小 + 编码）
//!    ↓
//! UiMessage::Completed → TextureImportWizard 更新状态
//! ```

mod attributes;
mod category;
mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod preview;
mod service;
mod source;
mod ui;
mod units;
mod wizard;
mod worker;

pub use attributes::{CatalogTexture, TextureAttributes};
pub use category::{CategoryCatalog, TexturesCategory};
pub use config::{ImportConfig, ResizeQuality};
pub use error::ImportError;
pub use loader::LocalContentResolver;
pub use pipeline::{exceeds_threshold, ReductionDecision, ReductionPlan, ReductionQuestion};
pub use preview::{render_attributes_preview, waiting_image, PreviewImage, PREVIEW_SIZE};
pub use service::ImportService;
pub use source::{ContentResolver, ContentStream, DecodedImage, ImageReference, ReadSeek};
pub use ui::{ImportedImage, ReductionRequest, TaskId, TaskKind, TaskOutcome, UiContext, UiHandle, UiMessage};
pub use units::LengthUnit;
pub use wizard::{
    DropTransfer,
    ImageChoiceTexts,
    Notification,
    ReductionPrompter,
    TextureImportWizard,
    TransferFlavor,
    WizardOptions,
    WizardStep,
};

/// 单任务编排器，只由服务层驱动。
pub(crate) use handler::ImportHandler;
