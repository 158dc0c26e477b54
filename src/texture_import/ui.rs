//! # UI 上下文
//!
//! ## 设计思路
//!
//! 界面状态只允许在一个线程上读写。工作线程不直接修改状态，
//! 而是向 UI 上下文投递 `UiMessage`，由 UI 线程按投递顺序处理。
//!
//! ## 实现思路
//!
//! - `UiHandle::post`：即发即忘，UI 已退出时仅记录日志。
//! - `UiHandle::confirm_reduction`：唯一的同步往返。消息携带一次性回复通道，
//!   工作线程阻塞到 UI 回答为止；UI 退出或回复端被丢弃都视为取消。
//! - `UiHandle::is_ui_thread`：唯一的线程归属检查。

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use super::attributes::CatalogTexture;
use super::pipeline::{ReductionDecision, ReductionQuestion};
use super::preview::PreviewImage;
use super::source::{DecodedImage, ImageReference};
use super::ImportError;

/// 任务编号，按提交顺序递增。
pub type TaskId = u64;

/// 投递到 UI 上下文的消息。
#[derive(Debug)]
pub enum UiMessage {
    /// 更新预览区显示的图片。
    Preview(PreviewImage),
    /// 请求用户确认是否缩小大图。
    ConfirmReduction(ReductionRequest),
    /// 任务结束，每个任务恰好一条。
    Completed(TaskOutcome),
}

/// 缩小确认请求，回答后工作线程继续执行。
#[derive(Debug)]
pub struct ReductionRequest {
    pub question: ReductionQuestion,
    reply: SyncSender<ReductionDecision>,
}

impl ReductionRequest {
    pub fn respond(self, decision: ReductionDecision) {
        if self.reply.send(decision).is_err() {
            log::warn!("⚠️ 缩小确认回复失败：工作线程已不再等待");
        }
    }
}

/// 任务类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 用户选择或拖入的图片。
    Import,
    /// 修改已有目录贴图时加载其图片。
    Catalog,
}

/// 成功导入的图片。
#[derive(Debug, Clone)]
pub struct ImportedImage {
    pub task_id: TaskId,
    /// 临时存储中的内容（缩小后为新文件）。
    pub content: ImageReference,
    /// 原始引用的展示名称。
    pub label: String,
    pub image: Arc<DecodedImage>,
    pub reduced: bool,
}

/// 任务结果。
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Imported(ImportedImage),
    CatalogLoaded {
        task_id: TaskId,
        texture: CatalogTexture,
        image: Arc<DecodedImage>,
    },
    Failed {
        task_id: TaskId,
        kind: TaskKind,
        error: ImportError,
        /// 为 `false` 时不弹出提示（初始引用静默失败）。
        notify: bool,
    },
    Cancelled {
        task_id: TaskId,
    },
}

impl TaskOutcome {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Imported(imported) => imported.task_id,
            Self::CatalogLoaded { task_id, .. }
            | Self::Failed { task_id, .. }
            | Self::Cancelled { task_id } => *task_id,
        }
    }
}

/// 工作线程持有的 UI 句柄。
#[derive(Debug, Clone)]
pub struct UiHandle {
    sender: Sender<UiMessage>,
    ui_thread: ThreadId,
}

impl UiHandle {
    /// 当前线程是否为 UI 线程。
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// 即发即忘地投递消息，返回是否投递成功。
    pub fn post(&self, message: UiMessage) -> bool {
        match self.sender.send(message) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("UI 上下文已关闭，丢弃消息");
                false
            }
        }
    }

    pub fn post_preview(&self, preview: PreviewImage) -> bool {
        self.post(UiMessage::Preview(preview))
    }

    /// 阻塞询问 UI 是否缩小。
    ///
    /// 在 UI 线程自身调用、UI 已关闭、或请求未被回答即被丢弃，均返回 `Cancel`。
    pub fn confirm_reduction(&self, question: ReductionQuestion) -> ReductionDecision {
        if self.is_ui_thread() {
            log::warn!("⚠️ 在 UI 线程上请求缩小确认，按取消处理");
            return ReductionDecision::Cancel;
        }

        let (reply, answer) = mpsc::sync_channel(1);
        if !self.post(UiMessage::ConfirmReduction(ReductionRequest { question, reply })) {
            return ReductionDecision::Cancel;
        }

        match answer.recv() {
            Ok(decision) => decision,
            Err(_) => {
                log::info!("🛑 缩小确认未得到回答，按取消处理");
                ReductionDecision::Cancel
            }
        }
    }
}

/// UI 上下文：消息队列的接收端，固定在创建它的线程上。
#[derive(Debug)]
pub struct UiContext {
    receiver: Receiver<UiMessage>,
    handle: UiHandle,
}

impl UiContext {
    /// 以当前线程作为 UI 线程创建上下文。
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            handle: UiHandle {
                sender,
                ui_thread: thread::current().id(),
            },
        }
    }

    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// 边界处的线程检查。
    pub fn ensure_ui_thread(&self, operation: &'static str) -> Result<(), ImportError> {
        if self.handle.is_ui_thread() {
            Ok(())
        } else {
            Err(ImportError::WrongThread(operation))
        }
    }

    /// 取出一条已到达的消息，不阻塞。
    pub fn try_next(&self) -> Option<UiMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// 最多等待 `timeout` 取出一条消息。
    pub fn next_timeout(&self, timeout: Duration) -> Option<UiMessage> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}
