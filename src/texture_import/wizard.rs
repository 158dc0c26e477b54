//! # 贴图导入向导步骤
//!
//! ## 设计思路
//!
//! `TextureImportWizard` 是 UI 线程上的状态持有者：当前步骤、预览、
//! 已接受的图片、属性与待展示的提示都只在这里被修改。
//! 加载与缩小交给 `ImportService` 在后台执行，结果以 `UiMessage` 回到这里。
//!
//! ## 实现思路
//!
//! - 步骤只有 `ImageSelection` 与 `Attributes` 两个，
//!   只有在已接受图片时才能进入属性页，“更换图片”回到选择页。
//! - 多个任务可能先后完成，最后处理的结果决定最终状态。
//! - 工作线程的缩小确认由 `ReductionPrompter` 在 UI 线程上回答。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;

use super::attributes::{CatalogTexture, TextureAttributes};
use super::category::CategoryCatalog;
use super::pipeline::{ReductionDecision, ReductionQuestion};
use super::preview::{self, PreviewImage};
use super::service::ImportService;
use super::source::{DecodedImage, ImageReference};
use super::units::LengthUnit;
use super::ui::{TaskId, TaskKind, TaskOutcome, UiContext, UiMessage};
use super::{ImportConfig, ImportError};

/// 向导步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    ImageSelection,
    Attributes,
}

/// 图片选择区的提示文案。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageChoiceTexts {
    Choose,
    Change,
}

impl ImageChoiceTexts {
    pub fn label(self) -> &'static str {
        match self {
            Self::Choose => "选择要作为贴图的图片：",
            Self::Change => "已选择的贴图图片：",
        }
    }

    pub fn button(self) -> &'static str {
        match self {
            Self::Choose => "选择图片...",
            Self::Change => "更换图片...",
        }
    }
}

/// 需要向用户展示的提示。
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// 引用无法读取或复制。
    ImageUnreadable { detail: String },
    /// 内容不是受支持的图片格式。
    UnsupportedFormat { detail: String },
    /// 拖入的内容中没有可导入的图片。
    DropRejected,
}

impl Notification {
    pub fn message(&self) -> String {
        match self {
            Self::ImageUnreadable { detail } => format!("无法读取所选图片（{}）。", detail),
            Self::UnsupportedFormat { .. } => "不支持该图片格式，请选择其他图片。".to_string(),
            Self::DropRejected => "拖入的内容不是可导入的图片。".to_string(),
        }
    }
}

/// 拖放数据的类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferFlavor {
    FileList,
    PlainText,
    Image,
    Other(String),
}

/// 一次拖放携带的数据。
#[derive(Debug, Clone, Default)]
pub struct DropTransfer {
    pub flavors: Vec<TransferFlavor>,
    pub files: Vec<PathBuf>,
}

impl DropTransfer {
    pub fn files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            flavors: vec![TransferFlavor::FileList],
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// 在 UI 线程上回答缩小确认。
pub trait ReductionPrompter {
    fn confirm(&mut self, question: &ReductionQuestion) -> ReductionDecision;
}

impl<F> ReductionPrompter for F
where
    F: FnMut(&ReductionQuestion) -> ReductionDecision,
{
    fn confirm(&mut self, question: &ReductionQuestion) -> ReductionDecision {
        self(question)
    }
}

/// 向导初始内容。
#[derive(Debug, Clone, Default)]
pub struct WizardOptions {
    /// 修改已有目录贴图时传入。
    pub catalog_texture: Option<CatalogTexture>,
    /// 预先选中的图片，读取失败时不提示。
    pub texture_reference: Option<ImageReference>,
}

/// 贴图导入向导步骤的状态。
pub struct TextureImportWizard {
    // 先于 service 释放：丢弃排队中的确认请求，使等待中的任务按取消结束
    ui: UiContext,
    service: ImportService,
    prompter: Box<dyn ReductionPrompter>,
    catalog: CategoryCatalog,
    step: WizardStep,
    texts: ImageChoiceTexts,
    error_visible: bool,
    preview: PreviewImage,
    image: Option<ImageReference>,
    decoded: Option<Arc<DecodedImage>>,
    attributes: TextureAttributes,
    length_unit: LengthUnit,
    notifications: Vec<Notification>,
    pending: usize,
}

impl TextureImportWizard {
    /// 在当前线程创建向导，当前线程即为 UI 线程。
    pub fn new(
        service: ImportService,
        catalog: CategoryCatalog,
        prompter: Box<dyn ReductionPrompter>,
        options: WizardOptions,
    ) -> Result<Self, ImportError> {
        let length_unit = service.config()?.length_unit;
        let mut wizard = Self {
            ui: UiContext::new(),
            service,
            prompter,
            catalog,
            step: WizardStep::ImageSelection,
            texts: ImageChoiceTexts::Choose,
            error_visible: false,
            preview: PreviewImage::Empty,
            image: None,
            decoded: None,
            attributes: TextureAttributes::default(),
            length_unit,
            notifications: Vec::new(),
            pending: 0,
        };

        if let Some(texture) = options.catalog_texture {
            wizard.texts = ImageChoiceTexts::Change;
            wizard.service.submit_catalog(texture, wizard.ui.handle())?;
            wizard.pending += 1;
        }

        if let Some(reference) = options.texture_reference {
            wizard.service.submit_import(reference, false, wizard.ui.handle())?;
            wizard.pending += 1;
        }

        Ok(wizard)
    }

    /// 当前配置；读取失败时退回默认值，但保留向导的长度单位。
    fn config(&self) -> ImportConfig {
        match self.service.config() {
            Ok(config) => config,
            Err(err) => {
                log::warn!("⚠️ 读取导入配置失败，使用默认配置：{}", err);
                ImportConfig {
                    length_unit: self.length_unit,
                    ..ImportConfig::default()
                }
            }
        }
    }

    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    /// 切换长度单位，对之后接受的图片的默认宽度与用户输入的取值范围生效。
    pub fn set_length_unit(&mut self, unit: LengthUnit) -> Result<(), ImportError> {
        let config = ImportConfig {
            length_unit: unit,
            ..self.service.config()?
        };
        self.service.set_config(config)?;
        self.length_unit = unit;
        Ok(())
    }

    /// 导入用户选择的图片。
    pub fn select_image(&mut self, reference: ImageReference) -> Result<TaskId, ImportError> {
        self.ui.ensure_ui_thread("select_image")?;
        let task_id = self.service.submit_import(reference, true, self.ui.handle())?;
        self.pending += 1;
        Ok(task_id)
    }

    /// 仅接受文件列表类型的拖放。
    pub fn can_import(&self, flavors: &[TransferFlavor]) -> bool {
        flavors.contains(&TransferFlavor::FileList)
    }

    /// 导入拖入的第一个可接受文件，其余忽略。
    pub fn import_drop(&mut self, transfer: DropTransfer) -> Result<bool, ImportError> {
        self.ui.ensure_ui_thread("import_drop")?;

        if self.can_import(&transfer.flavors) {
            let accepted = transfer
                .files
                .into_iter()
                .map(ImageReference::File)
                .find(|reference| self.service.resolver().is_acceptable(reference));

            if let Some(reference) = accepted {
                log::info!("📥 拖入图片 - {}", reference.describe());
                self.select_image(reference)?;
                return Ok(true);
            }
        }

        log::info!("🚫 拖入内容中没有可导入的图片");
        self.notifications.push(Notification::DropRejected);
        Ok(false)
    }

    /// 回到图片选择页。
    pub fn change_image(&mut self) {
        self.step = WizardStep::ImageSelection;
    }

    /// 进入属性页，没有已接受的图片时保持不变并返回 `false`。
    pub fn go_to_attributes(&mut self) -> bool {
        if self.image.is_none() {
            return false;
        }
        self.step = WizardStep::Attributes;
        true
    }

    pub fn set_name(&mut self, name: &str) {
        self.attributes.set_name(name);
    }

    pub fn set_category(&mut self, name: &str) {
        self.attributes.set_category_name(name, &mut self.catalog);
    }

    pub fn set_creator(&mut self, creator: &str) {
        self.attributes.set_creator(creator);
    }

    pub fn set_width(&mut self, width: f32) {
        self.attributes.set_width(width, self.length_unit);
    }

    pub fn set_height(&mut self, height: f32) {
        self.attributes.set_height(height, self.length_unit);
    }

    /// 处理所有已到达的消息，返回处理条数。
    pub fn process_pending(&mut self) -> Result<usize, ImportError> {
        self.ui.ensure_ui_thread("process_pending")?;
        let mut handled = 0;
        while let Some(message) = self.ui.try_next() {
            self.handle_message(message);
            handled += 1;
        }
        Ok(handled)
    }

    /// 处理消息直到所有已提交任务结束或超时，返回是否全部结束。
    pub fn wait_for_tasks(&mut self, timeout: Duration) -> Result<bool, ImportError> {
        self.ui.ensure_ui_thread("wait_for_tasks")?;
        let deadline = Instant::now() + timeout;

        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            if let Some(message) = self.ui.next_timeout(remaining) {
                self.handle_message(message);
            }
        }

        self.process_pending()?;
        Ok(true)
    }

    fn handle_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::Preview(preview) => self.preview = preview,
            UiMessage::ConfirmReduction(request) => {
                let decision = self.prompter.confirm(&request.question);
                log::info!(
                    "❓ 缩小确认 {}x{} -> {}x{}：{}",
                    request.question.original_width,
                    request.question.original_height,
                    request.question.reduced_width,
                    request.question.reduced_height,
                    decision.as_str()
                );
                request.respond(decision);
            }
            UiMessage::Completed(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                self.apply_outcome(outcome);
            }
        }
    }

    fn apply_outcome(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Imported(imported) => {
                let config = self.config();
                let (width, height) = imported.image.dimensions();
                self.attributes = TextureAttributes::defaults_for_image(
                    &imported.label,
                    width,
                    height,
                    &mut self.catalog,
                    &config,
                );
                self.image = Some(imported.content);
                self.preview = PreviewImage::Loaded(Arc::clone(&imported.image));
                self.decoded = Some(imported.image);
                self.texts = ImageChoiceTexts::Change;
                self.error_visible = false;
            }
            TaskOutcome::CatalogLoaded { texture, image, .. } => {
                self.attributes = TextureAttributes::from_catalog(&texture);
                self.catalog.lookup_or_insert(texture.category.name());
                self.image = Some(texture.image);
                self.preview = PreviewImage::Loaded(Arc::clone(&image));
                self.decoded = Some(image);
            }
            TaskOutcome::Failed {
                kind: TaskKind::Catalog,
                ..
            } => {
                self.clear_image();
                self.error_visible = true;
            }
            TaskOutcome::Failed {
                error: ImportError::ReferenceUnreadable(detail),
                notify,
                ..
            } => {
                if notify {
                    self.notifications.push(Notification::ImageUnreadable { detail });
                }
            }
            TaskOutcome::Failed { error, notify, .. } => {
                self.clear_image();
                if notify {
                    self.notifications.push(Notification::UnsupportedFormat {
                        detail: error.to_string(),
                    });
                }
            }
            TaskOutcome::Cancelled { task_id } => {
                log::debug!("任务 #{} 已取消，状态保持不变", task_id);
            }
        }
    }

    fn clear_image(&mut self) {
        self.image = None;
        self.decoded = None;
        self.preview = PreviewImage::Empty;
        self.texts = ImageChoiceTexts::Choose;
        self.step = WizardStep::ImageSelection;
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn texts(&self) -> ImageChoiceTexts {
        self.texts
    }

    pub fn is_error_visible(&self) -> bool {
        self.error_visible
    }

    pub fn preview(&self) -> &PreviewImage {
        &self.preview
    }

    pub fn image(&self) -> Option<&ImageReference> {
        self.image.as_ref()
    }

    pub fn decoded_image(&self) -> Option<&Arc<DecodedImage>> {
        self.decoded.as_ref()
    }

    pub fn attributes(&self) -> &TextureAttributes {
        &self.attributes
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// 尚未展示的提示。提示只会累积，调用方展示后用 `take_notifications` 取走。
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn pending_tasks(&self) -> usize {
        self.pending
    }

    /// 属性页预览。
    pub fn attributes_preview(&self) -> RgbImage {
        preview::render_attributes_preview(
            self.decoded.as_deref(),
            self.attributes.width.unwrap_or(0.0),
            self.attributes.height.unwrap_or(0.0),
        )
    }

    /// 由当前图片与属性生成贴图，信息不完整时返回 `None`。
    pub fn build_texture(&self) -> Option<CatalogTexture> {
        let image = self.image.clone()?;
        if !self.attributes.is_complete() {
            return None;
        }
        Some(CatalogTexture {
            name: self.attributes.name.clone()?,
            category: self.attributes.category.clone()?,
            creator: self.attributes.creator.clone(),
            width: self.attributes.width?,
            height: self.attributes.height?,
            image,
        })
    }

    /// 关闭向导并等待加载线程结束。
    pub fn shutdown(self) {
        let Self { ui, service, .. } = self;
        drop(ui);
        service.shutdown();
    }
}
