//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImportHandler` 只负责工作线程上的流程编排，不持有任何界面状态。
//! 用户选择图片后的处理链路固定为：
//! 1. 读取配置快照
//! 2. 复制到临时存储（失败即“无法读取”）
//! 3. 读取 header 尺寸，超过阈值时同步询问 UI 是否缩小
//! 4. 需要时缩小并重新编码到新的临时文件
//! 5. 完整解码，期间预览区显示等待图
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImportConfig>>` 支持运行时更新。
//! - 单次任务内使用同一配置快照，避免处理中途配置漂移。
//! - 记录 `copy/reduce/decode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::attributes::CatalogTexture;
use super::pipeline::{self, ReductionDecision, ReductionPlan};
use super::preview::PreviewImage;
use super::source::{ContentResolver, DecodedImage, ImageReference};
use super::ui::{ImportedImage, TaskId, UiHandle};
use super::{ImportConfig, ImportError};

/// 导入处理器。
pub struct ImportHandler {
    pub(super) config: Arc<RwLock<ImportConfig>>,
    pub(super) resolver: Arc<dyn ContentResolver>,
}

impl ImportHandler {
    pub fn new(config: ImportConfig, resolver: Arc<dyn ContentResolver>) -> Result<Self, ImportError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            resolver,
        })
    }

    pub fn resolver(&self) -> &dyn ContentResolver {
        self.resolver.as_ref()
    }

    /// 获取配置快照。
    pub(super) fn config_snapshot(&self) -> Result<ImportConfig, ImportError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImportError::InvalidConfig("配置读取锁已中毒".to_string()))
    }

    /// 校验后替换配置，对之后提交的任务生效。
    pub(super) fn replace_config(&self, config: ImportConfig) -> Result<(), ImportError> {
        config.validate()?;
        let mut current = self
            .config
            .write()
            .map_err(|_| ImportError::InvalidConfig("配置写入锁已中毒".to_string()))?;
        *current = config;
        Ok(())
    }

    /// 导入用户选择的图片（在图片加载线程上调用）。
    pub fn import_reference(
        &self,
        task_id: TaskId,
        reference: &ImageReference,
        ui: &UiHandle,
    ) -> Result<ImportedImage, ImportError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();
        log::info!("🖼️ 任务 #{} 开始导入 - {}", task_id, reference.describe());

        let copy_start = Instant::now();
        let mut content = self.resolver.copy_to_temporary(reference)?;
        let copy_elapsed = copy_start.elapsed();

        let reduce_start = Instant::now();
        let (width, height) = match self.resolver.probe_dimensions(&content) {
            Ok(size) => size,
            Err(err) => {
                ui.post_preview(PreviewImage::Empty);
                return Err(err);
            }
        };
        log::debug!("📐 任务 #{} 图片尺寸 {}x{}", task_id, width, height);

        let mut reduced = false;
        if pipeline::exceeds_threshold(width, height, &config) {
            let plan = ReductionPlan::compute(width, height, &config);
            match ui.confirm_reduction(plan.question()) {
                ReductionDecision::Cancel => {
                    log::info!("🛑 任务 #{} 用户取消导入", task_id);
                    return Err(ImportError::ReductionCancelled);
                }
                ReductionDecision::KeepUnchanged => {
                    log::info!("任务 #{} 保留原始尺寸 {}x{}", task_id, width, height);
                }
                ReductionDecision::Reduce => {
                    content = self.reduce(&content, &plan, &config, ui)?;
                    reduced = true;
                }
            }
        }
        let reduce_elapsed = reduce_start.elapsed();

        let decode_start = Instant::now();
        let image = self.read_image(&content, ui)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 任务 #{} 导入完成 - {}x{} reduced={} copy={}ms reduce={}ms decode={}ms total={}ms",
            task_id,
            image.width(),
            image.height(),
            reduced,
            copy_elapsed.as_millis(),
            reduce_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ImportedImage {
            task_id,
            content,
            label: self.resolver.presentation_label(reference),
            image,
            reduced,
        })
    }

    /// 加载目录贴图的图片（在图片加载线程上调用）。
    pub fn load_catalog_texture(
        &self,
        task_id: TaskId,
        texture: &CatalogTexture,
        ui: &UiHandle,
    ) -> Result<Arc<DecodedImage>, ImportError> {
        log::info!("🖼️ 任务 #{} 加载目录贴图 - {}", task_id, texture.name);
        self.read_image(&texture.image, ui)
    }

    /// 解码引用；期间预览显示等待图，结束后显示结果或清空。
    fn read_image(
        &self,
        reference: &ImageReference,
        ui: &UiHandle,
    ) -> Result<Arc<DecodedImage>, ImportError> {
        ui.post_preview(PreviewImage::waiting());

        match pipeline::decode(self.resolver.as_ref(), reference) {
            Ok(image) => {
                let image = Arc::new(image);
                ui.post_preview(PreviewImage::Loaded(Arc::clone(&image)));
                Ok(image)
            }
            Err(err) => {
                log::warn!("⚠️ 图片解码失败 - {}：{}", reference.describe(), err);
                ui.post_preview(PreviewImage::Empty);
                Err(err)
            }
        }
    }

    /// 缩小并写入新的临时文件，返回新引用。
    fn reduce(
        &self,
        content: &ImageReference,
        plan: &ReductionPlan,
        config: &ImportConfig,
        ui: &UiHandle,
    ) -> Result<ImageReference, ImportError> {
        ui.post_preview(PreviewImage::waiting());

        let result = pipeline::decode(self.resolver.as_ref(), content).and_then(|source| {
            log::info!(
                "🧩 缩小图片：{}x{} -> {}x{}（factor={:.4}, filter={:?}）",
                plan.original_width,
                plan.original_height,
                plan.reduced_width,
                plan.reduced_height,
                plan.factor,
                config.resize_quality
            );
            let reduced = pipeline::resize(
                &source,
                plan.reduced_width,
                plan.reduced_height,
                config.resize_quality,
            )?;
            let (bytes, extension) = pipeline::encode_for_storage(&reduced, config.jpeg_quality)?;
            self.resolver.store_temporary(&bytes, extension)
        });

        if result.is_err() {
            ui.post_preview(PreviewImage::Empty);
        }
        result
    }
}
