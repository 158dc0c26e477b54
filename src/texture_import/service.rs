//! # 服务层
//!
//! ## 设计思路
//!
//! `ImportService` 把 `ImportHandler` 与单线程 `ImageLoader` 组合起来：
//! UI 线程只负责提交任务，任务在加载线程上执行，
//! 结束时把结果转换为 `TaskOutcome` 投递回 UI 上下文。
//!
//! ## 实现思路
//!
//! - 所有错误在任务边界被捕获并转换，不会越过任务继续传播。
//! - 任务编号按提交顺序递增，仅用于日志与结果关联。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::attributes::CatalogTexture;
use super::source::{ContentResolver, ImageReference};
use super::ui::{TaskId, TaskKind, TaskOutcome, UiHandle, UiMessage};
use super::worker::ImageLoader;
use super::{ImportConfig, ImportError, ImportHandler};

/// 贴图导入服务。
pub struct ImportService {
    handler: Arc<ImportHandler>,
    loader: ImageLoader,
    next_task_id: AtomicU64,
}

impl ImportService {
    pub fn new(config: ImportConfig, resolver: Arc<dyn ContentResolver>) -> Result<Self, ImportError> {
        let handler = Arc::new(ImportHandler::new(config, resolver)?);
        let loader = ImageLoader::spawn("texture-image-loader")?;
        Ok(Self {
            handler,
            loader,
            next_task_id: AtomicU64::new(1),
        })
    }

    pub fn resolver(&self) -> &dyn ContentResolver {
        self.handler.resolver()
    }

    pub fn config(&self) -> Result<ImportConfig, ImportError> {
        self.handler.config_snapshot()
    }

    /// 更新配置，对之后提交的任务生效。
    ///
    /// 读取体积上限由解析器在构造时固定，不随配置变化。
    pub fn set_config(&self, config: ImportConfig) -> Result<(), ImportError> {
        self.handler.replace_config(config)?;
        log::info!("⚙️ 已更新贴图导入配置");
        Ok(())
    }

    fn allocate_task_id(&self) -> TaskId {
        self.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    /// 提交导入任务。`notify_unreadable` 为 `false` 时读取失败不提示。
    pub fn submit_import(
        &self,
        reference: ImageReference,
        notify_unreadable: bool,
        ui: UiHandle,
    ) -> Result<TaskId, ImportError> {
        let task_id = self.allocate_task_id();
        let handler = Arc::clone(&self.handler);

        self.loader.execute(move || {
            let outcome = match handler.import_reference(task_id, &reference, &ui) {
                Ok(imported) => TaskOutcome::Imported(imported),
                Err(ImportError::ReductionCancelled) => TaskOutcome::Cancelled { task_id },
                Err(error) => {
                    let notify = notify_unreadable || !matches!(error, ImportError::ReferenceUnreadable(_));
                    log::warn!(
                        "⚠️ 任务 #{} 导入失败 [{}/{}]：{}",
                        task_id,
                        error.code(),
                        error.stage(),
                        error
                    );
                    TaskOutcome::Failed {
                        task_id,
                        kind: TaskKind::Import,
                        error,
                        notify,
                    }
                }
            };
            ui.post(UiMessage::Completed(outcome));
        })?;

        Ok(task_id)
    }

    /// 提交目录贴图加载任务。
    pub fn submit_catalog(&self, texture: CatalogTexture, ui: UiHandle) -> Result<TaskId, ImportError> {
        let task_id = self.allocate_task_id();
        let handler = Arc::clone(&self.handler);

        self.loader.execute(move || {
            let outcome = match handler.load_catalog_texture(task_id, &texture, &ui) {
                Ok(image) => TaskOutcome::CatalogLoaded {
                    task_id,
                    texture,
                    image,
                },
                Err(error) => {
                    log::warn!(
                        "⚠️ 任务 #{} 目录贴图加载失败 [{}/{}]：{}",
                        task_id,
                        error.code(),
                        error.stage(),
                        error
                    );
                    TaskOutcome::Failed {
                        task_id,
                        kind: TaskKind::Catalog,
                        error,
                        notify: false,
                    }
                }
            };
            ui.post(UiMessage::Completed(outcome));
        })?;

        Ok(task_id)
    }

    /// 关闭加载线程并等待排队任务结束。
    pub fn shutdown(self) {
        self.loader.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TemporaryStore;
    use crate::texture_import::loader::LocalContentResolver;
    use crate::texture_import::pipeline::ReductionDecision;
    use crate::texture_import::ui::UiContext;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn service(parent: &tempfile::TempDir) -> ImportService {
        let store = TemporaryStore::new_in(parent.path()).expect("store init failed");
        let resolver = Arc::new(LocalContentResolver::new(Arc::new(store), 64 * 1024 * 1024));
        ImportService::new(ImportConfig::default(), resolver).expect("service init failed")
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    /// 提交一张图片并在当前线程回答缩小确认，返回结果与确认次数。
    fn import_once(service: &ImportService, context: &UiContext, bytes: Vec<u8>) -> (TaskOutcome, usize) {
        service
            .submit_import(ImageReference::embedded("tile", bytes), true, context.handle())
            .expect("submit failed");

        let mut prompts = 0;
        loop {
            match context.next_timeout(Duration::from_secs(20)) {
                Some(UiMessage::ConfirmReduction(request)) => {
                    prompts += 1;
                    request.respond(ReductionDecision::Reduce);
                }
                Some(UiMessage::Completed(outcome)) => return (outcome, prompts),
                Some(UiMessage::Preview(_)) => {}
                None => panic!("task did not complete"),
            }
        }
    }

    #[test]
    fn swapped_config_applies_to_next_task() {
        let parent = tempfile::tempdir().expect("tempdir failed");
        let service = service(&parent);
        let context = UiContext::new();

        let (outcome, prompts) = import_once(&service, &context, png(800, 800));
        assert_eq!(prompts, 1);
        assert!(matches!(&outcome, TaskOutcome::Imported(imported) if imported.image.dimensions() == (512, 512)));

        let config = ImportConfig {
            large_image_pixel_threshold: 1_000_000,
            ..ImportConfig::default()
        };
        service.set_config(config.clone()).expect("set_config failed");
        assert_eq!(service.config().expect("config"), config);

        let (outcome, prompts) = import_once(&service, &context, png(800, 800));
        assert_eq!(prompts, 0);
        assert!(matches!(&outcome, TaskOutcome::Imported(imported) if imported.image.dimensions() == (800, 800)));

        service.shutdown();
    }

    #[test]
    fn invalid_config_is_rejected_and_previous_kept() {
        let parent = tempfile::tempdir().expect("tempdir failed");
        let service = service(&parent);

        let result = service.set_config(ImportConfig {
            preferred_max_size: 0,
            ..ImportConfig::default()
        });

        assert!(matches!(result, Err(ImportError::InvalidConfig(_))));
        assert_eq!(service.config().expect("config"), ImportConfig::default());
    }
}
