// 通过完整向导驱动导入流程：加载线程 + UI 消息队列 + 缩小确认。

use std::cell::RefCell;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use tempfile::TempDir;

use texture_import_wizard::storage::TemporaryStore;
use texture_import_wizard::texture_import::{
    CategoryCatalog,
    ImageChoiceTexts,
    ImageReference,
    ImportConfig,
    ImportService,
    LengthUnit,
    LocalContentResolver,
    Notification,
    ReductionDecision,
    ReductionQuestion,
    TextureImportWizard,
    WizardOptions,
    WizardStep,
};

const WAIT: Duration = Duration::from_secs(20);

struct Harness {
    dir: TempDir,
    wizard: TextureImportWizard,
    questions: Rc<RefCell<Vec<ReductionQuestion>>>,
}

impl Harness {
    fn new(decision: ReductionDecision) -> Self {
        Self::with_config(decision, ImportConfig::default())
    }

    fn with_config(decision: ReductionDecision, config: ImportConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = TemporaryStore::new_in(dir.path()).expect("store init failed");
        let resolver = Arc::new(LocalContentResolver::new(Arc::new(store), config.max_file_size));
        let service = ImportService::new(config, resolver).expect("service init failed");

        let questions = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&questions);
        let prompter = move |question: &ReductionQuestion| {
            recorded.borrow_mut().push(*question);
            decision
        };

        let wizard = TextureImportWizard::new(
            service,
            CategoryCatalog::with_names(["Floor", "Wall"]),
            Box::new(prompter),
            WizardOptions::default(),
        )
        .expect("wizard init failed");

        Self { dir, wizard, questions }
    }

    fn fixture(&self, name: &str, image: DynamicImage, format: ImageFormat) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, format).expect("failed to encode fixture");
        std::fs::write(&path, cursor.into_inner()).expect("failed to write fixture");
        path
    }

    fn opaque(&self, name: &str, width: u32, height: u32) -> PathBuf {
        self.fixture(name, DynamicImage::ImageRgb8(RgbImage::new(width, height)), ImageFormat::Png)
    }

    fn import(&mut self, path: &Path) {
        self.wizard
            .select_image(ImageReference::file(path))
            .expect("submit failed");
        assert!(self.wizard.wait_for_tasks(WAIT).expect("wait failed"), "import timed out");
    }

    fn prompts(&self) -> usize {
        self.questions.borrow().len()
    }

    fn pixel_size(&self) -> Option<(u32, u32)> {
        self.wizard.decoded_image().map(|image| image.dimensions())
    }
}

#[test]
fn image_at_threshold_is_kept_without_prompt() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.opaque("square.png", 640, 640);

    harness.import(&path);

    assert_eq!(harness.prompts(), 0);
    assert_eq!(harness.pixel_size(), Some((640, 640)));
    assert_eq!(harness.wizard.texts(), ImageChoiceTexts::Change);
}

#[test]
fn image_over_threshold_prompts_exactly_once() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.opaque("wide.png", 2000, 500);

    harness.import(&path);

    let questions = harness.questions.borrow().clone();
    assert_eq!(questions.len(), 1);
    assert_eq!(
        (questions[0].reduced_width, questions[0].reduced_height),
        (1024, 256)
    );
    assert_eq!(harness.pixel_size(), Some((1024, 256)));
    assert!(questions[0].message().contains("2000×500"));
}

#[test]
fn square_image_is_reduced_to_preferred_size() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.fixture(
        "photo.jpg",
        DynamicImage::ImageRgb8(RgbImage::from_pixel(1000, 1000, image::Rgb([120, 80, 40]))),
        ImageFormat::Jpeg,
    );

    harness.import(&path);

    assert_eq!(harness.pixel_size(), Some((512, 512)));
    assert_eq!(harness.wizard.attributes().name.as_deref(), Some("photo"));
    let stored = harness.wizard.image().and_then(|image| image.path()).expect("stored file");
    assert_eq!(stored.extension().and_then(|e| e.to_str()), Some("jpg"));
}

#[test]
fn translucent_image_is_reduced_to_png() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.fixture(
        "glass.png",
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(900, 1200, image::Rgba([0, 0, 255, 128]))),
        ImageFormat::Png,
    );

    harness.import(&path);

    assert_eq!(harness.pixel_size(), Some((384, 512)));
    let stored = harness.wizard.image().and_then(|image| image.path()).expect("stored file");
    assert_eq!(stored.extension().and_then(|e| e.to_str()), Some("png"));
    assert!(!harness.wizard.decoded_image().expect("decoded").is_opaque());
}

#[test]
fn keep_unchanged_accepts_original_size() {
    let mut harness = Harness::new(ReductionDecision::KeepUnchanged);
    let path = harness.opaque("big.png", 1000, 1000);

    harness.import(&path);

    assert_eq!(harness.prompts(), 1);
    assert_eq!(harness.pixel_size(), Some((1000, 1000)));
    assert_eq!(harness.wizard.attributes().height, Some(20.0));
}

#[test]
fn cancel_leaves_state_unchanged() {
    let mut harness = Harness::new(ReductionDecision::Cancel);
    let small = harness.opaque("small.png", 800, 400);
    let large = harness.opaque("large.png", 1000, 1000);

    harness.import(&small);
    assert!(harness.wizard.go_to_attributes());
    let image = harness.wizard.image().cloned();
    let attributes = harness.wizard.attributes().clone();
    let catalog_len = harness.wizard.catalog().len();

    harness.wizard.change_image();
    harness.import(&large);

    assert_eq!(harness.prompts(), 1);
    assert_eq!(harness.wizard.image().cloned(), image);
    assert_eq!(harness.wizard.attributes(), &attributes);
    assert_eq!(harness.wizard.catalog().len(), catalog_len);
    assert_eq!(harness.pixel_size(), Some((800, 400)));
    assert!(harness.wizard.notifications().is_empty());
}

#[test]
fn metric_defaults_follow_image_ratio() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.opaque("brick wall.png", 800, 400);

    harness.import(&path);

    let attributes = harness.wizard.attributes();
    assert_eq!(attributes.name.as_deref(), Some("brick wall"));
    assert_eq!(attributes.category.as_ref().map(|c| c.name()), Some("我的贴图"));
    assert_eq!(attributes.creator, None);
    assert_eq!(attributes.width, Some(20.0));
    assert_eq!(attributes.height, Some(10.0));
    assert!(harness.wizard.catalog().find("我的贴图").is_some());
}

#[test]
fn imperial_defaults_use_eight_inches() {
    let config = ImportConfig {
        length_unit: LengthUnit::Inch,
        ..ImportConfig::default()
    };
    let mut harness = Harness::with_config(ReductionDecision::Reduce, config);
    let path = harness.opaque("tile.png", 100, 100);

    harness.import(&path);

    let width = harness.wizard.attributes().width.expect("width");
    let height = harness.wizard.attributes().height.expect("height");
    assert!((width - 20.32).abs() < 1e-4);
    assert!((height - width).abs() < 1e-4);
}

#[test]
fn unreadable_reference_notifies_once_without_changes() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.opaque("ok.png", 64, 32);
    harness.import(&path);
    let attributes = harness.wizard.attributes().clone();

    let missing = harness.dir.path().join("vanished.png");
    harness.import(&missing);

    let notifications = harness.wizard.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert!(matches!(notifications[0], Notification::ImageUnreadable { .. }));
    assert_eq!(harness.wizard.attributes(), &attributes);
    assert_eq!(harness.pixel_size(), Some((64, 32)));
}

#[test]
fn unsupported_bytes_clear_the_image() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let good = harness.opaque("good.png", 64, 64);
    let bad = harness.dir.path().join("fake.png");
    std::fs::write(&bad, b"definitely not a png").expect("write failed");

    harness.import(&good);
    assert!(harness.wizard.go_to_attributes());
    harness.import(&bad);

    assert!(harness.wizard.image().is_none());
    assert_eq!(harness.wizard.step(), WizardStep::ImageSelection);
    assert_eq!(harness.wizard.texts(), ImageChoiceTexts::Choose);
    assert!(!harness.wizard.go_to_attributes());
    assert!(matches!(
        harness.wizard.notifications(),
        [Notification::UnsupportedFormat { .. }]
    ));
}

#[test]
fn same_reference_twice_gives_identical_attributes() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.opaque("stone.png", 1600, 900);

    harness.import(&path);
    let first = harness.wizard.attributes().clone();
    let first_size = harness.pixel_size();

    harness.import(&path);

    assert_eq!(harness.wizard.attributes(), &first);
    assert_eq!(harness.pixel_size(), first_size);
    assert_eq!(harness.prompts(), 2);
}

#[test]
fn queued_imports_finish_in_submission_order() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let first = harness.opaque("first.png", 32, 32);
    let second = harness.opaque("second.png", 48, 16);

    harness.wizard.select_image(ImageReference::file(&first)).expect("submit failed");
    harness.wizard.select_image(ImageReference::file(&second)).expect("submit failed");
    assert_eq!(harness.wizard.pending_tasks(), 2);
    assert!(harness.wizard.wait_for_tasks(WAIT).expect("wait failed"));

    assert_eq!(harness.wizard.attributes().name.as_deref(), Some("second"));
    assert_eq!(harness.pixel_size(), Some((48, 16)));
}

#[test]
fn attributes_preview_is_rendered_for_accepted_image() {
    let mut harness = Harness::new(ReductionDecision::Reduce);
    let path = harness.fixture(
        "red.png",
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, image::Rgb([255, 0, 0]))),
        ImageFormat::Png,
    );

    harness.import(&path);
    let preview = harness.wizard.attributes_preview();

    assert_eq!(preview.dimensions(), (150, 150));
    assert_eq!(preview.get_pixel(75, 75).0, [255, 0, 0]);
}
