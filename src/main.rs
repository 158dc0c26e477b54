//! # 贴图导入工具 — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与结果输出。
//! 导入流程分布在 `texture_import` 各子模块中，详见 `lib.rs` 架构文档。
//!
//! ```text
//! texture-import wood.jpg                         (大图时交互询问是否缩小)
//! texture-import -d reduce big.png --unit inch    (固定回答 + 英制单位)
//! texture-import a.png b.png -o out/ --json       (导出贴图与预览，JSON 输出)
//! ```

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use texture_import_wizard::error::AppError;
use texture_import_wizard::settings;
use texture_import_wizard::storage::TemporaryStore;
use texture_import_wizard::texture_import::{
    CatalogTexture,
    CategoryCatalog,
    ImageReference,
    ImportService,
    LengthUnit,
    LocalContentResolver,
    ReductionDecision,
    ReductionPrompter,
    ReductionQuestion,
    TextureImportWizard,
    WizardOptions,
};

/// 将图片导入为贴图：大图询问是否缩小，生成默认贴图属性。
#[derive(Parser, Debug)]
#[command(name = "texture-import", version, about = "贴图导入：图片选择、缩小确认与默认属性")]
struct CliArgs {
    /// 要导入的图片文件，按顺序依次作为“更换图片”导入。
    #[arg(required = true, num_args = 1..)]
    files: Vec<PathBuf>,

    /// JSON 配置文件；不存在时使用默认配置。
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 大图缩小确认的固定回答：ask / reduce / keep / cancel。
    #[arg(short, long, default_value = "ask", value_name = "DECISION")]
    decision: String,

    /// 长度单位：mm / cm / m / inch，覆盖配置文件。
    #[arg(short, long, value_name = "UNIT")]
    unit: Option<String>,

    /// 导入后设置的分类名。
    #[arg(long, value_name = "NAME")]
    category: Option<String>,

    /// 导入后设置的创作者。
    #[arg(long, value_name = "NAME")]
    creator: Option<String>,

    /// 导出最终图片与属性页预览的目录。
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// 每张图片的最长等待时间（秒）。
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// 以 JSON 输出结果。
    #[arg(long)]
    json: bool,
}

/// 固定回答。
struct FixedPrompter(ReductionDecision);

impl ReductionPrompter for FixedPrompter {
    fn confirm(&mut self, question: &ReductionQuestion) -> ReductionDecision {
        log::info!("{}，自动回答：{}", question.message(), self.0.as_str());
        self.0
    }
}

/// 从标准输入读取回答，无法读取时按取消处理。
struct ConsolePrompter;

impl ReductionPrompter for ConsolePrompter {
    fn confirm(&mut self, question: &ReductionQuestion) -> ReductionDecision {
        let stdin = io::stdin();
        for _ in 0..3 {
            eprintln!("{}", question.title());
            eprint!("{} [r]缩小 / [K]保持原样 / [c]取消：", question.message());
            let _ = io::stderr().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => return ReductionDecision::Cancel,
                Ok(_) => {
                    if let Some(decision) = ReductionDecision::from_str(&line) {
                        return decision;
                    }
                }
            }
        }
        ReductionDecision::Cancel
    }
}

fn build_prompter(decision: &str) -> Result<Box<dyn ReductionPrompter>, AppError> {
    if decision.trim().eq_ignore_ascii_case("ask") {
        return Ok(Box::new(ConsolePrompter));
    }
    ReductionDecision::from_str(decision)
        .map(|d| Box::new(FixedPrompter(d)) as Box<dyn ReductionPrompter>)
        .ok_or_else(|| AppError::Usage(format!("未知的缩小回答：{}（可选：ask / reduce / keep / cancel）", decision)))
}

fn parse_unit(args: &CliArgs) -> Result<Option<LengthUnit>, AppError> {
    args.unit
        .as_deref()
        .map(|unit| {
            LengthUnit::from_str(unit).ok_or_else(|| AppError::Usage(format!("未知的长度单位：{}", unit)))
        })
        .transpose()
}

/// 导出图片与预览，返回导出的图片路径。
fn export(wizard: &TextureImportWizard, texture: &CatalogTexture, dir: &Path) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)?;

    let source = texture
        .image
        .path()
        .ok_or_else(|| AppError::Usage(format!("无法导出非文件图片：{}", texture.image.describe())))?;
    let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("png");
    let target = dir.join(format!("{}.{}", texture.name, extension));
    fs::copy(source, &target)?;

    let preview_path = dir.join(format!("{}_preview.png", texture.name));
    wizard
        .attributes_preview()
        .save(&preview_path)
        .map_err(|e| AppError::Io(io::Error::other(e.to_string())))?;

    Ok(target)
}

fn report(
    wizard: &TextureImportWizard,
    file: &Path,
    texture: &CatalogTexture,
    exported: Option<&Path>,
    unit: LengthUnit,
    json: bool,
) {
    let (pixel_width, pixel_height) = wizard.decoded_image().map(|i| i.dimensions()).unwrap_or((0, 0));

    if json {
        let value = serde_json::json!({
            "source": file.display().to_string(),
            "name": texture.name,
            "category": texture.category.name(),
            "creator": texture.creator,
            "width_cm": texture.width,
            "height_cm": texture.height,
            "pixel_width": pixel_width,
            "pixel_height": pixel_height,
            "exported": exported.map(|p| p.display().to_string()),
        });
        println!("{}", value);
    } else {
        println!("✅ {}", file.display());
        println!("   名称：{}", texture.name);
        println!("   分类：{}", texture.category.name());
        if let Some(creator) = &texture.creator {
            println!("   创作者：{}", creator);
        }
        println!("   尺寸：{} × {}", unit.format(texture.width), unit.format(texture.height));
        println!("   像素：{}×{}", pixel_width, pixel_height);
        if let Some(path) = exported {
            println!("   导出：{}", path.display());
        }
    }
}

fn run(args: CliArgs) -> Result<usize, AppError> {
    let config = settings::load_import_config(args.config.as_deref())?;
    let unit_override = parse_unit(&args)?;
    let prompter = build_prompter(&args.decision)?;

    let store = TemporaryStore::new()?;
    let resolver = Arc::new(LocalContentResolver::new(Arc::new(store), config.max_file_size));
    let service = ImportService::new(config, resolver)?;
    let mut wizard = TextureImportWizard::new(service, CategoryCatalog::new(), prompter, WizardOptions::default())?;
    if let Some(unit) = unit_override {
        wizard.set_length_unit(unit)?;
    }
    let unit = wizard.length_unit();

    let timeout = Duration::from_secs(args.timeout.max(1));
    let mut failures = 0;

    for file in &args.files {
        let previous = wizard.image().cloned();
        wizard.change_image();
        wizard.select_image(ImageReference::file(file))?;

        if !wizard.wait_for_tasks(timeout)? {
            eprintln!("⏱️ {}：等待超时", file.display());
            failures += 1;
            continue;
        }

        for notification in wizard.take_notifications() {
            eprintln!("❌ {}：{}", file.display(), notification.message());
        }

        if wizard.image().is_none() || wizard.image() == previous.as_ref() {
            eprintln!("⚠️ {}：未导入", file.display());
            failures += 1;
            continue;
        }

        if let Some(category) = &args.category {
            wizard.set_category(category);
        }
        if let Some(creator) = &args.creator {
            wizard.set_creator(creator);
        }
        wizard.go_to_attributes();

        let Some(texture) = wizard.build_texture() else {
            eprintln!("⚠️ {}：属性不完整", file.display());
            failures += 1;
            continue;
        };

        let exported = match &args.output_dir {
            Some(dir) => Some(export(&wizard, &texture, dir)?),
            None => None,
        };
        report(&wizard, file, &texture, exported.as_deref(), unit, args.json);
    }

    wizard.shutdown();
    Ok(failures)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    match run(args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            log::warn!("{} 张图片未能导入", failures);
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("错误：{}", error);
            ExitCode::from(error.exit_code() as u8)
        }
    }
}
