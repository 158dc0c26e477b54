use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::texture_import::ImportConfig;

/// 读取导入配置。未指定路径或文件不存在时使用默认值，内容不合法时报错。
pub fn load_import_config(path: Option<&Path>) -> Result<ImportConfig, AppError> {
    let config = match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)?;
            let config = serde_json::from_str::<ImportConfig>(&content)
                .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;
            log::info!("⚙️ 已读取配置 - {}", path.display());
            config
        }
        Some(path) => {
            log::info!("⚙️ 配置文件不存在，使用默认配置 - {}", path.display());
            ImportConfig::default()
        }
        None => ImportConfig::default(),
    };

    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;
    Ok(config)
}

pub fn save_import_config(path: &Path, config: &ImportConfig) -> Result<(), AppError> {
    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("序列化配置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}
