//! # 贴图导入工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 入口 (main.rs / clap CLI)                 │
//! │                                                          │
//! │  settings ── 读取 JSON 配置 ── ImportConfig              │
//! │       │                                                  │
//! │  TextureImportWizard (UI 线程，消息驱动)                 │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ UiMessage（Preview / ConfirmReduction / Completed）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后台 (texture-image-loader 线程)      │
//! │                                                          │
//! │  ┌─ error ────── AppError (应用级错误类型)                │
//! │  │                                                       │
//! │  ├─ texture_import                                       │
//! │  │   ├─ service / handler   任务提交与编排                │
//! │  │   ├─ loader              文件 / 内嵌 / Base64 读取     │
//! │  │   └─ pipeline            缩小计划·解码·缩放·编码       │
//! │  │                                                       │
//! │  └─ storage              临时图片目录 (返回 Result)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 应用级错误类型 `AppError`，命令行入口的返回类型 |
//! | [`settings`] | 导入配置的读取、校验与保存 |
//! | [`storage`] | 导入图片的临时目录与文件命名 |
//! | [`texture_import`] | 图片选择步骤：加载、缩小确认、预览与默认属性 |

pub mod error;
pub mod settings;
pub mod storage;
pub mod texture_import;
