//! # Puzzle Bridge
//!
//! 让通用解谜引擎（midend）在宿主应用里运行的桥接层。
//!
//! ## 架构概述
//!
//! `puzzle-bridge` 不拥有谜题规则，也不拥有宿主的 UI 工具链。
//! 它在两个互不相识的子系统之间搬运三类东西：绘图原语、配置值、
//! 存档字节流。
//!
//! ```text
//! Host                               Engine
//!   │                                  │
//!   │── 按键/resize/滴答/对话框编辑 ──►│
//!   │        (PuzzleBridge 转发)       │
//!   │                                  │
//!   │◄── DrawingSink 绘图/计时器 ──────│
//!   │◄── DialogHost 对话框搭建 ────────│
//!   │◄── SerialiseHost 存档字节段 ─────│
//! ```
//!
//! ## 核心类型
//!
//! - [`PuzzleBridge`]：面向宿主的总入口，拥有唯一的活动会话
//! - [`DrawingSink`]：引擎的绘图与计时器回调通道
//! - [`Host`] / [`DrawingHost`] / [`DialogHost`] / [`SerialiseHost`]：
//!   宿主按能力集实现的接口
//! - [`Engine`] / [`Backend`] / [`GameLibrary`]：引擎协作者接口
//! - [`ConfigField`] / [`PresetEntry`]：跨边界的配置与预设数据模型
//!
//! ## 使用示例
//!
//! ```ignore
//! use puzzle_bridge::{PuzzleBridge, ConfigPurpose};
//!
//! let mut bridge = PuzzleBridge::new(host, library);
//!
//! // 开新局并接上宿主视图
//! bridge.start_from_game_id("mines", "9x9:...")?;
//! bridge.resize_event(view_w, view_h);
//!
//! // 宿主事件循环
//! bridge.key_event(x, y, key);
//! bridge.timer_tick();
//!
//! // 存档：字节段按序到达宿主的 SerialiseHost
//! bridge.serialise();
//! ```
//!
//! ## 模块结构
//!
//! - [`bridge`]：总入口与会话替换
//! - [`drawing`]：绘图接收器与 blitter
//! - [`config`]：配置对话框协议的数据模型
//! - [`serialise`]：存档读取游标
//! - [`resolver`]：存档识别与变体解析
//! - [`session`]：会话上下文
//! - [`engine`] / [`host`]：两侧协作者接口
//! - [`error`]：错误类型定义

pub mod bridge;
pub mod config;
pub mod drawing;
pub mod engine;
pub mod error;
pub mod host;
pub mod preset;
pub mod resolver;
pub mod serialise;
pub mod session;

#[cfg(test)]
pub(crate) mod testkit;

// 重导出核心类型
pub use bridge::PuzzleBridge;
pub use config::{ConfigField, ConfigPurpose, PendingDialog};
pub use drawing::{BLITTER_FROM_SAVED, Blitter, DrawingSink};
pub use engine::{Backend, Engine, GameLibrary, UiCapabilities};
pub use error::{BridgeError, BridgeResult, ConfigError, ResolveError};
pub use host::{
    ALIGN_HCENTRE, ALIGN_HLEFT, ALIGN_HRIGHT, ALIGN_VCENTRE, ALIGN_VNORMAL, BlitterToken,
    ColourIndex, DialogHost, DrawingHost, FontType, Host, Rgb, SerialiseHost,
};
pub use preset::PresetEntry;
pub use resolver::ParamsRequest;
pub use serialise::ReadCursor;
pub use session::SessionTag;
