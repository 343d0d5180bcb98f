//! # Engine 模块
//!
//! 定义外部解谜引擎协作者的接口。
//!
//! ## 职责边界
//!
//! 引擎独自拥有游戏规则、求解器、局面状态与存档格式；桥接层只
//! 负责在引擎与宿主之间搬运绘图原语、配置值和字节流。引擎通过
//! 创建时拿到的 [`DrawingSink`](crate::drawing::DrawingSink) 回调
//! 绘图与计时器开关，其余一切交互都由桥接层主动调用。
//!
//! 三层结构：
//!
//! - [`GameLibrary`]：整套注册表，编译期固定的变体列表 + 存档识别
//! - [`Backend`]：一个已注册的游戏变体，负责造出引擎实例
//! - [`Engine`]：一局游戏的活动实例

use serde::{Deserialize, Serialize};

use crate::config::{ConfigField, ConfigPurpose};
use crate::drawing::DrawingSink;
use crate::host::Rgb;
use crate::preset::PresetEntry;
use crate::serialise::ReadCursor;

/// 宿主界面需要的能力开关集合
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiCapabilities {
    /// 当前可撤销
    pub can_undo: bool,
    /// 当前可重做
    pub can_redo: bool,
    /// 变体支持自定义配置
    pub can_configure: bool,
    /// 变体支持自动求解
    pub can_solve: bool,
    /// 需要状态栏
    pub wants_statusbar: bool,
}

/// 一个已注册的游戏变体
pub trait Backend {
    /// 显示名（存档内声明的正式名字，如 "Mines"）
    fn name(&self) -> &str;

    /// 短名（宿主启动请求与帮助主题用的标识，如 "mines"）
    fn slug(&self) -> &str;

    /// 变体支持自定义配置
    fn can_configure(&self) -> bool;

    /// 变体支持自动求解
    fn can_solve(&self) -> bool;

    /// 默认参数的编码串
    fn default_params(&self) -> String;

    /// 校验一条编码参数串
    ///
    /// 失败时返回给用户看的消息。
    fn validate_params(&self, encoded: &str) -> Result<(), String>;

    /// 创建绑定到此变体的引擎实例
    ///
    /// `sink` 是实例此后绘图与计时器开关的唯一通道。
    fn new_instance(&self, sink: DrawingSink) -> Box<dyn Engine>;
}

/// 一局游戏的活动引擎实例
pub trait Engine {
    /// 计算首选几何尺寸
    ///
    /// 在 `(max_w, max_h)` 的约束下返回实际想要的 (w, h)。
    /// `user_expand` 表示是否允许放大贴满用户给的空间。
    fn size(&mut self, max_w: i32, max_h: i32, user_expand: bool) -> (i32, i32);

    /// 重置格子尺寸到默认值（密度探测前调用）
    fn reset_tilesize(&mut self);

    /// 强制完整重绘
    fn force_redraw(&mut self);

    /// 处理一次按键/点击（坐标已换算到引擎坐标系）
    fn process_key(&mut self, x: i32, y: i32, key: i32);

    /// 计时器滴答，`elapsed` 为距上次滴答的秒数
    ///
    /// 引擎可以在回调中通过 sink 停掉计时器（如谜题完成时）。
    fn timer(&mut self, elapsed: f32);

    /// 当前游戏要求的按键表
    fn request_keys(&mut self) -> String;

    /// 取某用途的配置字段列表，返回 (标题, 字段)
    ///
    /// 种子/描述用途返回单个字符串字段，其值为
    /// `<编码参数><分隔符><载荷>` 的完整形式。
    fn get_config(&mut self, purpose: ConfigPurpose) -> (String, Vec<ConfigField>);

    /// 提交一份配置快照
    ///
    /// 校验失败时返回给用户看的消息，引擎状态不变。
    fn set_config(&mut self, purpose: ConfigPurpose, fields: &[ConfigField]) -> Result<(), String>;

    /// 当前参数的编码串
    ///
    /// `full` 为真时包含所有影响局面生成的参数。
    fn encode_params(&self, full: bool) -> String;

    /// 校验并应用一条游戏标识串（参数 + 描述或种子）
    fn game_id(&mut self, id: &str) -> Result<(), String>;

    /// 按当前参数开新局
    fn new_game(&mut self);

    /// 重开当前局
    fn restart_game(&mut self);

    /// 自动求解
    fn solve(&mut self) -> Result<(), String>;

    /// 当前可撤销
    fn can_undo(&self) -> bool;

    /// 当前可重做
    fn can_redo(&self) -> bool;

    /// 需要状态栏
    fn wants_statusbar(&self) -> bool;

    /// 本局是否已结束（完成或失败）
    fn is_completed(&self) -> bool;

    /// 调色板，索引与绘图调用中的 [`ColourIndex`](crate::host::ColourIndex) 对应
    fn colours(&self) -> Vec<Rgb>;

    /// 参数预设树，每次调用重新构建
    fn presets(&mut self) -> Vec<PresetEntry>;

    /// 序列化当前局面
    ///
    /// 通过 `write` 按序产出字节段；段的切分由引擎自定。
    fn serialise(&mut self, write: &mut dyn FnMut(&[u8]));

    /// 从游标恢复局面
    ///
    /// 失败时返回给用户看的消息，实例应视为不可用。
    fn deserialise(&mut self, read: &mut ReadCursor<'_>) -> Result<(), String>;
}

/// 整套游戏注册表
///
/// 变体列表在编译期固定；存档识别是套件级操作，因为只有引擎
/// 认得存档头里的游戏名。
pub trait GameLibrary {
    /// 全部已注册变体，顺序稳定
    fn games(&self) -> &[Box<dyn Backend>];

    /// 从存档游标读出其声明的游戏名
    ///
    /// 只做识别，不构建实例。失败时返回给用户看的消息。
    fn identify(&self, read: &mut ReadCursor<'_>) -> Result<String, String>;
}
