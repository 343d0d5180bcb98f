//! # Host 模块
//!
//! 定义宿主应用必须实现的能力接口。
//!
//! ## 设计原则
//!
//! - 按能力集拆分：绘图 / 对话框 / 序列化各一个 trait，
//!   再由 [`Host`] 汇总并补充计时器开关与按键表下发
//! - 桥接层下发的坐标**已经换算到屏幕坐标系**（视口偏移已加上），
//!   宿主不需要再做任何平移
//! - 所有调用都是同步的即发即弃：宿主若需要异步渲染，由宿主自行排队

use serde::{Deserialize, Serialize};

use crate::config::ConfigPurpose;

/// 调色板索引
///
/// 引擎的绘图调用用索引引用颜色，实际的 RGB 值来自
/// [`Engine::colours`](crate::engine::Engine::colours) 返回的调色板。
pub type ColourIndex = i32;

/// 归一化 RGB 三通道（0.0..=1.0）
pub type Rgb = [f32; 3];

/// 文本垂直对齐：基线对齐
pub const ALIGN_VNORMAL: i32 = 0x000;
/// 文本垂直对齐：居中
pub const ALIGN_VCENTRE: i32 = 0x100;
/// 文本水平对齐：左对齐
pub const ALIGN_HLEFT: i32 = 0x000;
/// 文本水平对齐：居中
pub const ALIGN_HCENTRE: i32 = 0x001;
/// 文本水平对齐：右对齐
pub const ALIGN_HRIGHT: i32 = 0x002;

/// 字体类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontType {
    /// 变宽字体（常规界面文本）
    Variable,
    /// 等宽字体（数字/字母棋盘）
    Fixed,
}

/// 宿主侧离屏缓冲令牌
///
/// 由 [`DrawingHost::blitter_alloc`] 发放，桥接层只做保存转发，
/// 不解释其内容。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlitterToken(pub i32);

/// 绘图能力
///
/// 接收引擎的绘图原语。所有坐标都是最终屏幕坐标。
pub trait DrawingHost {
    /// 绘制文本
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        font: FontType,
        size: i32,
        align: i32,
        colour: ColourIndex,
        text: &str,
    );

    /// 填充矩形
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: ColourIndex);

    /// 绘制线段（thickness 为线宽，最小 1.0）
    fn draw_line(&mut self, thickness: f32, x1: f32, y1: f32, x2: f32, y2: f32, colour: ColourIndex);

    /// 绘制多边形（顶点已平移完毕）
    fn draw_poly(
        &mut self,
        thickness: f32,
        points: &[(i32, i32)],
        fill: ColourIndex,
        outline: ColourIndex,
    );

    /// 绘制圆
    fn draw_circle(
        &mut self,
        thickness: f32,
        cx: f32,
        cy: f32,
        radius: f32,
        fill: ColourIndex,
        outline: ColourIndex,
    );

    /// 设置剪裁矩形
    fn clip_rect(&mut self, x: i32, y: i32, w: i32, h: i32);

    /// 取消剪裁，恢复到以 (ox, oy) 为原点的完整游戏区域
    fn unclip(&mut self, ox: i32, oy: i32);

    /// 更新状态栏文本
    fn status_bar(&mut self, text: &str);

    /// 分配 w×h 的离屏缓冲
    ///
    /// 返回 `None` 表示宿主无法分配，本次保存操作会被静默放弃。
    fn blitter_alloc(&mut self, w: i32, h: i32) -> Option<BlitterToken>;

    /// 释放离屏缓冲
    fn blitter_free(&mut self, token: BlitterToken);

    /// 把屏幕上以 (x, y) 为左上角的矩形拷入缓冲
    fn blitter_save(&mut self, token: BlitterToken, x: i32, y: i32);

    /// 把缓冲内容拷回屏幕 (x, y) 处
    fn blitter_load(&mut self, token: BlitterToken, x: i32, y: i32);

    /// 请求宿主调度一次重绘
    fn post_invalidate(&mut self);

    /// 默认背景色，ARGB 打包格式
    fn default_background_argb(&mut self) -> u32;
}

/// 配置对话框能力
///
/// 桥接层按引擎给出的字段顺序逐条下发，宿主据此搭建对话框。
pub trait DialogHost {
    /// 开始搭建对话框
    fn dialog_init(&mut self, purpose: ConfigPurpose, title: &str);

    /// 添加字符串字段
    fn dialog_add_string(&mut self, purpose: ConfigPurpose, name: &str, value: &str);

    /// 添加布尔字段
    fn dialog_add_boolean(&mut self, purpose: ConfigPurpose, name: &str, checked: bool);

    /// 添加单选字段
    fn dialog_add_choices(
        &mut self,
        purpose: ConfigPurpose,
        name: &str,
        choices: &[String],
        selected: usize,
    );

    /// 字段下发完毕，展示对话框
    fn dialog_show(&mut self);
}

/// 序列化输出能力
pub trait SerialiseHost {
    /// 接收一段序列化数据
    ///
    /// 同一次序列化的各段按产生顺序到达，宿主必须原样追加，
    /// 不得缓冲重排。
    fn serialise_write(&mut self, chunk: &[u8]);
}

/// 宿主完整接口
pub trait Host: DrawingHost + DialogHost + SerialiseHost {
    /// 开启/关闭计时器滴答投递
    fn request_timer(&mut self, enable: bool);

    /// 下发当前游戏要求的按键表
    fn set_keys(&mut self, keys: &str);
}
