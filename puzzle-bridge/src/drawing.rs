//! # Drawing 模块
//!
//! 引擎侧的绘图接收器与离屏缓冲（blitter）管理。
//!
//! ## 坐标换算
//!
//! 引擎在自己的坐标系里绘图；接收器给每个带坐标的调用加上当前
//! 视口偏移，再转发给宿主。宿主收到的永远是最终屏幕坐标。
//!
//! ## 过期会话防护
//!
//! 每个接收器带着所属会话的代际标签。会话被替换后，旧引擎若仍在
//! 回调中绘图，标签比对不过，调用被静默丢弃。这是纵深防御，不能
//! 替代正确的调用顺序约束（替换前不得有未完成的绘图调用在途）。
//! 例外是 [`DrawingSink::blitter_free`]：旧引擎拆除期间仍须释放
//! 宿主缓冲，因此不做标签检查。

use std::rc::Rc;

use crate::host::{BlitterToken, ColourIndex, FontType, Rgb};
use crate::session::{BridgeShared, SessionTag};

/// 传给 [`DrawingSink::blitter_load`] 的哨兵坐标
///
/// 两个坐标都是哨兵时表示"恢复到上一次保存的位置"。
pub const BLITTER_FROM_SAVED: i32 = i32::MIN;

/// 一个预留的离屏像素缓冲
///
/// 由引擎独占持有。宿主侧缓冲**惰性分配**：创建时不发生任何宿主
/// 调用，第一次保存才向宿主要缓冲。很多引擎会投机性地预留
/// blitter，推迟分配可以避免为从未用到的预留浪费宿主资源。
#[derive(Debug)]
pub struct Blitter {
    w: i32,
    h: i32,
    /// 宿主侧令牌；首次保存成功后才有值
    token: Option<BlitterToken>,
    /// 上一次保存的引擎坐标
    saved_at: Option<(i32, i32)>,
}

impl Blitter {
    /// 预留的尺寸
    pub fn size(&self) -> (i32, i32) {
        (self.w, self.h)
    }
}

/// 引擎的绘图与计时器回调通道
///
/// 引擎实例在创建时拿到一个接收器，此后所有可观察效果（绘图、
/// 状态栏、重绘调度、计时器开关）都经由它到达宿主。
pub struct DrawingSink {
    shared: Rc<BridgeShared>,
    tag: SessionTag,
}

impl DrawingSink {
    pub(crate) fn new(shared: Rc<BridgeShared>, tag: SessionTag) -> Self {
        Self { shared, tag }
    }

    fn live(&self) -> bool {
        self.shared.is_current(self.tag)
    }

    fn offset(&self) -> (i32, i32) {
        self.shared.offset_or_zero()
    }

    /// 一帧绘制开始（预留挂点，当前无操作）
    pub fn begin_draw(&self) {}

    /// 一帧绘制结束，请宿主调度一次重绘
    pub fn end_draw(&self) {
        if !self.live() {
            return;
        }
        self.shared.host.borrow_mut().post_invalidate();
    }

    /// 绘制文本
    pub fn draw_text(
        &self,
        x: i32,
        y: i32,
        font: FontType,
        size: i32,
        align: i32,
        colour: ColourIndex,
        text: &str,
    ) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        self.shared
            .host
            .borrow_mut()
            .draw_text(x + ox, y + oy, font, size, align, colour, text);
    }

    /// 填充矩形
    pub fn draw_rect(&self, x: i32, y: i32, w: i32, h: i32, colour: ColourIndex) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        self.shared
            .host
            .borrow_mut()
            .fill_rect(x + ox, y + oy, w, h, colour);
    }

    /// 绘制指定线宽的线段
    pub fn draw_thick_line(
        &self,
        thickness: f32,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        colour: ColourIndex,
    ) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        let (ox, oy) = (ox as f32, oy as f32);
        self.shared
            .host
            .borrow_mut()
            .draw_line(thickness, x1 + ox, y1 + oy, x2 + ox, y2 + oy, colour);
    }

    /// 绘制单宽线段
    pub fn draw_line(&self, x1: i32, y1: i32, x2: i32, y2: i32, colour: ColourIndex) {
        self.draw_thick_line(1.0, x1 as f32, y1 as f32, x2 as f32, y2 as f32, colour);
    }

    /// 绘制指定线宽的多边形
    pub fn draw_thick_poly(
        &self,
        thickness: f32,
        points: &[(i32, i32)],
        fill: ColourIndex,
        outline: ColourIndex,
    ) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        let translated: Vec<(i32, i32)> = points.iter().map(|&(x, y)| (x + ox, y + oy)).collect();
        self.shared
            .host
            .borrow_mut()
            .draw_poly(thickness, &translated, fill, outline);
    }

    /// 绘制单宽多边形
    pub fn draw_poly(&self, points: &[(i32, i32)], fill: ColourIndex, outline: ColourIndex) {
        self.draw_thick_poly(1.0, points, fill, outline);
    }

    /// 绘制指定线宽的圆
    pub fn draw_thick_circle(
        &self,
        thickness: f32,
        cx: f32,
        cy: f32,
        radius: f32,
        fill: ColourIndex,
        outline: ColourIndex,
    ) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        self.shared.host.borrow_mut().draw_circle(
            thickness,
            cx + ox as f32,
            cy + oy as f32,
            radius,
            fill,
            outline,
        );
    }

    /// 绘制单宽圆
    pub fn draw_circle(&self, cx: i32, cy: i32, radius: i32, fill: ColourIndex, outline: ColourIndex) {
        self.draw_thick_circle(1.0, cx as f32, cy as f32, radius as f32, fill, outline);
    }

    /// 设置剪裁矩形
    pub fn clip(&self, x: i32, y: i32, w: i32, h: i32) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        self.shared.host.borrow_mut().clip_rect(x + ox, y + oy, w, h);
    }

    /// 取消剪裁
    pub fn unclip(&self) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        self.shared.host.borrow_mut().unclip(ox, oy);
    }

    /// 更新状态栏
    pub fn status_bar(&self, text: &str) {
        if !self.live() {
            return;
        }
        self.shared.host.borrow_mut().status_bar(text);
    }

    /// 默认背景色，按需向宿主取，拆成归一化三通道
    pub fn default_colour(&self) -> Rgb {
        let argb = self.shared.host.borrow_mut().default_background_argb();
        [
            ((argb >> 16) & 0xff) as f32 / 255.0,
            ((argb >> 8) & 0xff) as f32 / 255.0,
            (argb & 0xff) as f32 / 255.0,
        ]
    }

    /// 激活计时器（幂等）
    pub fn activate_timer(&self) {
        if !self.live() {
            return;
        }
        self.shared.activate_timer();
    }

    /// 停用计时器（幂等）
    pub fn deactivate_timer(&self) {
        if !self.live() {
            return;
        }
        self.shared.deactivate_timer();
    }

    /// 预留一个 w×h 的离屏缓冲，不发生宿主调用
    pub fn blitter_new(&self, w: i32, h: i32) -> Blitter {
        Blitter {
            w,
            h,
            token: None,
            saved_at: None,
        }
    }

    /// 把引擎坐标 (x, y) 处的矩形存入缓冲
    ///
    /// 首次使用时向宿主申请缓冲；宿主拒绝分配则本次保存静默放弃。
    pub fn blitter_save(&self, bl: &mut Blitter, x: i32, y: i32) {
        if !self.live() {
            return;
        }
        let (ox, oy) = self.offset();
        let mut host = self.shared.host.borrow_mut();
        let token = match bl.token {
            Some(token) => token,
            None => match host.blitter_alloc(bl.w, bl.h) {
                Some(token) => {
                    bl.token = Some(token);
                    token
                }
                None => return,
            },
        };
        bl.saved_at = Some((x, y));
        host.blitter_save(token, x + ox, y + oy);
    }

    /// 把缓冲内容恢复到引擎坐标 (x, y) 处
    ///
    /// 两个坐标都传 [`BLITTER_FROM_SAVED`] 时恢复到上一次保存的位置。
    ///
    /// # Panics
    ///
    /// 缓冲从未成功保存过时 panic：载入无内容的缓冲是调用方的
    /// 契约违规。
    pub fn blitter_load(&self, bl: &Blitter, x: i32, y: i32) {
        if !self.live() {
            return;
        }
        let (Some(token), Some(saved_at)) = (bl.token, bl.saved_at) else {
            panic!("blitter 在保存之前被要求恢复");
        };
        let (x, y) = if x == BLITTER_FROM_SAVED && y == BLITTER_FROM_SAVED {
            saved_at
        } else {
            (x, y)
        };
        let (ox, oy) = self.offset();
        self.shared.host.borrow_mut().blitter_load(token, x + ox, y + oy);
    }

    /// 释放缓冲
    ///
    /// 不做代际检查：会话替换时旧引擎的拆除流程仍要经此释放宿主
    /// 缓冲。从未分配过宿主令牌的缓冲直接丢弃。
    pub fn blitter_free(&self, bl: Blitter) {
        if let Some(token) = bl.token {
            self.shared.host.borrow_mut().blitter_free(token);
        }
    }
}
