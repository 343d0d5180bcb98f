//! # Session 模块
//!
//! 会话上下文：活动引擎实例与它共享的桥接状态。
//!
//! ## 设计原则
//!
//! - 任意时刻最多一个活动会话；替换时**先**拆除旧会话再安装新会话
//! - 会话身份用单调递增的代际标签表示，绘图回调在边界处比对标签，
//!   替换后残留的旧回调会被静默丢弃
//! - 视口偏移与计时器状态放在共享上下文里，因为引擎持有的
//!   [`DrawingSink`](crate::drawing::DrawingSink) 也要读写它们；
//!   安装新会话时一并复位
//! - 单线程协作模型：所有引擎调用与宿主回调都发生在同一线程上，
//!   共享用 `Rc` + `Cell`/`RefCell`，不引入锁

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use crate::config::PendingDialog;
use crate::engine::Engine;
use crate::host::Host;

/// 会话代际标签
///
/// 每次安装新会话递增；0 保留表示"尚无会话"。
pub type SessionTag = u64;

/// 引擎回调与会话管理共享的桥接状态
pub(crate) struct BridgeShared {
    /// 宿主接口
    pub(crate) host: RefCell<Box<dyn Host>>,
    /// 当前已安装会话的标签
    pub(crate) current: Cell<SessionTag>,
    /// 视口偏移；首次 resize 之前为 `None`，期间按键被忽略
    pub(crate) offset: Cell<Option<(i32, i32)>>,
    /// 计时器是否激活
    pub(crate) timer_active: Cell<bool>,
    /// 上一次滴答（或激活）的时刻
    pub(crate) last_tick: Cell<Option<Instant>>,
}

impl BridgeShared {
    pub(crate) fn new(host: Box<dyn Host>) -> Rc<Self> {
        Rc::new(Self {
            host: RefCell::new(host),
            current: Cell::new(0),
            offset: Cell::new(None),
            timer_active: Cell::new(false),
            last_tick: Cell::new(None),
        })
    }

    /// 标签是否仍指向当前会话
    pub(crate) fn is_current(&self, tag: SessionTag) -> bool {
        self.current.get() == tag
    }

    /// 当前偏移；尚未布局时按 (0, 0) 处理
    pub(crate) fn offset_or_zero(&self) -> (i32, i32) {
        self.offset.get().unwrap_or((0, 0))
    }

    /// 切换到新会话：复位偏移与计时器，更新当前标签
    pub(crate) fn begin_session(&self, tag: SessionTag) {
        self.current.set(tag);
        self.offset.set(None);
        self.timer_active.set(false);
        self.last_tick.set(None);
    }

    /// 激活计时器（幂等）
    ///
    /// 只有非激活→激活的跃迁才会请求宿主投递滴答并记录新基线。
    pub(crate) fn activate_timer(&self) {
        if !self.timer_active.get() {
            self.host.borrow_mut().request_timer(true);
            self.last_tick.set(Some(Instant::now()));
        }
        self.timer_active.set(true);
    }

    /// 停用计时器（幂等）
    pub(crate) fn deactivate_timer(&self) {
        if self.timer_active.get() {
            self.host.borrow_mut().request_timer(false);
        }
        self.timer_active.set(false);
    }
}

/// 一个活动会话
///
/// 拥有引擎实例与待决配置快照；计时器与偏移见 [`BridgeShared`]。
pub(crate) struct Session {
    /// 本会话的代际标签
    pub(crate) tag: SessionTag,
    /// 所属变体在注册表中的下标
    pub(crate) backend: usize,
    /// 引擎实例
    pub(crate) engine: Box<dyn Engine>,
    /// 待决配置快照（DialogOpen 状态时为 `Some`）
    pub(crate) dialog: Option<PendingDialog>,
}

impl Session {
    pub(crate) fn new(tag: SessionTag, backend: usize, engine: Box<dyn Engine>) -> Self {
        Self {
            tag,
            backend,
            engine,
            dialog: None,
        }
    }
}
