//! # Bridge 模块
//!
//! 面向宿主的总入口：拥有唯一的活动会话，接收宿主事件并转发给
//! 引擎，驱动配置对话框协议与游戏解析。
//!
//! ## 控制流
//!
//! ```text
//! Host 事件(按键/resize/滴答/对话框编辑)
//!   │
//!   ▼
//! PuzzleBridge ──转发──► Engine
//!   ▲                      │
//!   │    DrawingSink / DialogHost / SerialiseHost
//!   └──────────────────────┘
//! ```
//!
//! ## 会话替换
//!
//! 三个解析入口（仅识别、从存档启动、从游戏标识启动）都遵守同一
//! 条规则：解析完整成功之前不触碰活动会话，失败时原会话保持权威；
//! 成功后先拆除旧会话（旧引擎析构可能还要释放宿主侧 blitter），
//! 再安装新会话并复位偏移与计时器。

use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::{ConfigField, ConfigPurpose, PendingDialog};
use crate::drawing::DrawingSink;
use crate::engine::{GameLibrary, UiCapabilities};
use crate::error::{BridgeError, ConfigError, ResolveError};
use crate::host::{Host, Rgb};
use crate::preset::PresetEntry;
use crate::resolver::{self, ParamsRequest};
use crate::serialise::ReadCursor;
use crate::session::{BridgeShared, Session, SessionTag};

/// 桥接层总入口
///
/// 一个实例对应一个宿主视图；内部最多持有一个活动会话。
pub struct PuzzleBridge {
    shared: Rc<BridgeShared>,
    library: Box<dyn GameLibrary>,
    session: Option<Session>,
    tag_counter: SessionTag,
}

impl PuzzleBridge {
    /// 创建桥接实例
    pub fn new(host: Box<dyn Host>, library: Box<dyn GameLibrary>) -> Self {
        Self {
            shared: BridgeShared::new(host),
            library,
            session: None,
            tag_counter: 0,
        }
    }

    fn alloc_tag(&mut self) -> SessionTag {
        self.tag_counter += 1;
        self.tag_counter
    }

    /// 拆除旧会话并安装新会话
    ///
    /// 顺序敏感：旧引擎析构可能仍要通过自己的 sink 释放宿主侧
    /// blitter，必须发生在代际切换之前完成。
    fn install(&mut self, mut session: Session) {
        self.shared.deactivate_timer();
        if let Some(old) = self.session.take() {
            debug!(tag = old.tag, "拆除旧会话");
            drop(old);
        }
        self.shared.begin_session(session.tag);
        // 探测初始几何，宿主随后通常会跟一次 resize
        session.engine.size(i32::MAX, i32::MAX, false);
        let keys = session.engine.request_keys();
        self.shared.host.borrow_mut().set_keys(&keys);
        debug!(tag = session.tag, "会话已安装");
        self.session = Some(session);
    }

    // ---- 游戏解析入口 ----

    /// 仅识别：判断存档属于哪个变体，不构建实例，不触碰会话
    pub fn identify(&self, saved: &[u8]) -> Result<String, ResolveError> {
        let which = resolver::identify(self.library.as_ref(), saved)?;
        Ok(self.library.games()[which].name().to_string())
    }

    /// 从存档启动：识别、构建实例、恢复局面、替换会话
    pub fn start_from_save(&mut self, saved: &[u8]) -> Result<(), ResolveError> {
        let which = resolver::identify(self.library.as_ref(), saved)?;
        let tag = self.alloc_tag();
        let sink = DrawingSink::new(Rc::clone(&self.shared), tag);
        let mut engine = self.library.games()[which].new_instance(sink);
        let mut cursor = ReadCursor::new(saved);
        if let Err(message) = engine.deserialise(&mut cursor) {
            // 半成品实例随返回值丢弃，原会话不受影响
            warn!(error = %message, "存档恢复失败");
            return Err(ResolveError::Deserialise { message });
        }
        debug!(game = %self.library.games()[which].name(), "从存档恢复会话");
        self.install(Session::new(tag, which, engine));
        Ok(())
    }

    /// 从游戏标识启动：按短名定位变体，校验标识串，开新局
    pub fn start_from_game_id(&mut self, slug: &str, game_id: &str) -> Result<(), ResolveError> {
        let which = resolver::backend_by_slug(self.library.as_ref(), slug)?;
        let tag = self.alloc_tag();
        let sink = DrawingSink::new(Rc::clone(&self.shared), tag);
        let mut engine = self.library.games()[which].new_instance(sink);
        if let Err(message) = engine.game_id(game_id) {
            warn!(slug, error = %message, "游戏标识被引擎拒绝");
            return Err(ResolveError::BadGameId { message });
        }
        engine.new_game();
        debug!(slug, "从游戏标识开新会话");
        self.install(Session::new(tag, which, engine));
        Ok(())
    }

    /// 为指定变体推导一条已校验的编码参数串
    ///
    /// 取向请求（竖屏/横屏）基于变体默认参数的 `WxH` 前缀做宽高
    /// 交换；显式参数串原样校验。
    pub fn oriented_params(
        &self,
        slug: &str,
        request: &ParamsRequest,
    ) -> Result<String, ResolveError> {
        let which = resolver::backend_by_slug(self.library.as_ref(), slug)?;
        resolver::oriented_params(self.library.games()[which].as_ref(), request)
    }

    // ---- 宿主事件 ----

    /// 按键/点击事件，坐标为屏幕坐标
    ///
    /// 首次 resize 之前与非正键码一律忽略；坐标减去视口偏移后
    /// 进入引擎坐标系。
    pub fn key_event(&mut self, x: i32, y: i32, key: i32) {
        let Self { shared, session, .. } = self;
        let Some(session) = session.as_mut() else { return };
        let Some((ox, oy)) = shared.offset.get() else { return };
        if key <= 0 {
            return;
        }
        session.engine.process_key(x - ox, y - oy, key);
    }

    /// 视口尺寸变更：让引擎算首选几何，居中后强制重绘
    pub fn resize_event(&mut self, view_w: i32, view_h: i32) {
        let Self { shared, session, .. } = self;
        let Some(session) = session.as_mut() else { return };
        let (w, h) = session.engine.size(view_w, view_h, true);
        let ox = (view_w - w) / 2;
        let oy = (view_h - h) / 2;
        shared.offset.set(Some((ox, oy)));
        shared.host.borrow_mut().unclip(ox, oy);
        debug!(view_w, view_h, w, h, ox, oy, "视口尺寸变更");
        session.engine.force_redraw();
    }

    /// 计时器滴答
    ///
    /// 未激活时不进引擎。激活期间把距上次滴答的秒数交给引擎，
    /// 引擎可能在回调中自行停掉计时器。
    pub fn timer_tick(&mut self) {
        let Self { shared, session, .. } = self;
        if !shared.timer_active.get() {
            return;
        }
        let Some(session) = session.as_mut() else { return };
        let now = Instant::now();
        let elapsed = shared
            .last_tick
            .get()
            .map(|t| now.duration_since(t).as_secs_f32())
            .unwrap_or(0.0);
        session.engine.timer(elapsed);
        shared.last_tick.set(Some(now));
    }

    /// 重置滴答基线而不改变激活状态
    ///
    /// 宿主从后台恢复时调用，避免把挂起时长算成一次超长滴答。
    pub fn reset_timer_baseline(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.shared.last_tick.set(Some(Instant::now()));
    }

    // ---- 配置对话框协议 ----

    /// 打开某用途的配置对话框
    ///
    /// 向引擎要字段列表，按原始顺序逐条下发给宿主搭建对话框，
    /// 随后快照进入待决状态。
    pub fn configure(&mut self, purpose: ConfigPurpose) {
        let Self { shared, session, .. } = self;
        let Some(session) = session.as_mut() else { return };
        let (title, fields) = session.engine.get_config(purpose);
        let mut host = shared.host.borrow_mut();
        host.dialog_init(purpose, &title);
        for field in &fields {
            match field {
                ConfigField::String { name, value } => host.dialog_add_string(purpose, name, value),
                ConfigField::Boolean { name, checked } => {
                    host.dialog_add_boolean(purpose, name, *checked)
                }
                ConfigField::Choice {
                    name,
                    choices,
                    selected,
                } => host.dialog_add_choices(purpose, name, choices, *selected),
            }
        }
        host.dialog_show();
        drop(host);
        debug!(?purpose, fields = fields.len(), "配置对话框已打开");
        session.dialog = Some(PendingDialog { purpose, fields });
    }

    fn pending_mut(&mut self) -> &mut PendingDialog {
        match self.session.as_mut().and_then(|s| s.dialog.as_mut()) {
            Some(pending) => pending,
            None => panic!("配置对话框未打开"),
        }
    }

    /// 写回字符串字段（按名字精确匹配）
    pub fn config_set_string(&mut self, name: &str, value: &str) {
        self.pending_mut().set_string(name, value);
    }

    /// 写回布尔字段
    pub fn config_set_boolean(&mut self, name: &str, checked: bool) {
        self.pending_mut().set_boolean(name, checked);
    }

    /// 写回单选字段的选中索引
    pub fn config_set_choice(&mut self, name: &str, selected: usize) {
        self.pending_mut().set_choice(name, selected);
    }

    /// 提交待决快照
    ///
    /// 引擎接受后返回规范化的编码参数串并回到 Idle；引擎拒绝时
    /// 快照原样保留，宿主可让用户修正后重试。
    pub fn config_ok(&mut self) -> Result<String, ConfigError> {
        let Some(session) = self.session.as_mut() else {
            panic!("配置对话框未打开")
        };
        let Session { engine, dialog, .. } = session;
        let Some(pending) = dialog.as_ref() else {
            panic!("配置对话框未打开")
        };
        if let Err(message) = engine.set_config(pending.purpose, &pending.fields) {
            warn!(error = %message, "配置提交被拒绝");
            return Err(ConfigError::Rejected { message });
        }
        let encoded = engine.encode_params(true);
        *dialog = None;
        debug!(params = %encoded, "配置已提交");
        Ok(encoded)
    }

    /// 取消对话框，无条件丢弃待决快照，不与引擎交互
    pub fn config_cancel(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.dialog = None;
        }
    }

    /// 从种子对话框取出完整的种子串（`参数#种子`）
    pub fn full_seed_from_dialog(&mut self) -> Result<String, ConfigError> {
        self.desc_or_seed(ConfigPurpose::Seed)
    }

    /// 从描述对话框取出完整的游戏标识（`参数:描述`）
    pub fn full_game_id_from_dialog(&mut self) -> Result<String, ConfigError> {
        self.desc_or_seed(ConfigPurpose::Description)
    }

    /// 种子/描述的提取与补全
    ///
    /// 用户编辑过的值可能不带参数前缀；缺前缀时用引擎当前的参数
    /// 编码补全，保证宿主最终拿去开新局的串总是自描述的。补全后
    /// 交给引擎做游戏标识校验，通过才丢弃快照。
    fn desc_or_seed(&mut self, purpose: ConfigPurpose) -> Result<String, ConfigError> {
        let Some(session) = self.session.as_mut() else {
            panic!("配置对话框未打开")
        };
        let Session { engine, dialog, .. } = session;
        let Some(pending) = dialog.as_ref() else {
            panic!("配置对话框未打开")
        };
        let sep = match purpose.separator() {
            Some(sep) => sep,
            None => panic!("常规设置没有标识串形式"),
        };
        let raw = match pending.fields.first() {
            Some(ConfigField::String { value, .. }) => value.clone(),
            _ => panic!("种子/描述对话框应当只有一个字符串字段"),
        };
        let full = if raw.contains(sep) {
            raw
        } else {
            format!("{}{}{}", engine.encode_params(true), sep, raw)
        };
        if let Err(message) = engine.game_id(&full) {
            warn!(error = %message, "种子/描述校验失败");
            return Err(ConfigError::Rejected { message });
        }
        *dialog = None;
        debug!(id = %full, "种子/描述提取完成");
        Ok(full)
    }

    // ---- 序列化 ----

    /// 序列化当前局面，字节段按序转发给宿主的段接收器
    pub fn serialise(&mut self) {
        let Self { shared, session, .. } = self;
        let Some(session) = session.as_mut() else { return };
        session
            .engine
            .serialise(&mut |chunk| shared.host.borrow_mut().serialise_write(chunk));
    }

    // ---- 查询与杂项操作 ----

    /// 当前参数的完整编码串
    pub fn current_params(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.engine.encode_params(true))
    }

    /// 当前变体的帮助主题（短名）
    pub fn help_topic(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| self.library.games()[s.backend].slug())
    }

    /// 本局是否已结束
    pub fn is_completed(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.engine.is_completed())
    }

    /// 宿主界面需要的能力开关
    pub fn ui_capabilities(&self) -> Option<UiCapabilities> {
        let session = self.session.as_ref()?;
        let backend = &self.library.games()[session.backend];
        Some(UiCapabilities {
            can_undo: session.engine.can_undo(),
            can_redo: session.engine.can_redo(),
            can_configure: backend.can_configure(),
            can_solve: backend.can_solve(),
            wants_statusbar: session.engine.wants_statusbar(),
        })
    }

    /// 当前调色板
    pub fn colours(&self) -> Vec<Rgb> {
        self.session
            .as_ref()
            .map(|s| s.engine.colours())
            .unwrap_or_default()
    }

    /// 参数预设树，每次调用都向引擎重新构建
    pub fn presets(&mut self) -> Vec<PresetEntry> {
        self.session
            .as_mut()
            .map(|s| s.engine.presets())
            .unwrap_or_default()
    }

    /// 自动求解
    pub fn solve(&mut self) -> Result<(), BridgeError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session
            .engine
            .solve()
            .map_err(|message| BridgeError::Engine { message })
    }

    /// 重开当前局
    pub fn restart(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.engine.restart_game();
        }
    }

    /// 建议的显示密度
    ///
    /// 把格子尺寸重置到默认值后探测无约束几何，返回视口能容纳的
    /// 整数倍缩放，最小 1。
    pub fn suggest_density(&mut self, view_w: i32, view_h: i32) -> f32 {
        let Some(session) = self.session.as_mut() else {
            return 1.0;
        };
        session.engine.reset_tilesize();
        let (w, h) = session.engine.size(i32::MAX, i32::MAX, false);
        let fit = (view_w as f32 / w as f32)
            .floor()
            .min((view_h as f32 / h as f32).floor());
        fit.max(1.0)
    }
}
