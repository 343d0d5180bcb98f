//! # Testkit 模块
//!
//! 跨模块共享的测试夹具：
//!
//! - [`RecordingHost`]：把每次宿主调用记录成 [`HostCall`]，测试用
//!   日志断言桥接层的转发行为
//! - [`FakeLibrary`]：两个假变体（Mines / Net）组成的注册表，存档
//!   格式是简单的 `KEY=VALUE` 文本行
//! - [`Probe`]：所有假引擎共享的探针，测试借它观察引擎收到了什么
//!
//! 只在测试构型下编译。

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{ConfigField, ConfigPurpose};
use crate::drawing::{Blitter, DrawingSink};
use crate::engine::{Backend, Engine, GameLibrary};
use crate::host::{
    BlitterToken, ColourIndex, DialogHost, DrawingHost, FontType, Host, Rgb, SerialiseHost,
};
use crate::preset::PresetEntry;
use crate::serialise::ReadCursor;

/// 一次被记录的宿主调用
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    DrawText { x: i32, y: i32, colour: i32, text: String },
    FillRect { x: i32, y: i32, w: i32, h: i32, colour: i32 },
    DrawLine { x1: f32, y1: f32, x2: f32, y2: f32, colour: i32 },
    DrawPoly { points: Vec<(i32, i32)>, fill: i32, outline: i32 },
    DrawCircle { cx: f32, cy: f32, radius: f32, fill: i32, outline: i32 },
    ClipRect { x: i32, y: i32, w: i32, h: i32 },
    Unclip { ox: i32, oy: i32 },
    StatusBar { text: String },
    BlitterAlloc { w: i32, h: i32, token: i32 },
    BlitterFree { token: i32 },
    BlitterSave { token: i32, x: i32, y: i32 },
    BlitterLoad { token: i32, x: i32, y: i32 },
    PostInvalidate,
    DialogInit { purpose: ConfigPurpose, title: String },
    DialogAddString { name: String, value: String },
    DialogAddBoolean { name: String, checked: bool },
    DialogAddChoices { name: String, choices: Vec<String>, selected: usize },
    DialogShow,
    RequestTimer { enable: bool },
    SetKeys { keys: String },
}

/// 记录宿主的全部可观察状态
#[derive(Debug, Default)]
pub struct HostLog {
    /// 按发生顺序记录的调用
    pub calls: Vec<HostCall>,
    /// 序列化段接收器收到的全部字节（按序拼接）
    pub serialised: Vec<u8>,
    /// 收到的段数
    pub serialise_chunks: usize,
    /// 下一个发放的 blitter 令牌
    pub next_token: i32,
    /// 置真后拒绝一切 blitter 分配
    pub refuse_blitter: bool,
    /// `default_background_argb` 返回的值
    pub background: u32,
}

/// 把每次调用记进共享日志的宿主实现
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    /// 创建宿主实例和对应的日志句柄
    pub fn boxed() -> (Box<dyn Host>, Rc<RefCell<HostLog>>) {
        let log = Rc::new(RefCell::new(HostLog {
            background: 0xffff_ffff,
            ..HostLog::default()
        }));
        let host = Box::new(RecordingHost {
            log: Rc::clone(&log),
        });
        (host, log)
    }

    fn record(&self, call: HostCall) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl DrawingHost for RecordingHost {
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        _font: FontType,
        _size: i32,
        _align: i32,
        colour: ColourIndex,
        text: &str,
    ) {
        self.record(HostCall::DrawText {
            x,
            y,
            colour,
            text: text.to_string(),
        });
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: ColourIndex) {
        self.record(HostCall::FillRect { x, y, w, h, colour });
    }

    fn draw_line(&mut self, _thickness: f32, x1: f32, y1: f32, x2: f32, y2: f32, colour: ColourIndex) {
        self.record(HostCall::DrawLine { x1, y1, x2, y2, colour });
    }

    fn draw_poly(
        &mut self,
        _thickness: f32,
        points: &[(i32, i32)],
        fill: ColourIndex,
        outline: ColourIndex,
    ) {
        self.record(HostCall::DrawPoly {
            points: points.to_vec(),
            fill,
            outline,
        });
    }

    fn draw_circle(
        &mut self,
        _thickness: f32,
        cx: f32,
        cy: f32,
        radius: f32,
        fill: ColourIndex,
        outline: ColourIndex,
    ) {
        self.record(HostCall::DrawCircle {
            cx,
            cy,
            radius,
            fill,
            outline,
        });
    }

    fn clip_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.record(HostCall::ClipRect { x, y, w, h });
    }

    fn unclip(&mut self, ox: i32, oy: i32) {
        self.record(HostCall::Unclip { ox, oy });
    }

    fn status_bar(&mut self, text: &str) {
        self.record(HostCall::StatusBar {
            text: text.to_string(),
        });
    }

    fn blitter_alloc(&mut self, w: i32, h: i32) -> Option<BlitterToken> {
        let mut log = self.log.borrow_mut();
        if log.refuse_blitter {
            return None;
        }
        let token = log.next_token;
        log.next_token += 1;
        log.calls.push(HostCall::BlitterAlloc { w, h, token });
        Some(BlitterToken(token))
    }

    fn blitter_free(&mut self, token: BlitterToken) {
        self.record(HostCall::BlitterFree { token: token.0 });
    }

    fn blitter_save(&mut self, token: BlitterToken, x: i32, y: i32) {
        self.record(HostCall::BlitterSave { token: token.0, x, y });
    }

    fn blitter_load(&mut self, token: BlitterToken, x: i32, y: i32) {
        self.record(HostCall::BlitterLoad { token: token.0, x, y });
    }

    fn post_invalidate(&mut self) {
        self.record(HostCall::PostInvalidate);
    }

    fn default_background_argb(&mut self) -> u32 {
        self.log.borrow().background
    }
}

impl DialogHost for RecordingHost {
    fn dialog_init(&mut self, purpose: ConfigPurpose, title: &str) {
        self.record(HostCall::DialogInit {
            purpose,
            title: title.to_string(),
        });
    }

    fn dialog_add_string(&mut self, _purpose: ConfigPurpose, name: &str, value: &str) {
        self.record(HostCall::DialogAddString {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn dialog_add_boolean(&mut self, _purpose: ConfigPurpose, name: &str, checked: bool) {
        self.record(HostCall::DialogAddBoolean {
            name: name.to_string(),
            checked,
        });
    }

    fn dialog_add_choices(
        &mut self,
        _purpose: ConfigPurpose,
        name: &str,
        choices: &[String],
        selected: usize,
    ) {
        self.record(HostCall::DialogAddChoices {
            name: name.to_string(),
            choices: choices.to_vec(),
            selected,
        });
    }

    fn dialog_show(&mut self) {
        self.record(HostCall::DialogShow);
    }
}

impl SerialiseHost for RecordingHost {
    fn serialise_write(&mut self, chunk: &[u8]) {
        let mut log = self.log.borrow_mut();
        log.serialised.extend_from_slice(chunk);
        log.serialise_chunks += 1;
    }
}

impl Host for RecordingHost {
    fn request_timer(&mut self, enable: bool) {
        self.record(HostCall::RequestTimer { enable });
    }

    fn set_keys(&mut self, keys: &str) {
        self.record(HostCall::SetKeys {
            keys: keys.to_string(),
        });
    }
}

/// 所有假引擎共享的探针
#[derive(Debug, Default)]
pub struct Probe {
    /// 引擎收到的按键（已换算到引擎坐标系）
    pub keys: Vec<(i32, i32, i32)>,
    /// 引擎收到的每次滴答间隔
    pub timer_calls: Vec<f32>,
    /// new_game 次数
    pub new_games: u32,
    /// restart_game 次数
    pub restarts: u32,
    /// 预设树被请求的次数
    pub preset_requests: u32,
    /// 被析构的引擎实例数
    pub drops: u32,
}

/// 解析 `WxH` 形式的参数串
fn parse_dims(s: &str) -> Option<(i32, i32)> {
    let (w, h) = s.split_once('x')?;
    let w: i32 = w.parse().ok()?;
    let h: i32 = h.parse().ok()?;
    (w >= 1 && h >= 1).then_some((w, h))
}

/// 假变体定义
struct FakeBackend {
    name: &'static str,
    slug: &'static str,
    default_params: &'static str,
    can_solve: bool,
    probe: Rc<RefCell<Probe>>,
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn slug(&self) -> &str {
        self.slug
    }

    fn can_configure(&self) -> bool {
        true
    }

    fn can_solve(&self) -> bool {
        self.can_solve
    }

    fn default_params(&self) -> String {
        self.default_params.to_string()
    }

    fn validate_params(&self, encoded: &str) -> Result<(), String> {
        parse_dims(encoded)
            .map(|_| ())
            .ok_or_else(|| format!("参数无效: '{encoded}'"))
    }

    fn new_instance(&self, sink: DrawingSink) -> Box<dyn Engine> {
        Box::new(FakeEngine {
            sink,
            probe: Rc::clone(&self.probe),
            name: self.name,
            can_solve: self.can_solve,
            tile: 10,
            params: self.default_params.to_string(),
            payload: None,
            completed: false,
            moves: 0,
            difficulty: 1,
            show_timer: true,
            blitter: None,
            stop_timer_next_tick: false,
        })
    }
}

/// 假引擎：棋盘是 `WxH` 格、每格 `tile` 像素的矩形
///
/// 行为挂在特定按键上，方便测试驱动：
/// `s` 开表、`d` 停表、`x` 下一次滴答时自行停表、`b` 保存一个
/// blitter，其余按键画一个标记格子。
struct FakeEngine {
    sink: DrawingSink,
    probe: Rc<RefCell<Probe>>,
    name: &'static str,
    can_solve: bool,
    tile: i32,
    params: String,
    payload: Option<String>,
    completed: bool,
    moves: u32,
    difficulty: usize,
    show_timer: bool,
    blitter: Option<Blitter>,
    stop_timer_next_tick: bool,
}

impl FakeEngine {
    fn dims(&self) -> (i32, i32) {
        parse_dims(&self.params).unwrap_or((1, 1))
    }
}

impl Engine for FakeEngine {
    fn size(&mut self, max_w: i32, max_h: i32, _user_expand: bool) -> (i32, i32) {
        let (w, h) = self.dims();
        ((w * self.tile).min(max_w), (h * self.tile).min(max_h))
    }

    fn reset_tilesize(&mut self) {
        self.tile = 10;
    }

    fn force_redraw(&mut self) {
        self.sink.begin_draw();
        let (w, h) = self.dims();
        self.sink.draw_rect(0, 0, w * self.tile, h * self.tile, 0);
        self.sink.status_bar(&format!("步数 {}", self.moves));
        self.sink.end_draw();
    }

    fn process_key(&mut self, x: i32, y: i32, key: i32) {
        self.probe.borrow_mut().keys.push((x, y, key));
        self.moves += 1;
        match u8::try_from(key).ok() {
            Some(b's') => self.sink.activate_timer(),
            Some(b'd') => self.sink.deactivate_timer(),
            Some(b'x') => self.stop_timer_next_tick = true,
            Some(b'b') => {
                if self.blitter.is_none() {
                    let mut bl = self.sink.blitter_new(32, 32);
                    self.sink.blitter_save(&mut bl, x, y);
                    self.blitter = Some(bl);
                }
            }
            _ => {
                self.sink.draw_rect(x, y, self.tile, self.tile, 1);
                self.sink.end_draw();
            }
        }
    }

    fn timer(&mut self, elapsed: f32) {
        self.probe.borrow_mut().timer_calls.push(elapsed);
        if self.stop_timer_next_tick {
            self.sink.deactivate_timer();
            self.stop_timer_next_tick = false;
        }
    }

    fn request_keys(&mut self) -> String {
        "sdxb".to_string()
    }

    fn get_config(&mut self, purpose: ConfigPurpose) -> (String, Vec<ConfigField>) {
        match purpose {
            ConfigPurpose::Settings => (
                format!("{} 设置", self.name),
                vec![
                    ConfigField::choice(
                        "难度",
                        vec![
                            "简单".to_string(),
                            "普通".to_string(),
                            "困难".to_string(),
                        ],
                        self.difficulty,
                    ),
                    ConfigField::string("棋盘", self.params.clone()),
                    ConfigField::boolean("显示计时", self.show_timer),
                ],
            ),
            ConfigPurpose::Seed => (
                format!("{} 随机种子", self.name),
                vec![ConfigField::string(
                    "游戏种子",
                    format!("{}#{}", self.params, self.payload.as_deref().unwrap_or("12345")),
                )],
            ),
            ConfigPurpose::Description => (
                format!("{} 游戏标识", self.name),
                vec![ConfigField::string(
                    "游戏标识",
                    format!("{}:{}", self.params, self.payload.as_deref().unwrap_or("deadbeef")),
                )],
            ),
        }
    }

    fn set_config(&mut self, purpose: ConfigPurpose, fields: &[ConfigField]) -> Result<(), String> {
        if purpose != ConfigPurpose::Settings {
            return Ok(());
        }
        // 先整体校验，拒绝时引擎状态不变
        let mut params = self.params.clone();
        let mut difficulty = self.difficulty;
        let mut show_timer = self.show_timer;
        for field in fields {
            match field {
                ConfigField::Choice {
                    name,
                    choices,
                    selected,
                } if name == "难度" => {
                    if *selected >= choices.len() {
                        return Err(format!("难度选项越界: {selected}"));
                    }
                    difficulty = *selected;
                }
                ConfigField::String { name, value } if name == "棋盘" => {
                    parse_dims(value).ok_or_else(|| format!("无法解析棋盘尺寸 '{value}'"))?;
                    params = value.clone();
                }
                ConfigField::Boolean { name, checked } if name == "显示计时" => {
                    show_timer = *checked;
                }
                other => return Err(format!("未知配置字段 '{}'", other.name())),
            }
        }
        self.params = params;
        self.difficulty = difficulty;
        self.show_timer = show_timer;
        Ok(())
    }

    fn encode_params(&self, _full: bool) -> String {
        self.params.clone()
    }

    fn game_id(&mut self, id: &str) -> Result<(), String> {
        let Some(pos) = id.find([':', '#']) else {
            return Err("游戏标识缺少 ':' 或 '#' 分隔符".to_string());
        };
        let (params, payload) = (&id[..pos], &id[pos + 1..]);
        parse_dims(params).ok_or_else(|| format!("参数无效: '{params}'"))?;
        self.params = params.to_string();
        self.payload = Some(payload.to_string());
        self.completed = false;
        self.moves = 0;
        Ok(())
    }

    fn new_game(&mut self) {
        self.moves = 0;
        self.completed = false;
        self.probe.borrow_mut().new_games += 1;
    }

    fn restart_game(&mut self) {
        self.moves = 0;
        self.probe.borrow_mut().restarts += 1;
    }

    fn solve(&mut self) -> Result<(), String> {
        if self.can_solve {
            self.completed = true;
            Ok(())
        } else {
            Err("此游戏不支持自动求解".to_string())
        }
    }

    fn can_undo(&self) -> bool {
        self.moves > 0
    }

    fn can_redo(&self) -> bool {
        false
    }

    fn wants_statusbar(&self) -> bool {
        true
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn colours(&self) -> Vec<Rgb> {
        vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.8, 0.1, 0.1]]
    }

    fn presets(&mut self) -> Vec<PresetEntry> {
        self.probe.borrow_mut().preset_requests += 1;
        vec![
            PresetEntry::Params {
                id: 0,
                title: "9x9 普通".to_string(),
                params: "9x9".to_string(),
            },
            PresetEntry::Submenu {
                id: 1,
                title: "更大".to_string(),
                entries: vec![PresetEntry::Params {
                    id: 2,
                    title: "16x16 普通".to_string(),
                    params: "16x16".to_string(),
                }],
            },
        ]
    }

    fn serialise(&mut self, write: &mut dyn FnMut(&[u8])) {
        write(b"SAVEFILE=puzzle-bridge\n");
        write(format!("GAME={}\n", self.name).as_bytes());
        write(format!("PARAMS={}\n", self.params).as_bytes());
        write(format!("COMPLETED={}\n", self.completed as u8).as_bytes());
        write(format!("MOVES={}\n", self.moves).as_bytes());
    }

    fn deserialise(&mut self, read: &mut ReadCursor<'_>) -> Result<(), String> {
        // 故意按小块读取，顺带压一压游标
        let mut data = Vec::new();
        let mut chunk = [0u8; 16];
        while read.remaining() > 0 {
            let take = read.remaining().min(16);
            if !read.read(&mut chunk[..take]) {
                return Err("存档读取中断".to_string());
            }
            data.extend_from_slice(&chunk[..take]);
        }
        let text = String::from_utf8(data).map_err(|_| "存档不是合法的 UTF-8".to_string())?;
        let mut lines = text.lines();
        if lines.next() != Some("SAVEFILE=puzzle-bridge") {
            return Err("看不出这是存档文件".to_string());
        }
        let mut game = None;
        let mut params = None;
        let mut completed = None;
        let mut moves = None;
        for line in lines {
            let Some((key, value)) = line.split_once('=') else {
                return Err(format!("存档行无法解析: '{line}'"));
            };
            match key {
                "GAME" => game = Some(value.to_string()),
                "PARAMS" => params = Some(value.to_string()),
                "COMPLETED" => completed = Some(value == "1"),
                "MOVES" => moves = value.parse().ok(),
                // 容忍未来新增字段
                _ => {}
            }
        }
        let game = game.ok_or_else(|| "存档缺少 GAME 字段".to_string())?;
        if game != self.name {
            return Err(format!("存档属于 '{game}'，不是 {}", self.name));
        }
        let params = params.ok_or_else(|| "存档缺少 PARAMS 字段".to_string())?;
        parse_dims(&params).ok_or_else(|| format!("参数无效: '{params}'"))?;
        self.params = params;
        self.completed = completed.unwrap_or(false);
        self.moves = moves.unwrap_or(0);
        Ok(())
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        if let Some(bl) = self.blitter.take() {
            self.sink.blitter_free(bl);
        }
        self.probe.borrow_mut().drops += 1;
    }
}

/// 假注册表：Mines（可求解）和 Net（不可求解、默认横向棋盘）
pub struct FakeLibrary {
    games: Vec<Box<dyn Backend>>,
}

impl FakeLibrary {
    /// 标准两变体注册表和共享探针
    pub fn standard() -> (Box<dyn GameLibrary>, Rc<RefCell<Probe>>) {
        let probe = Rc::new(RefCell::new(Probe::default()));
        let games: Vec<Box<dyn Backend>> = vec![
            Box::new(FakeBackend {
                name: "Mines",
                slug: "mines",
                default_params: "9x9",
                can_solve: true,
                probe: Rc::clone(&probe),
            }),
            Box::new(FakeBackend {
                name: "Net",
                slug: "net",
                default_params: "30x20",
                can_solve: false,
                probe: Rc::clone(&probe),
            }),
        ];
        (Box::new(FakeLibrary { games }), probe)
    }
}

impl GameLibrary for FakeLibrary {
    fn games(&self) -> &[Box<dyn Backend>] {
        &self.games
    }

    fn identify(&self, read: &mut ReadCursor<'_>) -> Result<String, String> {
        let mut data = vec![0u8; read.remaining()];
        if !read.read(&mut data) {
            return Err("存档读取中断".to_string());
        }
        let text = String::from_utf8(data).map_err(|_| "存档不是合法的 UTF-8".to_string())?;
        let mut lines = text.lines();
        if lines.next() != Some("SAVEFILE=puzzle-bridge") {
            return Err("看不出这是存档文件".to_string());
        }
        for line in lines {
            if let Some(name) = line.strip_prefix("GAME=") {
                return Ok(name.to_string());
            }
        }
        Err("存档缺少 GAME 字段".to_string())
    }
}
