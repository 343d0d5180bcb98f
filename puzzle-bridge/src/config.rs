//! # Config 模块
//!
//! 配置对话框协议的数据模型。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──configure()──► DialogBuilding ──dialog_show──► DialogOpen
//!                                                          │
//!            ┌─────────────── config_cancel ◄──────────────┤
//!            │                                             │
//!          Idle ◄── 提交成功 ── config_ok / 种子·描述提取 ──┘
//!                        │
//!                        └── 引擎拒绝 ──► DialogOpen（快照保留）
//! ```
//!
//! DialogBuilding 只在 `configure()` 内部瞬时存在：字段按引擎给出的
//! 顺序逐条下发给宿主后立即进入 DialogOpen。待决快照保存在会话上，
//! 字段顺序在打开与提交之间保持不变，原样交还引擎。
//!
//! ## 设计原则
//!
//! - 字段按**名字精确匹配**定位；名字找不到说明宿主与引擎的协议
//!   对不上，直接 panic，不做部分恢复
//! - 快照是 `Vec<ConfigField>`，顺序即协议

use serde::{Deserialize, Serialize};

/// 配置对话框的用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigPurpose {
    /// 常规游戏设置
    Settings,
    /// 随机种子输入
    Seed,
    /// 局面描述输入
    Description,
}

impl ConfigPurpose {
    /// 游戏标识串中参数前缀与载荷之间的分隔符
    ///
    /// 种子用 `#`，描述用 `:`；常规设置没有对应的标识串形式。
    pub fn separator(self) -> Option<char> {
        match self {
            ConfigPurpose::Settings => None,
            ConfigPurpose::Seed => Some('#'),
            ConfigPurpose::Description => Some(':'),
        }
    }
}

/// 一个可编辑的配置字段
///
/// 引擎在打开对话框时给出字段列表，宿主编辑后按名字写回。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigField {
    /// 字符串字段
    String {
        /// 字段名（同一快照内唯一）
        name: String,
        /// 当前值
        value: String,
    },

    /// 布尔字段
    Boolean {
        /// 字段名
        name: String,
        /// 是否勾选
        checked: bool,
    },

    /// 单选字段
    Choice {
        /// 字段名
        name: String,
        /// 候选项列表
        choices: Vec<String>,
        /// 当前选中的索引
        selected: usize,
    },
}

impl ConfigField {
    /// 创建字符串字段
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        ConfigField::String {
            name: name.into(),
            value: value.into(),
        }
    }

    /// 创建布尔字段
    pub fn boolean(name: impl Into<String>, checked: bool) -> Self {
        ConfigField::Boolean {
            name: name.into(),
            checked,
        }
    }

    /// 创建单选字段
    pub fn choice(name: impl Into<String>, choices: Vec<String>, selected: usize) -> Self {
        ConfigField::Choice {
            name: name.into(),
            choices,
            selected,
        }
    }

    /// 字段名
    pub fn name(&self) -> &str {
        match self {
            ConfigField::String { name, .. } => name,
            ConfigField::Boolean { name, .. } => name,
            ConfigField::Choice { name, .. } => name,
        }
    }
}

/// 待决配置快照（DialogOpen 状态）
///
/// 从 `configure()` 打开到提交/取消之间，宿主的编辑都落在这份
/// 快照上；引擎侧不感知任何中间状态。
#[derive(Debug, Clone)]
pub struct PendingDialog {
    /// 对话框用途
    pub purpose: ConfigPurpose,
    /// 字段快照，顺序与引擎给出时一致
    pub fields: Vec<ConfigField>,
}

impl PendingDialog {
    /// 按名字定位字段
    ///
    /// # Panics
    ///
    /// 名字不在快照中时 panic：说明宿主写回了一个引擎从未给出的
    /// 字段，属于协议违规。
    fn field_mut(&mut self, name: &str) -> &mut ConfigField {
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) => field,
            None => panic!("配置字段 '{name}' 不在当前快照中"),
        }
    }

    /// 写回字符串字段
    pub fn set_string(&mut self, name: &str, new_value: &str) {
        match self.field_mut(name) {
            ConfigField::String { value, .. } => *value = new_value.to_string(),
            other => panic!("配置字段 '{}' 不是字符串类型", other.name()),
        }
    }

    /// 写回布尔字段
    pub fn set_boolean(&mut self, name: &str, new_checked: bool) {
        match self.field_mut(name) {
            ConfigField::Boolean { checked, .. } => *checked = new_checked,
            other => panic!("配置字段 '{}' 不是布尔类型", other.name()),
        }
    }

    /// 写回单选字段的选中索引
    pub fn set_choice(&mut self, name: &str, new_selected: usize) {
        match self.field_mut(name) {
            ConfigField::Choice { selected, .. } => *selected = new_selected,
            other => panic!("配置字段 '{}' 不是单选类型", other.name()),
        }
    }
}
