//! # Preset 模块
//!
//! 参数预设菜单的树形数据模型。
//!
//! 每次请求都从引擎的预设树重新构建，节点没有跨请求的持久身份；
//! 宿主拿到整棵树后自行渲染成菜单。

use serde::{Deserialize, Serialize};

/// 预设菜单节点
///
/// 叶子携带一条编码好的参数串，中间节点携带子菜单。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresetEntry {
    /// 叶子：选中即以这组参数开新局
    Params {
        /// 菜单项标识（宿主用于回报选中项）
        id: i32,
        /// 显示标题
        title: String,
        /// 编码好的参数串
        params: String,
    },

    /// 中间节点：展开子菜单
    Submenu {
        /// 菜单项标识
        id: i32,
        /// 显示标题
        title: String,
        /// 子菜单项
        entries: Vec<PresetEntry>,
    },
}

impl PresetEntry {
    /// 显示标题
    pub fn title(&self) -> &str {
        match self {
            PresetEntry::Params { title, .. } => title,
            PresetEntry::Submenu { title, .. } => title,
        }
    }

    /// 整棵子树的叶子数量
    pub fn leaf_count(&self) -> usize {
        match self {
            PresetEntry::Params { .. } => 1,
            PresetEntry::Submenu { entries, .. } => {
                entries.iter().map(PresetEntry::leaf_count).sum()
            }
        }
    }
}
