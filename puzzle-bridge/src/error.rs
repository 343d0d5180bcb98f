//! # Error 模块
//!
//! 定义 puzzle-bridge 中使用的错误类型。
//!
//! ## 设计原则
//!
//! - 引擎产生的消息**原样透传**：宿主最终展示给用户的文本由引擎决定，
//!   桥接层不加前缀、不翻译
//! - 每个失败域一个枚举（解析/配置），再汇总到统一的 [`BridgeError`]
//! - 契约违规（如载入从未保存过的 blitter）不走错误通道，直接 panic

use thiserror::Error;

/// 游戏解析错误
///
/// 覆盖三个解析入口（仅识别、从存档启动、从游戏标识启动）的全部失败路径。
/// 任何一个变体出现时，当前活动会话都保持不变。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// 引擎无法识别存档内容（引擎消息原样转发）
    #[error("{message}")]
    Unrecognised { message: String },

    /// 引擎报出的游戏名不在注册表中
    ///
    /// 防御性自检，正常运行中不应出现。
    #[error("识别游戏时发生内部错误：'{name}' 不在注册表中")]
    BackendMismatch { name: String },

    /// 指定的后端名不在注册表中
    #[error("未知的游戏后端 '{slug}'")]
    UnknownBackend { slug: String },

    /// 游戏标识验证失败（引擎消息原样转发）
    #[error("{message}")]
    BadGameId { message: String },

    /// 存档恢复失败（引擎消息原样转发）
    #[error("{message}")]
    Deserialise { message: String },

    /// 参数验证失败（引擎消息原样转发）
    #[error("{message}")]
    BadParams { message: String },
}

/// 配置对话框错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 引擎拒绝了提交的配置（引擎消息原样转发）
    ///
    /// 待决快照保留不变，宿主可让用户修正后再次提交。
    #[error("{message}")]
    Rejected { message: String },
}

/// puzzle-bridge 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// 解析错误
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// 配置错误
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// 引擎拒绝了某个操作（如自动求解），消息原样转发
    #[error("{message}")]
    Engine { message: String },
}

/// Result 类型别名
pub type BridgeResult<T> = Result<T, BridgeError>;
