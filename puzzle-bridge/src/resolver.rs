//! # Resolver 模块
//!
//! 游戏解析：从存档、游戏标识或后端名定位注册表中的变体。
//!
//! ## 设计原则
//!
//! - 注册表按**精确名字匹配**：存档识别比对显示名，启动请求比对短名
//! - 解析入口要么完整成功要么完整失败，失败不触碰任何会话状态；
//!   会话的安装由 [`PuzzleBridge`](crate::bridge::PuzzleBridge) 在
//!   解析成功后统一执行
//! - 引擎报出的名字不在注册表中属于防御性自检失败，与"引擎读不懂
//!   存档"区分开

use std::str::FromStr;

use crate::engine::{Backend, GameLibrary};
use crate::error::ResolveError;
use crate::serialise::ReadCursor;

/// 新局参数的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsRequest {
    /// 变体默认参数
    Default,
    /// 默认参数，但要求竖屏取向（高 ≥ 宽）
    Portrait,
    /// 默认参数，但要求横屏取向（宽 > 高）
    Landscape,
    /// 显式给出的编码参数串
    Explicit(String),
}

impl ParamsRequest {
    /// 解析宿主传来的参数请求；`None` 表示用默认参数
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => ParamsRequest::Default,
            Some(s) => Self::from_str(s).unwrap_or_else(|_| ParamsRequest::Explicit(s.to_string())),
        }
    }
}

impl FromStr for ParamsRequest {
    type Err = ();

    /// 只识别两个取向开关，其余一律当作显式参数串
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "--portrait" => Ok(ParamsRequest::Portrait),
            "--landscape" => Ok(ParamsRequest::Landscape),
            _ => Err(()),
        }
    }
}

/// 从存档识别变体，返回注册表下标
///
/// 只读不建：不构建引擎实例，也不触碰会话。
pub(crate) fn identify(library: &dyn GameLibrary, saved: &[u8]) -> Result<usize, ResolveError> {
    let mut cursor = ReadCursor::new(saved);
    let name = library
        .identify(&mut cursor)
        .map_err(|message| ResolveError::Unrecognised { message })?;
    library
        .games()
        .iter()
        .position(|g| g.name() == name)
        .ok_or(ResolveError::BackendMismatch { name })
}

/// 按短名查找变体，返回注册表下标
pub(crate) fn backend_by_slug(library: &dyn GameLibrary, slug: &str) -> Result<usize, ResolveError> {
    library
        .games()
        .iter()
        .position(|g| g.slug() == slug)
        .ok_or_else(|| ResolveError::UnknownBackend {
            slug: slug.to_string(),
        })
}

/// 为指定取向（或显式请求）推导一条**已校验**的编码参数串
///
/// 取向请求基于变体的默认参数：检查编码开头的 `WxH` 前缀，取向
/// 不符就交换宽高；没有这种前缀的变体保持默认参数不变。校验失败
/// 按标准解析错误上报。
pub(crate) fn oriented_params(
    backend: &dyn Backend,
    request: &ParamsRequest,
) -> Result<String, ResolveError> {
    let mut encoded = backend.default_params();
    match request {
        ParamsRequest::Default => {}
        ParamsRequest::Explicit(s) => encoded = s.clone(),
        ParamsRequest::Portrait | ParamsRequest::Landscape => {
            if let Some((w, h, rest)) = split_wxh(&encoded) {
                let want_landscape = matches!(request, ParamsRequest::Landscape);
                if (w > h) != want_landscape {
                    encoded = format!("{h}x{w}{rest}");
                }
            }
        }
    }
    backend
        .validate_params(&encoded)
        .map_err(|message| ResolveError::BadParams { message })?;
    Ok(encoded)
}

/// 拆出编码串开头的 `WxH` 前缀，返回 (W, H, 余下部分)
fn split_wxh(encoded: &str) -> Option<(u32, u32, &str)> {
    let x_pos = encoded.find('x')?;
    let w: u32 = encoded[..x_pos].parse().ok()?;
    let after = &encoded[x_pos + 1..];
    let h_end = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    let h: u32 = after[..h_end].parse().ok()?;
    Some((w, h, &after[h_end..]))
}
