// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了处理器树在解析、路由与渲染过程中可能出现的各类异常。
//!
//! ## 错误分类
//! - **请求解析错误**：报文不是 UTF-8、方法或协议版本不受支持。
//! - **配置错误**：处理器树结构损坏（非根节点以自身为父节点）、父节点已被释放、
//!   或者从某个节点到根节点之间找不到所需的能力（错误处理器、页面渲染器）。
//!   这类错误不能再交给渲染器处理，见 [`Exception::is_configuration`]。
//! - **资源错误**：资源树构建时的命名冲突，或读取资源内容时的 IO 错误。
//!
//! 正常的“未找到”不属于异常，由调用方通过 `Option` 表达。

use std::io;

use thiserror::Error;

/// 服务器处理请求过程中发生的异常类型。
#[derive(Debug, Error)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    #[error("Request bytes can't be parsed in UTF-8")]
    RequestIsNotUtf8,
    /// 客户端使用了服务器暂不支持的 HTTP 方法。
    #[error("Unsupported request method")]
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    #[error("Unsupported HTTP version")]
    UnsupportedHttpVersion,
    /// 请求的路径格式非法。对应 `400 Bad Request`。
    #[error("Invalid path (400)")]
    InvalidPath,
    /// 某个非根节点报告自己是自己的父节点。
    #[error("Router '{0}' returned itself as parent")]
    MalformedTree(String),
    /// 节点的父节点已经被释放，无法继续向上遍历。
    #[error("Router '{0}' has been detached from its parent")]
    DetachedHandler(String),
    /// 从当前节点到根节点都没有实现所需的能力。
    #[error("There is no {0} available in the routing tree")]
    MissingCapability(&'static str),
    /// 同一容器内的节点名与资源名重复。
    #[error("The name '{0}' is already used in this container")]
    DuplicateResourceName(String),
    /// 资源或节点名称为空、包含 `/` 或者是 `.`、`..`。
    #[error("'{0}' is not a valid resource name")]
    InvalidResourceName(String),
    /// 读取资源内容失败。
    #[error("Resource '{0}' is unavailable: {1}")]
    ResourceUnavailable(String, #[source] io::Error),
    /// 配置文件无法使用。
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Exception {
    /// 是否属于树结构或能力缺失导致的配置错误。
    ///
    /// 这类错误应当以通用的 500 终止当前请求，且不能再尝试渲染错误页面，
    /// 因为缺失的可能正是渲染能力本身。
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Exception::MalformedTree(_)
                | Exception::DetachedHandler(_)
                | Exception::MissingCapability(_)
        )
    }

    /// 与该异常对应的 HTTP 状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            Exception::RequestIsNotUtf8
            | Exception::UnSupportedRequestMethod
            | Exception::InvalidPath => 400,
            Exception::UnsupportedHttpVersion => 505,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(Exception::MalformedTree("x".to_string()).is_configuration());
        assert!(Exception::DetachedHandler("x".to_string()).is_configuration());
        assert!(Exception::MissingCapability("page renderer").is_configuration());
        assert!(!Exception::InvalidPath.is_configuration());
        assert!(!Exception::Io(io::Error::new(io::ErrorKind::Other, "boom")).is_configuration());
    }

    #[test]
    fn test_display() {
        let e = Exception::MalformedTree("Layout".to_string());
        assert_eq!(e.to_string(), "Router 'Layout' returned itself as parent");

        let e = Exception::MissingCapability("error handler");
        assert_eq!(
            e.to_string(),
            "There is no error handler available in the routing tree"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Exception::InvalidPath.status_code(), 400);
        assert_eq!(Exception::UnsupportedHttpVersion.status_code(), 505);
        assert_eq!(Exception::MissingCapability("x").status_code(), 500);
    }
}
