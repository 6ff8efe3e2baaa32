// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理器节点与能力
//!
//! 处理器树中的每个节点都实现 [`Handler`]：它知道自己的父节点（根节点的父节点是它自己），
//! 并且可以选择性地实现若干“能力”：
//!
//! | 能力 | 作用 |
//! |---|---|
//! | [`ErrorHandler`] | 把错误模型渲染为页面模板 |
//! | [`PageRenderer`] | 把页面模板渲染为响应 |
//! | [`HandlerResolver`] | 按名称查找子处理器（逻辑路由） |
//! | [`RootPathAppender`] | 向节点的规范路径贡献自己的路径段 |
//!
//! 节点通过 `into_*` 方法声明自己具备哪些能力，祖先查找只需要对每个节点做一次类型测试，
//! 见 [`Capability`] 与 [`crate::walker::HandlerExt`]。
//!
//! 树在服务器组装时自顶向下构建（[`HandlerBuilder`]），之后只读，所有请求共享。
//! 子节点只持有父节点的弱引用，避免引用环。

use std::fmt;
use std::sync::{Arc, Weak};

use crate::{
    content::{ContentElement, ContentInfo},
    exception::Exception,
    path::PathBuilder,
    request::Request,
    response::Response,
};

/// 处理器树中的节点。
pub trait Handler: Send + Sync + fmt::Debug {
    /// 父节点。根节点返回它自己；父节点已被释放时返回 `None`。
    fn parent(&self) -> Option<Arc<dyn Handler>>;

    /// 处理请求。
    ///
    /// 返回 `Ok(None)` 表示该处理器对请求的路径不负责，由上层决定如何回应（通常是 404）。
    fn handle(self: Arc<Self>, request: &mut Request) -> Result<Option<Response>, Exception>;

    /// 该处理器对外提供的内容，用于生成索引或站点地图。
    fn content(self: Arc<Self>, _request: &Request) -> Result<Vec<ContentElement>, Exception> {
        Ok(Vec::new())
    }

    fn into_error_handler(self: Arc<Self>) -> Option<Arc<dyn ErrorHandler>> {
        None
    }

    fn into_page_renderer(self: Arc<Self>) -> Option<Arc<dyn PageRenderer>> {
        None
    }

    fn into_handler_resolver(self: Arc<Self>) -> Option<Arc<dyn HandlerResolver>> {
        None
    }

    fn into_root_path_appender(self: Arc<Self>) -> Option<Arc<dyn RootPathAppender>> {
        None
    }
}

/// 把错误模型渲染为页面模板。
pub trait ErrorHandler: Send + Sync {
    fn render_error(
        &self,
        request: &Request,
        model: &ErrorModel,
        details: &ContentInfo,
    ) -> Result<TemplateModel, Exception>;
}

/// 把页面模板渲染为完整的响应。
pub trait PageRenderer: Send + Sync {
    fn render_page(&self, request: &Request, model: &TemplateModel) -> Result<Response, Exception>;
}

/// 按名称查找子处理器。
///
/// 名称查找与路径段查找是两回事：一个处理器可以用名字登记子节点，
/// 而不要求该名字出现在请求路径中。
pub trait HandlerResolver: Send + Sync {
    fn find(&self, segment: &str) -> Option<Arc<dyn Handler>>;
}

/// 向规范路径贡献路径段。
///
/// 路径是自叶向根收集的，因此实现者应当使用 [`PathBuilder::prepend`]。
/// `child` 是遍历时刚刚经过的子节点，节点可以据此决定贡献哪个段。
pub trait RootPathAppender: Send + Sync {
    fn append(&self, path: &mut PathBuilder, request: &Request, child: Option<&Arc<dyn Handler>>);
}

/// 能力角色的类型测试。
///
/// 为每个能力的 trait object 实现一次，祖先查找算法据此对任意能力泛型化。
pub trait Capability: Send + Sync {
    /// 出现在错误信息中的能力名称
    const NAME: &'static str;

    fn query(handler: Arc<dyn Handler>) -> Option<Arc<Self>>;
}

impl Capability for dyn ErrorHandler {
    const NAME: &'static str = "error handler";

    fn query(handler: Arc<dyn Handler>) -> Option<Arc<Self>> {
        handler.into_error_handler()
    }
}

impl Capability for dyn PageRenderer {
    const NAME: &'static str = "page renderer";

    fn query(handler: Arc<dyn Handler>) -> Option<Arc<Self>> {
        handler.into_page_renderer()
    }
}

impl Capability for dyn HandlerResolver {
    const NAME: &'static str = "handler resolver";

    fn query(handler: Arc<dyn Handler>) -> Option<Arc<Self>> {
        handler.into_handler_resolver()
    }
}

impl Capability for dyn RootPathAppender {
    const NAME: &'static str = "root path appender";

    fn query(handler: Arc<dyn Handler>) -> Option<Arc<Self>> {
        handler.into_root_path_appender()
    }
}

/// 在父节点已知后构建处理器。
pub trait HandlerBuilder: Send {
    fn build(self: Box<Self>, parent: Weak<dyn Handler>) -> Arc<dyn Handler>;
}

/// 两个处理器是否为同一个节点。
pub fn same(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// 交给 [`ErrorHandler`] 渲染的错误描述。
#[derive(Debug, Clone)]
pub struct ErrorModel {
    handler: Arc<dyn Handler>,
    status: u16,
    message: String,
    cause: Option<String>,
}

impl ErrorModel {
    pub fn new(handler: Arc<dyn Handler>, status: u16, message: impl Into<String>) -> Self {
        Self {
            handler,
            status,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// 产生该错误的处理器
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

/// 交给 [`PageRenderer`] 的页面模板：标题加上一段 HTML 正文。
#[derive(Debug, Clone)]
pub struct TemplateModel {
    handler: Arc<dyn Handler>,
    title: String,
    content: String,
}

impl TemplateModel {
    pub fn new(handler: Arc<dyn Handler>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            handler,
            title: title.into(),
            content: content.into(),
        }
    }

    /// 生成该页面的处理器，渲染器以它为起点重写页面中的链接
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
