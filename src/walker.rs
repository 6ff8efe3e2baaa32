// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理器树遍历
//!
//! 本模块只依赖 [`Handler`] 的约定（父节点、同一性、能力类型测试），提供：
//! - 祖先查找：[`HandlerExt::find_parent`]、[`HandlerExt::find_parents`]；
//! - 规范路径：[`HandlerExt::get_root`]，由各节点自己贡献路径段，不存在全局路由表；
//! - 链接重写：[`HandlerExt::route`]，支持绝对 URL、根相对、点相对与逻辑路由名；
//! - 错误与页面输出：沿树向上找到错误处理器和页面渲染器。
//!
//! 所有遍历都以请求携带的根节点为终点，复杂度为树的深度。
//! 遇到“非根节点以自身为父节点”时立即返回 [`Exception::MalformedTree`]。

use std::marker::PhantomData;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{
    content::{ContentElement, ContentInfo},
    exception::Exception,
    handler::{same, Capability, ErrorHandler, ErrorModel, Handler, HandlerResolver, PageRenderer, TemplateModel},
    path::{PathBuilder, WebPath, WebPathPart},
    request::Request,
    response::Response,
};

lazy_static! {
    /// 带协议头的绝对 URL，例如 `https://`
    static ref ABSOLUTE_URL: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").unwrap();
}

const NOT_FOUND_MESSAGE: &str = "The specified resource could not be found on this server.";
const METHOD_NOT_ALLOWED_MESSAGE: &str =
    "The specified resource cannot be accessed with the given HTTP verb.";

/// 从 `current` 走到它的父节点。到达 `root` 时返回 `None`。
fn step(current: &Arc<dyn Handler>, root: &Arc<dyn Handler>) -> Result<Option<Arc<dyn Handler>>, Exception> {
    if same(current, root) {
        return Ok(None);
    }

    let parent = current
        .parent()
        .ok_or_else(|| Exception::DetachedHandler(format!("{:?}", current)))?;

    if same(&parent, current) {
        return Err(Exception::MalformedTree(format!("{:?}", current)));
    }

    Ok(Some(parent))
}

/// 自某个节点向根方向、逐个产出实现了能力 `R` 的祖先（包括起点本身）。
///
/// 每次调用 [`HandlerExt::find_parents`] 都得到一个新的迭代器；迭代器在产出根节点的匹配后结束，
/// 遇到结构错误时产出一次 `Err` 后结束。
pub struct Ancestors<R: ?Sized> {
    current: Option<Arc<dyn Handler>>,
    root: Arc<dyn Handler>,
    pending: Option<Exception>,
    _role: PhantomData<fn() -> Arc<R>>,
}

impl<R: Capability + ?Sized> Iterator for Ancestors<R> {
    type Item = Result<Arc<R>, Exception>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(error) = self.pending.take() {
                return Some(Err(error));
            }

            let current = self.current.take()?;

            match step(&current, &self.root) {
                Ok(next) => self.current = next,
                Err(error) => self.pending = Some(error),
            }

            if let Some(found) = R::query(current) {
                return Some(Ok(found));
            }
        }
    }
}

/// 处理器树上的通用算法，作用于任何 `Arc<dyn Handler>`。
pub trait HandlerExt {
    /// 最近的（包括自身）实现了能力 `R` 的祖先。到达 `root` 仍未找到时返回 `Ok(None)`。
    fn find_parent<R: Capability + ?Sized>(&self, root: &Arc<dyn Handler>) -> Result<Option<Arc<R>>, Exception>;

    /// 所有实现了能力 `R` 的祖先，由近及远，惰性产出。
    fn find_parents<R: Capability + ?Sized>(&self, root: &Arc<dyn Handler>) -> Ancestors<R>;

    /// 节点在服务器上的规范绝对路径。
    fn get_root(&self, request: &Request, trailing_slash: bool) -> Result<WebPath, Exception>;

    /// 把路由引用重写为最终的 URL。
    ///
    /// 按顺序判断：
    /// 1. 绝对 URL 或以 `/` 开头：原样返回；
    /// 2. 以 `.` 开头：需要相对结果时原样返回，否则与请求路径合并；
    /// 3. 其余视为逻辑路径：第一段交给由近及远的 [`HandlerResolver`] 解析，
    ///    第一个认识它的祖先胜出，其余段追加在目标处理器的规范路径之后。
    ///
    /// 逻辑路径无法解析时返回 `Ok(None)`。
    fn route(&self, request: &Request, route: &str, relative: bool) -> Result<Option<String>, Exception>;

    fn route_path(&self, request: &Request, route: &WebPath) -> Result<Option<String>, Exception>;

    fn route_part(&self, request: &Request, part: &WebPathPart) -> Result<Option<String>, Exception>;

    /// 通过最近的页面渲染器渲染页面。
    fn get_page(&self, request: &Request, model: TemplateModel) -> Result<Response, Exception>;

    /// 通过最近的错误处理器和页面渲染器渲染错误页面，状态码取自错误模型。
    fn get_error(&self, request: &Request, model: &ErrorModel, details: &ContentInfo) -> Result<Response, Exception>;

    fn get_not_found(&self, request: &Request, title: Option<&str>, message: Option<&str>) -> Result<Response, Exception>;

    fn get_method_not_allowed(
        &self,
        request: &Request,
        title: Option<&str>,
        message: Option<&str>,
    ) -> Result<Response, Exception>;

    /// 以节点自身的规范路径描述一个内容元素。
    fn get_content(
        &self,
        request: &Request,
        details: ContentInfo,
        content_type: &str,
    ) -> Result<Vec<ContentElement>, Exception>;
}

impl HandlerExt for Arc<dyn Handler> {
    fn find_parent<R: Capability + ?Sized>(&self, root: &Arc<dyn Handler>) -> Result<Option<Arc<R>>, Exception> {
        let mut current = Arc::clone(self);

        loop {
            if let Some(found) = R::query(Arc::clone(&current)) {
                return Ok(Some(found));
            }

            match step(&current, root)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    fn find_parents<R: Capability + ?Sized>(&self, root: &Arc<dyn Handler>) -> Ancestors<R> {
        Ancestors {
            current: Some(Arc::clone(self)),
            root: Arc::clone(root),
            pending: None,
            _role: PhantomData,
        }
    }

    fn get_root(&self, request: &Request, trailing_slash: bool) -> Result<WebPath, Exception> {
        let root = request.root();
        let mut path = PathBuilder::new(trailing_slash);

        let mut current = Arc::clone(self);
        let mut child: Option<Arc<dyn Handler>> = None;

        loop {
            if let Some(appender) = Arc::clone(&current).into_root_path_appender() {
                appender.append(&mut path, request, child.as_ref());
            }

            match step(&current, root)? {
                Some(parent) => {
                    child = Some(current);
                    current = parent;
                }
                None => return Ok(path.build()),
            }
        }
    }

    fn route(&self, request: &Request, route: &str, relative: bool) -> Result<Option<String>, Exception> {
        if ABSOLUTE_URL.is_match(route) || route.starts_with('/') {
            return Ok(Some(route.to_string()));
        }

        if route.starts_with('.') {
            if relative {
                return Ok(Some(route.to_string()));
            }
            let combined = request.target().path().combine(&WebPath::parse(route));
            return Ok(Some(combined.to_string()));
        }

        let parts: Vec<WebPathPart> = route
            .split('/')
            .filter(|s| !s.is_empty())
            .map(WebPathPart::new)
            .collect();

        let Some(first) = parts.first() else {
            return Ok(None);
        };

        for resolver in self.find_parents::<dyn HandlerResolver>(request.root()) {
            let Some(responsible) = resolver?.find(first.value()) else {
                continue;
            };

            // 只写了一个名字且目标本身是容器时，按目录处理
            let directory = parts.len() == 1 && Arc::clone(&responsible).into_handler_resolver().is_some();
            let trailing_slash = route.ends_with('/') || directory;

            let mut target = responsible.get_root(request, false)?.edit(trailing_slash);
            for part in &parts[1..] {
                target.append_part(part.clone());
            }
            let target = target.build();

            debug!(
                "[ID{}]逻辑路由{}解析为{}",
                request.id(),
                route,
                target
            );

            return Ok(Some(if relative {
                request.target().path().relative_to(&target)
            } else {
                target.to_string()
            }));
        }

        debug!("[ID{}]逻辑路由{}无法解析", request.id(), route);
        Ok(None)
    }

    fn route_path(&self, request: &Request, route: &WebPath) -> Result<Option<String>, Exception> {
        self.route(request, &route.to_string(), true)
    }

    fn route_part(&self, request: &Request, part: &WebPathPart) -> Result<Option<String>, Exception> {
        self.route(request, part.original(), true)
    }

    fn get_page(&self, request: &Request, model: TemplateModel) -> Result<Response, Exception> {
        let renderer = self
            .find_parent::<dyn PageRenderer>(request.root())?
            .ok_or(Exception::MissingCapability(<dyn PageRenderer as Capability>::NAME))?;

        renderer.render_page(request, &model)
    }

    fn get_error(&self, request: &Request, model: &ErrorModel, details: &ContentInfo) -> Result<Response, Exception> {
        let renderer = self
            .find_parent::<dyn ErrorHandler>(request.root())?
            .ok_or(Exception::MissingCapability(<dyn ErrorHandler as Capability>::NAME))?;

        let template = renderer.render_error(request, model, details)?;

        Ok(self.get_page(request, template)?.status(model.status()))
    }

    fn get_not_found(&self, request: &Request, title: Option<&str>, message: Option<&str>) -> Result<Response, Exception> {
        let model = ErrorModel::new(Arc::clone(self), 404, message.unwrap_or(NOT_FOUND_MESSAGE));
        let details = ContentInfo::titled(title.unwrap_or("Not Found"));

        self.get_error(request, &model, &details)
    }

    fn get_method_not_allowed(
        &self,
        request: &Request,
        title: Option<&str>,
        message: Option<&str>,
    ) -> Result<Response, Exception> {
        let model = ErrorModel::new(Arc::clone(self), 405, message.unwrap_or(METHOD_NOT_ALLOWED_MESSAGE));
        let details = ContentInfo::titled(title.unwrap_or("Method Not Allowed"))
            .with_description(format!("不支持的请求方法：{}", request.method()));

        self.get_error(request, &model, &details)
    }

    fn get_content(
        &self,
        request: &Request,
        details: ContentInfo,
        content_type: &str,
    ) -> Result<Vec<ContentElement>, Exception> {
        Ok(vec![ContentElement::new(
            self.get_root(request, false)?,
            details,
            content_type,
            None,
        )])
    }
}
