// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::fmt;
use std::sync::{Arc, Weak};

use log::{error, warn};

use crate::{
    content::{ContentElement, ContentInfo},
    exception::Exception,
    handler::{ErrorHandler, ErrorModel, Handler, HandlerBuilder, HandlerResolver, PageRenderer, TemplateModel},
    param::STATUS_CODES,
    request::Request,
    response::Response,
    util::{escape_html, HtmlBuilder},
    walker::HandlerExt,
};

/// 默认引用的样式表，以逻辑路由给出
const DEFAULT_STYLESHEET: &str = "static/style.css";

/// 处理器树的根。
///
/// 把请求交给内容处理器；内容不负责时回应 404，内容出错时回应 500。
/// 同时为整棵树提供默认的错误处理与页面渲染。
pub struct CoreRouter {
    this: Weak<CoreRouter>,
    content: Arc<dyn Handler>,
    stylesheet: Option<String>,
    error_details: bool,
}

pub struct CoreRouterBuilder {
    content: Box<dyn HandlerBuilder>,
    stylesheet: Option<String>,
    error_details: bool,
}

impl CoreRouter {
    pub fn builder(content: impl HandlerBuilder + 'static) -> CoreRouterBuilder {
        CoreRouterBuilder {
            content: Box::new(content),
            stylesheet: Some(DEFAULT_STYLESHEET.to_string()),
            error_details: false,
        }
    }

    /// 内容处理器出错时的回应。配置错误不再经过渲染器。
    fn recover(this: Arc<dyn Handler>, request: &Request, e: Exception) -> Response {
        let id = request.id();
        if e.is_configuration() {
            error!("[ID{}]处理器树配置错误：{}", id, e);
            return Response::from_status_code(500, None);
        }

        error!("[ID{}]处理请求时发生异常：{}", id, e);
        let model = ErrorModel::new(Arc::clone(&this), e.status_code(), "服务器出现了一个内部错误。").with_cause(&e);
        let details = ContentInfo::titled(STATUS_CODES.get(&model.status()).copied().unwrap_or("Error"));

        match this.get_error(request, &model, &details) {
            Ok(response) => response,
            Err(e) => {
                error!("[ID{}]无法渲染错误页面：{}", id, e);
                Response::from_status_code(500, None)
            }
        }
    }
}

impl CoreRouterBuilder {
    /// 页面引用的样式表路由，`None` 表示不引用
    pub fn stylesheet(mut self, route: Option<&str>) -> Self {
        self.stylesheet = route.map(str::to_string);
        self
    }

    /// 是否在错误页面中写出异常原因。原因可能含有服务器上的文件路径，只应在开发时打开。
    pub fn error_details(mut self, enabled: bool) -> Self {
        self.error_details = enabled;
        self
    }

    /// 根节点没有父节点，它的父节点就是它自己。
    pub fn build(self) -> Arc<dyn Handler> {
        let CoreRouterBuilder {
            content,
            stylesheet,
            error_details,
        } = self;
        let router: Arc<CoreRouter> = Arc::new_cyclic(|this: &Weak<CoreRouter>| {
            let parent: Weak<dyn Handler> = this.clone();
            CoreRouter {
                this: this.clone(),
                content: content.build(parent),
                stylesheet,
                error_details,
            }
        });
        router
    }
}

impl fmt::Debug for CoreRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRouter")
            .field("content", &self.content)
            .finish()
    }
}

impl Handler for CoreRouter {
    fn parent(&self) -> Option<Arc<dyn Handler>> {
        self.this.upgrade().map(|this| this as Arc<dyn Handler>)
    }

    fn handle(self: Arc<Self>, request: &mut Request) -> Result<Option<Response>, Exception> {
        let this: Arc<dyn Handler> = self.clone();

        let result = match Arc::clone(&self.content).handle(request) {
            Ok(Some(response)) => Ok(response),
            Ok(None) => {
                warn!("[ID{}]请求的路径：{} 不存在，返回404", request.id(), request.path());
                this.get_not_found(request, None, None)
            }
            Err(e) => Err(e),
        };

        Ok(Some(match result {
            Ok(response) => response,
            Err(e) => CoreRouter::recover(this, request, e),
        }))
    }

    fn content(self: Arc<Self>, request: &Request) -> Result<Vec<ContentElement>, Exception> {
        Arc::clone(&self.content).content(request)
    }

    fn into_error_handler(self: Arc<Self>) -> Option<Arc<dyn ErrorHandler>> {
        Some(self)
    }

    fn into_page_renderer(self: Arc<Self>) -> Option<Arc<dyn PageRenderer>> {
        Some(self)
    }

    fn into_handler_resolver(self: Arc<Self>) -> Option<Arc<dyn HandlerResolver>> {
        Some(self)
    }
}

impl ErrorHandler for CoreRouter {
    fn render_error(
        &self,
        _request: &Request,
        model: &ErrorModel,
        details: &ContentInfo,
    ) -> Result<TemplateModel, Exception> {
        let title = details
            .title
            .clone()
            .unwrap_or_else(|| model.status().to_string());

        let mut body = format!(
            "<h1>{}</h1><h2>噢！</h2><p>{}</p>",
            escape_html(&title),
            escape_html(model.message())
        );
        if let Some(description) = &details.description {
            body.push_str(&format!("<p>{}</p>", escape_html(description)));
        }
        if let Some(cause) = model.cause().filter(|_| self.error_details) {
            body.push_str(&format!("<pre>{}</pre>", escape_html(cause)));
        }

        Ok(TemplateModel::new(Arc::clone(model.handler()), title, body))
    }
}

impl PageRenderer for CoreRouter {
    fn render_page(&self, request: &Request, model: &TemplateModel) -> Result<Response, Exception> {
        let mut page = HtmlBuilder::new(model.title(), model.content());

        // 样式表以绝对路径引用，与请求路径是否以 `/` 结尾无关
        if let Some(route) = &self.stylesheet {
            if let Some(href) = model.handler().route(request, route, false)? {
                page = page.stylesheet(&href);
            }
        }

        Ok(Response::new().html(page.build()))
    }
}

impl HandlerResolver for CoreRouter {
    fn find(&self, segment: &str) -> Option<Arc<dyn Handler>> {
        Arc::clone(&self.content)
            .into_handler_resolver()?
            .find(segment)
    }
}
