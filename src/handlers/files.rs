// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::fmt;
use std::sync::{Arc, Weak};

use log::debug;

use crate::{
    content::{ContentElement, ListingEntry},
    exception::Exception,
    handler::{Handler, HandlerBuilder, TemplateModel},
    param::{guess_content_type, DEFAULT_CONTENT_TYPE},
    request::Request,
    resource::{Resource, ResourceContainer, ResourceTreeExt},
    response::Response,
    util::{escape_html, listing_table},
    walker::HandlerExt,
};

/// 以一棵资源树提供静态内容。
///
/// - 资源：以显式或推测的内容类型返回；
/// - 目录：请求路径缺少结尾 `/` 时重定向，否则返回首页文件，
///   没有首页文件且允许列表时返回目录列表（HTML 或 JSON）；
/// - 部分匹配与未命中：不负责，交给上层。
pub struct ResourceTreeHandler {
    parent: Weak<dyn Handler>,
    tree: Arc<dyn ResourceContainer>,
    index_file: Option<String>,
    listing: bool,
}

pub struct ResourceTreeBuilder {
    tree: Arc<dyn ResourceContainer>,
    index_file: Option<String>,
    listing: bool,
}

impl ResourceTreeHandler {
    pub fn builder(tree: Arc<dyn ResourceContainer>) -> ResourceTreeBuilder {
        ResourceTreeBuilder {
            tree,
            index_file: None,
            listing: true,
        }
    }

    fn serve_resource(request: &Request, resource: &Arc<dyn Resource>) -> Result<Response, Exception> {
        let content_type = match resource.content_type() {
            Some(t) => t.to_string(),
            None => resource
                .name()
                .and_then(guess_content_type)
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
        };
        debug!("[ID{}]MIME类型: {}", request.id(), content_type);

        Ok(Response::new().content(resource.content()?, &content_type))
    }

    fn serve_directory(
        &self,
        this: &Arc<dyn Handler>,
        request: &Request,
        container: &Arc<dyn ResourceContainer>,
    ) -> Result<Option<Response>, Exception> {
        let path = request.target().path();

        if !path.trailing_slash() {
            let location = path.edit(true).build().to_string();
            debug!("[ID{}]目录请求缺少结尾斜杠，重定向到{}", request.id(), location);
            return Ok(Some(Response::redirect(&location)));
        }

        if let Some(index) = self
            .index_file
            .as_deref()
            .and_then(|name| container.try_get_resource(name))
        {
            return ResourceTreeHandler::serve_resource(request, &index).map(Some);
        }

        if !self.listing {
            return Ok(None);
        }

        let elements: Vec<ContentElement> = container.get_content(request, this)?.collect();
        debug!("[ID{}]生成目录列表，{}个条目", request.id(), elements.len());

        if request.wants_json() {
            let entries: Vec<ListingEntry> = elements.iter().map(ListingEntry::from).collect();
            let json = serde_json::to_vec(&entries)
                .map_err(|e| Exception::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
            return Ok(Some(Response::new().content(json, "application/json")));
        }

        let title = format!("{}的文件列表", path);
        let body = format!(
            "<h1>{}</h1><hr>{}",
            escape_html(&title),
            listing_table(path, &elements)
        );
        this.get_page(request, TemplateModel::new(Arc::clone(this), title, body))
            .map(Some)
    }
}

impl ResourceTreeBuilder {
    /// 目录中存在该文件时代替目录列表返回
    pub fn index_file(mut self, name: &str) -> Self {
        self.index_file = Some(name.to_string());
        self
    }

    pub fn listing(mut self, enabled: bool) -> Self {
        self.listing = enabled;
        self
    }
}

impl HandlerBuilder for ResourceTreeBuilder {
    fn build(self: Box<Self>, parent: Weak<dyn Handler>) -> Arc<dyn Handler> {
        let ResourceTreeBuilder {
            tree,
            index_file,
            listing,
        } = *self;

        Arc::new(ResourceTreeHandler {
            parent,
            tree,
            index_file,
            listing,
        })
    }
}

impl fmt::Debug for ResourceTreeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTreeHandler")
            .field("index_file", &self.index_file)
            .field("listing", &self.listing)
            .finish()
    }
}

impl Handler for ResourceTreeHandler {
    fn parent(&self) -> Option<Arc<dyn Handler>> {
        self.parent.upgrade()
    }

    fn handle(self: Arc<Self>, request: &mut Request) -> Result<Option<Response>, Exception> {
        let this: Arc<dyn Handler> = self.clone();

        let (container, resource) = self.tree.find(request.target_mut());

        // 部分匹配与未命中不检查请求方法，交给上层回应 404
        let target = request.target();
        let directory = match container {
            Some(container) if resource.is_none() && (target.ended() || target.last()) => Some(container),
            _ => None,
        };
        if resource.is_none() && directory.is_none() {
            return Ok(None);
        }

        if let Some(response) = super::check_read_only(&this, request)? {
            return Ok(Some(response));
        }

        match (resource, directory) {
            (Some(resource), _) => ResourceTreeHandler::serve_resource(request, &resource).map(Some),
            (None, Some(container)) => self.serve_directory(&this, request, &container),
            (None, None) => Ok(None),
        }
    }

    fn content(self: Arc<Self>, request: &Request) -> Result<Vec<ContentElement>, Exception> {
        let this: Arc<dyn Handler> = self.clone();
        Ok(self.tree.get_content(request, &this)?.collect())
    }
}
