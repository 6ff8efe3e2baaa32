// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::{
    content::{ContentElement, ContentInfo},
    exception::Exception,
    handler::{Handler, HandlerBuilder},
    param::{guess_content_type, DEFAULT_CONTENT_TYPE},
    request::Request,
    resource::Resource,
    response::Response,
    walker::HandlerExt,
};

/// 在自己的路径上提供单个资源。
pub struct DownloadHandler {
    parent: Weak<dyn Handler>,
    resource: Arc<dyn Resource>,
    content_type: String,
}

pub struct DownloadBuilder {
    resource: Arc<dyn Resource>,
    content_type: Option<String>,
}

impl DownloadHandler {
    pub fn builder(resource: Arc<dyn Resource>) -> DownloadBuilder {
        DownloadBuilder {
            resource,
            content_type: None,
        }
    }
}

impl DownloadBuilder {
    /// 不指定时依次使用资源自身的类型、按名称推测的类型和通用二进制类型
    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

impl HandlerBuilder for DownloadBuilder {
    fn build(self: Box<Self>, parent: Weak<dyn Handler>) -> Arc<dyn Handler> {
        let DownloadBuilder {
            resource,
            content_type,
        } = *self;

        let content_type = content_type
            .or_else(|| resource.content_type().map(str::to_string))
            .or_else(|| resource.name().and_then(guess_content_type).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Arc::new(DownloadHandler {
            parent,
            resource,
            content_type,
        })
    }
}

impl fmt::Debug for DownloadHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandler")
            .field("resource", &self.resource)
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl Handler for DownloadHandler {
    fn parent(&self) -> Option<Arc<dyn Handler>> {
        self.parent.upgrade()
    }

    fn handle(self: Arc<Self>, request: &mut Request) -> Result<Option<Response>, Exception> {
        if !request.target().ended() {
            return Ok(None);
        }

        let this: Arc<dyn Handler> = self.clone();
        if let Some(response) = super::check_read_only(&this, request)? {
            return Ok(Some(response));
        }

        Ok(Some(
            Response::new().content(self.resource.content()?, &self.content_type),
        ))
    }

    fn content(self: Arc<Self>, request: &Request) -> Result<Vec<ContentElement>, Exception> {
        let info = ContentInfo {
            title: self.resource.name().map(str::to_string),
            size: self.resource.length(),
            modified: self.resource.modified(),
            ..Default::default()
        };
        let this: Arc<dyn Handler> = self.clone();
        this.get_content(request, info, &self.content_type)
    }
}
