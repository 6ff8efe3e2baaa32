// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use log::debug;

use crate::{
    content::ContentElement,
    exception::Exception,
    handler::{same, Handler, HandlerBuilder, HandlerResolver, RootPathAppender},
    path::PathBuilder,
    request::Request,
    response::Response,
};

/// 按名称划分区段的处理器。
///
/// 请求路径的当前段与某个区段名相同时，消费该段并交给区段处理；
/// 路径已经耗尽时交给首页；都不匹配时交给兜底处理器，兜底处理器不消费路径段。
pub struct Layout {
    parent: Weak<dyn Handler>,
    sections: BTreeMap<String, Arc<dyn Handler>>,
    index: Option<Arc<dyn Handler>>,
    fallback: Option<Arc<dyn Handler>>,
}

#[derive(Default)]
pub struct LayoutBuilder {
    sections: Vec<(String, Box<dyn HandlerBuilder>)>,
    index: Option<Box<dyn HandlerBuilder>>,
    fallback: Option<Box<dyn HandlerBuilder>>,
}

impl Layout {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::default()
    }

    fn delegate(handler: &Arc<dyn Handler>, request: &mut Request) -> Result<Option<Response>, Exception> {
        Arc::clone(handler).handle(request)
    }
}

impl LayoutBuilder {
    /// 同名区段后添加的生效
    pub fn section(mut self, name: &str, handler: impl HandlerBuilder + 'static) -> Self {
        self.sections.push((name.to_string(), Box::new(handler)));
        self
    }

    pub fn index(mut self, handler: impl HandlerBuilder + 'static) -> Self {
        self.index = Some(Box::new(handler));
        self
    }

    pub fn fallback(mut self, handler: impl HandlerBuilder + 'static) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }
}

impl HandlerBuilder for LayoutBuilder {
    fn build(self: Box<Self>, parent: Weak<dyn Handler>) -> Arc<dyn Handler> {
        let LayoutBuilder {
            sections,
            index,
            fallback,
        } = *self;

        let layout: Arc<Layout> = Arc::new_cyclic(|this: &Weak<Layout>| {
            let me: Weak<dyn Handler> = this.clone();
            Layout {
                parent,
                sections: sections
                    .into_iter()
                    .map(|(name, builder)| (name, builder.build(me.clone())))
                    .collect(),
                index: index.map(|builder| builder.build(me.clone())),
                fallback: fallback.map(|builder| builder.build(me.clone())),
            }
        });
        layout
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .field("index", &self.index.is_some())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Handler for Layout {
    fn parent(&self) -> Option<Arc<dyn Handler>> {
        self.parent.upgrade()
    }

    fn handle(self: Arc<Self>, request: &mut Request) -> Result<Option<Response>, Exception> {
        let current = request.target().current().map(|part| part.value().to_string());

        match current {
            None => {
                if let Some(index) = &self.index {
                    return Layout::delegate(index, request);
                }
            }
            Some(segment) => {
                if let Some(section) = self.sections.get(&segment) {
                    debug!("[ID{}]进入区段{}", request.id(), segment);
                    request.target_mut().advance();
                    return Layout::delegate(section, request);
                }
            }
        }

        match &self.fallback {
            Some(fallback) => Layout::delegate(fallback, request),
            None => Ok(None),
        }
    }

    fn content(self: Arc<Self>, request: &Request) -> Result<Vec<ContentElement>, Exception> {
        let mut elements = Vec::new();
        for handler in self.index.iter().chain(self.sections.values()).chain(self.fallback.iter()) {
            elements.extend(Arc::clone(handler).content(request)?);
        }
        Ok(elements)
    }

    fn into_handler_resolver(self: Arc<Self>) -> Option<Arc<dyn HandlerResolver>> {
        Some(self)
    }

    fn into_root_path_appender(self: Arc<Self>) -> Option<Arc<dyn RootPathAppender>> {
        Some(self)
    }
}

impl HandlerResolver for Layout {
    fn find(&self, segment: &str) -> Option<Arc<dyn Handler>> {
        self.sections.get(segment).cloned()
    }
}

impl RootPathAppender for Layout {
    fn append(&self, path: &mut PathBuilder, _request: &Request, child: Option<&Arc<dyn Handler>>) {
        let Some(child) = child else {
            return;
        };
        if let Some((name, _)) = self.sections.iter().find(|(_, section)| same(section, child)) {
            path.prepend(name);
        }
    }
}
