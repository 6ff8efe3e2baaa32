// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 资源树
//!
//! 资源树是一棵与处理器树相互独立、形如文件系统的树：容器（目录）与资源（文件）。
//! 静态内容处理器持有一棵资源树的根，并在自己的边界上把请求路径翻译为资源树中的位置，
//! 或者把资源树中的位置翻译回服务器上的绝对路径（[`ResourceTreeExt::get_path`]）。

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

use crate::{
    content::{Children, ContentElement, ContentInfo, ContentIter, IndexProvider},
    exception::Exception,
    handler::Handler,
    param::HTML_CONTENT_TYPE,
    path::WebPath,
    request::Request,
    routing::RoutingTarget,
    walker::HandlerExt,
};

/// 资源树中的叶子。
pub trait Resource: Send + Sync + fmt::Debug {
    fn name(&self) -> Option<&str>;

    /// 显式指定的内容类型；为 `None` 时由资源名推测。
    fn content_type(&self) -> Option<&str>;

    fn length(&self) -> Option<u64> {
        None
    }

    fn modified(&self) -> Option<SystemTime> {
        None
    }

    /// 读取资源内容。
    fn content(&self) -> Result<Bytes, Exception>;
}

/// 资源树中的容器。根容器没有名字，其余容器都是 [`ResourceNode`]。
pub trait ResourceContainer: Send + Sync + fmt::Debug {
    fn try_get_node(&self, name: &str) -> Option<Arc<dyn ResourceContainer>>;

    fn nodes(&self) -> Vec<Arc<dyn ResourceContainer>>;

    fn try_get_resource(&self, name: &str) -> Option<Arc<dyn Resource>>;

    fn resources(&self) -> Vec<Arc<dyn Resource>>;

    /// 非根容器返回自己的节点视图。
    fn as_node(&self) -> Option<&dyn ResourceNode> {
        None
    }
}

/// 有名字、有父容器的容器，即目录。
pub trait ResourceNode {
    fn name(&self) -> &str;

    fn parent(&self) -> Option<Arc<dyn ResourceContainer>>;
}

/// `find` 的结果：解析到的容器与资源，二者都为 `None` 表示未找到。
pub type Resolution = (Option<Arc<dyn ResourceContainer>>, Option<Arc<dyn Resource>>);

/// 默认的目录包装方式：内容类型为 HTML 列表页，不带额外信息。
pub fn default_index_provider() -> IndexProvider {
    Arc::new(|_, path, children| {
        ContentElement::new(path, ContentInfo::default(), HTML_CONTENT_TYPE, Some(children))
    })
}

pub trait ResourceTreeExt {
    /// 按路由游标在容器中解析节点或资源。
    ///
    /// - 游标已耗尽：返回容器本身；
    /// - 游标位于最后一段：先按资源名查找，再按节点名查找，都没有则返回 `(None, None)`；
    /// - 其余情况只按节点名查找，命中则前进游标并继续向下，未命中则停在当前容器。
    ///
    /// 部分匹配时游标停在未能解析的段上，调用方可以据此区分“目录命中”和“部分匹配”。
    fn find(&self, target: &mut RoutingTarget) -> Resolution;

    /// 容器在服务器上的绝对路径：处理器的规范路径加上容器在资源树中的路径。
    fn get_path(&self, request: &Request, handler: &Arc<dyn Handler>) -> Result<WebPath, Exception>;

    /// 以默认方式列出容器的内容。
    fn get_content(
        &self,
        request: &Request,
        handler: &Arc<dyn Handler>,
    ) -> Result<ContentIter, Exception>;

    /// 列出容器的内容，目录由 `provider` 包装。
    fn get_content_with(
        &self,
        request: &Request,
        handler: &Arc<dyn Handler>,
        provider: IndexProvider,
    ) -> Result<ContentIter, Exception>;
}

impl ResourceTreeExt for Arc<dyn ResourceContainer> {
    fn find(&self, target: &mut RoutingTarget) -> Resolution {
        let mut node = Arc::clone(self);

        loop {
            let current = match target.current() {
                Some(current) => current.value().to_string(),
                None => return (Some(node), None),
            };

            if target.last() {
                if let Some(resource) = node.try_get_resource(&current) {
                    return (Some(node), Some(resource));
                }
                if let Some(child) = node.try_get_node(&current) {
                    return (Some(child), None);
                }
                return (None, None);
            }

            match node.try_get_node(&current) {
                Some(child) => {
                    target.advance();
                    node = child;
                }
                None => return (Some(node), None),
            }
        }
    }

    fn get_path(&self, request: &Request, handler: &Arc<dyn Handler>) -> Result<WebPath, Exception> {
        let mut segments = Vec::new();

        let mut current = Arc::clone(self);
        loop {
            let parent = match current.as_node() {
                Some(node) => {
                    segments.push(node.name().to_string());
                    node.parent()
                }
                None => break,
            };
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        let mut path = handler.get_root(request, true)?.edit(true);
        for segment in segments.iter().rev() {
            path.append(segment);
        }
        Ok(path.build())
    }

    fn get_content(
        &self,
        request: &Request,
        handler: &Arc<dyn Handler>,
    ) -> Result<ContentIter, Exception> {
        self.get_content_with(request, handler, default_index_provider())
    }

    fn get_content_with(
        &self,
        request: &Request,
        handler: &Arc<dyn Handler>,
        provider: IndexProvider,
    ) -> Result<ContentIter, Exception> {
        let path = self.get_path(request, handler)?;
        Ok(Children::new(Arc::clone(self), path, provider).iter())
    }
}
