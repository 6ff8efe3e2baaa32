// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 内容元素
//!
//! 内容元素描述一个可以展示的路径：路径本身、元数据、内容类型，
//! 以及（对目录而言）一组按需生成的子元素。
//!
//! 子元素以 [`Children`] 表示，每次调用 [`Children::iter`] 都会得到一个新的惰性迭代器，
//! 只有在被拉取时才会访问资源树的下一层，调用方可以随时停止。

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde_derive::Serialize;

use crate::{
    param::{guess_content_type, DEFAULT_CONTENT_TYPE},
    path::WebPath,
    resource::{Resource, ResourceContainer},
};

/// 内容的描述信息。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    /// 字节数，目录为 `None`
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl ContentInfo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 一个已解析、可展示的内容单元。
#[derive(Clone)]
pub struct ContentElement {
    path: WebPath,
    info: ContentInfo,
    content_type: String,
    children: Option<Children>,
}

impl ContentElement {
    pub fn new(
        path: WebPath,
        info: ContentInfo,
        content_type: impl Into<String>,
        children: Option<Children>,
    ) -> Self {
        Self {
            path,
            info,
            content_type: content_type.into(),
            children,
        }
    }

    pub fn path(&self) -> &WebPath {
        &self.path
    }

    pub fn info(&self) -> &ContentInfo {
        &self.info
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn children(&self) -> Option<&Children> {
        self.children.as_ref()
    }

    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }

    /// 列表中显示的名称：最后一个路径段，目录带上 `/`。
    pub fn display_name(&self) -> String {
        let name = self.path.name().unwrap_or("/");
        if self.is_directory() {
            format!("{}/", name)
        } else {
            name.to_string()
        }
    }
}

impl fmt::Debug for ContentElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentElement")
            .field("path", &self.path.to_string())
            .field("info", &self.info)
            .field("content_type", &self.content_type)
            .field("directory", &self.is_directory())
            .finish()
    }
}

/// 把子节点包装为内容元素的函数。
///
/// 参数依次是子节点、子节点的路径以及子节点自己的子元素。
/// 传入的是被包装的子节点本身而不是它所在的容器：
/// 子节点的名称和元数据都在它自己身上，需要上一层时可以经由 [`ResourceNode::parent`] 取得。
/// 不同的处理器可以用不同的方式呈现目录，而不必重复遍历逻辑。
///
/// [`ResourceNode::parent`]: crate::resource::ResourceNode::parent
pub type IndexProvider =
    Arc<dyn Fn(&Arc<dyn ResourceContainer>, WebPath, Children) -> ContentElement + Send + Sync>;

/// 目录的子元素，可重复遍历。
#[derive(Clone)]
pub struct Children {
    container: Arc<dyn ResourceContainer>,
    path: WebPath,
    provider: IndexProvider,
}

impl Children {
    /// `path` 是 `container` 自身的路径。
    pub fn new(container: Arc<dyn ResourceContainer>, path: WebPath, provider: IndexProvider) -> Self {
        Self {
            container,
            path,
            provider,
        }
    }

    pub fn path(&self) -> &WebPath {
        &self.path
    }

    /// 先列出全部子节点，再列出资源；同一层内按容器给出的顺序。
    pub fn iter(&self) -> ContentIter {
        ContentIter {
            children: self.clone(),
            nodes: None,
            resources: None,
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Children")
            .field("path", &self.path.to_string())
            .finish()
    }
}

impl IntoIterator for &Children {
    type Item = ContentElement;
    type IntoIter = ContentIter;

    fn into_iter(self) -> ContentIter {
        self.iter()
    }
}

/// [`Children`] 的惰性迭代器。
pub struct ContentIter {
    children: Children,
    nodes: Option<std::vec::IntoIter<Arc<dyn ResourceContainer>>>,
    resources: Option<std::vec::IntoIter<Arc<dyn Resource>>>,
}

impl Iterator for ContentIter {
    type Item = ContentElement;

    fn next(&mut self) -> Option<ContentElement> {
        let container = &self.children.container;

        let nodes = self
            .nodes
            .get_or_insert_with(|| container.nodes().into_iter());
        for node in nodes.by_ref() {
            let Some(name) = node.as_node().map(|n| n.name().to_string()) else {
                continue;
            };
            let path = self.children.path.edit(true).append(&name).build();
            let children = Children::new(
                Arc::clone(&node),
                path.clone(),
                Arc::clone(&self.children.provider),
            );
            return Some((self.children.provider)(&node, path, children));
        }

        let resources = self
            .resources
            .get_or_insert_with(|| container.resources().into_iter());
        for resource in resources.by_ref() {
            let Some(name) = resource.name() else {
                continue;
            };
            let path = self.children.path.edit(false).append(name).build();
            let content_type = match resource.content_type() {
                Some(t) => t.to_string(),
                None => guess_content_type(name)
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string(),
            };
            let info = ContentInfo {
                size: resource.length(),
                modified: resource.modified(),
                ..Default::default()
            };
            return Some(ContentElement::new(path, info, content_type, None));
        }

        None
    }
}

/// 目录列表的 JSON 表示，只展开一层。
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub directory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl From<&ContentElement> for ListingEntry {
    fn from(element: &ContentElement) -> Self {
        Self {
            name: element.display_name(),
            path: element.path().to_string(),
            content_type: element.content_type().to_string(),
            directory: element.is_directory(),
            size: element.info().size,
            modified: element.info().modified.map(|time| {
                let local: DateTime<Local> = time.into();
                local.format("%Y-%m-%d %H:%M:%S %Z").to_string()
            }),
        }
    }
}
