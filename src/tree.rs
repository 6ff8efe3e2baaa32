// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 资源树构建
//!
//! [`VirtualTree`] 在启动时收集目录与资源，[`VirtualTree::build`] 之后得到只读的容器树，
//! 子容器通过弱引用指向父容器。
//!
//! 同一容器内的节点名与资源名不允许重复，构建时直接拒绝，
//! 这样“同名的文件与目录谁优先”只会出现在自定义的 [`ResourceContainer`] 实现中。
//!
//! 资源有两种：内存中的 [`BytesResource`]，以及按需从磁盘读取的 [`FileResource`]，
//! 后者的内容经 [`FileCache`] 缓存。

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::SystemTime;

use bytes::Bytes;
use log::{debug, warn};

use crate::{
    cache::FileCache,
    exception::Exception,
    resource::{Resource, ResourceContainer, ResourceNode},
};

/// 检查节点或资源名是否可以作为单个路径段。
fn validate_name(name: &str) -> Result<(), Exception> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(Exception::InvalidResourceName(name.to_string()));
    }
    Ok(())
}

/// 资源树的构建器。
#[derive(Debug, Default)]
pub struct VirtualTree {
    nodes: BTreeMap<String, VirtualTree>,
    resources: BTreeMap<String, Arc<dyn Resource>>,
}

impl VirtualTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_free(&self, name: &str) -> Result<(), Exception> {
        validate_name(name)?;
        if self.nodes.contains_key(name) || self.resources.contains_key(name) {
            return Err(Exception::DuplicateResourceName(name.to_string()));
        }
        Ok(())
    }

    /// 添加一个子目录。
    pub fn add_node(mut self, name: &str, node: VirtualTree) -> Result<Self, Exception> {
        self.check_free(name)?;
        self.nodes.insert(name.to_string(), node);
        Ok(self)
    }

    /// 添加一个资源，资源必须有名字。
    pub fn add_resource(mut self, resource: Arc<dyn Resource>) -> Result<Self, Exception> {
        let name = resource
            .name()
            .ok_or_else(|| Exception::InvalidResourceName(String::new()))?
            .to_string();
        self.check_free(&name)?;
        self.resources.insert(name, resource);
        Ok(self)
    }

    /// 递归扫描目录。子目录成为节点，文件成为 [`FileResource`]。
    ///
    /// 符号链接会被跟随，但指向正在扫描的上级目录的链接会被跳过，否则扫描不会终止。
    /// 无法识别类型的条目（例如失效的符号链接）也会被跳过。
    pub fn from_directory(
        path: &Path,
        cache: Arc<Mutex<FileCache>>,
        threshold: u64,
    ) -> Result<Self, Exception> {
        let mut ancestors = Vec::new();
        VirtualTree::scan(path, &mut ancestors, &cache, threshold)
    }

    /// `ancestors` 是从扫描起点到 `path` 的规范路径
    fn scan(
        path: &Path,
        ancestors: &mut Vec<PathBuf>,
        cache: &Arc<Mutex<FileCache>>,
        threshold: u64,
    ) -> Result<Self, Exception> {
        ancestors.push(fs::canonicalize(path)?);
        let mut tree = VirtualTree::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_path = entry.path();

            let file_type = match fs::metadata(&entry_path) {
                Ok(meta) => meta.file_type(),
                Err(e) => {
                    warn!("跳过无法读取元数据的条目{}：{}", entry_path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                match fs::canonicalize(&entry_path) {
                    Ok(real) if ancestors.contains(&real) => {
                        warn!("跳过指向上级目录的符号链接{} -> {}", entry_path.display(), real.display());
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("跳过无法解析的目录{}：{}", entry_path.display(), e);
                        continue;
                    }
                }
                let node = VirtualTree::scan(&entry_path, ancestors, cache, threshold)?;
                tree = tree.add_node(&name, node)?;
            } else if file_type.is_file() {
                let resource = FileResource::new(&name, entry_path).with_cache(Arc::clone(cache), threshold);
                tree = tree.add_resource(Arc::new(resource))?;
            }
        }

        ancestors.pop();
        debug!(
            "扫描目录{}：{}个子目录，{}个文件",
            path.display(),
            tree.nodes.len(),
            tree.resources.len()
        );
        Ok(tree)
    }

    /// 构建只读的容器树，返回根容器。
    pub fn build(self) -> Arc<dyn ResourceContainer> {
        self.assemble(None, Weak::new())
    }

    fn assemble(self, name: Option<String>, parent: Weak<Container>) -> Arc<Container> {
        let VirtualTree { nodes, resources } = self;
        Arc::new_cyclic(|me| Container {
            name,
            parent,
            nodes: nodes
                .into_iter()
                .map(|(name, node)| {
                    let child = node.assemble(Some(name.clone()), me.clone());
                    (name, child)
                })
                .collect(),
            resources,
        })
    }
}

/// 构建完成的容器。根容器没有名字。
struct Container {
    name: Option<String>,
    parent: Weak<Container>,
    nodes: BTreeMap<String, Arc<Container>>,
    resources: BTreeMap<String, Arc<dyn Resource>>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResourceContainer for Container {
    fn try_get_node(&self, name: &str) -> Option<Arc<dyn ResourceContainer>> {
        self.nodes
            .get(name)
            .map(|node| Arc::clone(node) as Arc<dyn ResourceContainer>)
    }

    fn nodes(&self) -> Vec<Arc<dyn ResourceContainer>> {
        self.nodes
            .values()
            .map(|node| Arc::clone(node) as Arc<dyn ResourceContainer>)
            .collect()
    }

    fn try_get_resource(&self, name: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(name).cloned()
    }

    fn resources(&self) -> Vec<Arc<dyn Resource>> {
        self.resources.values().cloned().collect()
    }

    fn as_node(&self) -> Option<&dyn ResourceNode> {
        match self.name {
            Some(_) => Some(self),
            None => None,
        }
    }
}

impl ResourceNode for Container {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn parent(&self) -> Option<Arc<dyn ResourceContainer>> {
        self.parent
            .upgrade()
            .map(|parent| parent as Arc<dyn ResourceContainer>)
    }
}

/// 内存中的资源。
#[derive(Debug, Clone)]
pub struct BytesResource {
    name: String,
    content_type: Option<String>,
    content: Bytes,
    modified: SystemTime,
}

impl BytesResource {
    pub fn new(name: &str, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.to_string(),
            content_type: None,
            content: content.into(),
            modified: SystemTime::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

impl Resource for BytesResource {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn length(&self) -> Option<u64> {
        Some(self.content.len() as u64)
    }

    fn modified(&self) -> Option<SystemTime> {
        Some(self.modified)
    }

    fn content(&self) -> Result<Bytes, Exception> {
        Ok(self.content.clone())
    }
}

/// 磁盘上的文件。
pub struct FileResource {
    name: String,
    path: PathBuf,
    content_type: Option<String>,
    cache: Option<Arc<Mutex<FileCache>>>,
    threshold: u64,
}

impl FileResource {
    pub fn new(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            path,
            content_type: None,
            cache: None,
            threshold: 0,
        }
    }

    /// 不超过 `threshold` 字节的文件在读取后放入缓存。
    pub fn with_cache(mut self, cache: Arc<Mutex<FileCache>>, threshold: u64) -> Self {
        self.cache = Some(cache);
        self.threshold = threshold;
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, error: std::io::Error) -> Exception {
        Exception::ResourceUnavailable(self.path.display().to_string(), error)
    }
}

impl fmt::Debug for FileResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileResource")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl Resource for FileResource {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn length(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }

    fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok().and_then(|meta| meta.modified().ok())
    }

    fn content(&self) -> Result<Bytes, Exception> {
        let Some(cache) = &self.cache else {
            return fs::read(&self.path).map(Bytes::from).map_err(|e| self.unavailable(e));
        };

        let metadata = fs::metadata(&self.path).map_err(|e| self.unavailable(e))?;
        let modified = metadata.modified().map_err(|e| self.unavailable(e))?;
        let key = self.path.to_string_lossy();

        {
            let mut cache_lock = match cache.lock() {
                Ok(lock) => lock,
                Err(poisoned) => {
                    warn!("缓存锁被污染，恢复并继续");
                    poisoned.into_inner()
                }
            };
            if let Some(bytes) = cache_lock.find(&key, modified) {
                debug!("缓存命中：{}", key);
                return Ok(bytes);
            }
        }

        debug!("缓存未命中或文件已修改：{}", key);
        let bytes = Bytes::from(fs::read(&self.path).map_err(|e| self.unavailable(e))?);

        if FileCache::should_cache(metadata.len(), self.threshold) {
            let mut cache_lock = match cache.lock() {
                Ok(lock) => lock,
                Err(poisoned) => poisoned.into_inner(),
            };
            cache_lock.push(&key, bytes.clone(), modified);
        } else {
            debug!("文件过大({} bytes)，跳过缓存", metadata.len());
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Arc<dyn ResourceContainer> {
        VirtualTree::new()
            .add_node(
                "docs",
                VirtualTree::new()
                    .add_resource(Arc::new(BytesResource::new("guide.txt", "guide")))
                    .unwrap(),
            )
            .unwrap()
            .add_resource(Arc::new(BytesResource::new("index.html", "<h1>hi</h1>")))
            .unwrap()
            .build()
    }

    #[test]
    fn test_build_links_parents() {
        let root = sample();
        assert!(root.as_node().is_none());

        let docs = root.try_get_node("docs").unwrap();
        let node = docs.as_node().unwrap();
        assert_eq!(node.name(), "docs");

        let parent = node.parent().unwrap();
        assert!(parent.try_get_resource("index.html").is_some());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = VirtualTree::new()
            .add_resource(Arc::new(BytesResource::new("x", "file")))
            .unwrap()
            .add_node("x", VirtualTree::new());

        assert!(matches!(result, Err(Exception::DuplicateResourceName(name)) if name == "x"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        for name in ["", ".", "..", "a/b"] {
            let result = VirtualTree::new().add_node(name, VirtualTree::new());
            assert!(matches!(result, Err(Exception::InvalidResourceName(_))), "{:?}", name);
        }
    }

    #[test]
    fn test_sorted_listing() {
        let root = VirtualTree::new()
            .add_resource(Arc::new(BytesResource::new("b.txt", "")))
            .unwrap()
            .add_resource(Arc::new(BytesResource::new("a.txt", "")))
            .unwrap()
            .build();

        let names: Vec<String> = root
            .resources()
            .iter()
            .filter_map(|r| r.name().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("inner.txt"), "inner").unwrap();
        fs::write(dir.path().join("top.css"), "body {}").unwrap();

        let cache = Arc::new(Mutex::new(FileCache::from_capacity(4)));
        let root = VirtualTree::from_directory(dir.path(), cache, 1024)
            .unwrap()
            .build();

        let sub = root.try_get_node("sub").unwrap();
        let inner = sub.try_get_resource("inner.txt").unwrap();
        assert_eq!(inner.content().unwrap(), Bytes::from("inner"));
        assert_eq!(root.try_get_resource("top.css").unwrap().length(), Some(7));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_directory_skips_symlink_cycles() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("inner.txt"), "inner").unwrap();
        symlink(dir.path(), sub.join("loop")).unwrap();
        symlink(&sub, sub.join("self")).unwrap();

        // 指向扫描范围之外的目录链接照常跟随
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("shared.txt"), "shared").unwrap();
        symlink(outside.path(), dir.path().join("linked")).unwrap();

        let cache = Arc::new(Mutex::new(FileCache::from_capacity(4)));
        let root = VirtualTree::from_directory(dir.path(), cache, 1024)
            .unwrap()
            .build();

        let sub = root.try_get_node("sub").unwrap();
        assert!(sub.try_get_node("loop").is_none());
        assert!(sub.try_get_node("self").is_none());
        assert!(sub.try_get_resource("inner.txt").is_some());

        let linked = root.try_get_node("linked").unwrap();
        assert_eq!(linked.try_get_resource("shared.txt").unwrap().content().unwrap(), Bytes::from("shared"));
    }

    #[test]
    fn test_file_resource_uses_cache() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"cached body").unwrap();

        let cache = Arc::new(Mutex::new(FileCache::from_capacity(4)));
        let resource =
            FileResource::new("body.txt", file.path().to_path_buf()).with_cache(Arc::clone(&cache), 1024);

        assert_eq!(resource.content().unwrap(), Bytes::from("cached body"));
        assert_eq!(resource.content().unwrap(), Bytes::from("cached body"));

        let stats = cache.lock().unwrap().stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_file_resource_over_threshold_not_cached() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let cache = Arc::new(Mutex::new(FileCache::from_capacity(4)));
        let resource =
            FileResource::new("big.bin", file.path().to_path_buf()).with_cache(Arc::clone(&cache), 4);

        assert_eq!(resource.content().unwrap().len(), 10);
        assert!(cache.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let resource = FileResource::new("gone.txt", PathBuf::from("/nonexistent/gone.txt"));
        assert!(matches!(
            resource.content(),
            Err(Exception::ResourceUnavailable(_, _))
        ));
    }
}
