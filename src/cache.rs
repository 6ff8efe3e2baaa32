// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 资源内容缓存
//!
//! 以文件路径为键、以修改时间为版本的 LRU 缓存。
//! 文件被修改后旧条目自动失效，下一次读取会重新填充。

use std::num::NonZeroUsize;
use std::time::SystemTime;

use bytes::Bytes;
use log::warn;
use lru::LruCache;

/// 容量为 0 时使用的默认容量
const FALLBACK_CAPACITY: usize = 5;

#[derive(Clone)]
struct CacheEntry {
    content: Bytes,
    modified_time: SystemTime,
}

pub struct FileCache {
    cache: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// 缓存的运行统计，供控制台 `status` 命令输出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl FileCache {
    // 根据容量构造
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = match NonZeroUsize::new(capacity) {
            Some(c) => c,
            None => {
                warn!("缓存容量被指定为0，改为{}", FALLBACK_CAPACITY);
                NonZeroUsize::new(FALLBACK_CAPACITY).unwrap_or(NonZeroUsize::MIN)
            }
        };
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    // 放入
    pub fn push(&mut self, key: &str, bytes: Bytes, modified_time: SystemTime) {
        let entry = CacheEntry {
            content: bytes,
            modified_time,
        };
        self.cache.put(key.to_string(), entry);
    }

    // 检查文件大小是否适合缓存
    pub fn should_cache(file_size: u64, threshold: u64) -> bool {
        file_size <= threshold
    }

    // 查询有效缓存，过期条目直接移除
    pub fn find(&mut self, key: &str, current_modified_time: SystemTime) -> Option<Bytes> {
        let fresh = match self.cache.get(key) {
            Some(entry) if entry.modified_time == current_modified_time => Some(entry.content.clone()),
            Some(_) => {
                self.cache.pop(key);
                None
            }
            None => None,
        };
        match fresh {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        fresh
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_cache_creation() {
        let cache = FileCache::from_capacity(10);
        assert_eq!(cache.capacity(), 10);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_zero_capacity_falls_back() {
        let cache = FileCache::from_capacity(0);
        assert_eq!(cache.capacity(), FALLBACK_CAPACITY);
    }

    #[test]
    fn test_cache_push_and_find() {
        let mut cache = FileCache::from_capacity(3);
        let time = SystemTime::now();
        let content = Bytes::from("test content");

        cache.push("/srv/file1.txt", content.clone(), time);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.find("/srv/file1.txt", time), Some(content));
    }

    #[test]
    fn test_cache_modified_time_invalidation() {
        let mut cache = FileCache::from_capacity(3);
        let time1 = SystemTime::now();
        let time2 = time1 + Duration::from_secs(10);

        cache.push("/srv/file1.txt", Bytes::from("test content"), time1);

        assert!(cache.find("/srv/file1.txt", time2).is_none());
        // 过期条目已被移除
        assert!(cache.find("/srv/file1.txt", time1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = FileCache::from_capacity(2);
        let time = SystemTime::now();

        cache.push("a", Bytes::from("content1"), time);
        cache.push("b", Bytes::from("content2"), time);

        cache.find("a", time);

        cache.push("c", Bytes::from("content3"), time);
        assert_eq!(cache.len(), 2);

        assert!(cache.find("b", time).is_none());
        assert!(cache.find("a", time).is_some());
        assert!(cache.find("c", time).is_some());
    }

    #[test]
    fn test_cache_stats() {
        let mut cache = FileCache::from_capacity(4);
        let time = SystemTime::now();

        cache.push("a", Bytes::from("x"), time);
        cache.find("a", time);
        cache.find("a", time);
        cache.find("missing", time);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_should_cache() {
        assert!(FileCache::should_cache(10, 10));
        assert!(!FileCache::should_cache(11, 10));
    }
}
