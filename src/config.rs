// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs;

use crate::exception::Exception;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    www_root: String,
    port: u16,
    worker_threads: usize,
    cache_size: usize,
    local: bool,
    /// 超过该大小（字节）的文件不进入缓存
    #[serde(default = "default_cache_threshold")]
    cache_threshold: u64,
    #[serde(default = "default_directory_listing")]
    directory_listing: bool,
    #[serde(default = "default_index_file")]
    index_file: String,
    /// 错误页面是否写出异常原因
    #[serde(default)]
    error_details: bool,
}

fn default_cache_threshold() -> u64 {
    10485760 // 10MB
}

fn default_directory_listing() -> bool {
    true
}

fn default_index_file() -> String {
    "index.html".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            www_root: ".".to_string(),
            port: 7878,
            worker_threads: num_cpus::get(),
            cache_size: 5,
            local: true,
            cache_threshold: default_cache_threshold(),
            directory_listing: default_directory_listing(),
            index_file: default_index_file(),
            error_details: false,
        }
    }

    /// 从 TOML 文件读取配置。
    ///
    /// 文件无法读取时返回错误；内容无法解析时记录日志并使用默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let str_val = fs::read_to_string(filename)
            .map_err(|e| Exception::Config(format!("无法读取配置文件{}：{}", filename, e)))?;
        Ok(Self::from_toml_str(&str_val))
    }

    pub fn from_toml_str(str_val: &str) -> Self {
        let mut raw_config = match toml::from_str::<Config>(str_val) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.cache_size == 0 {
            warn!("cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为5。");
            raw_config.cache_size = 5;
        }
        raw_config
    }

    /// 端口为 0 时由系统分配
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_www_root(mut self, www_root: &str) -> Self {
        self.www_root = www_root.to_string();
        self
    }
}

impl Config {
    pub fn www_root(&self) -> &str {
        &self.www_root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn cache_threshold(&self) -> u64 {
        self.cache_threshold
    }

    pub fn directory_listing(&self) -> bool {
        self.directory_listing
    }

    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    pub fn error_details(&self) -> bool {
        self.error_details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(
            r#"
            www_root = "./www"
            port = 8080
            worker_threads = 2
            cache_size = 20
            local = false
            cache_threshold = 1024
            directory_listing = false
            index_file = "home.html"
            error_details = true
            "#,
        );

        assert_eq!(config.www_root(), "./www");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.worker_threads(), 2);
        assert_eq!(config.cache_size(), 20);
        assert!(!config.local());
        assert_eq!(config.cache_threshold(), 1024);
        assert!(!config.directory_listing());
        assert_eq!(config.index_file(), "home.html");
        assert!(config.error_details());
    }

    #[test]
    fn test_optional_fields_default() {
        let config = Config::from_toml_str(
            r#"
            www_root = "."
            port = 7878
            worker_threads = 4
            cache_size = 5
            local = true
            "#,
        );

        assert_eq!(config.cache_threshold(), 10485760);
        assert!(config.directory_listing());
        assert_eq!(config.index_file(), "index.html");
        assert!(!config.error_details());
    }

    #[test]
    fn test_zero_values_corrected() {
        let config = Config::from_toml_str(
            r#"
            www_root = "."
            port = 7878
            worker_threads = 0
            cache_size = 0
            local = true
            "#,
        );

        assert_eq!(config.worker_threads(), num_cpus::get());
        assert_eq!(config.cache_size(), 5);
    }

    #[test]
    fn test_invalid_content_falls_back() {
        let config = Config::from_toml_str("port = \"not a number\"");
        assert_eq!(config.port(), 7878);
        assert_eq!(config.www_root(), ".");
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::new().with_port(0).with_www_root("/srv/www");
        assert_eq!(config.port(), 0);
        assert_eq!(config.www_root(), "/srv/www");
        assert_eq!(config.index_file(), "index.html");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = Config::from_toml("/nonexistent/development.toml");
        assert!(matches!(result, Err(Exception::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "www_root = \"static\"\nport = 9000\nworker_threads = 1\ncache_size = 3\nlocal = true"
        )
        .unwrap();

        let config = Config::from_toml(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.www_root(), "static");
        assert_eq!(config.port(), 9000);
    }
}
