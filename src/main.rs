// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 示例服务器
//!
//! 组装一棵处理器树并挂到配置指定的端口上：
//! - `/static/`：内置的样式表；
//! - `/login`：默认登录页；
//! - `/robots.txt`：单文件下载；
//! - 其余路径：`www_root` 目录下的静态文件与目录列表。
//!
//! 运行期间可以在标准输入中输入 `stop`、`status`、`help` 管理服务器。

use std::{
    path::Path,
    sync::{atomic::Ordering, Arc, Mutex},
};

use log::{error, info, warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Builder,
};

use webtree::{
    handler::Handler,
    handlers::{CoreRouter, DownloadHandler, Layout, LoginHandler, ResourceTreeHandler},
    BytesResource, Config, Exception, FileCache, Host, VirtualTree,
};

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SERVER_CONFIG: &str = "config/development.toml";

const STYLESHEET: &str = include_str!("../static/style.css");
const ROBOTS: &str = "User-agent: *\nDisallow: /login\n";

/// 优先使用 YAML 配置，文件缺失时退回到只输出到控制台的日志。
fn init_logging() {
    if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
        eprintln!("无法读取日志配置{}：{}，改为输出到控制台", LOG_CONFIG, e);

        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} - {m}{n}")))
            .build();
        let config = LogConfig::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info));

        match config {
            Ok(config) => {
                if let Err(e) = log4rs::init_config(config) {
                    eprintln!("日志系统初始化失败：{}", e);
                }
            }
            Err(e) => eprintln!("日志系统初始化失败：{}", e),
        }
    }
}

/// 组装处理器树
fn assemble(config: &Config, cache: Arc<Mutex<FileCache>>) -> Result<Arc<dyn Handler>, Exception> {
    let assets = VirtualTree::new()
        .add_resource(Arc::new(
            BytesResource::new("style.css", STYLESHEET).with_content_type("text/css;charset=utf-8"),
        ))?
        .build();

    let www = match VirtualTree::from_directory(Path::new(config.www_root()), cache, config.cache_threshold()) {
        Ok(tree) => tree,
        Err(e) => {
            warn!("无法扫描www root {}：{}，将以空目录启动", config.www_root(), e);
            VirtualTree::new()
        }
    }
    .build();

    let mut files = ResourceTreeHandler::builder(www).listing(config.directory_listing());
    if !config.index_file().is_empty() {
        files = files.index_file(config.index_file());
    }

    let layout = Layout::builder()
        .section("static", ResourceTreeHandler::builder(assets).listing(false))
        .section("login", LoginHandler::builder())
        .section(
            "robots.txt",
            DownloadHandler::builder(Arc::new(BytesResource::new("robots.txt", ROBOTS))),
        )
        .fallback(files);

    Ok(CoreRouter::builder(layout)
        .error_details(config.error_details())
        .build())
}

/// # 程序入口点
///
/// 初始化日志、加载配置、组装处理器树并启动主事件循环。
fn main() -> Result<(), Exception> {
    init_logging();

    let config = match Config::from_toml(SERVER_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}，使用默认配置", e);
            Config::new()
        }
    };
    info!("配置文件已载入");
    info!("www root: {}", config.www_root());

    // 根据配置文件分配工作线程数
    let runtime = Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()?;

    let cache = Arc::new(Mutex::new(FileCache::from_capacity(config.cache_size())));
    let root = assemble(&config, Arc::clone(&cache))?;
    let host = Host::new(root, &config);

    runtime.block_on(async {
        let listener = host.bind().await?;

        // 后台管理控制台，不阻塞监听循环
        tokio::spawn({
            let shutdown = host.shutdown_handle();
            let active_connection = host.active_connections();
            let cache = Arc::clone(&cache);
            async move {
                let mut reader = BufReader::new(tokio::io::stdin());
                let mut input = String::new();
                loop {
                    input.clear();
                    match reader.read_line(&mut input).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                    let cmd = input.trim();
                    match cmd {
                        "stop" => {
                            shutdown.notify_one();
                            println!("停机指令已激活，服务器将不再接受新的连接...");
                            break;
                        }
                        "help" => {
                            println!("== Webserver Help ==");
                            println!("stop   - 发出停机信号");
                            println!("status - 查看当前服务器运行状态");
                            println!("help   - 显示此帮助信息");
                            println!("====================");
                        }
                        "status" => {
                            let stats = match cache.lock() {
                                Ok(cache) => cache.stats(),
                                Err(poisoned) => poisoned.into_inner().stats(),
                            };
                            println!("== Webserver 状态 ===");
                            println!("当前活跃连接数: {}", active_connection.load(Ordering::Relaxed));
                            println!("缓存条目: {}/{}", stats.entries, stats.capacity);
                            println!("缓存命中: {}，未命中: {}", stats.hits, stats.misses);
                            println!("====================");
                        }
                        "" => {}
                        _ => {
                            println!("无效的命令：{}", cmd);
                        }
                    }
                }
            }
        });

        if let Err(e) = host.serve(listener).await {
            error!("服务器异常退出：{}", e);
            return Err(e);
        }
        Ok(())
    })
}
