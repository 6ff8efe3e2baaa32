// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # webtree
//!
//! 以处理器树组织的可嵌入 Web 服务器。
//!
//! - [`handler`] 与 [`walker`]：处理器节点、能力以及沿树向上的通用算法；
//! - [`resource`] 与 [`tree`]：与处理器树相互独立的资源树；
//! - [`handlers`]：开箱即用的处理器（根路由、区段布局、静态资源、单文件下载、登录页）；
//! - [`server`]：把处理器树挂到 TCP 端口上。

pub mod cache;
pub mod config;
pub mod content;
pub mod exception;
pub mod handler;
pub mod handlers;
pub mod param;
pub mod path;
pub mod request;
pub mod resource;
pub mod response;
pub mod routing;
pub mod server;
pub mod tree;
pub mod util;
pub mod walker;

pub use cache::FileCache;
pub use config::Config;
pub use content::{ContentElement, ContentInfo};
pub use exception::Exception;
pub use handler::{ErrorHandler, ErrorModel, Handler, HandlerBuilder, HandlerResolver, PageRenderer, RootPathAppender, TemplateModel};
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use path::{PathBuilder, WebPath, WebPathPart};
pub use request::Request;
pub use resource::{Resource, ResourceContainer, ResourceNode, ResourceTreeExt};
pub use response::Response;
pub use routing::RoutingTarget;
pub use server::Host;
pub use tree::{BytesResource, FileResource, VirtualTree};
pub use util::HtmlBuilder;
pub use walker::HandlerExt;
