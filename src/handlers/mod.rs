// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 内置处理器
//!
//! | 处理器 | 作用 |
//! |---|---|
//! | [`CoreRouter`] | 树根：默认的错误处理器与页面渲染器，把“未找到”和异常转换为响应 |
//! | [`Layout`] | 按名称划分的区段，外加可选的首页与兜底处理器 |
//! | [`ResourceTreeHandler`] | 把一棵资源树作为静态内容提供，支持目录列表 |
//! | [`DownloadHandler`] | 提供单个资源 |
//! | [`LoginHandler`] | 默认的登录页 |

mod router;
mod download;
mod files;
mod layout;
mod login;

pub use router::{CoreRouter, CoreRouterBuilder};
pub use download::{DownloadBuilder, DownloadHandler};
pub use files::{ResourceTreeBuilder, ResourceTreeHandler};
pub use layout::{Layout, LayoutBuilder};
pub use login::{LoginBuilder, LoginHandler};

use std::sync::Arc;

use crate::{
    exception::Exception,
    handler::Handler,
    param::{HttpRequestMethod, ALLOWED_METHODS},
    request::Request,
    response::Response,
    walker::HandlerExt,
};

/// 只读处理器共用的方法检查。
///
/// OPTIONS 直接回应 204，GET 与 HEAD 放行，其余方法得到带 `Allow` 头的 405 页面。
/// 返回 `Ok(Some(_))` 时调用方应直接使用该响应。
pub(crate) fn check_read_only(
    handler: &Arc<dyn Handler>,
    request: &Request,
) -> Result<Option<Response>, Exception> {
    match request.method() {
        HttpRequestMethod::Get | HttpRequestMethod::Head => Ok(None),
        HttpRequestMethod::Options => Ok(Some(Response::new().status(204).allow(&ALLOWED_METHODS))),
        _ => Ok(Some(
            handler
                .get_method_not_allowed(request, None, None)?
                .allow(&ALLOWED_METHODS),
        )),
    }
}
