// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::{
    exception::Exception,
    handler::{Handler, HandlerBuilder, TemplateModel},
    request::Request,
    response::Response,
    util::escape_html,
    walker::HandlerExt,
};

/// 默认的登录页：一个提交到当前路径的表单，状态码为 401。
///
/// 只负责展示，不校验凭据。
pub struct LoginHandler {
    parent: Weak<dyn Handler>,
}

#[derive(Debug, Default)]
pub struct LoginBuilder;

impl LoginHandler {
    pub fn builder() -> LoginBuilder {
        LoginBuilder
    }
}

impl HandlerBuilder for LoginBuilder {
    fn build(self: Box<Self>, parent: Weak<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(LoginHandler { parent })
    }
}

impl fmt::Debug for LoginHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoginHandler")
    }
}

impl Handler for LoginHandler {
    fn parent(&self) -> Option<Arc<dyn Handler>> {
        self.parent.upgrade()
    }

    fn handle(self: Arc<Self>, request: &mut Request) -> Result<Option<Response>, Exception> {
        if !request.target().ended() {
            return Ok(None);
        }

        let this: Arc<dyn Handler> = self.clone();
        let action = this
            .route(request, ".", true)?
            .unwrap_or_else(|| ".".to_string());

        let form = format!(
            r#"<form method="post" action="{}">
                Username: <input type="text" name="Username" id="Username" /><br />
                Password: <input type="password" name="Password" id="Password" /><br /><br />
                <button type="submit" name="Action" value="Login">Login</button>
            </form>"#,
            escape_html(&action)
        );

        let page = this.get_page(request, TemplateModel::new(Arc::clone(&this), "Login required", form))?;
        Ok(Some(page.status(401)))
    }
}
