// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use chrono::{DateTime, Local};

use crate::{content::ContentElement, param::STATUS_CODES, path::WebPath};

/// 默认页面样式，没有外部样式表时使用
const DEFAULT_CSS: &str = r"
            body {
                width: 35em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }

            table {
                border-collapse: collapse;
                width: 100%;
            }

            td {
                padding: 8px;
                white-space: pre-wrap; /* 保留换行符和空格 */
                border: none; /* 隐藏单元格边框 */
            }";

pub struct HtmlBuilder {
    title: String,
    css: String,
    stylesheet: Option<String>,
    body: String,
}

impl HtmlBuilder {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: escape_html(title),
            css: DEFAULT_CSS.to_string(),
            stylesheet: None,
            body: body.to_string(),
        }
    }

    /// 引用外部样式表，`href` 应当已经是重写后的链接
    pub fn stylesheet(mut self, href: &str) -> Self {
        self.stylesheet = Some(href.to_string());
        self
    }

    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let description = match note {
            Some(n) => n,
            None => STATUS_CODES.get(&code).copied().unwrap_or("Unknown Status"),
        };
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code,
            escape_html(description)
        );
        Self::new(&code.to_string(), &body)
    }

    pub fn build(&self) -> String {
        let link = match &self.stylesheet {
            Some(href) => format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)),
            None => String::new(),
        };
        format!(
            r##"<!DOCTYPE html>
            <!-- 本文件由shaneyale的Rust Webtree自动生成 -->
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                    {}
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.css, link, self.body
        )
    }
}

/// 目录列表表格。链接相对于 `base`（通常是请求路径）计算。
pub fn listing_table(base: &WebPath, elements: &[ContentElement]) -> String {
    let mut body = String::from("<table>");
    body.push_str(
        r#"
            <tr>
                <td>文件名</td>
                <td>大小</td>
                <td>修改时间</td>
            </tr>"#,
    );
    if !base.is_root() {
        body.push_str(
            r#"
            <tr>
                <td><a href="../">..</a></td>
                <td></td>
                <td></td>
            </tr>"#,
        );
    }

    for element in elements {
        let href = base.relative_to(element.path());
        let size = match (element.is_directory(), element.info().size) {
            (true, _) => "文件夹".to_string(),
            (false, Some(size)) => format_file_size(size),
            (false, None) => String::new(),
        };
        let modified = element
            .info()
            .modified
            .map(|time| {
                let local_time: DateTime<Local> = time.into();
                local_time.format("%Y-%m-%d %H:%M:%S %Z").to_string()
            })
            .unwrap_or_default();

        body.push_str(&format!(
            r#"
            <tr>
                <td><a href="{}">{}</a></td>
                <td>{}</td>
                <td>{}</td>
            </tr>"#,
            escape_html(&href),
            escape_html(&element.display_name()),
            size,
            modified
        ));
    }
    body.push_str("</table>");
    body
}

pub fn format_file_size(size: u64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < units.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.1} {}", size, units[unit_index])
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
