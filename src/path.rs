// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径模型
//!
//! `WebPath` 是一个不可变的路径：有序的路径段加上一个“是否以 `/` 结尾”的标志。
//! 每个路径段同时保存原始文本（可能包含百分号编码，用于输出链接）和解码后的值
//! （用于比较与查找）。
//!
//! 路径一旦构建便不可修改，需要修改时通过 [`WebPath::edit`] 得到一个新的
//! [`PathBuilder`]，写时复制，源路径不受影响。

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// 路径段中需要编码的字符
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// 路径中的一个段。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebPathPart {
    /// 请求或路由字符串中出现的原始文本
    original: String,
    /// 解码后的值，作为比较键
    value: String,
}

impl WebPathPart {
    /// 从原始（可能已编码的）文本构建路径段。
    pub fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
            value: percent_decode_str(original).decode_utf8_lossy().into_owned(),
        }
    }

    /// 从解码后的值构建路径段，原始文本由编码得到。
    pub fn from_value(value: &str) -> Self {
        Self {
            original: utf8_percent_encode(value, SEGMENT).to_string(),
            value: value.to_string(),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for WebPathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// 不可变路径。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebPath {
    parts: Vec<WebPathPart>,
    trailing_slash: bool,
}

impl WebPath {
    /// 根路径 `/`。
    pub fn root() -> Self {
        Self {
            parts: Vec::new(),
            trailing_slash: true,
        }
    }

    /// 解析形如 `/a/b/` 的路径字符串，空段会被忽略。
    pub fn parse(path: &str) -> Self {
        PathBuilder::parse(path).build()
    }

    pub fn parts(&self) -> &[WebPathPart] {
        &self.parts
    }

    pub fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// 最后一个路径段的值。
    pub fn name(&self) -> Option<&str> {
        self.parts.last().map(|p| p.value())
    }

    /// 以当前路径为起点创建构建器，可以指定新的结尾斜杠标志。
    pub fn edit(&self, trailing_slash: bool) -> PathBuilder {
        PathBuilder {
            parts: self.parts.clone(),
            trailing_slash,
        }
    }

    /// 把 `other` 的路径段追加到当前路径之后，并消解其中的 `.` 与 `..`。
    ///
    /// 当前路径被视为目录；结果的结尾斜杠跟随 `other`。
    pub fn combine(&self, other: &WebPath) -> WebPath {
        let mut parts = self.parts.clone();
        for part in &other.parts {
            match part.value() {
                "." => {}
                ".." => {
                    parts.pop();
                }
                _ => parts.push(part.clone()),
            }
        }
        WebPath {
            parts,
            trailing_slash: other.trailing_slash,
        }
    }

    /// 计算从当前路径指向 `target` 的相对引用。
    ///
    /// 先求最长公共前缀，当前路径在前缀之外每多一段就输出一个 `..`，
    /// 再输出 `target` 剩余的段。没有需要回退的段时以 `.` 开头，
    /// 因此结果总是点开头的相对引用，例如 `../catalog/`、`./a`、`.`。
    pub fn relative_to(&self, target: &WebPath) -> String {
        let common = self
            .parts
            .iter()
            .zip(&target.parts)
            .take_while(|(a, b)| a.value == b.value)
            .count();

        let hops = self.parts.len() - common;

        let mut segments: Vec<&str> = Vec::with_capacity(hops + target.parts.len() - common + 1);
        if hops == 0 {
            segments.push(".");
        } else {
            segments.extend(std::iter::repeat("..").take(hops));
        }
        segments.extend(target.parts[common..].iter().map(|p| p.original()));

        let mut result = segments.join("/");
        if target.trailing_slash {
            result.push('/');
        }
        result
    }
}

impl Default for WebPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for WebPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (index, part) in self.parts.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            f.write_str(part.original())?;
        }
        if self.trailing_slash && !self.parts.is_empty() {
            f.write_str("/")?;
        }
        Ok(())
    }
}

/// 可变的路径构建器。
///
/// 结尾斜杠标志在创建时确定，也可以在构建前修改。
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    parts: Vec<WebPathPart>,
    trailing_slash: bool,
}

impl PathBuilder {
    pub fn new(trailing_slash: bool) -> Self {
        Self {
            parts: Vec::new(),
            trailing_slash,
        }
    }

    /// 从路径字符串创建构建器，各段按原始文本解析。
    pub fn parse(path: &str) -> Self {
        Self {
            parts: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(WebPathPart::new)
                .collect(),
            trailing_slash: path.ends_with('/'),
        }
    }

    /// 追加一个按值给出的路径段（例如资源名），原始文本会被编码。
    pub fn append(&mut self, segment: &str) -> &mut Self {
        self.parts.push(WebPathPart::from_value(segment));
        self
    }

    pub fn append_part(&mut self, part: WebPathPart) -> &mut Self {
        self.parts.push(part);
        self
    }

    /// 在最前面插入一个路径段。自叶向根收集路径时使用。
    pub fn prepend(&mut self, segment: &str) -> &mut Self {
        self.parts.insert(0, WebPathPart::from_value(segment));
        self
    }

    pub fn trailing_slash(&mut self, trailing_slash: bool) -> &mut Self {
        self.trailing_slash = trailing_slash;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn build(&self) -> WebPath {
        WebPath {
            parts: self.parts.clone(),
            trailing_slash: self.trailing_slash,
        }
    }
}
