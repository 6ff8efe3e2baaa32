// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由游标
//!
//! `RoutingTarget` 记录一个请求的路径中还有哪些段尚未被处理器树消费。
//! 游标只能向前移动，每个请求独占一个，不会在请求之间共享。

use crate::path::{PathBuilder, WebPath, WebPathPart};

#[derive(Debug, Clone)]
pub struct RoutingTarget {
    path: WebPath,
    index: usize,
}

impl RoutingTarget {
    pub fn new(path: WebPath) -> Self {
        Self { path, index: 0 }
    }

    /// 请求的完整路径（不受游标位置影响）。
    pub fn path(&self) -> &WebPath {
        &self.path
    }

    /// 游标所在的路径段；全部消费完后为 `None`。
    pub fn current(&self) -> Option<&WebPathPart> {
        self.path.parts().get(self.index)
    }

    /// 游标是否停在最后一个路径段上。
    pub fn last(&self) -> bool {
        self.index + 1 == self.path.parts().len()
    }

    pub fn ended(&self) -> bool {
        self.index >= self.path.parts().len()
    }

    /// 向前移动一个段，到达末尾后不再移动。
    pub fn advance(&mut self) {
        if !self.ended() {
            self.index += 1;
        }
    }

    pub fn position(&self) -> usize {
        self.index
    }

    /// 尚未消费的部分，结尾斜杠与原路径一致。
    pub fn remaining(&self) -> WebPath {
        let mut builder = PathBuilder::new(self.path.trailing_slash());
        for part in &self.path.parts()[self.index.min(self.path.parts().len())..] {
            builder.append_part(part.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_walk() {
        let mut target = RoutingTarget::new(WebPath::parse("/a/b"));

        assert_eq!(target.current().map(|p| p.value()), Some("a"));
        assert!(!target.last());

        target.advance();
        assert_eq!(target.current().map(|p| p.value()), Some("b"));
        assert!(target.last());

        target.advance();
        assert!(target.current().is_none());
        assert!(target.ended());
        assert!(!target.last());

        // 到达末尾后保持不动
        target.advance();
        assert_eq!(target.position(), 2);
    }

    #[test]
    fn test_root_target() {
        let target = RoutingTarget::new(WebPath::root());
        assert!(target.current().is_none());
        assert!(target.ended());
        assert!(!target.last());
    }

    #[test]
    fn test_remaining() {
        let mut target = RoutingTarget::new(WebPath::parse("/a/b/c/"));
        target.advance();
        assert_eq!(target.remaining().to_string(), "/b/c/");
        assert_eq!(target.path().to_string(), "/a/b/c/");
    }
}
