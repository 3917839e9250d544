//! 定长先进先出缓冲 (Bounded FIFO ring)
//!
//! 同时用于: 每个跟踪对象的类别投票历史 + 屏幕显示日志

use std::collections::VecDeque;

/// 定长环形队列,超出容量时丢弃最旧元素
#[derive(Clone, Debug, PartialEq)]
pub struct Ring<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Ring<T> {
    /// 创建指定容量的队列 (容量为0时按1处理)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加元素,返回被挤出的最旧元素
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按插入顺序遍历 (最旧 → 最新)
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: PartialEq> Ring<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}
