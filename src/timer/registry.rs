//! 定时器注册表的链表实现
//! Linked list implementation for the timer registry
//!
//! 节点存放在一个索引化的槽位池中，前驱和后继以槽位下标表示，空闲槽位
//! 通过侵入式空闲链表复用。尾部插入和给定节点的摘除都是 O(1)。
//!
//! Nodes live in an index-based slot pool; predecessor and successor links are
//! slot indices, and vacant slots are reused through an intrusive free list.
//! Tail insertion and unlinking a given node are both O(1).
//!
//! 本结构不做任何同步，调用方必须持有相应的锁。
//! This structure is not synchronized; callers must hold the appropriate lock.

use std::collections::TryReserveError;

/// 注册表中节点的位置
/// Position of a node in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// 安全遍历时访问者对当前节点的处理决定
/// Visitor decision for the current node during a safe scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// 保留节点并继续
    /// Keep the node and continue
    Keep,
    /// 摘除并释放当前节点，然后继续
    /// Unlink and drop the current node, then continue
    Unlink,
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<usize> },
}

/// 双向链接的注册表
/// Doubly linked registry
#[derive(Debug)]
pub struct LinkedRegistry<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_head: Option<usize>,
    len: usize,
}

impl<T> Default for LinkedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkedRegistry<T> {
    /// 创建空注册表
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 在尾部追加一个值。只有在槽位池需要扩容且扩容失败时才会失败，
    /// 失败时注册表保持不变。
    ///
    /// Append a value at the tail. Fails only when the slot pool has to grow and
    /// the allocation is refused; the registry is left unchanged in that case.
    pub fn try_insert_tail(&mut self, value: T) -> Result<NodeId, TryReserveError> {
        let node = Node {
            value,
            prev: self.tail,
            next: None,
        };

        let index = match self.free_head {
            Some(index) => {
                if let Slot::Vacant { next_free } = self.slots[index] {
                    self.free_head = next_free;
                }
                self.slots[index] = Slot::Occupied(node);
                index
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        Ok(NodeId(index))
    }

    /// 摘除给定节点并交回其值。节点不存在时返回 `None`。
    /// Unlink the given node and hand back its value. Returns `None` if the node is not linked.
    pub fn unlink(&mut self, id: NodeId) -> Option<T> {
        let (prev, next) = match self.slots.get(id.0)? {
            Slot::Occupied(node) => (node.prev, node.next),
            Slot::Vacant { .. } => return None,
        };

        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.tail = prev,
        }

        let slot = std::mem::replace(
            &mut self.slots[id.0],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(id.0);
        self.len -= 1;

        match slot {
            Slot::Occupied(node) => Some(node.value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.0)? {
            Slot::Occupied(node) => Some(&node.value),
            Slot::Vacant { .. } => None,
        }
    }

    /// 按链接顺序返回第一个满足条件的节点
    /// Return the first node, in link order, that satisfies the predicate
    pub fn find_first<P>(&self, mut predicate: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = self.node(index);
            if predicate(&node.value) {
                return Some(NodeId(index));
            }
            cursor = node.next;
        }
        None
    }

    /// 按链接顺序访问每个节点恰好一次。访问前先记下后继，
    /// 因此访问者可以要求摘除当前节点；被摘除的值在继续下一个节点之前就被释放。
    ///
    /// Visit every linked node exactly once, in link order. The successor is
    /// captured before the visitor runs, so the visitor may ask for the current
    /// node to be unlinked; the unlinked value is dropped before the scan moves on.
    pub fn for_each_safe<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut T) -> Visit,
    {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = self.node_mut(index);
            cursor = node.next;
            if visit(&mut node.value) == Visit::Unlink {
                drop(self.unlink(NodeId(index)));
            }
        }
    }

    /// 按链接顺序摘除所有节点
    /// Unlink every node, in link order
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        while let Some(head) = self.head {
            if let Some(value) = self.unlink(NodeId(head)) {
                values.push(value);
            }
        }
        self.slots.clear();
        self.free_head = None;
        values
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            registry: self,
            cursor: self.head,
        }
    }

    fn node(&self, index: usize) -> &Node<T> {
        match &self.slots[index] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked index {index} points at a vacant slot"),
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<T> {
        match &mut self.slots[index] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked index {index} points at a vacant slot"),
        }
    }
}

/// 按链接顺序的只读迭代器
/// Read-only iterator in link order
pub struct Iter<'a, T> {
    registry: &'a LinkedRegistry<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.registry.node(self.cursor?);
        self.cursor = node.next;
        Some(&node.value)
    }
}
