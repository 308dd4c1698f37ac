//! Untyped effect nodes.
//!
//! The typed [`Effect`](super::Effect) handle erases its value types into
//! [`Value`] so that a single tree can change result type at every stage
//! (e.g. `f64` through two `flat_map`s, then `String` after a `map`).

use std::any::Any;
use std::fmt;

use crate::runtime::errors::{RunError, RunResult};

/// A type-erased value flowing between nodes
pub type Value = Box<dyn Any + Send>;

/// Deferred computation of a `Sync` leaf
pub type Thunk = Box<dyn FnOnce() -> Value + Send>;

/// Pure function of a `Map` node
pub type Transform = Box<dyn FnOnce(Value) -> RunResult<Value> + Send>;

/// Effect-producing function of a `FlatMap` node
pub type Continuation = Box<dyn FnOnce(Value) -> RunResult<Node> + Send>;

/// One node of an effect tree.
pub enum Node {
    /// Leaf: run `thunk` when interpreted
    Sync { thunk: Thunk },
    /// Apply `transform` to the result of `source`
    Map { source: Box<Node>, transform: Transform },
    /// Feed the result of `source` to `continuation` and evaluate the node it returns
    FlatMap {
        source: Box<Node>,
        continuation: Continuation,
    },
}

/// Variant tag of a [`Node`], for introspection without evaluating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Sync,
    Map,
    FlatMap,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Sync => write!(f, "Sync"),
            NodeKind::Map => write!(f, "Map"),
            NodeKind::FlatMap => write!(f, "FlatMap"),
        }
    }
}

impl Node {
    /// A `Sync` leaf producing `()`. Boxing a zero-sized closure does not allocate.
    pub(crate) fn unit() -> Self {
        Node::Sync {
            thunk: Box::new(|| Box::new(()) as Value),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Sync { .. } => NodeKind::Sync,
            Node::Map { .. } => NodeKind::Map,
            Node::FlatMap { .. } => NodeKind::FlatMap,
        }
    }

    /// Number of nodes on the static source chain, including this one.
    ///
    /// Nodes hidden behind a `FlatMap` continuation do not exist yet and are not counted.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut node = self;
        while let Node::Map { source, .. } | Node::FlatMap { source, .. } = node {
            depth += 1;
            node = &**source;
        }
        depth
    }
}

/// Tear a tree down iteratively.
///
/// The derived drop glue would recurse once per `source` link, which overflows
/// the native stack for long chains built in a loop.
pub(crate) fn dismantle(mut node: Node) {
    loop {
        node = match node {
            Node::Sync { .. } => return,
            Node::Map { source, .. } | Node::FlatMap { source, .. } => *source,
        };
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Chains are printed flat: Map <- FlatMap <- Sync
        let mut node = self;
        write!(f, "{}", node.kind())?;
        while let Node::Map { source, .. } | Node::FlatMap { source, .. } = node {
            node = &**source;
            write!(f, " <- {}", node.kind())?;
        }
        Ok(())
    }
}

/// Recover a concrete value from a [`Value`]
pub(crate) fn downcast<A: 'static>(value: Value) -> RunResult<A> {
    value
        .downcast::<A>()
        .map(|boxed| *boxed)
        .map_err(|_| RunError::TypeMismatch {
            expected: std::any::type_name::<A>(),
        })
}
