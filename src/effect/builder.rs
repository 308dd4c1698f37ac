//! Builder API: typed construction and left-to-right composition of effects.

use std::fmt;
use std::marker::PhantomData;

use super::node::{dismantle, downcast, Node, NodeKind, Value};

/// A lazy, typed description of a computation producing an `A`.
///
/// Building an `Effect` never runs anything; thunks, transforms and
/// continuations only execute when a runtime interprets the tree.
/// Interpretation consumes the effect, so a tree is evaluated at most once.
pub struct Effect<A> {
    root: Node,
    _result: PhantomData<fn() -> A>,
}

impl<A: Send + 'static> Effect<A> {
    /// Wrap `thunk` in a `Sync` node
    pub fn sync<F>(thunk: F) -> Self
    where
        F: FnOnce() -> A + Send + 'static,
    {
        Self::from_node(Node::Sync {
            thunk: Box::new(move || Box::new(thunk()) as Value),
        })
    }

    /// Apply a pure function to this effect's result
    pub fn map<B, F>(self, transform: F) -> Effect<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        Effect::from_node(Node::Map {
            source: Box::new(self.into_node()),
            transform: Box::new(move |value| {
                let input = downcast::<A>(value)?;
                Ok(Box::new(transform(input)) as Value)
            }),
        })
    }

    /// Chain an effect built from this effect's result
    pub fn flat_map<B, F>(self, continuation: F) -> Effect<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Effect<B> + Send + 'static,
    {
        Effect::from_node(Node::FlatMap {
            source: Box::new(self.into_node()),
            continuation: Box::new(move |value| {
                let input = downcast::<A>(value)?;
                Ok(continuation(input).into_node())
            }),
        })
    }
}

impl<A> Effect<A> {
    pub(crate) fn from_node(root: Node) -> Self {
        Self {
            root,
            _result: PhantomData,
        }
    }

    /// Hand the tree over to an interpreter
    pub(crate) fn into_node(mut self) -> Node {
        std::mem::replace(&mut self.root, Node::unit())
    }

    /// Variant of the root node
    pub fn kind(&self) -> NodeKind {
        self.root.kind()
    }

    /// Length of the static source chain below (and including) the root
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

impl<A> Drop for Effect<A> {
    fn drop(&mut self) {
        dismantle(std::mem::replace(&mut self.root, Node::unit()));
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Effect").field(&self.root).finish()
    }
}

/// Wrap `thunk` in a `Sync` node. Nothing runs until the effect is interpreted.
pub fn sync<A, F>(thunk: F) -> Effect<A>
where
    A: Send + 'static,
    F: FnOnce() -> A + Send + 'static,
{
    Effect::sync(thunk)
}

/// Curried `Map` composer for use with [`pipe!`](crate::pipe)
pub fn map<A, B, F>(transform: F) -> impl FnOnce(Effect<A>) -> Effect<B>
where
    A: Send + 'static,
    B: Send + 'static,
    F: FnOnce(A) -> B + Send + 'static,
{
    move |source| source.map(transform)
}

/// Curried `FlatMap` composer for use with [`pipe!`](crate::pipe)
pub fn flat_map<A, B, F>(continuation: F) -> impl FnOnce(Effect<A>) -> Effect<B>
where
    A: Send + 'static,
    B: Send + 'static,
    F: FnOnce(A) -> Effect<B> + Send + 'static,
{
    move |source| source.flat_map(continuation)
}

/// Method form of [`pipe!`](crate::pipe): `value.pipe(composer)` is `composer(value)`.
pub trait Pipe: Sized {
    fn pipe<R, F>(self, composer: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        composer(self)
    }
}

impl<T> Pipe for T {}

/// Thread a value through composers from left to right.
///
/// `pipe!(x, f, g, h)` is `h(g(f(x)))`; `pipe!(x)` is `x`.
///
/// ```rust
/// use effectron::{flat_map, map, pipe, sync};
///
/// let program = pipe!(
///     sync(|| 1),
///     flat_map(|n: i32| sync(move || n + 1)),
///     map(|n: i32| n * 10),
/// );
/// assert_eq!(program.depth(), 3);
/// ```
#[macro_export]
macro_rules! pipe {
    ($initial:expr $(, $composer:expr)* $(,)?) => {{
        let value = $initial;
        $(
            let value = ($composer)(value);
        )*
        value
    }};
}
