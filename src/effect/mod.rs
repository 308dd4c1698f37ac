//! Effect algebra
//!
//! An effect is an immutable tree of three node kinds:
//!
//! - `Sync`: a deferred zero-argument computation (leaf)
//! - `Map`: a pure transform of the source's result
//! - `FlatMap`: a continuation turning the source's result into a new effect
//!
//! Trees are built with the curried composers [`sync`], [`map`], [`flat_map`]
//! and the [`pipe!`](crate::pipe) macro, or with the equivalent methods on
//! [`Effect`], and are evaluated by [`crate::runtime`].

mod builder;
pub(crate) mod node;

pub use builder::{flat_map, map, sync, Effect, Pipe};
pub use node::NodeKind;
