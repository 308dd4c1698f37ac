//! Trampoline Engine - Iterative Interpretation
//!
//! This module contains the loop that evaluates an effect tree using an
//! explicit continuation stack instead of recursive calls, and that stops
//! after a bounded number of steps so the host can run other work.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace};

use crate::effect::node::{dismantle, Node, Value};
use crate::runtime::errors::{RunError, RunResult, Stage};

use super::types::{Frame, Progress, TrampolineStats};

/// Suspended-or-running interpretation state of one effect tree.
///
/// Everything needed to continue lives here as plain data, so a suspended
/// trampoline can be moved into a host task and resumed later.
pub(crate) struct Trampoline {
    /// Node to descend into next; `None` once the result has been produced
    current: Option<Node>,
    /// Frames waiting for the result of the subtree being evaluated
    stack: Vec<Frame>,
    stats: TrampolineStats,
    catch_panics: bool,
}

impl Trampoline {
    pub(crate) fn new(root: Node, catch_panics: bool) -> Self {
        Self {
            current: Some(root),
            stack: Vec::new(),
            stats: TrampolineStats::default(),
            catch_panics,
        }
    }

    pub(crate) fn stats(&self) -> TrampolineStats {
        self.stats
    }

    /// Run until the tree completes or `budget` nodes have been processed in this slice.
    pub(crate) fn run_slice(&mut self, budget: usize) -> RunResult<Progress> {
        let mut ops = 0usize;

        loop {
            let Some(node) = self.current.take() else {
                return Err(RunError::AlreadyCompleted);
            };

            ops += 1;
            if ops > budget {
                self.current = Some(node);
                self.stats.suspensions += 1;
                debug!(
                    target: "effectron::runtime::trampoline",
                    steps = self.stats.steps,
                    suspensions = self.stats.suspensions,
                    stack = self.stack.len(),
                    "step budget exhausted, suspending"
                );
                return Ok(Progress::Suspended);
            }

            self.stats.steps += 1;
            trace!(
                target: "effectron::runtime::trampoline",
                kind = %node.kind(),
                stack = self.stack.len(),
                "step"
            );

            match node {
                Node::Sync { thunk } => {
                    let value = self.invoke(Stage::Thunk, thunk)?;
                    if let Some(result) = self.unwind(value)? {
                        return Ok(Progress::Complete(result));
                    }
                }
                Node::Map { source, transform } => {
                    self.push(Frame::Map(transform));
                    self.current = Some(*source);
                }
                Node::FlatMap {
                    source,
                    continuation,
                } => {
                    self.push(Frame::FlatMap(continuation));
                    self.current = Some(*source);
                }
            }
        }
    }

    /// Feed `value` to pending frames.
    ///
    /// Returns the final result once the stack is empty, or `None` after a
    /// `FlatMap` frame has installed a new subtree in `current`.
    fn unwind(&mut self, mut value: Value) -> RunResult<Option<Value>> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Map(transform) => {
                    value = self.invoke(Stage::Transform, || transform(value))??;
                }
                Frame::FlatMap(continuation) => {
                    let next = self.invoke(Stage::Continuation, || continuation(value))??;
                    self.current = Some(next);
                    return Ok(None);
                }
            }
        }
        Ok(Some(value))
    }

    fn push(&mut self, frame: Frame) {
        self.stack.push(frame);
        self.stats.max_stack = self.stats.max_stack.max(self.stack.len());
    }

    fn invoke<T>(&self, stage: Stage, f: impl FnOnce() -> T) -> RunResult<T> {
        if !self.catch_panics {
            return Ok(f());
        }
        panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| RunError::from_panic(stage, payload))
    }
}

impl Drop for Trampoline {
    fn drop(&mut self) {
        if let Some(node) = self.current.take() {
            dismantle(node);
        }
    }
}
