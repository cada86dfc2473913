//! Structural verification of flow graphs.

use rustc_hash::FxHashSet;

use super::{BlockFlow, BlockId, Branch, BranchArgument, FlowGraph};
use crate::ValueTag;

/// Where a value is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseSite {
    /// By the body instruction with this tag.
    Instruction(ValueTag),
    /// By the flow of this block.
    Flow(BlockId),
}

/// A structural defect found by [`FlowGraph::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("{tag} is defined more than once")]
    DuplicateDefinition { tag: ValueTag },
    #[error("{tag} is used by {site:?} but never defined")]
    UndefinedValue { tag: ValueTag, site: UseSite },
    #[error("{tag} has {actual} argument(s), its prototype takes {expected}")]
    ArityMismatch {
        tag: ValueTag,
        expected: usize,
        actual: usize,
    },
    #[error("{from:?} branches to missing block {target:?}")]
    MissingBlock { from: BlockId, target: BlockId },
    #[error("{from:?} passes {actual} argument(s) to {target:?}, which takes {expected}")]
    BranchArgumentCount {
        from: BlockId,
        target: BlockId,
        expected: usize,
        actual: usize,
    },
    /// `TryResult`/`TryException` used outside the matching `Try` branch.
    #[error("{from:?} passes a try result to {target:?} outside a try branch")]
    MisplacedTryArgument { from: BlockId, target: BlockId },
}

impl FlowGraph {
    /// Check the graph's structural invariants, returning every violation.
    ///
    /// An empty result means: each tag is defined once, every use refers to
    /// a defined tag, instruction arities match their prototypes, and every
    /// branch targets an existing block with the right number of arguments.
    pub fn validate(&self) -> Vec<GraphError> {
        let mut errors = Vec::new();
        let mut defined = FxHashSet::default();

        for block in &self.blocks {
            for param in &block.parameters {
                if !defined.insert(param.tag) {
                    errors.push(GraphError::DuplicateDefinition { tag: param.tag });
                }
            }
            for ti in &block.instructions {
                if !defined.insert(ti.tag) {
                    errors.push(GraphError::DuplicateDefinition { tag: ti.tag });
                }
            }
        }

        for block in &self.blocks {
            for ti in &block.instructions {
                let args = ti.instruction.arguments();
                let arity = ti.instruction.prototype().arity();
                if args.len() != arity {
                    errors.push(GraphError::ArityMismatch {
                        tag: ti.tag,
                        expected: arity,
                        actual: args.len(),
                    });
                }
                for &arg in args {
                    if !defined.contains(&arg) {
                        errors.push(GraphError::UndefinedValue {
                            tag: arg,
                            site: UseSite::Instruction(ti.tag),
                        });
                    }
                }
            }

            for tag in block.flow.used_values() {
                if !defined.contains(&tag) {
                    errors.push(GraphError::UndefinedValue {
                        tag,
                        site: UseSite::Flow(block.id),
                    });
                }
            }

            match &block.flow {
                BlockFlow::Try {
                    success, exception, ..
                } => {
                    self.check_branch(block.id, success, Some(BranchArgument::TryResult), &mut errors);
                    self.check_branch(
                        block.id,
                        exception,
                        Some(BranchArgument::TryException),
                        &mut errors,
                    );
                }
                flow => {
                    for branch in flow.branches() {
                        self.check_branch(block.id, branch, None, &mut errors);
                    }
                }
            }
        }

        errors
    }

    fn check_branch(
        &self,
        from: BlockId,
        branch: &Branch,
        allowed_special: Option<BranchArgument>,
        errors: &mut Vec<GraphError>,
    ) {
        let target = branch.target;
        let Some(target_block) = self.blocks.get(target.index()) else {
            errors.push(GraphError::MissingBlock { from, target });
            return;
        };
        if target_block.parameters.len() != branch.arguments.len() {
            errors.push(GraphError::BranchArgumentCount {
                from,
                target,
                expected: target_block.parameters.len(),
                actual: branch.arguments.len(),
            });
        }
        let misplaced = branch.arguments.iter().any(|arg| match arg {
            BranchArgument::Value(_) => false,
            special => Some(*special) != allowed_special,
        });
        if misplaced {
            errors.push(GraphError::MisplacedTryArgument { from, target });
        }
    }
}
