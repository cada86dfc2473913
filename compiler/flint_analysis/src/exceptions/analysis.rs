//! Per-instruction exception analysis over a flow graph.

use flint_ir::graph::BlockFlow;
use flint_ir::types::TypeSystem;
use flint_ir::{BlockId, FlowGraph, Instruction, PrototypeKind, ValueTag};
use rustc_hash::FxHashMap;

use super::{ExceptionRules, ExceptionSpecification, Nullability};

/// Exception specifications for every instruction of one body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BodyExceptions {
    /// Body instructions, by tag.
    pub instructions: FxHashMap<ValueTag, ExceptionSpecification>,
    /// Instructions embedded in `Try` flows, by block.
    pub try_flows: FxHashMap<BlockId, ExceptionSpecification>,
}

impl BodyExceptions {
    /// Tags of body instructions that may throw.
    pub fn throwing(&self) -> impl Iterator<Item = ValueTag> + '_ {
        self.instructions
            .iter()
            .filter(|(_, spec)| spec.can_throw())
            .map(|(tag, _)| *tag)
    }
}

/// Read-only exception queries against a rule registry.
#[derive(Clone, Copy, Debug)]
pub struct ExceptionAnalysis<'a> {
    rules: &'a ExceptionRules,
    types: &'a TypeSystem,
}

impl<'a> ExceptionAnalysis<'a> {
    pub fn new(rules: &'a ExceptionRules, types: &'a TypeSystem) -> Self {
        Self { rules, types }
    }

    /// The specification of `instruction`'s prototype.
    pub fn spec_of(&self, instruction: &Instruction) -> ExceptionSpecification {
        self.rules.spec_of(instruction.prototype(), self.types)
    }

    /// The specification of the body instruction tagged `tag`, with null
    /// checks resolved where `graph` shows the argument's nullability.
    pub fn refined_spec_of(&self, graph: &FlowGraph, tag: ValueTag) -> Option<ExceptionSpecification> {
        graph
            .instruction(tag)
            .map(|instruction| self.refined(graph, instruction))
    }

    fn refined(&self, graph: &FlowGraph, instruction: &Instruction) -> ExceptionSpecification {
        let arguments = instruction.arguments();
        self.spec_of(instruction).refine(|index| {
            arguments
                .get(index)
                .map_or(Nullability::Unknown, |&arg| nullability(graph, arg))
        })
    }

    /// Refined specifications for every instruction in `graph`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn analyze(&self, graph: &FlowGraph) -> BodyExceptions {
        let mut result = BodyExceptions::default();
        for block in graph.blocks() {
            for ti in &block.instructions {
                result
                    .instructions
                    .insert(ti.tag, self.refined(graph, &ti.instruction));
            }
            if let BlockFlow::Try { instruction, .. } = &block.flow {
                result
                    .try_flows
                    .insert(block.id, self.refined(graph, instruction));
            }
        }
        tracing::debug!(
            instructions = result.instructions.len(),
            try_flows = result.try_flows.len(),
            "exception analysis complete"
        );
        result
    }
}

/// What `graph` proves about whether `tag` is null.
pub fn nullability(graph: &FlowGraph, tag: ValueTag) -> Nullability {
    let Some(instruction) = graph.instruction(tag) else {
        return Nullability::Unknown;
    };
    match instruction.prototype().kind() {
        PrototypeKind::NewObject { .. }
        | PrototypeKind::Alloca { .. }
        | PrototypeKind::AllocaArray { .. }
        | PrototypeKind::Box { .. }
        | PrototypeKind::GetStaticFieldPointer { .. }
        | PrototypeKind::NewDelegate { .. } => Nullability::NonNull,
        PrototypeKind::Constant { value, .. } if value.is_null() => Nullability::Null,
        _ => Nullability::Unknown,
    }
}
