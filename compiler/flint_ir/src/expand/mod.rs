//! Fused Instruction Expansion.
//!
//! Lowers [`LoadField`](PrototypeKind::LoadField) and
//! [`StoreField`](PrototypeKind::StoreField) into primitive instructions:
//!
//! - **`LoadField(obj)`** becomes `GetFieldPointer(obj)` + `Load(ptr)`.
//! - **`StoreField(obj, value)`** becomes `GetFieldPointer(obj)` +
//!   `Store(ptr, value)`.
//!
//! In a block body the prefix is inserted before the fused instruction and
//! the final primitive step takes over the fused instruction's tag, so every
//! user of that tag stays valid.
//!
//! A fused instruction in a `Try` flow is split across blocks: each prefix
//! step becomes its own `Try` whose success branch passes the step's result
//! to a fresh block, and every step shares the original exception branch.
//! The last block's `Try` runs the final step with the original branches.
//!
//! After [`expand_fused`] the graph is primitive-only. Expansion is one-way.

use crate::graph::{BlockFlow, BlockId, Branch, BranchArgument, FlowGraph};
use crate::types::TypeSystem;
use crate::{Instruction, Prototype, PrototypeInterner, PrototypeKind, ValueTag};

/// Build the primitive sequence for a fused prototype applied to `arguments`.
///
/// Prefix steps are handed to `emit`, which places them and returns the tag
/// their value is reachable under. Returns the final step.
fn lower(
    proto: &Prototype,
    arguments: &[ValueTag],
    interner: &PrototypeInterner,
    types: &TypeSystem,
    emit: &mut dyn FnMut(Instruction) -> ValueTag,
) -> Instruction {
    match proto.kind() {
        PrototypeKind::LoadField { field } => {
            let field_type = types.field(*field).field_type;
            let address = emit(
                interner
                    .intern(PrototypeKind::GetFieldPointer { field: *field }, types)
                    .instantiate([arguments[0]]),
            );
            interner
                .intern(PrototypeKind::Load { result_type: field_type }, types)
                .instantiate([address])
        }
        PrototypeKind::StoreField { field } => {
            let field_type = types.field(*field).field_type;
            let address = emit(
                interner
                    .intern(PrototypeKind::GetFieldPointer { field: *field }, types)
                    .instantiate([arguments[0]]),
            );
            interner
                .intern(PrototypeKind::Store { result_type: field_type }, types)
                .instantiate([address, arguments[1]])
        }
        other => panic!("{other:?} is not a fused prototype"),
    }
}

impl Prototype {
    /// Expand the body instruction tagged `tag`, which must carry exactly
    /// this fused prototype.
    ///
    /// # Panics
    /// Panics if `tag` is not a body instruction, if the instruction carries
    /// a different prototype (e.g. it was already expanded), or if this
    /// prototype is not fused.
    pub fn expand(
        &self,
        graph: &mut FlowGraph,
        tag: ValueTag,
        interner: &PrototypeInterner,
        types: &TypeSystem,
    ) {
        let arguments = match graph.instruction(tag) {
            Some(instruction) => {
                assert!(
                    Prototype::ptr_eq(instruction.prototype(), self),
                    "cannot expand {tag} as {self:?}: it carries {:?}",
                    instruction.prototype(),
                );
                instruction.arguments().to_vec()
            }
            None => panic!("{tag} is not an instruction of this graph"),
        };

        let replacement = {
            let mut emit = |step: Instruction| graph.insert_before(tag, step, None);
            lower(self, &arguments, interner, types, &mut emit)
        };
        graph.replace(tag, replacement);
    }

    /// Expand the instruction of `block`'s `Try` flow, which must carry
    /// exactly this fused prototype.
    ///
    /// # Panics
    /// Panics if the block does not end in a `Try` flow carrying this
    /// prototype, or if this prototype is not fused.
    pub fn expand_try(
        &self,
        graph: &mut FlowGraph,
        block: BlockId,
        interner: &PrototypeInterner,
        types: &TypeSystem,
    ) {
        let (arguments, success, exception) = match &graph.block(block).flow {
            BlockFlow::Try {
                instruction,
                success,
                exception,
            } => {
                assert!(
                    Prototype::ptr_eq(instruction.prototype(), self),
                    "cannot expand the try flow of {block:?} as {self:?}: it carries {:?}",
                    instruction.prototype(),
                );
                (instruction.arguments().to_vec(), success.clone(), exception.clone())
            }
            other => panic!("{block:?} ends in {other:?}, not a try flow"),
        };

        let mut current = block;
        let replacement = {
            let mut emit = |step: Instruction| {
                let next = graph.add_block();
                let result = graph.add_parameter(next, step.prototype().result_type(), false, None);
                graph.set_flow(
                    current,
                    BlockFlow::Try {
                        instruction: step,
                        success: Branch::new(next, [BranchArgument::TryResult]),
                        exception: exception.clone(),
                    },
                );
                current = next;
                result
            };
            lower(self, &arguments, interner, types, &mut emit)
        };
        graph.set_flow(
            current,
            BlockFlow::Try {
                instruction: replacement,
                success,
                exception,
            },
        );
    }
}

/// Expand every fused instruction in `graph`, in block bodies and `Try`
/// flows. Returns the number of fused instructions expanded.
#[tracing::instrument(level = "debug", skip_all)]
pub fn expand_fused(
    graph: &mut FlowGraph,
    interner: &PrototypeInterner,
    types: &TypeSystem,
) -> usize {
    let fused: Vec<(ValueTag, Prototype)> = graph
        .instructions()
        .filter(|ti| ti.instruction.prototype().is_fused())
        .map(|ti| (ti.tag, ti.instruction.prototype().clone()))
        .collect();
    for (tag, proto) in &fused {
        proto.expand(graph, *tag, interner, types);
    }

    // Blocks added while splitting try flows end in primitive steps.
    let fused_tries: Vec<(BlockId, Prototype)> = graph
        .blocks()
        .iter()
        .filter_map(|block| {
            let instruction = block.flow.instruction()?;
            instruction
                .prototype()
                .is_fused()
                .then(|| (block.id, instruction.prototype().clone()))
        })
        .collect();
    for (block, proto) in &fused_tries {
        proto.expand_try(graph, *block, interner, types);
    }

    let expanded = fused.len() + fused_tries.len();
    tracing::debug!(
        expanded,
        blocks = graph.blocks().len(),
        instructions = graph.instruction_count(),
        "fused instruction expansion complete"
    );
    expanded
}
