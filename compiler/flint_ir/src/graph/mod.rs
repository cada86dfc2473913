//! Method bodies as graphs of basic blocks.
//!
//! - **[`FlowGraph`]**: blocks, entry block, and the tag allocator
//! - **[`BasicBlock`]**: parameters, tagged instructions, outgoing flow
//! - **[`BlockFlow`]**: how control leaves a block (jump, return, switch,
//!   try, unreachable)
//!
//! Every [`ValueTag`] is defined exactly once, either by a block parameter
//! or by an instruction in a block body. Rewrites that replace an
//! instruction keep its tag, so uses elsewhere stay valid.

mod validate;

use rustc_hash::FxHashMap;

pub use validate::{GraphError, UseSite};

use crate::types::TypeId;
use crate::{Constant, Instruction, Name, ValueTag};

/// Basic block ID within a [`FlowGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An incoming value at a block boundary (phi-like).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockParameter {
    pub tag: ValueTag,
    pub ty: TypeId,
    pub is_const: bool,
}

/// An instruction together with the tag of the value it defines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedInstruction {
    pub tag: ValueTag,
    pub instruction: Instruction,
}

/// A value passed along a branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchArgument {
    Value(ValueTag),
    /// Result of the instruction in a `Try` flow (success branch only).
    TryResult,
    /// The exception caught by a `Try` flow (exception branch only).
    TryException,
}

/// A control transfer to `target`, binding its parameters to `arguments`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    pub target: BlockId,
    pub arguments: Vec<BranchArgument>,
}

impl Branch {
    pub fn new(target: BlockId, arguments: impl IntoIterator<Item = BranchArgument>) -> Self {
        Self {
            target,
            arguments: arguments.into_iter().collect(),
        }
    }

    /// A branch passing plain values.
    pub fn with_values(target: BlockId, values: impl IntoIterator<Item = ValueTag>) -> Self {
        Self::new(target, values.into_iter().map(BranchArgument::Value))
    }
}

/// How control leaves a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockFlow {
    Unreachable,
    Jump(Branch),
    Return(ValueTag),
    Switch {
        value: ValueTag,
        cases: Vec<(Constant, Branch)>,
        default: Branch,
    },
    /// Run `instruction`; continue at `success` if it completes, or at
    /// `exception` if it throws.
    Try {
        instruction: Instruction,
        success: Branch,
        exception: Branch,
    },
}

impl BlockFlow {
    /// Values read directly by the flow (branch arguments included).
    pub fn used_values(&self) -> Vec<ValueTag> {
        fn from_branch(branch: &Branch, used: &mut Vec<ValueTag>) {
            used.extend(branch.arguments.iter().filter_map(|arg| match arg {
                BranchArgument::Value(tag) => Some(*tag),
                BranchArgument::TryResult | BranchArgument::TryException => None,
            }));
        }

        let mut used = Vec::new();
        match self {
            BlockFlow::Unreachable => {}
            BlockFlow::Jump(branch) => from_branch(branch, &mut used),
            BlockFlow::Return(tag) => used.push(*tag),
            BlockFlow::Switch {
                value,
                cases,
                default,
            } => {
                used.push(*value);
                for (_, branch) in cases {
                    from_branch(branch, &mut used);
                }
                from_branch(default, &mut used);
            }
            BlockFlow::Try {
                instruction,
                success,
                exception,
            } => {
                used.extend_from_slice(instruction.arguments());
                from_branch(success, &mut used);
                from_branch(exception, &mut used);
            }
        }
        used
    }

    /// Every outgoing branch.
    pub fn branches(&self) -> Vec<&Branch> {
        match self {
            BlockFlow::Unreachable | BlockFlow::Return(_) => Vec::new(),
            BlockFlow::Jump(branch) => vec![branch],
            BlockFlow::Switch { cases, default, .. } => cases
                .iter()
                .map(|(_, branch)| branch)
                .chain(std::iter::once(default))
                .collect(),
            BlockFlow::Try {
                success, exception, ..
            } => vec![success, exception],
        }
    }

    /// The instruction embedded in a `Try` flow.
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            BlockFlow::Try { instruction, .. } => Some(instruction),
            _ => None,
        }
    }
}

/// A basic block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub parameters: Vec<BlockParameter>,
    pub instructions: Vec<TaggedInstruction>,
    pub flow: BlockFlow,
}

/// A method body.
#[derive(Clone, Debug)]
pub struct FlowGraph {
    blocks: Vec<BasicBlock>,
    entry: BlockId,
    next_tag: u32,
    /// Defining block of every parameter and instruction tag.
    defined_in: FxHashMap<ValueTag, BlockId>,
}

impl FlowGraph {
    /// Create a graph with an empty, unreachable entry block.
    pub fn new() -> Self {
        let mut graph = Self {
            blocks: Vec::new(),
            entry: BlockId::new(0),
            next_tag: 0,
            defined_in: FxHashMap::default(),
        };
        graph.entry = graph.add_block();
        graph
    }

    #[inline]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    #[inline]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// # Panics
    /// Panics if `id` is not a block of this graph.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        match self.blocks.get(id.index()) {
            Some(block) => block,
            None => panic!("{id:?} is not a block of this graph"),
        }
    }

    fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        match self.blocks.get_mut(id.index()) {
            Some(block) => block,
            None => panic!("{id:?} is not a block of this graph"),
        }
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [BasicBlock] {
        &mut self.blocks
    }

    /// Append an empty block whose flow is `Unreachable`.
    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId::new(
            u32::try_from(self.blocks.len())
                .unwrap_or_else(|_| panic!("block count exceeds u32::MAX")),
        );
        self.blocks.push(BasicBlock {
            id,
            parameters: Vec::new(),
            instructions: Vec::new(),
            flow: BlockFlow::Unreachable,
        });
        id
    }

    /// Allocate a tag that no other value in this graph uses.
    pub fn fresh_tag(&mut self, name: Option<Name>) -> ValueTag {
        let tag = ValueTag::new(self.next_tag, name);
        self.next_tag = self
            .next_tag
            .checked_add(1)
            .unwrap_or_else(|| panic!("value tag count exceeds u32::MAX"));
        tag
    }

    pub fn add_parameter(
        &mut self,
        block: BlockId,
        ty: TypeId,
        is_const: bool,
        name: Option<Name>,
    ) -> ValueTag {
        let tag = self.fresh_tag(name);
        self.block_mut(block).parameters.push(BlockParameter { tag, ty, is_const });
        self.defined_in.insert(tag, block);
        tag
    }

    /// Append `instruction` to `block`, returning the tag of its value.
    pub fn append(&mut self, block: BlockId, instruction: Instruction, name: Option<Name>) -> ValueTag {
        let tag = self.fresh_tag(name);
        self.block_mut(block)
            .instructions
            .push(TaggedInstruction { tag, instruction });
        self.defined_in.insert(tag, block);
        tag
    }

    /// Insert `instruction` immediately before the instruction tagged `anchor`.
    ///
    /// # Panics
    /// Panics if `anchor` is not an instruction of this graph.
    pub fn insert_before(
        &mut self,
        anchor: ValueTag,
        instruction: Instruction,
        name: Option<Name>,
    ) -> ValueTag {
        let (block, index) = self.expect_position(anchor);
        let tag = self.fresh_tag(name);
        self.block_mut(block)
            .instructions
            .insert(index, TaggedInstruction { tag, instruction });
        self.defined_in.insert(tag, block);
        tag
    }

    /// Replace the instruction tagged `tag`, keeping the tag.
    ///
    /// # Panics
    /// Panics if `tag` is not an instruction of this graph.
    pub fn replace(&mut self, tag: ValueTag, instruction: Instruction) {
        let (block, index) = self.expect_position(tag);
        self.block_mut(block).instructions[index].instruction = instruction;
    }

    pub fn set_flow(&mut self, block: BlockId, flow: BlockFlow) {
        self.block_mut(block).flow = flow;
    }

    /// Replace the instruction embedded in `block`'s `Try` flow.
    ///
    /// # Panics
    /// Panics if the block's flow is not `Try`.
    pub fn replace_try_instruction(&mut self, block: BlockId, replacement: Instruction) {
        match &mut self.block_mut(block).flow {
            BlockFlow::Try { instruction, .. } => *instruction = replacement,
            other => panic!("{block:?} ends in {other:?}, not a try flow"),
        }
    }

    /// Block and body index of the instruction tagged `tag`.
    pub fn position(&self, tag: ValueTag) -> Option<(BlockId, usize)> {
        let block = *self.defined_in.get(&tag)?;
        let index = self
            .block(block)
            .instructions
            .iter()
            .position(|ti| ti.tag == tag)?;
        Some((block, index))
    }

    fn expect_position(&self, tag: ValueTag) -> (BlockId, usize) {
        self.position(tag)
            .unwrap_or_else(|| panic!("{tag} is not an instruction of this graph"))
    }

    /// The instruction that defines `tag`, if it is an instruction.
    pub fn instruction(&self, tag: ValueTag) -> Option<&Instruction> {
        let (block, index) = self.position(tag)?;
        Some(&self.block(block).instructions[index].instruction)
    }

    /// The block parameter that defines `tag`, if it is a parameter.
    pub fn parameter(&self, tag: ValueTag) -> Option<&BlockParameter> {
        let block = *self.defined_in.get(&tag)?;
        self.block(block).parameters.iter().find(|p| p.tag == tag)
    }

    /// Block that defines `tag`.
    #[inline]
    pub fn defining_block(&self, tag: ValueTag) -> Option<BlockId> {
        self.defined_in.get(&tag).copied()
    }

    #[inline]
    pub fn contains(&self, tag: ValueTag) -> bool {
        self.defined_in.contains_key(&tag)
    }

    /// Type of the value named by `tag`.
    pub fn value_type(&self, tag: ValueTag) -> Option<TypeId> {
        if let Some(param) = self.parameter(tag) {
            return Some(param.ty);
        }
        self.instruction(tag)
            .map(|instruction| instruction.prototype().result_type())
    }

    /// Tags of the body instructions that read `tag`.
    pub fn users(&self, tag: ValueTag) -> Vec<ValueTag> {
        self.blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
            .filter(|ti| ti.instruction.uses(tag))
            .map(|ti| ti.tag)
            .collect()
    }

    /// Every body instruction, in block order.
    pub fn instructions(&self) -> impl Iterator<Item = &TaggedInstruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|block| block.instructions.len()).sum()
    }

    /// `true` if no body or try-flow instruction uses a fused prototype.
    pub fn is_primitive_only(&self) -> bool {
        self.blocks.iter().all(|block| {
            block
                .instructions
                .iter()
                .all(|ti| !ti.instruction.prototype().is_fused())
                && block
                    .flow
                    .instruction()
                    .map_or(true, |instruction| !instruction.prototype().is_fused())
        })
    }
}

impl Default for FlowGraph {
    fn default() -> Self {
        Self::new()
    }
}
