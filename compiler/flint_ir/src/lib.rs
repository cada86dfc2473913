//! Intermediate representation for the Flint compiler.
//!
//! This crate provides:
//!
//! - **Type-system model** ([`types::TypeSystem`]): declared types, fields,
//!   methods and properties in an index-addressed arena, plus an interning
//!   pool for constructed types (pointers, arrays, generic parameters).
//!
//! - **Prototypes** ([`Prototype`], [`PrototypeKind`]): interned operation
//!   shapes. A [`PrototypeInterner`] guarantees that structurally equal
//!   kinds yield the same instance, so prototypes compare by identity.
//!
//! - **Instructions and flow graphs** ([`Instruction`], [`FlowGraph`]): a
//!   prototype applied to [`ValueTag`] arguments, organized into basic blocks
//!   with block parameters and explicit outgoing flow.
//!
//! - **Member mapping** ([`MemberMapping`]): total rewriting of the type,
//!   field and method references embedded in IR, for generic instantiation.
//!
//! - **Fused-instruction expansion** ([`expand_fused`]): in-place lowering of
//!   composite prototypes into primitive sequences before emission.
//!
//! # Crate Dependencies
//!
//! No dependency on the analyses built on top of the IR; those live in
//! `flint_analysis`.

mod constant;
pub mod expand;
pub mod graph;
mod instruction;
pub mod mapping;
mod name;
pub mod prototype;
pub mod types;
mod value_tag;

#[cfg(test)]
mod test_helpers;

pub use constant::Constant;
pub use expand::expand_fused;
pub use graph::{
    BasicBlock, BlockFlow, BlockId, BlockParameter, Branch, BranchArgument, FlowGraph, GraphError,
    TaggedInstruction, UseSite,
};
pub use instruction::Instruction;
pub use mapping::{IdentityMapping, MemberMapping, SubstitutionMapping};
pub use name::{Name, NameError, NameTable};
pub use prototype::{
    ConformanceError, ExpectedArgument, MethodLookup, Prototype, PrototypeInterner, PrototypeKind,
    PrototypeTag,
};
pub use value_tag::ValueTag;
