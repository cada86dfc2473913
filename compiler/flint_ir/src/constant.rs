//! Constant values carried by `Constant` prototypes and switch cases.
//!
//! A closed sum type: every kind of constant the IR can hold has its own
//! variant, so consumers match exhaustively. Floats are stored as bits so
//! constants can be hashed and interned.

use std::fmt;

use crate::types::{FieldId, MethodId, TypeId};
use crate::Name;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Null,
    Bool(bool),
    Int { value: i128, bits: u8, signed: bool },
    Float32(u32),
    Float64(u64),
    Char(char),
    String(Name),
    /// The default value of a type.
    Default(TypeId),
    TypeToken(TypeId),
    FieldToken(FieldId),
    MethodToken(MethodId),
}

impl Constant {
    pub fn int32(value: i32) -> Self {
        Constant::Int {
            value: i128::from(value),
            bits: 32,
            signed: true,
        }
    }

    pub fn int64(value: i64) -> Self {
        Constant::Int {
            value: i128::from(value),
            bits: 64,
            signed: true,
        }
    }

    pub fn float64(value: f64) -> Self {
        Constant::Float64(value.to_bits())
    }

    #[inline]
    pub fn is_null(self) -> bool {
        matches!(self, Constant::Null)
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int {
                value,
                bits,
                signed,
            } => write!(f, "{value}{}{bits}", if *signed { 'i' } else { 'u' }),
            Constant::Float32(bits) => write!(f, "{}f32", f32::from_bits(*bits)),
            Constant::Float64(bits) => write!(f, "{}f64", f64::from_bits(*bits)),
            Constant::Char(c) => write!(f, "{c:?}"),
            Constant::String(name) => write!(f, "str({name:?})"),
            Constant::Default(ty) => write!(f, "default({ty:?})"),
            Constant::TypeToken(ty) => write!(f, "typeof({ty:?})"),
            Constant::FieldToken(field) => write!(f, "fieldof({field:?})"),
            Constant::MethodToken(method) => write!(f, "methodof({method:?})"),
        }
    }
}
