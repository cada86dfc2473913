//! The exception-specification algebra.

use std::fmt;

use flint_ir::types::{TypeDeclId, TypeSystem};

/// What is known about whether an argument is null at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Nullability {
    #[default]
    Unknown,
    NonNull,
    Null,
}

/// The set of exceptions an instruction may throw.
///
/// Values built through [`union`](Self::union) are canonical: unions are
/// flat, hold at least two distinct members, never contain `NoThrow`, and
/// collapse to `ThrowAny` when any member is `ThrowAny`. A `Union` built
/// directly may not be canonical; equality compares canonical forms and
/// ignores member order.
#[derive(Clone, Debug)]
pub enum ExceptionSpecification {
    /// Never throws.
    NoThrow,
    /// May throw anything; the conservative top element.
    ThrowAny,
    /// Throws exactly this exception type (not a subtype), unconditionally.
    Exact(TypeDeclId),
    /// Throws `exception` iff the argument at `argument` is null.
    NullCheck {
        argument: usize,
        exception: TypeDeclId,
    },
    /// May throw what any one member may throw.
    Union(Box<[ExceptionSpecification]>),
}

impl ExceptionSpecification {
    /// Canonical union of `specs`.
    pub fn union(specs: impl IntoIterator<Item = ExceptionSpecification>) -> Self {
        let mut members: Vec<ExceptionSpecification> = Vec::new();
        let mut stack: Vec<ExceptionSpecification> = specs.into_iter().collect();
        stack.reverse();

        while let Some(spec) = stack.pop() {
            match spec {
                ExceptionSpecification::NoThrow => {}
                ExceptionSpecification::ThrowAny => return ExceptionSpecification::ThrowAny,
                ExceptionSpecification::Union(nested) => {
                    stack.extend(nested.into_vec().into_iter().rev());
                }
                leaf => {
                    if !members.contains(&leaf) {
                        members.push(leaf);
                    }
                }
            }
        }

        match members.len() {
            0 => ExceptionSpecification::NoThrow,
            1 => members.swap_remove(0),
            _ => ExceptionSpecification::Union(members.into_boxed_slice()),
        }
    }

    /// Union of `self` and `other`.
    #[must_use]
    pub fn or(self, other: ExceptionSpecification) -> Self {
        Self::union([self, other])
    }

    /// Members of a union, or the spec itself.
    pub fn members(&self) -> &[ExceptionSpecification] {
        match self {
            ExceptionSpecification::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// `false` only for [`NoThrow`](Self::NoThrow).
    pub fn can_throw(&self) -> bool {
        match self {
            ExceptionSpecification::NoThrow => false,
            ExceptionSpecification::Union(members) => members.iter().any(Self::can_throw),
            _ => true,
        }
    }

    /// Whether a handler for `exception` could observe a throw: some
    /// thrown type is `exception` or one of its subtypes.
    pub fn may_throw(&self, exception: TypeDeclId, types: &TypeSystem) -> bool {
        match self {
            ExceptionSpecification::NoThrow => false,
            ExceptionSpecification::ThrowAny => true,
            ExceptionSpecification::Exact(thrown)
            | ExceptionSpecification::NullCheck {
                exception: thrown,
                ..
            } => types.is_subtype(*thrown, exception),
            ExceptionSpecification::Union(members) => {
                members.iter().any(|m| m.may_throw(exception, types))
            }
        }
    }

    /// Resolve null checks whose argument's nullability is known.
    ///
    /// A check on a non-null argument cannot fire and disappears; a check on
    /// a null argument becomes an unconditional throw.
    #[must_use]
    pub fn refine(&self, nullability: impl Fn(usize) -> Nullability) -> Self {
        self.refine_with(&nullability)
    }

    fn refine_with(&self, nullability: &dyn Fn(usize) -> Nullability) -> Self {
        match self {
            ExceptionSpecification::NullCheck {
                argument,
                exception,
            } => match nullability(*argument) {
                Nullability::Unknown => self.clone(),
                Nullability::NonNull => ExceptionSpecification::NoThrow,
                Nullability::Null => ExceptionSpecification::Exact(*exception),
            },
            ExceptionSpecification::Union(members) => {
                Self::union(members.iter().map(|m| m.refine_with(nullability)))
            }
            ExceptionSpecification::NoThrow
            | ExceptionSpecification::ThrowAny
            | ExceptionSpecification::Exact(_) => self.clone(),
        }
    }

    /// Display with qualified type names instead of declaration ids.
    pub fn display<'a>(&'a self, types: &'a TypeSystem) -> impl fmt::Display + 'a {
        Named { spec: self, types }
    }

    fn write(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &dyn Fn(&mut fmt::Formatter<'_>, TypeDeclId) -> fmt::Result,
    ) -> fmt::Result {
        match self {
            ExceptionSpecification::NoThrow => f.write_str("nothrow"),
            ExceptionSpecification::ThrowAny => f.write_str("throws(*)"),
            ExceptionSpecification::Exact(ty) => {
                f.write_str("throws(")?;
                name(f, *ty)?;
                f.write_str(")")
            }
            ExceptionSpecification::NullCheck {
                argument,
                exception,
            } => {
                write!(f, "if null(#{argument}) throws(")?;
                name(f, *exception)?;
                f.write_str(")")
            }
            ExceptionSpecification::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    member.write(f, name)?;
                }
                Ok(())
            }
        }
    }
}

impl ExceptionSpecification {
    /// Equality of two values already in canonical form.
    fn canonical_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExceptionSpecification::NoThrow, ExceptionSpecification::NoThrow)
            | (ExceptionSpecification::ThrowAny, ExceptionSpecification::ThrowAny) => true,
            (ExceptionSpecification::Exact(a), ExceptionSpecification::Exact(b)) => a == b,
            (
                ExceptionSpecification::NullCheck {
                    argument: a_arg,
                    exception: a_exc,
                },
                ExceptionSpecification::NullCheck {
                    argument: b_arg,
                    exception: b_exc,
                },
            ) => a_arg == b_arg && a_exc == b_exc,
            (ExceptionSpecification::Union(a), ExceptionSpecification::Union(b)) => {
                a.len() == b.len()
                    && a.iter().all(|m| b.iter().any(|n| m.canonical_eq(n)))
                    && b.iter().all(|m| a.iter().any(|n| m.canonical_eq(n)))
            }
            _ => false,
        }
    }
}

impl PartialEq for ExceptionSpecification {
    /// Compares canonical forms, so a hand-built `Union` equals what
    /// [`union`](Self::union) would make of it.
    fn eq(&self, other: &Self) -> bool {
        let is_union = |spec: &Self| matches!(spec, ExceptionSpecification::Union(_));
        if is_union(self) || is_union(other) {
            let canonical = |spec: &Self| ExceptionSpecification::union([spec.clone()]);
            return canonical(self).canonical_eq(&canonical(other));
        }
        self.canonical_eq(other)
    }
}

impl Eq for ExceptionSpecification {}

impl fmt::Display for ExceptionSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, &|f: &mut fmt::Formatter<'_>, ty: TypeDeclId| {
            write!(f, "{ty:?}")
        })
    }
}

struct Named<'a> {
    spec: &'a ExceptionSpecification,
    types: &'a TypeSystem,
}

impl fmt::Display for Named<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.spec.write(f, &|f: &mut fmt::Formatter<'_>, ty: TypeDeclId| {
            f.write_str(self.types.decl_name(ty))
        })
    }
}

#[cfg(test)]
mod tests;
