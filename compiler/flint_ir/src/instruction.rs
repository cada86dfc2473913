//! Instructions: a prototype applied to argument values.

use smallvec::SmallVec;

use crate::{Prototype, ValueTag};

/// A prototype plus its ordered arguments.
///
/// Instructions are plain values. Rewrites replace them rather than mutate
/// them; the identity of the value an instruction produces lives in the
/// [`ValueTag`] the graph associates with it, not in the instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    prototype: Prototype,
    arguments: SmallVec<[ValueTag; 3]>,
}

impl Instruction {
    /// # Panics
    /// Panics if the number of arguments differs from the prototype's arity.
    pub fn new(prototype: Prototype, arguments: impl IntoIterator<Item = ValueTag>) -> Self {
        let arguments: SmallVec<[ValueTag; 3]> = arguments.into_iter().collect();
        assert_eq!(
            arguments.len(),
            prototype.arity(),
            "{prototype:?} takes {} argument(s), got {}",
            prototype.arity(),
            arguments.len(),
        );
        Self {
            prototype,
            arguments,
        }
    }

    #[inline]
    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }

    #[inline]
    pub fn arguments(&self) -> &[ValueTag] {
        &self.arguments
    }

    /// The same prototype applied to different arguments.
    pub fn with_arguments(&self, arguments: impl IntoIterator<Item = ValueTag>) -> Self {
        Self::new(self.prototype.clone(), arguments)
    }

    /// Replace every use of `old` with `new`.
    pub fn substitute(&self, old: ValueTag, new: ValueTag) -> Self {
        self.with_arguments(
            self.arguments
                .iter()
                .map(|&arg| if arg == old { new } else { arg }),
        )
    }

    #[inline]
    pub fn uses(&self, tag: ValueTag) -> bool {
        self.arguments.contains(&tag)
    }
}
