//! The type-system model the IR refers to.
//!
//! The front end declares types and members into a [`TypeSystem`] with
//! `&mut self` builder calls, then shares it immutably with the IR passes
//! and analyses. Declarations are never removed, so their indices are
//! stable for the lifetime of the type system; caches keyed by those
//! indices never keep a declaration alive on their own.

mod decl;
mod ids;
mod pool;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

pub use decl::{
    Attribute, FieldDecl, MethodDecl, MethodFlags, PropertyDecl, TypeDecl, TypeDeclKind,
};
pub use ids::{FieldId, MethodId, PropertyId, TypeDeclId};
pub use pool::{GenericOwner, PointerKind, PrimitiveType, TypeData, TypeId, TypePool};

use crate::{Name, NameTable};

/// Signature used when declaring a method.
#[derive(Clone, Debug)]
pub struct MethodSignature {
    pub name: Name,
    pub flags: MethodFlags,
    pub parameter_types: SmallVec<[TypeId; 4]>,
    pub return_type: TypeId,
}

impl MethodSignature {
    pub fn new(
        name: Name,
        flags: MethodFlags,
        parameter_types: impl IntoIterator<Item = TypeId>,
        return_type: TypeId,
    ) -> Self {
        Self {
            name,
            flags,
            parameter_types: parameter_types.into_iter().collect(),
            return_type,
        }
    }
}

/// Arena of type and member declarations, plus the type pool and names.
pub struct TypeSystem {
    names: NameTable,
    pool: TypePool,
    decls: Vec<TypeDecl>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    properties: Vec<PropertyDecl>,
    /// Qualified name → declarations. More than one entry means the name is
    /// ambiguous (e.g. declared by two referenced modules).
    by_name: FxHashMap<Name, SmallVec<[TypeDeclId; 1]>>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self {
            names: NameTable::new(),
            pool: TypePool::new(),
            decls: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    // ── Names and pool ──────────────────────────────────────────

    #[inline]
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    #[inline]
    pub fn intern_name(&self, s: &str) -> Name {
        self.names.intern(s)
    }

    #[inline]
    pub fn pool(&self) -> &TypePool {
        &self.pool
    }

    #[inline]
    pub fn type_data(&self, ty: TypeId) -> TypeData {
        self.pool.get(ty)
    }

    /// The type reference for a declaration.
    pub fn declared(&self, decl: TypeDeclId) -> TypeId {
        self.pool.intern(TypeData::Declared(decl))
    }

    pub fn pointer_to(&self, pointee: TypeId, kind: PointerKind) -> TypeId {
        self.pool.intern(TypeData::Pointer { pointee, kind })
    }

    pub fn array_of(&self, element: TypeId, rank: u32) -> TypeId {
        self.pool.intern(TypeData::Array { element, rank })
    }

    pub fn generic_parameter(&self, owner: GenericOwner, index: u32) -> TypeId {
        self.pool.intern(TypeData::GenericParameter { owner, index })
    }

    /// The pointee of a pointer type, or `None` for non-pointers.
    pub fn pointee(&self, ty: TypeId) -> Option<(TypeId, PointerKind)> {
        match self.pool.get(ty) {
            TypeData::Pointer { pointee, kind } => Some((pointee, kind)),
            _ => None,
        }
    }

    /// The element type of an array type, or `None` for non-arrays.
    pub fn array_element(&self, ty: TypeId) -> Option<TypeId> {
        match self.pool.get(ty) {
            TypeData::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    // ── Declaration ─────────────────────────────────────────────

    /// Declare a new type with a fully qualified name.
    pub fn declare_type(&mut self, qualified_name: &str, kind: TypeDeclKind) -> TypeDeclId {
        self.declare_generic_type(qualified_name, kind, 0)
    }

    /// Declare a type that introduces `generic_arity` generic parameters.
    pub fn declare_generic_type(
        &mut self,
        qualified_name: &str,
        kind: TypeDeclKind,
        generic_arity: u32,
    ) -> TypeDeclId {
        let id = TypeDeclId::from_len(self.decls.len());
        let name = self.names.intern(qualified_name);
        self.decls.push(TypeDecl {
            name,
            kind,
            bases: SmallVec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            generic_arity,
        });
        self.by_name.entry(name).or_default().push(id);
        tracing::trace!(decl = id.raw(), name = qualified_name, "declared type");
        id
    }

    /// Record `base` as a direct base type or implemented interface of `decl`.
    ///
    /// The type system must stay acyclic; that is the caller's invariant.
    pub fn add_base(&mut self, decl: TypeDeclId, base: TypeDeclId) {
        assert_ne!(decl, base, "a type cannot be its own base");
        self.decls[decl.index()].bases.push(base);
    }

    pub fn declare_field(
        &mut self,
        owner: TypeDeclId,
        name: &str,
        field_type: TypeId,
        is_static: bool,
    ) -> FieldId {
        let id = FieldId::from_len(self.fields.len());
        let name = self.names.intern(name);
        self.fields.push(FieldDecl {
            name,
            owner,
            field_type,
            is_static,
        });
        self.decls[owner.index()].fields.push(id);
        id
    }

    /// Declare a method directly on `owner`.
    pub fn declare_method(&mut self, owner: TypeDeclId, signature: MethodSignature) -> MethodId {
        let id = self.push_method(owner, signature);
        self.decls[owner.index()].methods.push(id);
        id
    }

    pub fn declare_property(
        &mut self,
        owner: TypeDeclId,
        name: &str,
        property_type: TypeId,
    ) -> PropertyId {
        let id = PropertyId::from_len(self.properties.len());
        let name = self.names.intern(name);
        self.properties.push(PropertyDecl {
            name,
            owner,
            property_type,
            accessors: SmallVec::new(),
        });
        self.decls[owner.index()].properties.push(id);
        id
    }

    /// Declare a getter or setter for `property`. The accessor is a method
    /// owned by the property's declaring type but not listed in its
    /// [`TypeDecl::methods`].
    pub fn declare_accessor(&mut self, property: PropertyId, signature: MethodSignature) -> MethodId {
        let owner = self.properties[property.index()].owner;
        let id = self.push_method(owner, signature);
        self.properties[property.index()].accessors.push(id);
        id
    }

    fn push_method(&mut self, owner: TypeDeclId, signature: MethodSignature) -> MethodId {
        let id = MethodId::from_len(self.methods.len());
        self.methods.push(MethodDecl {
            name: signature.name,
            owner,
            flags: signature.flags,
            parameter_types: signature.parameter_types,
            return_type: signature.return_type,
            base_methods: SmallVec::new(),
            attributes: SmallVec::new(),
        });
        id
    }

    /// Record that `method` overrides or implements `base`.
    pub fn add_base_method(&mut self, method: MethodId, base: MethodId) {
        assert_ne!(method, base, "a method cannot override itself");
        self.methods[method.index()].base_methods.push(base);
    }

    pub fn add_attribute(&mut self, method: MethodId, attribute: Attribute) {
        self.methods[method.index()].attributes.push(attribute);
    }

    // ── Queries ─────────────────────────────────────────────────

    #[inline]
    pub fn decl(&self, id: TypeDeclId) -> &TypeDecl {
        &self.decls[id.index()]
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    #[inline]
    pub fn property(&self, id: PropertyId) -> &PropertyDecl {
        &self.properties[id.index()]
    }

    /// Qualified name of a declaration.
    pub fn decl_name(&self, id: TypeDeclId) -> &'static str {
        self.names.lookup(self.decl(id).name)
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = TypeDeclId> {
        (0..self.decls.len()).map(TypeDeclId::from_len)
    }

    /// Every declaration whose qualified name is `qualified_name`.
    pub fn resolve_by_name(&self, qualified_name: &str) -> SmallVec<[TypeDeclId; 1]> {
        self.names
            .get(qualified_name)
            .and_then(|name| self.by_name.get(&name).cloned())
            .unwrap_or_default()
    }

    /// Methods and property accessors declared directly on `decl`.
    pub fn methods_and_accessors(&self, decl: TypeDeclId) -> impl Iterator<Item = MethodId> + '_ {
        let d = self.decl(decl);
        d.methods.iter().copied().chain(
            d.properties
                .iter()
                .flat_map(move |&p| self.property(p).accessors.iter().copied()),
        )
    }

    /// `true` if `sub` is `sup` or inherits from it, directly or transitively.
    pub fn is_subtype(&self, sub: TypeDeclId, sup: TypeDeclId) -> bool {
        if sub == sup {
            return true;
        }
        let mut visited = FxHashSet::default();
        let mut stack: Vec<TypeDeclId> = self.decl(sub).bases.to_vec();
        while let Some(next) = stack.pop() {
            if next == sup {
                return true;
            }
            if visited.insert(next) {
                stack.extend(self.decl(next).bases.iter().copied());
            }
        }
        false
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSystem")
            .field("decls", &self.decls.len())
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .field("types", &self.pool.len())
            .finish_non_exhaustive()
    }
}
