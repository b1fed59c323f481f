//! Interning of structurally equal types to a canonical [`TypeId`].

use std::hash::BuildHasher;

use ahash::AHashMap;
use vds_common::Result;

use crate::{
    parser,
    schema::MatrixTableSchema,
    ty::Ty,
    type_def::{ArrayType, Field, Layout, StructType, TypeDef, TypeId, TypeKind},
};

const SCALAR_KINDS: [TypeKind; 6] = [
    TypeKind::Boolean,
    TypeKind::Int32,
    TypeKind::Int64,
    TypeKind::Float32,
    TypeKind::Float64,
    TypeKind::String,
];

/// Owns every canonical type.
///
/// Constructing a type through the registry either returns the handle of a
/// structurally equal type interned earlier, or interns the new one. Once types
/// are resolved, handles can be compared by identity alone.
///
/// Interning needs `&mut self`, so a registry is populated from a single thread
/// and may then be shared read-only (`&TypeRegistry` is `Send + Sync`).
pub struct TypeRegistry {
    defs: Vec<TypeDef>,
    /// Structural hash to the canonical handles with that hash.
    buckets: AHashMap<u64, Vec<TypeId>>,
    hasher: ahash::RandomState,
    /// Indexed by `[scalar][required as usize]`, in `SCALAR_KINDS` order.
    scalars: [[TypeId; 2]; 6],
    call: [TypeId; 2],
    alt_allele: [TypeId; 2],
}

impl TypeRegistry {
    pub fn new() -> TypeRegistry {
        let placeholder = [TypeId::new(0); 2];
        let mut registry = TypeRegistry {
            defs: Vec::new(),
            buckets: AHashMap::new(),
            hasher: ahash::RandomState::new(),
            scalars: [placeholder; 6],
            call: placeholder,
            alt_allele: placeholder,
        };
        for (i, kind) in SCALAR_KINDS.iter().enumerate() {
            for required in [false, true] {
                registry.scalars[i][required as usize] = registry.intern(kind.clone(), required);
            }
        }
        for required in [false, true] {
            let representation = registry.int32(required);
            registry.call[required as usize] =
                registry.intern(TypeKind::Call { representation }, required);

            let representation = registry.struct_type(
                vec![
                    Field::new("ref", registry.string(true)),
                    Field::new("alt", registry.string(true)),
                ],
                required,
            );
            registry.alt_allele[required as usize] =
                registry.intern(TypeKind::AltAllele { representation }, required);
        }
        registry
    }

    /// Number of canonical types interned so far.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this registry.
    pub fn get(&self, id: TypeId) -> &TypeDef {
        &self.defs[id.index()]
    }

    /// Borrowed handle for navigating the type `id`.
    pub fn ty(&self, id: TypeId) -> Ty<'_> {
        assert!(id.index() < self.defs.len(), "foreign type id {id:?}");
        Ty::new(self, id)
    }

    pub fn boolean(&self, required: bool) -> TypeId {
        self.scalars[0][required as usize]
    }

    pub fn int32(&self, required: bool) -> TypeId {
        self.scalars[1][required as usize]
    }

    pub fn int64(&self, required: bool) -> TypeId {
        self.scalars[2][required as usize]
    }

    pub fn float32(&self, required: bool) -> TypeId {
        self.scalars[3][required as usize]
    }

    pub fn float64(&self, required: bool) -> TypeId {
        self.scalars[4][required as usize]
    }

    pub fn string(&self, required: bool) -> TypeId {
        self.scalars[5][required as usize]
    }

    pub fn call(&self, required: bool) -> TypeId {
        self.call[required as usize]
    }

    pub fn alt_allele(&self, required: bool) -> TypeId {
        self.alt_allele[required as usize]
    }

    pub fn struct_type(&mut self, fields: Vec<Field>, required: bool) -> TypeId {
        let info = fields
            .iter()
            .map(|f| {
                let def = self.get(f.ty);
                (def.required(), def.layout())
            })
            .collect::<Vec<_>>();
        self.intern(TypeKind::Struct(StructType::new(fields, &info)), required)
    }

    /// The zero-field struct (`Empty` in the type grammar).
    pub fn empty_struct(&mut self, required: bool) -> TypeId {
        self.struct_type(Vec::new(), required)
    }

    pub fn array_type(&mut self, element: TypeId, required: bool) -> TypeId {
        let def = self.get(element);
        let at = ArrayType::new(element, def.required(), def.layout());
        self.intern(TypeKind::Array(at), required)
    }

    pub fn set_type(&mut self, element: TypeId, required: bool) -> TypeId {
        let representation = self.array_type(element, required);
        self.intern(
            TypeKind::Set {
                element,
                representation,
            },
            required,
        )
    }

    pub fn locus_type(&mut self, genome_reference: &str, required: bool) -> TypeId {
        let representation = self.locus_representation(required);
        self.intern(
            TypeKind::Locus {
                genome_reference: genome_reference.to_string(),
                representation,
            },
            required,
        )
    }

    pub fn variant_type(&mut self, genome_reference: &str, required: bool) -> TypeId {
        let representation = self.variant_representation(required);
        self.intern(
            TypeKind::Variant {
                genome_reference: genome_reference.to_string(),
                representation,
            },
            required,
        )
    }

    /// Parses a type from its textual grammar, e.g. `Struct{a: !Int32, b: Array[Float64]}`.
    pub fn parse(&mut self, text: &str) -> Result<TypeId> {
        parser::parse_type(self, text)
    }

    /// Builds the matrix table schema and its derived row implementation type.
    pub fn matrix_table_schema(
        &mut self,
        global: TypeId,
        col_key: TypeId,
        col: TypeId,
        row_key: TypeId,
        row: TypeId,
        entry: TypeId,
    ) -> MatrixTableSchema {
        MatrixTableSchema::new(self, global, col_key, col, row_key, row, entry)
    }

    fn locus_representation(&mut self, required: bool) -> TypeId {
        let fields = vec![
            Field::new("contig", self.string(true)),
            Field::new("pos", self.int32(true)),
        ];
        self.struct_type(fields, required)
    }

    fn variant_representation(&mut self, required: bool) -> TypeId {
        let alt_alleles = self.array_type(self.alt_allele(true), true);
        let fields = vec![
            Field::new("contig", self.string(true)),
            Field::new("pos", self.int32(true)),
            Field::new("ref", self.string(true)),
            Field::new("altAlleles", alt_alleles),
        ];
        self.struct_type(fields, required)
    }

    fn intern(&mut self, kind: TypeKind, required: bool) -> TypeId {
        let hash = self.hasher.hash_one((&kind, required));
        if let Some(ids) = self.buckets.get(&hash) {
            if let Some(&id) = ids
                .iter()
                .find(|&&id| self.get(id).is_same_shape(&kind, required))
            {
                return id;
            }
        }

        // Lowering may intern further types, so the new handle is assigned after it.
        let (layout, lowered) = self.lower(&kind, required);
        let id = TypeId::new(self.defs.len());
        self.defs
            .push(TypeDef::new(kind, required, layout, lowered.unwrap_or(id)));
        self.buckets.entry(hash).or_default().push(id);
        id
    }

    /// Computes the layout of a candidate type and its fundamental type.
    /// `None` means the candidate is its own fundamental type.
    fn lower(&mut self, kind: &TypeKind, required: bool) -> (Layout, Option<TypeId>) {
        match kind {
            TypeKind::Boolean => (Layout::new(1, 1), None),
            TypeKind::Int32 | TypeKind::Float32 => (Layout::new(4, 4), None),
            TypeKind::Int64 | TypeKind::Float64 => (Layout::new(8, 8), None),
            TypeKind::String => (Layout::REFERENCE, None),
            TypeKind::Struct(st) => {
                if st.fields().iter().all(|f| self.ty(f.ty).is_fundamental()) {
                    return (st.layout(), None);
                }
                let fields = st
                    .fields()
                    .iter()
                    .map(|f| Field::new(f.name.clone(), self.get(f.ty).fundamental()))
                    .collect();
                (st.layout(), Some(self.struct_type(fields, required)))
            }
            TypeKind::Array(at) => {
                if self.ty(at.element()).is_fundamental() {
                    return (Layout::REFERENCE, None);
                }
                let element = self.get(at.element()).fundamental();
                (Layout::REFERENCE, Some(self.array_type(element, required)))
            }
            TypeKind::Set { representation, .. }
            | TypeKind::Call { representation }
            | TypeKind::Locus { representation, .. }
            | TypeKind::AltAllele { representation }
            | TypeKind::Variant { representation, .. } => {
                let def = self.get(*representation);
                (def.layout(), Some(def.fundamental()))
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.defs.len())
            .finish()
    }
}
