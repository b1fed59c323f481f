use std::fmt;

use crate::{
    registry::TypeRegistry,
    type_def::{ArrayType, Field, Kind, Layout, StructType, TypeDef, TypeId, TypeKind},
};

/// A borrowed handle to a canonical type, bundling the [`TypeId`] with the
/// registry that owns it.
///
/// Two handles compare equal iff they name the same canonical type of the same
/// registry.
#[derive(Clone, Copy)]
pub struct Ty<'r> {
    registry: &'r TypeRegistry,
    id: TypeId,
}

impl<'r> Ty<'r> {
    pub(crate) fn new(registry: &'r TypeRegistry, id: TypeId) -> Ty<'r> {
        Ty { registry, id }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn def(&self) -> &'r TypeDef {
        self.registry.get(self.id)
    }

    pub fn kind(&self) -> Kind {
        self.def().kind()
    }

    pub fn required(&self) -> bool {
        self.def().required()
    }

    pub fn layout(&self) -> Layout {
        self.def().layout()
    }

    pub fn alignment(&self) -> u64 {
        self.def().alignment()
    }

    pub fn size(&self) -> u64 {
        self.def().size()
    }

    pub fn fundamental(&self) -> Ty<'r> {
        Ty::new(self.registry, self.def().fundamental())
    }

    pub fn is_fundamental(&self) -> bool {
        self.def().fundamental() == self.id
    }

    /// The representation type of a compound type (`Set`, `Call`, `Locus`,
    /// `AltAllele`, `Variant`).
    pub fn representation(&self) -> Option<Ty<'r>> {
        self.def()
            .type_kind()
            .representation()
            .map(|id| Ty::new(self.registry, id))
    }

    pub fn as_struct(&self) -> Option<&'r StructType> {
        self.def().as_struct()
    }

    pub fn as_array(&self) -> Option<&'r ArrayType> {
        self.def().as_array()
    }

    pub fn fields(&self) -> &'r [Field] {
        self.as_struct().map(StructType::fields).unwrap_or_default()
    }

    /// Type of the field at `index`, for struct types.
    pub fn field_type(&self, index: usize) -> Option<Ty<'r>> {
        self.as_struct()
            .and_then(|st| st.fields().get(index))
            .map(|f| Ty::new(self.registry, f.ty))
    }

    /// Element type of an `Array` or `Set`.
    pub fn element(&self) -> Option<Ty<'r>> {
        match self.def().type_kind() {
            TypeKind::Array(at) => Some(Ty::new(self.registry, at.element())),
            TypeKind::Set { element, .. } => Some(Ty::new(self.registry, *element)),
            _ => None,
        }
    }

    /// Genome reference tag of a `Locus` or `Variant`.
    pub fn genome_reference(&self) -> Option<&'r str> {
        match self.def().type_kind() {
            TypeKind::Locus {
                genome_reference, ..
            }
            | TypeKind::Variant {
                genome_reference, ..
            } => Some(genome_reference),
            _ => None,
        }
    }
}

impl PartialEq for Ty<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.registry, other.registry) && self.id == other.id
    }
}

impl Eq for Ty<'_> {}

impl fmt::Debug for Ty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ty({}: {})", self.id.index(), self)
    }
}

/// Writes the type in the same grammar the parser accepts.
impl fmt::Display for Ty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required() {
            f.write_str("!")?;
        }
        match self.def().type_kind() {
            TypeKind::Boolean => f.write_str("Boolean"),
            TypeKind::Int32 => f.write_str("Int32"),
            TypeKind::Int64 => f.write_str("Int64"),
            TypeKind::Float32 => f.write_str("Float32"),
            TypeKind::Float64 => f.write_str("Float64"),
            TypeKind::String => f.write_str("String"),
            TypeKind::Struct(st) => {
                f.write_str("Struct{")?;
                for (i, field) in st.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, Ty::new(self.registry, field.ty))?;
                }
                f.write_str("}")
            }
            TypeKind::Array(at) => {
                write!(f, "Array[{}]", Ty::new(self.registry, at.element()))
            }
            TypeKind::Set { element, .. } => {
                write!(f, "Set[{}]", Ty::new(self.registry, *element))
            }
            TypeKind::Call { .. } => f.write_str("Call"),
            TypeKind::Locus {
                genome_reference, ..
            } => write!(f, "Locus({genome_reference})"),
            TypeKind::AltAllele { .. } => f.write_str("AltAllele"),
            TypeKind::Variant {
                genome_reference, ..
            } => write!(f, "Variant({genome_reference})"),
        }
    }
}
