//! Type descriptors and their physical layout.
//!
//! A [`TypeDef`] is immutable once interned. Nested types refer to each other
//! through [`TypeId`] handles into the owning [`TypeRegistry`](crate::TypeRegistry),
//! so equality of sub-parts is identity equality of canonical handles.

use std::hash::{Hash, Hasher};

use vds_bytes::{align::align_up_u64, bits::bitmap_bytes};

/// Handle of a canonical type owned by a [`TypeRegistry`](crate::TypeRegistry).
///
/// A `TypeId` is only meaningful for the registry that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub(crate) fn new(index: usize) -> TypeId {
        TypeId(u32::try_from(index).expect("type registry overflow"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Struct,
    Array,
    Set,
    Call,
    Locus,
    AltAllele,
    Variant,
    MatrixTableSchema,
}

impl Kind {
    /// Compound kinds have no layout of their own and are stored as their
    /// representation type.
    pub fn is_compound(self) -> bool {
        matches!(
            self,
            Kind::Set | Kind::Call | Kind::Locus | Kind::AltAllele | Kind::Variant
        )
    }
}

/// Physical layout of one instance of a type's fundamental form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub alignment: u64,
    pub size: u64,
}

impl Layout {
    pub const fn new(alignment: u64, size: u64) -> Layout {
        Layout { alignment, size }
    }

    /// Layout of the 8-byte offset slot used by `String` and `Array` values.
    pub const REFERENCE: Layout = Layout::new(8, 8);

    /// Size of one element in a packed sequence of this layout.
    pub fn stride(&self) -> u64 {
        align_up_u64(self.size, self.alignment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Field {
        Field {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered list of fields together with its computed layout.
///
/// The struct value starts with a missing bitmap holding one bit per nullable
/// field (in declared order), followed by the fields, each aligned to its own
/// alignment. Only the field list participates in equality and hashing.
#[derive(Debug, Clone)]
pub struct StructType {
    fields: Vec<Field>,
    field_offsets: Vec<u64>,
    field_missing_bits: Vec<Option<u64>>,
    n_nullable_fields: u64,
    layout: Layout,
}

impl StructType {
    /// Computes the layout of `fields`, given the `(required, layout)` of each
    /// field type in order.
    pub(crate) fn new(fields: Vec<Field>, field_info: &[(bool, Layout)]) -> StructType {
        debug_assert_eq!(fields.len(), field_info.len());

        let mut field_missing_bits = Vec::with_capacity(fields.len());
        let mut n_nullable_fields = 0u64;
        for &(required, _) in field_info {
            if required {
                field_missing_bits.push(None);
            } else {
                field_missing_bits.push(Some(n_nullable_fields));
                n_nullable_fields += 1;
            }
        }

        let mut alignment = 1;
        let mut size = bitmap_bytes(n_nullable_fields);
        let mut field_offsets = Vec::with_capacity(fields.len());
        for &(_, field_layout) in field_info {
            size = align_up_u64(size, field_layout.alignment);
            field_offsets.push(size);
            size += field_layout.size;
            alignment = alignment.max(field_layout.alignment);
        }

        StructType {
            fields,
            field_offsets,
            field_missing_bits,
            n_nullable_fields,
            layout: Layout::new(alignment, size),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    /// Finds a field by name, returning its position and descriptor.
    pub fn find_field(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Byte offset of field `index` relative to the start of the struct.
    pub fn field_offset(&self, index: usize) -> u64 {
        self.field_offsets[index]
    }

    /// Bit index of field `index` in the missing bitmap, `None` for required fields.
    pub fn field_missing_bit(&self, index: usize) -> Option<u64> {
        self.field_missing_bits[index]
    }

    pub fn n_nullable_fields(&self) -> u64 {
        self.n_nullable_fields
    }

    pub fn missing_bits_size(&self) -> u64 {
        bitmap_bytes(self.n_nullable_fields)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for StructType {}

impl Hash for StructType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.hash(state);
    }
}

/// A variable-length sequence of one element type.
///
/// The array value is an 8-byte reference to out-of-line content laid out as:
///
/// ```text
/// [ n: i32 ][ missing bitmap: ceil(n/8) bytes, omitted if the element is required ]
/// [ padding to element alignment ][ n * element_size ]
/// ```
///
/// The element's requiredness and layout are cached so that content layout can
/// be computed without consulting the registry. Only the element handle
/// participates in equality and hashing.
#[derive(Debug, Clone)]
pub struct ArrayType {
    element: TypeId,
    element_required: bool,
    element_layout: Layout,
}

impl ArrayType {
    pub(crate) fn new(
        element: TypeId,
        element_required: bool,
        element_layout: Layout,
    ) -> ArrayType {
        ArrayType {
            element,
            element_required,
            element_layout,
        }
    }

    pub fn element(&self) -> TypeId {
        self.element
    }

    pub fn element_required(&self) -> bool {
        self.element_required
    }

    pub fn missing_bits_size(&self, n: u64) -> u64 {
        if self.element_required {
            0
        } else {
            bitmap_bytes(n)
        }
    }

    pub fn element_size(&self) -> u64 {
        self.element_layout.stride()
    }

    pub fn content_alignment(&self) -> u64 {
        self.element_layout.alignment.max(4)
    }

    pub fn elements_offset(&self, n: u64) -> u64 {
        align_up_u64(4 + self.missing_bits_size(n), self.element_layout.alignment)
    }

    /// # Panics
    ///
    /// Panics if `i >= n`.
    pub fn element_offset(&self, n: u64, i: u64) -> u64 {
        assert!(i < n, "array index {i} out of bounds for length {n}");
        self.elements_offset(n) + i * self.element_size()
    }

    pub fn content_size(&self, n: u64) -> u64 {
        self.elements_offset(n) + n * self.element_size()
    }

    /// [`content_size`](Self::content_size), or `None` if it overflows.
    pub fn checked_content_size(&self, n: u64) -> Option<u64> {
        let bitmap = if self.element_required { 0 } else { n.div_ceil(8) };
        let elements_offset = (4 + bitmap).checked_next_multiple_of(self.element_layout.alignment)?;
        n.checked_mul(self.element_size())?.checked_add(elements_offset)
    }
}

impl PartialEq for ArrayType {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
    }
}

impl Eq for ArrayType {}

impl Hash for ArrayType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
    }
}

/// Per-kind payload of a value type.
///
/// Compound variants carry the handle of their representation type, which is
/// itself derived from the structural parts and therefore consistent with
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Struct(StructType),
    Array(ArrayType),
    Set {
        element: TypeId,
        representation: TypeId,
    },
    Call {
        representation: TypeId,
    },
    Locus {
        genome_reference: String,
        representation: TypeId,
    },
    AltAllele {
        representation: TypeId,
    },
    Variant {
        genome_reference: String,
        representation: TypeId,
    },
}

impl TypeKind {
    pub fn kind(&self) -> Kind {
        match self {
            TypeKind::Boolean => Kind::Boolean,
            TypeKind::Int32 => Kind::Int32,
            TypeKind::Int64 => Kind::Int64,
            TypeKind::Float32 => Kind::Float32,
            TypeKind::Float64 => Kind::Float64,
            TypeKind::String => Kind::String,
            TypeKind::Struct(_) => Kind::Struct,
            TypeKind::Array(_) => Kind::Array,
            TypeKind::Set { .. } => Kind::Set,
            TypeKind::Call { .. } => Kind::Call,
            TypeKind::Locus { .. } => Kind::Locus,
            TypeKind::AltAllele { .. } => Kind::AltAllele,
            TypeKind::Variant { .. } => Kind::Variant,
        }
    }

    /// Representation type of a compound kind.
    pub fn representation(&self) -> Option<TypeId> {
        match self {
            TypeKind::Set { representation, .. }
            | TypeKind::Call { representation }
            | TypeKind::Locus { representation, .. }
            | TypeKind::AltAllele { representation }
            | TypeKind::Variant { representation, .. } => Some(*representation),
            _ => None,
        }
    }
}

/// A canonical, interned value type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    kind: TypeKind,
    required: bool,
    layout: Layout,
    fundamental: TypeId,
}

impl TypeDef {
    pub(crate) fn new(
        kind: TypeKind,
        required: bool,
        layout: Layout,
        fundamental: TypeId,
    ) -> TypeDef {
        TypeDef {
            kind,
            required,
            layout,
            fundamental,
        }
    }

    pub fn type_kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn kind(&self) -> Kind {
        self.kind.kind()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn alignment(&self) -> u64 {
        self.layout.alignment
    }

    pub fn size(&self) -> u64 {
        self.layout.size
    }

    pub fn fundamental(&self) -> TypeId {
        self.fundamental
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match &self.kind {
            TypeKind::Struct(st) => Some(st),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match &self.kind {
            TypeKind::Array(at) => Some(at),
            _ => None,
        }
    }

    /// Structural identity: kind payload plus the required flag. Layout and
    /// fundamental type are functions of these and are not compared.
    pub(crate) fn is_same_shape(&self, kind: &TypeKind, required: bool) -> bool {
        self.required == required && &self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_layout_with_padding() {
        // {a: Boolean (nullable), b: !Int64, c: Int32 (nullable)}
        let fields = vec![
            Field::new("a", TypeId(0)),
            Field::new("b", TypeId(1)),
            Field::new("c", TypeId(2)),
        ];
        let info = [
            (false, Layout::new(1, 1)),
            (true, Layout::new(8, 8)),
            (false, Layout::new(4, 4)),
        ];
        let st = StructType::new(fields, &info);
        assert_eq!(st.n_nullable_fields(), 2);
        assert_eq!(st.missing_bits_size(), 1);
        assert_eq!(st.field_missing_bit(0), Some(0));
        assert_eq!(st.field_missing_bit(1), None);
        assert_eq!(st.field_missing_bit(2), Some(1));
        assert_eq!(st.field_offset(0), 1);
        assert_eq!(st.field_offset(1), 8);
        assert_eq!(st.field_offset(2), 16);
        assert_eq!(st.layout(), Layout::new(8, 20));
    }

    #[test]
    fn test_empty_struct_layout() {
        let st = StructType::new(vec![], &[]);
        assert_eq!(st.layout(), Layout::new(1, 0));
        assert_eq!(st.missing_bits_size(), 0);
    }

    #[test]
    fn test_array_content_layout() {
        let required_i32 = ArrayType::new(TypeId(0), true, Layout::new(4, 4));
        assert_eq!(required_i32.missing_bits_size(0), 0);
        assert_eq!(required_i32.content_size(0), required_i32.elements_offset(0));
        assert_eq!(required_i32.elements_offset(3), 4);
        assert_eq!(required_i32.content_size(3), 16);

        let nullable_f64 = ArrayType::new(TypeId(1), false, Layout::new(8, 8));
        assert_eq!(nullable_f64.missing_bits_size(9), 2);
        assert_eq!(nullable_f64.elements_offset(9), 8);
        assert_eq!(nullable_f64.element_offset(9, 2), 24);
        assert_eq!(nullable_f64.content_alignment(), 8);
    }

    #[test]
    fn test_array_element_stride_pads_struct_elements() {
        // A struct element of size 5 and alignment 4 occupies 8 bytes per slot.
        let at = ArrayType::new(TypeId(0), true, Layout::new(4, 5));
        assert_eq!(at.element_size(), 8);
        assert_eq!(at.content_size(2), 4 + 16);
    }

    #[test]
    fn test_checked_content_size() {
        let wide = ArrayType::new(TypeId(0), true, Layout::new(8, 512));
        assert_eq!(wide.checked_content_size(3), Some(wide.content_size(3)));
        assert_eq!(wide.checked_content_size(i32::MAX as u64), Some(8 + 512 * i32::MAX as u64));
        assert_eq!(wide.checked_content_size(u64::MAX / 256), None);

        let nullable = ArrayType::new(TypeId(1), false, Layout::new(1, 1));
        assert_eq!(nullable.checked_content_size(9), Some(nullable.content_size(9)));
        assert_eq!(nullable.checked_content_size(u64::MAX), None);
    }
}
