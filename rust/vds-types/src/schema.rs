//! The aggregate schema of a matrix table.

use std::fmt;

use crate::{
    registry::TypeRegistry,
    ty::Ty,
    type_def::{Field, Kind, TypeId},
};

/// The six component types of a matrix table plus the derived row
/// implementation type that partition files are encoded with.
///
/// The row implementation type is the nullable struct
/// `Struct{pk, v, va, gs}`:
/// - `pk`: the partition key. For a `Variant` row key this is the `Locus` of
///   the same genome reference and requiredness, otherwise the row key itself.
/// - `v`: the row key.
/// - `va`: the row annotation.
/// - `gs`: a nullable array of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixTableSchema {
    global: TypeId,
    col_key: TypeId,
    col: TypeId,
    row_key: TypeId,
    row: TypeId,
    entry: TypeId,
    row_impl: TypeId,
}

impl MatrixTableSchema {
    pub(crate) fn new(
        registry: &mut TypeRegistry,
        global: TypeId,
        col_key: TypeId,
        col: TypeId,
        row_key: TypeId,
        row: TypeId,
        entry: TypeId,
    ) -> MatrixTableSchema {
        let pk = partition_key(registry, row_key);
        let gs = registry.array_type(entry, false);
        let row_impl = registry.struct_type(
            vec![
                Field::new("pk", pk),
                Field::new("v", row_key),
                Field::new("va", row),
                Field::new("gs", gs),
            ],
            false,
        );
        MatrixTableSchema {
            global,
            col_key,
            col,
            row_key,
            row,
            entry,
            row_impl,
        }
    }

    pub fn kind(&self) -> Kind {
        Kind::MatrixTableSchema
    }

    pub fn global(&self) -> TypeId {
        self.global
    }

    pub fn col_key(&self) -> TypeId {
        self.col_key
    }

    pub fn col(&self) -> TypeId {
        self.col
    }

    pub fn row_key(&self) -> TypeId {
        self.row_key
    }

    pub fn row(&self) -> TypeId {
        self.row
    }

    pub fn entry(&self) -> TypeId {
        self.entry
    }

    /// The logical type of one decoded row.
    pub fn row_impl(&self) -> TypeId {
        self.row_impl
    }

    /// The fundamental form of [`Self::row_impl`], i.e. the type partition
    /// payloads are decoded against.
    pub fn row_impl_fundamental(&self, registry: &TypeRegistry) -> TypeId {
        registry.get(self.row_impl).fundamental()
    }

    pub fn display<'a>(&'a self, registry: &'a TypeRegistry) -> SchemaDisplay<'a> {
        SchemaDisplay {
            schema: self,
            registry,
        }
    }
}

fn partition_key(registry: &mut TypeRegistry, row_key: TypeId) -> TypeId {
    let ty = registry.ty(row_key);
    if ty.kind() != Kind::Variant {
        return row_key;
    }
    let required = ty.required();
    let gr = ty.genome_reference().unwrap_or_default().to_string();
    registry.locus_type(&gr, required)
}

/// Prints a [`MatrixTableSchema`] with its component types.
pub struct SchemaDisplay<'a> {
    schema: &'a MatrixTableSchema,
    registry: &'a TypeRegistry,
}

impl fmt::Display for SchemaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = |id| Ty::new(self.registry, id);
        writeln!(f, "MatrixTableSchema {{")?;
        writeln!(f, "  global: {}", ty(self.schema.global))?;
        writeln!(f, "  col_key: {}", ty(self.schema.col_key))?;
        writeln!(f, "  col: {}", ty(self.schema.col))?;
        writeln!(f, "  row_key: {}", ty(self.schema.row_key))?;
        writeln!(f, "  row: {}", ty(self.schema.row))?;
        writeln!(f, "  entry: {}", ty(self.schema.entry))?;
        writeln!(f, "  row_impl: {}", ty(self.schema.row_impl))?;
        write!(f, "}}")
    }
}
