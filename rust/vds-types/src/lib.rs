//! The structural type system of the variant dataset format: type descriptors
//! with their physical layout, the interning registry, the textual type grammar
//! and the matrix table schema.

mod parser;
pub mod registry;
pub mod schema;
pub mod ty;
pub mod type_def;
#[cfg(test)]
mod tests;

pub use registry::TypeRegistry;
pub use schema::MatrixTableSchema;
pub use ty::Ty;
pub use type_def::{ArrayType, Field, Kind, Layout, StructType, TypeDef, TypeId, TypeKind};
