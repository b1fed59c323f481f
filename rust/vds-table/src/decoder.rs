//! Schema-driven decoding of one value from a block stream into a region.

use std::io::Read;

use vds_common::{Result, error::Error};
use vds_io::BlockReader;
use vds_region::Region;
use vds_types::{TypeId, TypeKind, TypeRegistry};

/// Decodes one value of type `ty` into freshly allocated region space and
/// returns its offset.
///
/// The stream carries the value per the fundamental form of `ty`.
pub fn decode<R: Read>(
    reader: &mut BlockReader<R>,
    region: &mut Region,
    registry: &TypeRegistry,
    ty: TypeId,
) -> Result<u64> {
    let fundamental = registry.get(ty).fundamental();
    let layout = registry.get(fundamental).layout();
    let offset = region.try_allocate(layout.alignment, layout.size)?;
    decode_into(reader, region, registry, fundamental, offset)?;
    Ok(offset)
}

/// Decodes one value of the fundamental type `ty` into the already allocated
/// slot at `offset`.
pub fn decode_into<R: Read>(
    reader: &mut BlockReader<R>,
    region: &mut Region,
    registry: &TypeRegistry,
    ty: TypeId,
    offset: u64,
) -> Result<()> {
    let def = registry.get(ty);
    if def.fundamental() != ty {
        return Err(Error::invariant_violation(format!(
            "cannot decode non-fundamental type {}",
            registry.ty(ty)
        )));
    }

    match def.type_kind() {
        TypeKind::Boolean => region.store_bool(offset, reader.read_bool()?),
        TypeKind::Int32 => region.store_i32(offset, reader.read_int()?),
        TypeKind::Int64 => region.store_i64(offset, reader.read_long()?),
        TypeKind::Float32 => region.store_f32(offset, reader.read_float()?),
        TypeKind::Float64 => region.store_f64(offset, reader.read_double()?),
        TypeKind::String => {
            let n = read_length(reader, "string")?;
            let content = allocate_content(reader, region, 4, Some(4 + n), "string", n)?;
            region.store_i32(content, n as i32);
            reader.read_bytes(region.bytes_mut(content + 4, n))?;
            region.store_offset(offset, content);
        }
        TypeKind::Struct(st) => {
            reader.read_bytes(region.bytes_mut(offset, st.missing_bits_size()))?;
            for (i, field) in st.fields().iter().enumerate() {
                if !region.is_field_missing(st, offset, i) {
                    let field_offset = offset + st.field_offset(i);
                    decode_into(reader, region, registry, field.ty, field_offset)?;
                }
            }
        }
        TypeKind::Array(at) => {
            let n = read_length(reader, "array")?;
            let alignment = at.content_alignment();
            let size = at.checked_content_size(n);
            let content = allocate_content(reader, region, alignment, size, "array", n)?;
            region.store_i32(content, n as i32);
            reader.read_bytes(region.bytes_mut(content + 4, at.missing_bits_size(n)))?;
            for i in 0..n {
                if !region.is_element_missing(at, content, i) {
                    decode_into(
                        reader,
                        region,
                        registry,
                        at.element(),
                        content + at.element_offset(n, i),
                    )?;
                }
            }
            region.store_offset(offset, content);
        }
        TypeKind::Set { .. }
        | TypeKind::Call { .. }
        | TypeKind::Locus { .. }
        | TypeKind::AltAllele { .. }
        | TypeKind::Variant { .. } => {
            return Err(Error::invariant_violation(format!(
                "compound type {} reached the decoder",
                registry.ty(ty)
            )));
        }
    }
    Ok(())
}

fn read_length<R: Read>(reader: &mut BlockReader<R>, what: &str) -> Result<u64> {
    let n = reader.read_int()?;
    if n < 0 {
        return Err(reader.corrupt(format!("negative {what} length {n}")));
    }
    Ok(n as u64)
}

/// Allocates the out-of-line content of a value whose `size` was derived from
/// a length read from the stream. A size that overflows or would push the
/// region past the reader's value limit is corruption.
fn allocate_content<R: Read>(
    reader: &BlockReader<R>,
    region: &mut Region,
    alignment: u64,
    size: Option<u64>,
    what: &str,
    n: u64,
) -> Result<u64> {
    let limit = reader.max_value_bytes();
    let fits = |size: &u64| region.len().checked_add(*size).is_some_and(|end| end <= limit);
    match size.filter(fits) {
        Some(size) => region.try_allocate(alignment, size),
        None => Err(reader.corrupt(format!(
            "{what} length {n} exceeds the value limit of {limit} bytes"
        ))),
    }
}
