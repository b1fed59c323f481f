//! Reference encoder producing the exact byte layout [`decode`](crate::decoder::decode)
//! consumes. Used to write partition files for tests and tools.

use std::io::Write;

use vds_bytes::bits::{bitmap_bytes, put_bit};
use vds_common::{Result, error::Error};
use vds_io::BlockWriter;
use vds_region::Value;
use vds_types::{TypeId, TypeKind, TypeRegistry};

/// Encodes `value` as a present value of type `ty`.
///
/// `value` must be shaped like the fundamental form of `ty`: compound types are
/// supplied as their representation (a `Locus` as a two-field struct, a `Call`
/// as an `Int32`). `Value::Missing` is accepted only for nullable struct fields
/// and array elements.
pub fn encode<W: Write>(
    writer: &mut BlockWriter<W>,
    registry: &TypeRegistry,
    ty: TypeId,
    value: &Value,
) -> Result<()> {
    encode_present(writer, registry, registry.get(ty).fundamental(), value)
}

fn encode_present<W: Write>(
    writer: &mut BlockWriter<W>,
    registry: &TypeRegistry,
    ty: TypeId,
    value: &Value,
) -> Result<()> {
    match (registry.get(ty).type_kind(), value) {
        (TypeKind::Boolean, Value::Boolean(v)) => writer.write_bool(*v),
        (TypeKind::Int32, Value::Int32(v)) => writer.write_int(*v),
        (TypeKind::Int64, Value::Int64(v)) => writer.write_long(*v),
        (TypeKind::Float32, Value::Float32(v)) => writer.write_float(*v),
        (TypeKind::Float64, Value::Float64(v)) => writer.write_double(*v),
        (TypeKind::String, Value::String(s)) => {
            writer.write_int(encoded_length(s.len())?)?;
            writer.write_bytes(s.as_bytes())
        }
        (TypeKind::Struct(st), Value::Struct(fields)) => {
            if fields.len() != st.len() {
                return Err(Error::invalid_arg(
                    "value",
                    format!("{} fields supplied for {}", fields.len(), registry.ty(ty)),
                ));
            }
            let mut bitmap = vec![0u8; st.missing_bits_size() as usize];
            for (i, field) in fields.iter().enumerate() {
                if field.is_missing() {
                    let Some(bit) = st.field_missing_bit(i) else {
                        return Err(Error::invalid_arg(
                            "value",
                            format!("required field '{}' is missing", st.field(i).name),
                        ));
                    };
                    put_bit(&mut bitmap, bit, true);
                }
            }
            writer.write_bytes(&bitmap)?;
            for (i, field) in fields.iter().enumerate() {
                if !field.is_missing() {
                    encode_present(writer, registry, st.field(i).ty, field)?;
                }
            }
            Ok(())
        }
        (TypeKind::Array(at), Value::Array(elements)) => {
            let n = elements.len();
            writer.write_int(encoded_length(n)?)?;
            if at.element_required() {
                if elements.iter().any(Value::is_missing) {
                    return Err(Error::invalid_arg(
                        "value",
                        format!("missing element in {}", registry.ty(ty)),
                    ));
                }
            } else {
                let mut bitmap = vec![0u8; bitmap_bytes(n as u64) as usize];
                for (i, element) in elements.iter().enumerate() {
                    if element.is_missing() {
                        put_bit(&mut bitmap, i as u64, true);
                    }
                }
                writer.write_bytes(&bitmap)?;
            }
            for element in elements.iter().filter(|e| !e.is_missing()) {
                encode_present(writer, registry, at.element(), element)?;
            }
            Ok(())
        }
        (_, Value::Missing) => Err(Error::invalid_arg(
            "value",
            format!("missing value for {}", registry.ty(ty)),
        )),
        (_, value) => Err(Error::invalid_arg(
            "value",
            format!("{value:?} does not match {}", registry.ty(ty)),
        )),
    }
}

fn encoded_length(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::invalid_arg("value", format!("length {len} exceeds i32")))
}
