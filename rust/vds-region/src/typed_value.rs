use vds_common::{Result, error::Error, verify_data};
use vds_types::{Kind, Ty};

use crate::{region::Region, value::Value};

/// A typed, non-owning view of a value stored in a [`Region`].
///
/// The view is typed with the logical type (e.g. `Locus`), while its bytes are
/// laid out per the type's fundamental form. Navigation resolves compound
/// types to their representation, so a `Locus` view exposes the `contig` and
/// `pos` fields and a `Set` view exposes its elements.
///
/// The borrow on the region guarantees the view cannot outlive the next
/// `clear()` of the region.
#[derive(Clone, Copy)]
pub struct TypedRegionValue<'a> {
    region: &'a Region,
    offset: u64,
    ty: Ty<'a>,
}

impl<'a> TypedRegionValue<'a> {
    pub fn new(region: &'a Region, offset: u64, ty: Ty<'a>) -> TypedRegionValue<'a> {
        TypedRegionValue { region, offset, ty }
    }

    pub fn region(&self) -> &'a Region {
        self.region
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn ty(&self) -> Ty<'a> {
        self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.expect_kind(Kind::Boolean)?;
        Ok(self.region.load_bool(self.offset))
    }

    /// Reads an `Int32`, or the allele-pair code of a `Call`.
    pub fn as_i32(&self) -> Result<i32> {
        self.expect_kind(Kind::Int32)?;
        Ok(self.region.load_i32(self.offset))
    }

    pub fn as_i64(&self) -> Result<i64> {
        self.expect_kind(Kind::Int64)?;
        Ok(self.region.load_i64(self.offset))
    }

    pub fn as_f32(&self) -> Result<f32> {
        self.expect_kind(Kind::Float32)?;
        Ok(self.region.load_f32(self.offset))
    }

    pub fn as_f64(&self) -> Result<f64> {
        self.expect_kind(Kind::Float64)?;
        Ok(self.region.load_f64(self.offset))
    }

    pub fn as_bytes(&self) -> Result<&'a [u8]> {
        self.expect_kind(Kind::String)?;
        let content = self.region.load_offset(self.offset);
        let len = self.region.load_i32(content);
        verify_data!(string_len, len >= 0);
        Ok(self.region.bytes(content + 4, len as u64))
    }

    pub fn as_str(&self) -> Result<&'a str> {
        std::str::from_utf8(self.as_bytes()?)
            .map_err(|_| Error::invalid_format("string value"))
    }

    /// Number of fields of a struct-shaped value.
    pub fn field_count(&self) -> Result<usize> {
        match self.ty.fundamental().as_struct() {
            Some(st) => Ok(st.len()),
            None => Err(self.mismatch("struct field access")),
        }
    }

    /// Field `index` of a struct-shaped value, `None` if the field is missing.
    pub fn field_at(&self, index: usize) -> Result<Option<TypedRegionValue<'a>>> {
        let Some(st) = self.ty.fundamental().as_struct() else {
            return Err(self.mismatch("struct field access"));
        };
        if index >= st.len() {
            return Err(Error::invalid_arg(
                "index",
                format!("field {index} out of range for {}", self.ty),
            ));
        }
        let Some(field) = self.structural().field_type(index) else {
            return Err(self.mismatch("struct field access"));
        };
        if self.region.is_field_missing(st, self.offset, index) {
            return Ok(None);
        }
        Ok(Some(TypedRegionValue::new(
            self.region,
            self.offset + st.field_offset(index),
            field,
        )))
    }

    /// Field `name` of a struct-shaped value, `None` if the field is missing.
    pub fn field(&self, name: &str) -> Result<Option<TypedRegionValue<'a>>> {
        let logical = self.structural();
        let Some(st) = logical.as_struct() else {
            return Err(self.mismatch("struct field access"));
        };
        let Some((index, _)) = st.find_field(name) else {
            return Err(Error::invalid_arg(
                "name",
                format!("no field '{name}' in {}", self.ty),
            ));
        };
        self.field_at(index)
    }

    /// Length of an array-shaped value.
    pub fn array_len(&self) -> Result<u64> {
        self.expect_kind(Kind::Array)?;
        let content = self.region.load_offset(self.offset);
        let len = self.region.load_i32(content);
        verify_data!(array_len, len >= 0);
        Ok(len as u64)
    }

    /// Element `index` of an array-shaped value, `None` if the element is
    /// missing.
    pub fn element(&self, index: u64) -> Result<Option<TypedRegionValue<'a>>> {
        let fundamental = self.ty.fundamental();
        let (Some(element), Some(at)) = (self.structural().element(), fundamental.as_array())
        else {
            return Err(self.mismatch("array element access"));
        };
        let content = self.region.load_offset(self.offset);
        let len = self.region.load_i32(content) as u64;
        if index >= len {
            return Err(Error::invalid_arg(
                "index",
                format!("element {index} out of range for length {len}"),
            ));
        }
        if self.region.is_element_missing(at, content, index) {
            return Ok(None);
        }
        Ok(Some(TypedRegionValue::new(
            self.region,
            content + at.element_offset(len, index),
            element,
        )))
    }

    /// Copies the value into an owned [`Value`] tree.
    pub fn to_value(&self) -> Result<Value> {
        let value = match self.ty.fundamental().kind() {
            Kind::Boolean => Value::Boolean(self.as_bool()?),
            Kind::Int32 => Value::Int32(self.as_i32()?),
            Kind::Int64 => Value::Int64(self.as_i64()?),
            Kind::Float32 => Value::Float32(self.as_f32()?),
            Kind::Float64 => Value::Float64(self.as_f64()?),
            Kind::String => Value::String(self.as_str()?.to_string()),
            Kind::Struct => {
                let n = self.field_count()?;
                let mut fields = Vec::with_capacity(n);
                for i in 0..n {
                    fields.push(self.field_at(i)?.map_or(Ok(Value::Missing), |f| f.to_value())?);
                }
                Value::Struct(fields)
            }
            Kind::Array => {
                let n = self.array_len()?;
                let mut elements = Vec::with_capacity(n as usize);
                for i in 0..n {
                    elements.push(self.element(i)?.map_or(Ok(Value::Missing), |e| e.to_value())?);
                }
                Value::Array(elements)
            }
            other => {
                return Err(Error::invariant_violation(format!(
                    "{other:?} cannot be a fundamental type"
                )));
            }
        };
        Ok(value)
    }

    /// The logical type with compound layers replaced by their representation.
    fn structural(&self) -> Ty<'a> {
        let mut ty = self.ty;
        while let Some(representation) = ty.representation() {
            ty = representation;
        }
        ty
    }

    fn expect_kind(&self, kind: Kind) -> Result<()> {
        if self.ty.fundamental().kind() == kind {
            Ok(())
        } else {
            Err(self.mismatch(&format!("{kind:?} access")))
        }
    }

    fn mismatch(&self, what: &str) -> Error {
        Error::invariant_violation(format!("{what} on a value of type {}", self.ty))
    }
}

impl std::fmt::Debug for TypedRegionValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedRegionValue")
            .field("offset", &self.offset)
            .field("ty", &self.ty)
            .finish()
    }
}
