//! Structural deep equality, the engine's terminal case.
//!
//! Values are rendered through their `serde::Serialize` impl into a `Shape`
//! tree and the trees are compared element by element. Map entries compare
//! without regard to order, so two hash maps holding the same pairs are
//! equal whatever their iteration order. Floats compare with `==` (NaN is
//! never equal to itself).
//!
//! Rendering is bounded by `MAX_DEPTH` levels, far past the nesting of
//! ordinary data (serde_json stops parsing at 128). The bound exists for
//! self-referential values, which would otherwise recurse forever. A value
//! that nests deeper, or whose `Serialize` impl reports an error, cannot be
//! rendered: `deep_equal` answers `false` for it, even against itself, and
//! logs a warning. `deep_equal_within` takes an explicit bound for data
//! that legitimately nests deeper. Neither panics.

use serde::ser::{self, Serialize};

/// Default nesting the renderer follows before giving up on a value.
pub const MAX_DEPTH: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("{0}")]
    Custom(String),
    #[error("value nests deeper than {0} levels")]
    TooDeep(usize),
}

impl ser::Error for ShapeError {
    fn custom<T: core::fmt::Display>(msg: T) -> Self {
        ShapeError::Custom(msg.to_string())
    }
}

/// Rendered structure of a value.
#[derive(Debug, Clone)]
pub enum Shape {
    Unit,
    Bool(bool),
    Int(i128),
    UInt(u128),
    Float(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    None,
    Some(Box<Shape>),
    /// Unit structs, named by type.
    Named(&'static str),
    /// Newtype structs and the payload of enum variants.
    Wrapped(&'static str, Box<Shape>),
    Variant {
        name: &'static str,
        variant: &'static str,
        payload: Box<Shape>,
    },
    Seq(Vec<Shape>),
    Map(Vec<(Shape, Shape)>),
    Struct(&'static str, Vec<(&'static str, Shape)>),
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        use Shape::*;
        match (self, other) {
            (Unit, Unit) | (None, None) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Some(a), Some(b)) => a == b,
            (Named(a), Named(b)) => a == b,
            (Wrapped(na, a), Wrapped(nb, b)) => na == nb && a == b,
            (
                Variant {
                    name: na,
                    variant: va,
                    payload: a,
                },
                Variant {
                    name: nb,
                    variant: vb,
                    payload: b,
                },
            ) => na == nb && va == vb && a == b,
            (Seq(a), Seq(b)) => a == b,
            (Struct(na, a), Struct(nb, b)) => na == nb && a == b,
            (Map(a), Map(b)) => same_entries(a, b),
            _ => false,
        }
    }
}

// Entries compare as multisets: each entry of `b` pairs with at most one
// entry of `a`.
fn same_entries(a: &[(Shape, Shape)], b: &[(Shape, Shape)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut taken = vec![false; b.len()];
    a.iter().all(|(ka, va)| {
        let hit = b
            .iter()
            .zip(taken.iter())
            .position(|((kb, vb), &used)| !used && ka == kb && va == vb);
        match hit {
            Some(i) => {
                taken[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Render `value` into a `Shape`, nesting at most `MAX_DEPTH` levels.
pub fn shape_of<T: Serialize + ?Sized>(value: &T) -> Result<Shape, ShapeError> {
    shape_within(value, MAX_DEPTH)
}

/// Render `value` into a `Shape`, nesting at most `max_depth` levels.
pub fn shape_within<T: Serialize + ?Sized>(
    value: &T,
    max_depth: usize,
) -> Result<Shape, ShapeError> {
    value.serialize(ShapeSerializer {
        depth: 0,
        max_depth,
    })
}

/// Structural equality of `a` and `b`. Unrenderable values are unequal.
pub fn deep_equal<T: Serialize + ?Sized>(a: &T, b: &T) -> bool {
    deep_equal_within(a, b, MAX_DEPTH)
}

/// `deep_equal` with an explicit nesting bound.
pub fn deep_equal_within<T: Serialize + ?Sized>(a: &T, b: &T, max_depth: usize) -> bool {
    match (shape_within(a, max_depth), shape_within(b, max_depth)) {
        (Ok(sa), Ok(sb)) => sa == sb,
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(
                error = %e,
                ty = core::any::type_name::<T>(),
                "structural comparison could not render value; treating as unequal"
            );
            false
        }
    }
}

#[derive(Clone, Copy)]
struct ShapeSerializer {
    depth: usize,
    max_depth: usize,
}

impl ShapeSerializer {
    /// Serializer for a value nested one level below this one.
    fn child(self) -> Result<ShapeSerializer, ShapeError> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(ShapeError::TooDeep(self.max_depth));
        }
        Ok(ShapeSerializer { depth, ..self })
    }

    fn nested<T: Serialize + ?Sized>(self, value: &T) -> Result<Shape, ShapeError> {
        value.serialize(self.child()?)
    }
}

struct SeqBuilder {
    ser: ShapeSerializer,
    items: Vec<Shape>,
    wrap: SeqWrap,
}

enum SeqWrap {
    Plain,
    Named(&'static str),
    Variant(&'static str, &'static str),
}

impl SeqBuilder {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        self.items.push(self.ser.nested(value)?);
        Ok(())
    }

    fn finish(self) -> Shape {
        let seq = Shape::Seq(self.items);
        match self.wrap {
            SeqWrap::Plain => seq,
            SeqWrap::Named(name) => Shape::Wrapped(name, Box::new(seq)),
            SeqWrap::Variant(name, variant) => Shape::Variant {
                name,
                variant,
                payload: Box::new(seq),
            },
        }
    }
}

struct MapBuilder {
    ser: ShapeSerializer,
    entries: Vec<(Shape, Shape)>,
    pending_key: Option<Shape>,
}

struct StructBuilder {
    ser: ShapeSerializer,
    name: &'static str,
    variant: Option<&'static str>,
    fields: Vec<(&'static str, Shape)>,
}

impl StructBuilder {
    fn finish(self) -> Shape {
        let body = Shape::Struct(self.name, self.fields);
        match self.variant {
            None => body,
            Some(variant) => Shape::Variant {
                name: self.name,
                variant,
                payload: Box::new(body),
            },
        }
    }
}

impl ser::Serializer for ShapeSerializer {
    type Ok = Shape;
    type Error = ShapeError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    fn serialize_bool(self, v: bool) -> Result<Shape, ShapeError> {
        Ok(Shape::Bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<Shape, ShapeError> {
        Ok(Shape::Int(v.into()))
    }
    fn serialize_i16(self, v: i16) -> Result<Shape, ShapeError> {
        Ok(Shape::Int(v.into()))
    }
    fn serialize_i32(self, v: i32) -> Result<Shape, ShapeError> {
        Ok(Shape::Int(v.into()))
    }
    fn serialize_i64(self, v: i64) -> Result<Shape, ShapeError> {
        Ok(Shape::Int(v.into()))
    }
    fn serialize_i128(self, v: i128) -> Result<Shape, ShapeError> {
        Ok(Shape::Int(v))
    }
    fn serialize_u8(self, v: u8) -> Result<Shape, ShapeError> {
        Ok(Shape::UInt(v.into()))
    }
    fn serialize_u16(self, v: u16) -> Result<Shape, ShapeError> {
        Ok(Shape::UInt(v.into()))
    }
    fn serialize_u32(self, v: u32) -> Result<Shape, ShapeError> {
        Ok(Shape::UInt(v.into()))
    }
    fn serialize_u64(self, v: u64) -> Result<Shape, ShapeError> {
        Ok(Shape::UInt(v.into()))
    }
    fn serialize_u128(self, v: u128) -> Result<Shape, ShapeError> {
        Ok(Shape::UInt(v))
    }
    fn serialize_f32(self, v: f32) -> Result<Shape, ShapeError> {
        Ok(Shape::Float(v.into()))
    }
    fn serialize_f64(self, v: f64) -> Result<Shape, ShapeError> {
        Ok(Shape::Float(v))
    }
    fn serialize_char(self, v: char) -> Result<Shape, ShapeError> {
        Ok(Shape::Char(v))
    }
    fn serialize_str(self, v: &str) -> Result<Shape, ShapeError> {
        Ok(Shape::Str(v.to_owned()))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Shape, ShapeError> {
        Ok(Shape::Bytes(v.to_vec()))
    }
    fn serialize_none(self) -> Result<Shape, ShapeError> {
        Ok(Shape::None)
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Shape, ShapeError> {
        Ok(Shape::Some(Box::new(self.nested(value)?)))
    }
    fn serialize_unit(self) -> Result<Shape, ShapeError> {
        Ok(Shape::Unit)
    }
    fn serialize_unit_struct(self, name: &'static str) -> Result<Shape, ShapeError> {
        Ok(Shape::Named(name))
    }
    fn serialize_unit_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Shape, ShapeError> {
        Ok(Shape::Variant {
            name,
            variant,
            payload: Box::new(Shape::Unit),
        })
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Shape, ShapeError> {
        Ok(Shape::Wrapped(name, Box::new(self.nested(value)?)))
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Shape, ShapeError> {
        Ok(Shape::Variant {
            name,
            variant,
            payload: Box::new(self.nested(value)?),
        })
    }
    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, ShapeError> {
        Ok(SeqBuilder {
            ser: self,
            items: Vec::with_capacity(len.unwrap_or(0)),
            wrap: SeqWrap::Plain,
        })
    }
    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, ShapeError> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ShapeError> {
        Ok(SeqBuilder {
            ser: self,
            items: Vec::with_capacity(len),
            wrap: SeqWrap::Named(name),
        })
    }
    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ShapeError> {
        Ok(SeqBuilder {
            ser: self,
            items: Vec::with_capacity(len),
            wrap: SeqWrap::Variant(name, variant),
        })
    }
    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, ShapeError> {
        Ok(MapBuilder {
            ser: self,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }
    fn serialize_struct(self, name: &'static str, len: usize) -> Result<StructBuilder, ShapeError> {
        Ok(StructBuilder {
            ser: self,
            name,
            variant: None,
            fields: Vec::with_capacity(len),
        })
    }
    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructBuilder, ShapeError> {
        Ok(StructBuilder {
            ser: self,
            name,
            variant: Some(variant),
            fields: Vec::with_capacity(len),
        })
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        self.push(value)
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        self.push(value)
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        self.push(value)
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        self.push(value)
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ShapeError> {
        self.pending_key = Some(self.ser.nested(key)?);
        Ok(())
    }
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| ShapeError::Custom("map value without a key".into()))?;
        let value = self.ser.nested(value)?;
        self.entries.push((key, value));
        Ok(())
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(Shape::Map(self.entries))
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ShapeError> {
        let value = self.ser.nested(value)?;
        self.fields.push((key, value));
        Ok(())
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Shape;
    type Error = ShapeError;
    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ShapeError> {
        let value = self.ser.nested(value)?;
        self.fields.push((key, value));
        Ok(())
    }
    fn end(self) -> Result<Shape, ShapeError> {
        Ok(self.finish())
    }
}
