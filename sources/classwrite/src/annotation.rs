//! Runtime visible annotations (JVMS §4.7.16).
//!
//! Annotations are encoded to bytes as soon as they are attached to a field.
//! Every symbol they reference therefore lands in the pool up front, and
//! their size is known long before the field is written.

use std::collections::VecDeque;

use bytes::Bytes;
use support::bytes_ext::ByteVector;
use tracing::trace;

use crate::error::{EncodeError, EncodeResult};
use crate::pool::{Constant, SymbolTable};

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Enum { descriptor: String, constant: String },
    /// A class literal, given as a return descriptor such as `Ljava/lang/Object;` or `V`
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn tag(&self) -> u8 {
        match self {
            ElementValue::Byte(_) => b'B',
            ElementValue::Char(_) => b'C',
            ElementValue::Double(_) => b'D',
            ElementValue::Float(_) => b'F',
            ElementValue::Int(_) => b'I',
            ElementValue::Long(_) => b'J',
            ElementValue::Short(_) => b'S',
            ElementValue::Boolean(_) => b'Z',
            ElementValue::String(_) => b's',
            ElementValue::Enum { .. } => b'e',
            ElementValue::Class(_) => b'c',
            ElementValue::Annotation(_) => b'@',
            ElementValue::Array(_) => b'[',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface, e.g. `Ljava/lang/Deprecated;`
    pub descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            elements: vec![],
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.elements.push((name.into(), value));
        self
    }
}

fn count(what: &'static str, length: usize) -> EncodeResult<u16> {
    u16::try_from(length).map_err(|_| EncodeError::LengthOverflow { what, length })
}

fn put_annotation(
    pool: &mut SymbolTable,
    annotation: &Annotation,
    out: &mut ByteVector,
) -> EncodeResult<()> {
    let descriptor = pool.intern_utf8(&annotation.descriptor)?;
    let pairs = count("element value pairs", annotation.elements.len())?;
    out.put_u16(descriptor).put_u16(pairs);

    for (name, value) in &annotation.elements {
        let name = pool.intern_utf8(name)?;
        out.put_u16(name);
        put_element_value(pool, value, out)?;
    }

    Ok(())
}

fn put_element_value(
    pool: &mut SymbolTable,
    value: &ElementValue,
    out: &mut ByteVector,
) -> EncodeResult<()> {
    out.put_u8(value.tag());

    let index = match value {
        ElementValue::Byte(v) => pool.intern_constant(&Constant::Byte(*v))?,
        ElementValue::Char(v) => pool.intern_constant(&Constant::Char(*v))?,
        ElementValue::Double(v) => pool.intern_constant(&Constant::Double(*v))?,
        ElementValue::Float(v) => pool.intern_constant(&Constant::Float(*v))?,
        ElementValue::Int(v) => pool.intern_constant(&Constant::Int(*v))?,
        ElementValue::Long(v) => pool.intern_constant(&Constant::Long(*v))?,
        ElementValue::Short(v) => pool.intern_constant(&Constant::Short(*v))?,
        ElementValue::Boolean(v) => pool.intern_constant(&Constant::Boolean(*v))?,
        ElementValue::String(v) | ElementValue::Class(v) => pool.intern_utf8(v)?,
        ElementValue::Enum {
            descriptor,
            constant,
        } => {
            let descriptor = pool.intern_utf8(descriptor)?;
            let constant = pool.intern_utf8(constant)?;
            out.put_u16(descriptor).put_u16(constant);
            return Ok(());
        }
        ElementValue::Annotation(nested) => return put_annotation(pool, nested, out),
        ElementValue::Array(values) => {
            out.put_u16(count("array element values", values.len())?);
            for value in values {
                put_element_value(pool, value, out)?;
            }
            return Ok(());
        }
    };

    out.put_u16(index);
    Ok(())
}

/// One annotation, already encoded against a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAnnotation {
    bytes: Bytes,
}

impl EncodedAnnotation {
    pub fn encode(pool: &mut SymbolTable, annotation: &Annotation) -> EncodeResult<Self> {
        let mut out = ByteVector::new();
        pool.atomically(|pool| put_annotation(pool, annotation, &mut out))?;

        trace!(
            "encoded annotation {} into {} bytes",
            annotation.descriptor,
            out.len()
        );

        Ok(Self { bytes: out.freeze() })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The annotations of one member, most recently added first
#[derive(Debug, Clone, Default)]
pub struct AnnotationChain {
    entries: VecDeque<EncodedAnnotation>,
}

impl AnnotationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: EncodedAnnotation) {
        self.entries.push_front(annotation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncodedAnnotation> {
        self.entries.iter()
    }

    /// Length of the attribute body: num_annotations plus every annotation
    pub fn size(&self) -> EncodeResult<u32> {
        let length = 2 + self.entries.iter().map(EncodedAnnotation::len).sum::<usize>();
        u32::try_from(length).map_err(|_| EncodeError::LengthOverflow {
            what: "annotations attribute",
            length,
        })
    }

    /// Writes attribute_length followed by the attribute body
    pub fn put(&self, out: &mut ByteVector) -> EncodeResult<()> {
        let size = self.size()?;
        let annotations = count("annotations", self.entries.len())?;
        out.put_u32(size).put_u16(annotations);

        for annotation in &self.entries {
            out.put_slice(annotation.bytes());
        }

        Ok(())
    }
}
