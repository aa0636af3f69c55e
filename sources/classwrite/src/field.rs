//! Encoding of a single field_info (JVMS §4.5).
//!
//! A field is written in two passes. `compute_size` runs during the class wide
//! size pass and is the only place attribute names get added to the pool.
//! `write` runs once every size is known and only looks names up, so it can
//! never grow the pool underneath sizes that were already handed out.

use support::bytes_ext::ByteVector;
use tracing::{debug, trace};

use crate::annotation::{Annotation, AnnotationChain, EncodedAnnotation};
use crate::constants::{self, ATTRIBUTE_HEADER_SIZE, FIELD_HEADER_SIZE};
use crate::error::{EncodeError, EncodeResult};
use crate::flags::FieldAccessFlags;
use crate::pool::{Constant, SymbolTable};

/// Optional attributes a field can carry, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    ConstantValue,
    Synthetic,
    Deprecated,
    Signature,
    RuntimeVisibleAnnotations,
}

impl AttributeKind {
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::ConstantValue => constants::CONSTANT_VALUE,
            AttributeKind::Synthetic => constants::SYNTHETIC,
            AttributeKind::Deprecated => constants::DEPRECATED,
            AttributeKind::Signature => constants::SIGNATURE,
            AttributeKind::RuntimeVisibleAnnotations => constants::RUNTIME_VISIBLE_ANNOTATIONS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Payload<'a> {
    Empty,
    Index(u16),
    Annotations(&'a AnnotationChain),
}

#[derive(Debug, Clone, Copy)]
struct PlannedAttribute<'a> {
    kind: AttributeKind,
    name: u16,
    payload: Payload<'a>,
}

impl PlannedAttribute<'_> {
    fn payload_len(&self) -> EncodeResult<u32> {
        match self.payload {
            Payload::Empty => Ok(0),
            Payload::Index(_) => Ok(2),
            Payload::Annotations(chain) => chain.size(),
        }
    }

    fn size(&self) -> EncodeResult<u32> {
        let payload = self.payload_len()?;
        payload
            .checked_add(ATTRIBUTE_HEADER_SIZE)
            .ok_or(EncodeError::LengthOverflow {
                what: "attribute",
                length: payload as usize,
            })
    }

    fn put(&self, out: &mut ByteVector) -> EncodeResult<()> {
        trace!("writing {} attribute", self.kind.name());
        out.put_u16(self.name);

        match self.payload {
            Payload::Empty => {
                out.put_u32(0);
            }
            Payload::Index(index) => {
                out.put_u32(2).put_u16(index);
            }
            Payload::Annotations(chain) => chain.put(out)?,
        }

        Ok(())
    }
}

/// Where attribute names come from while planning.
/// The size pass registers them, the write pass may only look them up.
trait NameSource {
    fn name_index(&mut self, name: &'static str) -> EncodeResult<u16>;
    fn is_pre_modern_format(&self) -> bool;
}

struct Registering<'p>(&'p mut SymbolTable);

impl NameSource for Registering<'_> {
    fn name_index(&mut self, name: &'static str) -> EncodeResult<u16> {
        self.0.intern_utf8(name)
    }

    fn is_pre_modern_format(&self) -> bool {
        self.0.is_pre_modern_format()
    }
}

struct Registered<'p>(&'p SymbolTable);

impl NameSource for Registered<'_> {
    fn name_index(&mut self, name: &'static str) -> EncodeResult<u16> {
        self.0
            .utf8_index(name)
            .ok_or_else(|| EncodeError::UnregisteredSymbol {
                value: name.to_string(),
            })
    }

    fn is_pre_modern_format(&self) -> bool {
        self.0.is_pre_modern_format()
    }
}

fn planned<'a, S: NameSource>(
    names: &mut S,
    kind: AttributeKind,
    payload: Payload<'a>,
) -> EncodeResult<PlannedAttribute<'a>> {
    Ok(PlannedAttribute {
        kind,
        name: names.name_index(kind.name())?,
        payload,
    })
}

/// A field declaration, resolved against the class's constant pool
#[derive(Debug, Clone)]
pub struct FieldWriter {
    access: FieldAccessFlags,
    name: u16,
    descriptor: u16,
    /// 0 when the field has no generic signature
    signature: u16,
    /// 0 when the field has no constant value
    value: u16,
    annotations: AnnotationChain,
    size: Option<u32>,
}

impl FieldWriter {
    pub fn new(
        pool: &mut SymbolTable,
        access: FieldAccessFlags,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
        value: Option<&Constant>,
    ) -> EncodeResult<Self> {
        // cheap rejection before the pool is touched at all
        if let Some(value) = value {
            value.field_tag()?;
        }

        let (name, descriptor, signature, value) = pool.atomically(|pool| {
            let name = pool.intern_utf8(name)?;
            let descriptor = pool.intern_utf8(descriptor)?;

            let signature = match signature {
                Some(signature) => pool.intern_utf8(signature)?,
                None => 0,
            };

            let value = match value {
                Some(value) => pool.intern_field_constant(value)?,
                None => 0,
            };

            Ok((name, descriptor, signature, value))
        })?;

        Ok(Self {
            access,
            name,
            descriptor,
            signature,
            value,
            annotations: AnnotationChain::new(),
            size: None,
        })
    }

    pub fn access(&self) -> FieldAccessFlags {
        self.access
    }

    pub fn name_index(&self) -> u16 {
        self.name
    }

    pub fn descriptor_index(&self) -> u16 {
        self.descriptor
    }

    pub fn signature_index(&self) -> Option<u16> {
        (self.signature != 0).then_some(self.signature)
    }

    pub fn value_index(&self) -> Option<u16> {
        (self.value != 0).then_some(self.value)
    }

    pub fn annotations(&self) -> &AnnotationChain {
        &self.annotations
    }

    /// The size from the last `compute_size`, if it has run
    pub fn size(&self) -> Option<u32> {
        self.size
    }

    /// Attaches a runtime visible annotation. It is encoded straight away and
    /// will be written ahead of every annotation added before it.
    pub fn visit_annotation(
        &mut self,
        pool: &mut SymbolTable,
        annotation: &Annotation,
    ) -> EncodeResult<()> {
        if self.size.is_some() {
            return Err(EncodeError::RecordSealed);
        }

        let encoded = EncodedAnnotation::encode(pool, annotation)?;
        self.annotations.push(encoded);
        Ok(())
    }

    fn plan<S: NameSource>(&self, names: &mut S) -> EncodeResult<Vec<PlannedAttribute<'_>>> {
        let mut plan = Vec::with_capacity(5);

        if self.value != 0 {
            plan.push(planned(
                names,
                AttributeKind::ConstantValue,
                Payload::Index(self.value),
            )?);
        }

        if self
            .access
            .has_synthetic_attribute(names.is_pre_modern_format())
        {
            plan.push(planned(names, AttributeKind::Synthetic, Payload::Empty)?);
        }

        if self.access.is_deprecated() {
            plan.push(planned(names, AttributeKind::Deprecated, Payload::Empty)?);
        }

        if self.signature != 0 {
            plan.push(planned(
                names,
                AttributeKind::Signature,
                Payload::Index(self.signature),
            )?);
        }

        if !self.annotations.is_empty() {
            plan.push(planned(
                names,
                AttributeKind::RuntimeVisibleAnnotations,
                Payload::Annotations(&self.annotations),
            )?);
        }

        Ok(plan)
    }

    /// Which attributes this field will be written with
    pub fn attribute_kinds(&self, pool: &SymbolTable) -> EncodeResult<Vec<AttributeKind>> {
        Ok(self
            .plan(&mut Registered(pool))?
            .iter()
            .map(|attribute| attribute.kind)
            .collect())
    }

    /// Returns the number of bytes `write` will produce, registering every
    /// attribute name the field needs along the way.
    pub fn compute_size(&mut self, pool: &mut SymbolTable) -> EncodeResult<u32> {
        let size = {
            let plan = self.plan(&mut Registering(pool))?;
            let mut size = FIELD_HEADER_SIZE;

            for attribute in &plan {
                let attribute_size = attribute.size()?;
                size = size
                    .checked_add(attribute_size)
                    .ok_or(EncodeError::LengthOverflow {
                        what: "field",
                        length: size as usize + attribute_size as usize,
                    })?;
            }

            debug!(
                "field #{}:#{} has {} attributes, {} bytes",
                self.name,
                self.descriptor,
                plan.len(),
                size
            );

            size
        };

        self.size = Some(size);
        Ok(size)
    }

    /// Appends the field_info to `out`. Must follow `compute_size`.
    pub fn write(&self, pool: &SymbolTable, out: &mut ByteVector) -> EncodeResult<()> {
        let expected = self.size.ok_or(EncodeError::SizeNotComputed)?;
        let plan = self.plan(&mut Registered(pool))?;
        let start = out.len();

        out.put_u16(self.access.emitted_bits())
            .put_u16(self.name)
            .put_u16(self.descriptor)
            .put_u16(plan.len() as u16);

        for attribute in &plan {
            attribute.put(out)?;
        }

        let actual = out.len() - start;
        if actual != expected as usize {
            return Err(EncodeError::EncodingInvariantViolation {
                expected,
                actual: actual as u32,
            });
        }

        Ok(())
    }
}
