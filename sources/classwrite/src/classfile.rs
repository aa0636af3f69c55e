use bytes::Bytes;
use support::bytes_ext::ByteVector;
use tracing::{debug, info};

use crate::annotation::Annotation;
use crate::config::WriterConfig;
use crate::constants::MAGIC;
use crate::error::{EncodeError, EncodeResult};
use crate::field::FieldWriter;
use crate::flags::{ClassAccessFlags, FieldAccessFlags};
use crate::pool::{Constant, SymbolTable};

#[derive(Debug, Clone)]
struct Header {
    access: ClassAccessFlags,
    name: String,
    this_class: u16,
    super_class: u16,
}

/// Builds a class file out of a header and its fields.
///
/// Everything that needs a pool entry gets one while the class is being
/// described; `to_bytes` then sizes every field before writing any of them.
#[derive(Debug, Clone)]
pub struct ClassWriter {
    config: WriterConfig,
    pool: SymbolTable,
    header: Option<Header>,
    fields: Vec<FieldWriter>,
}

/// A field that was just added, still open for annotations
pub struct FieldVisitor<'a> {
    pool: &'a mut SymbolTable,
    field: &'a mut FieldWriter,
}

impl FieldVisitor<'_> {
    pub fn visit_annotation(&mut self, annotation: &Annotation) -> EncodeResult<&mut Self> {
        self.field.visit_annotation(self.pool, annotation)?;
        Ok(self)
    }

    pub fn field(&self) -> &FieldWriter {
        self.field
    }
}

impl ClassWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            pool: SymbolTable::new(config.version),
            header: None,
            fields: vec![],
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn pool(&self) -> &SymbolTable {
        &self.pool
    }

    pub fn fields(&self) -> &[FieldWriter] {
        &self.fields
    }

    /// `name` and `super_name` are internal names, e.g. `java/lang/Object`.
    /// Only `java/lang/Object` itself should pass `None` for its super class.
    pub fn visit(
        &mut self,
        access: ClassAccessFlags,
        name: &str,
        super_name: Option<&str>,
    ) -> EncodeResult<()> {
        let this_class = self.pool.intern_class(name)?;
        let super_class = match super_name {
            Some(super_name) => self.pool.intern_class(super_name)?,
            None => 0,
        };

        self.header = Some(Header {
            access,
            name: name.to_string(),
            this_class,
            super_class,
        });

        Ok(())
    }

    pub fn visit_field(
        &mut self,
        access: FieldAccessFlags,
        name: &str,
        descriptor: &str,
        signature: Option<&str>,
        value: Option<Constant>,
    ) -> EncodeResult<FieldVisitor<'_>> {
        let mut access = access;
        if self.config.legacy_synthetic && access.has(FieldAccessFlags::SYNTHETIC) {
            access |= FieldAccessFlags::SYNTHETIC_ATTRIBUTE;
        }

        let field = FieldWriter::new(
            &mut self.pool,
            access,
            name,
            descriptor,
            signature,
            value.as_ref(),
        )?;

        let index = self.fields.len();
        self.fields.push(field);

        Ok(FieldVisitor {
            pool: &mut self.pool,
            field: &mut self.fields[index],
        })
    }

    /// Sizes every field, then writes the whole class file
    pub fn to_bytes(&mut self) -> EncodeResult<Bytes> {
        let header = self.header.clone().ok_or(EncodeError::HeaderNotVisited)?;

        let field_count =
            u16::try_from(self.fields.len()).map_err(|_| EncodeError::LengthOverflow {
                what: "fields",
                length: self.fields.len(),
            })?;

        // the size pass is the last point where the pool may grow
        let mut fields_size: usize = 0;
        for field in &mut self.fields {
            fields_size += field.compute_size(&mut self.pool)? as usize;
        }

        // magic, minor, major, pool, access, this, super,
        // interfaces, fields, methods, attributes
        let size = 4 + 2 + 2 + self.pool.byte_size() + 2 + 2 + 2 + 2 + 2 + fields_size + 2 + 2;
        debug!(
            "class {} has {} pool slots, {} fields, {} bytes",
            header.name,
            self.pool.len() - 1,
            field_count,
            size
        );

        let mut out = ByteVector::with_capacity(size);
        out.put_u32(MAGIC)
            .put_u16(self.config.version.minor)
            .put_u16(self.config.version.major);

        self.pool.write(&mut out);

        out.put_u16(header.access.bits())
            .put_u16(header.this_class)
            .put_u16(header.super_class)
            .put_u16(0)
            .put_u16(field_count);

        for field in &self.fields {
            field.write(&self.pool, &mut out)?;
        }

        out.put_u16(0).put_u16(0);

        if out.len() != size {
            return Err(EncodeError::EncodingInvariantViolation {
                expected: size as u32,
                actual: out.len() as u32,
            });
        }

        info!("wrote class {} ({} bytes)", header.name, size);
        Ok(out.freeze())
    }
}
