#![allow(dead_code)]

use anyhow::{anyhow, Result};
use bytes::Bytes;
use classwrite::{pool::ConstantEntry, FieldWriter, SymbolTable};
use lazy_static::lazy_static;
use support::bytes_ext::{ByteVector, SafeBuf};
use tracing::Level;
use tracing_subscriber::fmt;

lazy_static! {
    static ref TRACING: () = {
        let _ = fmt()
            .with_max_level(Level::TRACE)
            .with_test_writer()
            .try_init();
    };
}

pub fn init_tracing() {
    lazy_static::initialize(&TRACING);
}

#[derive(Debug, Clone)]
pub struct RawAttribute {
    pub name: u16,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct RawField {
    pub access: u16,
    pub name: u16,
    pub descriptor: u16,
    pub attributes: Vec<RawAttribute>,
}

impl RawField {
    pub fn attribute_names(&self, pool: &SymbolTable) -> Vec<String> {
        self.attributes
            .iter()
            .map(|attribute| utf8(pool, attribute.name))
            .collect()
    }

    pub fn attribute(&self, pool: &SymbolTable, name: &str) -> Option<&RawAttribute> {
        self.attributes
            .iter()
            .find(|attribute| utf8(pool, attribute.name) == name)
    }
}

/// Pulls one field_info off the front of `bytes`
pub fn read_field(bytes: &mut Bytes) -> Result<RawField> {
    let access = bytes.try_get_u16()?;
    let name = bytes.try_get_u16()?;
    let descriptor = bytes.try_get_u16()?;
    let count = bytes.try_get_u16()?;

    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = bytes.try_get_u16()?;
        let length = bytes.try_get_u32()? as usize;
        if bytes.len() < length {
            return Err(anyhow!("attribute claims {} bytes, {} left", length, bytes.len()));
        }

        attributes.push(RawAttribute {
            name,
            data: bytes.split_to(length),
        });
    }

    Ok(RawField {
        access,
        name,
        descriptor,
        attributes,
    })
}

/// Runs both passes over one field and checks they agree
pub fn encode(pool: &mut SymbolTable, field: &mut FieldWriter) -> Result<Bytes> {
    let size = field.compute_size(pool)?;

    let mut out = ByteVector::new();
    field.write(pool, &mut out)?;

    assert_eq!(out.len(), size as usize, "size pass and write pass disagree");
    Ok(out.freeze())
}

pub fn utf8(pool: &SymbolTable, index: u16) -> String {
    match pool.get(index) {
        Some(ConstantEntry::Utf8(value)) => value.clone(),
        other => panic!("expected utf8 at #{} got {:?}", index, other),
    }
}
