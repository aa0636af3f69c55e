use std::collections::HashMap;

use enum_as_inner::EnumAsInner;
use support::bytes_ext::ByteVector;
use support::encoding::{encode_string, encoded_len};
use tracing::trace;

use crate::config::ClassVersion;
use crate::constants::MAX_POOL_SLOTS;
use crate::error::{EncodeError, EncodeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantTag {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    MethodType,
}

impl ConstantTag {
    pub fn tag(&self) -> u8 {
        match self {
            ConstantTag::Utf8 => 1,
            ConstantTag::Integer => 3,
            ConstantTag::Float => 4,
            ConstantTag::Long => 5,
            ConstantTag::Double => 6,
            ConstantTag::Class => 7,
            ConstantTag::String => 8,
            ConstantTag::MethodType => 16,
        }
    }
}

/// A constant as handed to the writer, before it lives in the pool.
/// Booleans, bytes, chars and shorts share CONSTANT_Integer with ints.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(String),
    MethodType(String),
}

macro_rules! from_native {
    ( $( $x:ty => $variant:ident ),* ) => {
        $(
            impl From<$x> for Constant {
                fn from(value: $x) -> Self {
                    Constant::$variant(value.into())
                }
            }
        )*
    };
}

from_native!(
    bool => Boolean,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    f32 => Float,
    i64 => Long,
    f64 => Double,
    &str => String,
    String => String
);

impl Constant {
    pub fn kind(&self) -> &'static str {
        match self {
            Constant::Boolean(_) => "boolean",
            Constant::Byte(_) => "byte",
            Constant::Char(_) => "char",
            Constant::Short(_) => "short",
            Constant::Int(_) => "int",
            Constant::Float(_) => "float",
            Constant::Long(_) => "long",
            Constant::Double(_) => "double",
            Constant::String(_) => "string",
            Constant::Class(_) => "class",
            Constant::MethodType(_) => "method type",
        }
    }

    /// The pool entry kind a ConstantValue attribute would point at, if this
    /// constant can back a field at all
    pub fn field_tag(&self) -> EncodeResult<ConstantTag> {
        match self {
            Constant::Boolean(_)
            | Constant::Byte(_)
            | Constant::Char(_)
            | Constant::Short(_)
            | Constant::Int(_) => Ok(ConstantTag::Integer),
            Constant::Float(_) => Ok(ConstantTag::Float),
            Constant::Long(_) => Ok(ConstantTag::Long),
            Constant::Double(_) => Ok(ConstantTag::Double),
            Constant::String(_) => Ok(ConstantTag::String),
            Constant::Class(_) | Constant::MethodType(_) => {
                Err(EncodeError::UnsupportedConstantType { kind: self.kind() })
            }
        }
    }
}

#[derive(EnumAsInner, Debug, Clone, PartialEq)]
pub enum ConstantEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    MethodType(u16),
    /// Second slot of a Long or Double
    Reserved,
}

impl ConstantEntry {
    pub fn tag(&self) -> Option<ConstantTag> {
        match self {
            ConstantEntry::Utf8(_) => Some(ConstantTag::Utf8),
            ConstantEntry::Integer(_) => Some(ConstantTag::Integer),
            ConstantEntry::Float(_) => Some(ConstantTag::Float),
            ConstantEntry::Long(_) => Some(ConstantTag::Long),
            ConstantEntry::Double(_) => Some(ConstantTag::Double),
            ConstantEntry::Class(_) => Some(ConstantTag::Class),
            ConstantEntry::String(_) => Some(ConstantTag::String),
            ConstantEntry::MethodType(_) => Some(ConstantTag::MethodType),
            ConstantEntry::Reserved => None,
        }
    }

    fn is_wide(&self) -> bool {
        matches!(self, ConstantEntry::Long(_) | ConstantEntry::Double(_))
    }

    /// Bytes this entry takes up in the pool, tag included
    fn byte_size(&self) -> usize {
        match self {
            ConstantEntry::Utf8(value) => 3 + encoded_len(value),
            ConstantEntry::Integer(_) | ConstantEntry::Float(_) => 5,
            ConstantEntry::Long(_) | ConstantEntry::Double(_) => 9,
            ConstantEntry::Class(_) | ConstantEntry::String(_) | ConstantEntry::MethodType(_) => 3,
            ConstantEntry::Reserved => 0,
        }
    }

    fn put(&self, out: &mut ByteVector) {
        let tag = match self.tag() {
            Some(tag) => tag.tag(),
            None => return,
        };
        out.put_u8(tag);

        match self {
            ConstantEntry::Utf8(value) => {
                let bytes = encode_string(value);
                out.put_u16(bytes.len() as u16).put_slice(&bytes);
            }
            ConstantEntry::Integer(value) => {
                out.put_i32(*value);
            }
            ConstantEntry::Float(value) => {
                out.put_f32(*value);
            }
            ConstantEntry::Long(value) => {
                out.put_i64(*value);
            }
            ConstantEntry::Double(value) => {
                out.put_f64(*value);
            }
            ConstantEntry::Class(index)
            | ConstantEntry::String(index)
            | ConstantEntry::MethodType(index) => {
                out.put_u16(*index);
            }
            ConstantEntry::Reserved => {}
        }
    }
}

/// Identity of a pool entry for deduplication. Floating point values compare
/// by bit pattern so NaN finds itself and 0.0 stays apart from -0.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    MethodType(u16),
}

impl From<&ConstantKey> for ConstantEntry {
    fn from(key: &ConstantKey) -> Self {
        match key {
            ConstantKey::Utf8(value) => ConstantEntry::Utf8(value.clone()),
            ConstantKey::Integer(value) => ConstantEntry::Integer(*value),
            ConstantKey::Float(bits) => ConstantEntry::Float(f32::from_bits(*bits)),
            ConstantKey::Long(value) => ConstantEntry::Long(*value),
            ConstantKey::Double(bits) => ConstantEntry::Double(f64::from_bits(*bits)),
            ConstantKey::Class(index) => ConstantEntry::Class(*index),
            ConstantKey::String(index) => ConstantEntry::String(*index),
            ConstantKey::MethodType(index) => ConstantEntry::MethodType(*index),
        }
    }
}

/// The constant pool of the class being written.
///
/// Entries are only ever appended, and interning the same value twice hands
/// back the index it got the first time. Indices are 1-based, Long and
/// Double entries take up two slots.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    version: ClassVersion,
    entries: Vec<ConstantEntry>,
    lookup: HashMap<ConstantKey, u16>,
}

impl SymbolTable {
    pub fn new(version: ClassVersion) -> Self {
        Self {
            version,
            entries: vec![],
            lookup: HashMap::new(),
        }
    }

    pub fn version(&self) -> ClassVersion {
        self.version
    }

    pub fn is_pre_modern_format(&self) -> bool {
        self.version.is_pre_modern()
    }

    fn intern(&mut self, key: ConstantKey) -> EncodeResult<u16> {
        if let Some(index) = self.lookup.get(&key) {
            return Ok(*index);
        }

        let entry = ConstantEntry::from(&key);
        let slots = if entry.is_wide() { 2 } else { 1 };
        if self.entries.len() + slots > MAX_POOL_SLOTS {
            return Err(EncodeError::PoolOverflow);
        }

        let index = (self.entries.len() + 1) as u16;
        trace!("pool #{} = {:?}", index, entry);

        self.entries.push(entry);
        if slots == 2 {
            self.entries.push(ConstantEntry::Reserved);
        }

        self.lookup.insert(key, index);
        Ok(index)
    }

    /// Runs `f` against the pool and, if it fails, drops every entry it added
    /// so the pool looks as if it had never been called.
    pub fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> EncodeResult<T>,
    ) -> EncodeResult<T> {
        let mark = self.entries.len();
        let result = f(self);

        if result.is_err() && self.entries.len() > mark {
            trace!("rolling pool back to {} slots", mark);
            self.entries.truncate(mark);
            self.lookup.retain(|_, index| (*index as usize) <= mark);
        }

        result
    }

    pub fn intern_utf8(&mut self, value: &str) -> EncodeResult<u16> {
        let length = encoded_len(value);
        if length > u16::MAX as usize {
            return Err(EncodeError::StringTooLong { length });
        }

        self.intern(ConstantKey::Utf8(value.to_string()))
    }

    /// `internal_name` is slash separated, e.g. `java/lang/Object`
    pub fn intern_class(&mut self, internal_name: &str) -> EncodeResult<u16> {
        let name = self.intern_utf8(internal_name)?;
        self.intern(ConstantKey::Class(name))
    }

    pub fn intern_constant(&mut self, value: &Constant) -> EncodeResult<u16> {
        let key = match value {
            Constant::Boolean(value) => ConstantKey::Integer(*value as i32),
            Constant::Byte(value) => ConstantKey::Integer(*value as i32),
            Constant::Char(value) => ConstantKey::Integer(*value as i32),
            Constant::Short(value) => ConstantKey::Integer(*value as i32),
            Constant::Int(value) => ConstantKey::Integer(*value),
            Constant::Float(value) => ConstantKey::Float(value.to_bits()),
            Constant::Long(value) => ConstantKey::Long(*value),
            Constant::Double(value) => ConstantKey::Double(value.to_bits()),
            Constant::String(value) => ConstantKey::String(self.intern_utf8(value)?),
            Constant::Class(value) => ConstantKey::Class(self.intern_utf8(value)?),
            Constant::MethodType(value) => ConstantKey::MethodType(self.intern_utf8(value)?),
        };

        self.intern(key)
    }

    /// Interns a constant for use in a ConstantValue attribute. Kinds that
    /// cannot initialise a field are rejected before anything is added.
    pub fn intern_field_constant(&mut self, value: &Constant) -> EncodeResult<u16> {
        value.field_tag()?;
        self.intern_constant(value)
    }

    /// Looks up an already interned Utf8 without adding it
    pub fn utf8_index(&self, value: &str) -> Option<u16> {
        self.lookup.get(&ConstantKey::Utf8(value.to_string())).copied()
    }

    pub fn get(&self, index: u16) -> Option<&ConstantEntry> {
        if index == 0 {
            return None;
        }

        self.entries.get((index - 1) as usize)
    }

    /// The `constant_pool_count` value: occupied slots plus one
    pub fn len(&self) -> u16 {
        (self.entries.len() + 1) as u16
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes `write` will produce, count included
    pub fn byte_size(&self) -> usize {
        2 + self.entries.iter().map(ConstantEntry::byte_size).sum::<usize>()
    }

    pub fn write(&self, out: &mut ByteVector) {
        out.put_u16(self.len());
        for entry in &self.entries {
            entry.put(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_deduplicates_utf8() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let first = pool.intern_utf8("value").unwrap();
        let second = pool.intern_utf8("other").unwrap();
        let again = pool.intern_utf8("value").unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(again, first);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn it_reserves_a_slot_after_wide_entries() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let long = pool.intern_constant(&Constant::Long(7)).unwrap();
        let next = pool.intern_constant(&Constant::Int(7)).unwrap();

        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert!(pool.get(2).unwrap().is_reserved());
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn it_folds_small_integrals_into_integer_entries() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let int = pool.intern_constant(&Constant::Int(1)).unwrap();

        assert_eq!(pool.intern_constant(&Constant::Boolean(true)).unwrap(), int);
        assert_eq!(pool.intern_constant(&Constant::Byte(1)).unwrap(), int);
        assert_eq!(pool.intern_constant(&Constant::Short(1)).unwrap(), int);
        assert_eq!(pool.intern_constant(&Constant::Char(1)).unwrap(), int);
    }

    #[test]
    fn it_compares_floats_by_bits() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let nan = pool.intern_constant(&Constant::Double(f64::NAN)).unwrap();
        assert_eq!(pool.intern_constant(&Constant::Double(f64::NAN)).unwrap(), nan);

        let zero = pool.intern_constant(&Constant::Float(0.0)).unwrap();
        let negative_zero = pool.intern_constant(&Constant::Float(-0.0)).unwrap();
        assert_ne!(zero, negative_zero);
    }

    #[test]
    fn it_interns_strings_through_utf8() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let string = pool.intern_constant(&"hello".into()).unwrap();
        let utf8 = pool.utf8_index("hello").unwrap();

        assert_eq!(utf8, 1);
        assert_eq!(string, 2);
        assert_eq!(pool.get(string).unwrap().as_string(), Some(&utf8));
    }

    #[test]
    fn it_rejects_class_literals_as_field_constants() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let err = pool
            .intern_field_constant(&Constant::Class("java/lang/String".to_string()))
            .unwrap_err();

        assert_eq!(err, EncodeError::UnsupportedConstantType { kind: "class" });
        assert!(pool.is_empty());
    }

    #[test]
    fn it_rejects_oversized_strings() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let long = "\0".repeat(40_000);

        assert_eq!(
            pool.intern_utf8(&long).unwrap_err(),
            EncodeError::StringTooLong { length: 80_000 }
        );
    }

    #[test]
    fn it_overflows_past_the_slot_limit() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        for i in 0..(MAX_POOL_SLOTS as i32) {
            pool.intern_constant(&Constant::Int(i)).unwrap();
        }

        assert_eq!(pool.len(), u16::MAX);
        assert_eq!(pool.intern_utf8("one more"), Err(EncodeError::PoolOverflow));
    }

    #[test]
    fn it_rolls_back_entries_added_by_a_failed_step() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let kept = pool.intern_utf8("kept").unwrap();

        let result = pool.atomically(|pool| {
            pool.intern_constant(&Constant::Double(2.0))?;
            pool.intern_utf8("dropped")?;
            pool.intern_utf8(&"\0".repeat(40_000))
        });

        assert_eq!(result, Err(EncodeError::StringTooLong { length: 80_000 }));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.utf8_index("kept"), Some(kept));
        assert_eq!(pool.utf8_index("dropped"), None);

        // indices handed out after the rollback reuse the freed slots
        assert_eq!(pool.intern_utf8("next").unwrap(), 2);
    }

    #[test]
    fn it_keeps_entries_from_a_successful_step() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        let index = pool
            .atomically(|pool| pool.intern_class("java/lang/Object"))
            .unwrap();

        assert_eq!(index, 2);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn it_writes_entries_with_their_tags() {
        let mut pool = SymbolTable::new(ClassVersion::V1_8);
        pool.intern_class("A").unwrap();
        pool.intern_constant(&Constant::Long(1)).unwrap();

        let mut out = ByteVector::new();
        pool.write(&mut out);

        assert_eq!(out.len(), pool.byte_size());
        assert_eq!(
            out.as_slice(),
            &[
                0x00, 0x05, // count: utf8, class, long (2 slots), +1
                0x01, 0x00, 0x01, b'A', // utf8 "A"
                0x07, 0x00, 0x01, // class #1
                0x05, 0, 0, 0, 0, 0, 0, 0, 0x01 // long 1
            ]
        );
    }
}
