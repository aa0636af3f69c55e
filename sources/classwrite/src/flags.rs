//! defines the bitflags written into class and field access words
//! field flags carry two writer-only pseudo flags above the u16 range, which
//! are stripped before the word is emitted

use bitflags::bitflags;
use tracing::warn;

macro_rules! impl_flags {
    ( $flag_type:ident, $raw:ty ) => {
        impl $flag_type {
            /// Bits outside the declared set are dropped with a warning, they
            /// never reach the emitted access word.
            pub fn from_raw(raw: $raw) -> Self {
                match <$flag_type>::from_bits(raw) {
                    Some(flags) => flags,
                    None => {
                        warn!("unrecognised bits {:b} for {}", raw, stringify!($flag_type));
                        <$flag_type>::from_bits_truncate(raw)
                    }
                }
            }

            pub fn has(&self, other: $flag_type) -> bool {
                self.contains(other)
            }
        }
    };
}

bitflags! {
    pub struct ClassAccessFlags: u16 {
         const PUBLIC = 0x0001;
         const FINAL = 0x0010;
         const SUPER = 0x0020;
         const INTERFACE = 0x0200;
         const ABSTRACT = 0x0400;
         const SYNTHETIC = 0x1000;
         const ANNOTATION = 0x2000;
         const ENUM = 0x4000;
         const MODULE = 0x8000;
    }
}

bitflags! {
    pub struct FieldAccessFlags: u32 {
         const PUBLIC = 0x0001;
         const PRIVATE = 0x0002;
         const PROTECTED = 0x0004;
         const STATIC = 0x0008;
         const FINAL = 0x0010;
         const VOLATILE = 0x0040;
         const TRANSIENT = 0x0080;
         const SYNTHETIC = 0x1000;
         const ENUM = 0x4000;

         /// Emit a Deprecated attribute. Never written into the flags word.
         const DEPRECATED = 0x20000;
         /// Signal SYNTHETIC through the Synthetic attribute rather than the
         /// flag bit. Never written into the flags word.
         const SYNTHETIC_ATTRIBUTE = 0x40000;
    }
}

impl_flags!(ClassAccessFlags, u16);
impl_flags!(FieldAccessFlags, u32);

impl FieldAccessFlags {
    /// Whether a Synthetic attribute must accompany the field
    pub fn has_synthetic_attribute(&self, pre_modern_format: bool) -> bool {
        self.has(Self::SYNTHETIC) && (self.has(Self::SYNTHETIC_ATTRIBUTE) || pre_modern_format)
    }

    pub fn is_deprecated(&self) -> bool {
        self.has(Self::DEPRECATED)
    }

    /// The access_flags word as it appears in the field_info.
    /// The pseudo flags are dropped, and when synthetic is signalled through
    /// the attribute the SYNTHETIC bit goes with them.
    pub fn emitted_bits(&self) -> u16 {
        let mut mask = Self::DEPRECATED | Self::SYNTHETIC_ATTRIBUTE;
        if self.has(Self::SYNTHETIC_ATTRIBUTE) {
            mask |= Self::SYNTHETIC;
        }

        (*self - mask).bits() as u16
    }
}
