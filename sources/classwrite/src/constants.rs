pub const MAGIC: u32 = 0xCAFEBABE;

/// The four u16 words every field_info starts with
pub const FIELD_HEADER_SIZE: u32 = 8;

/// u16 name index followed by u32 length
pub const ATTRIBUTE_HEADER_SIZE: u32 = 6;

/// Slots available to pool entries. `constant_pool_count` is a u16 holding
/// the slot count plus one.
pub const MAX_POOL_SLOTS: usize = u16::MAX as usize - 1;

pub const CONSTANT_VALUE: &str = "ConstantValue";
pub const SYNTHETIC: &str = "Synthetic";
pub const DEPRECATED: &str = "Deprecated";
pub const SIGNATURE: &str = "Signature";
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
