pub mod mutf8;

use anyhow::Result;

use self::mutf8::ModifiedUtf8;

pub trait EncodingFormat {
    fn into_java(str: &str) -> Vec<u8>;
    fn from_java(data: &[u8]) -> Result<String>;
}

/// Encode a string into the form stored in CONSTANT_Utf8 entries
pub fn encode_string(str: &str) -> Vec<u8> {
    ModifiedUtf8::into_java(str)
}

pub fn decode_string(data: &[u8]) -> Result<String> {
    ModifiedUtf8::from_java(data)
}

/// The number of bytes `str` occupies once encoded, without allocating
pub fn encoded_len(str: &str) -> usize {
    str.encode_utf16().map(mutf8::unit_len).sum()
}
