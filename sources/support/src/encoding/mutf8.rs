use super::EncodingFormat;
use anyhow::{anyhow, bail, Result};

/// The "modified UTF-8" used by class files (JVMS §4.4.7).
/// NUL is written as two bytes and characters outside the BMP are written
/// as a surrogate pair, each half taking three bytes.
pub struct ModifiedUtf8;

pub(crate) fn unit_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

impl EncodingFormat for ModifiedUtf8 {
    fn into_java(str: &str) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(str.len());

        // work in utf16 units so surrogate pairs fall out for free
        for unit in str.encode_utf16() {
            match unit_len(unit) {
                1 => bytes.push(unit as u8),
                2 => {
                    bytes.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                    bytes.push(0x80 | (unit & 0x3F) as u8);
                }
                _ => {
                    bytes.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                    bytes.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                    bytes.push(0x80 | (unit & 0x3F) as u8);
                }
            }
        }

        bytes
    }

    fn from_java(data: &[u8]) -> Result<String> {
        let mut units: Vec<u16> = Vec::with_capacity(data.len());
        let mut i = 0;

        let continuation = |at: usize| -> Result<u16> {
            let byte = *data
                .get(at)
                .ok_or_else(|| anyhow!("truncated sequence at byte {}", at))?;

            if byte & 0xC0 != 0x80 {
                bail!("expected continuation byte at {} got {:#x}", at, byte);
            }

            Ok((byte & 0x3F) as u16)
        };

        while i < data.len() {
            let lead = data[i] as u16;
            match lead >> 4 {
                0x0..=0x7 => {
                    units.push(lead);
                    i += 1;
                }
                0xC | 0xD => {
                    units.push(((lead & 0x1F) << 6) | continuation(i + 1)?);
                    i += 2;
                }
                0xE => {
                    units.push(
                        ((lead & 0x0F) << 12) | (continuation(i + 1)? << 6) | continuation(i + 2)?,
                    );
                    i += 3;
                }
                _ => bail!("invalid lead byte {:#x} at {}", lead, i),
            }
        }

        Ok(String::from_utf16(&units)?)
    }
}
