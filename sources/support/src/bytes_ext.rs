use anyhow::anyhow;
use bytes::{BufMut, Bytes, BytesMut};

/// Checked big-endian reads over any `bytes::Buf`, used to pick apart
/// written output. Each `try_get_*` fails instead of panicking when the
/// buffer runs dry.
macro_rules! checked_reads {
    ( $($type:ty),* ) => {
        pub trait SafeBuf: bytes::Buf {
            paste::paste! {
                $(
                fn [<try_get_ $type>](&mut self) -> anyhow::Result<$type> {
                    let needed = std::mem::size_of::<$type>();
                    if self.remaining() < needed {
                        return Err(anyhow!(
                            "{} needs {} bytes, {} left",
                            stringify!($type),
                            needed,
                            self.remaining()
                        ));
                    }

                    Ok(self.[<get_ $type>]())
                }
                )*
            }
        }

        impl<T: bytes::Buf> SafeBuf for T {}
    };
}

checked_reads!(u8, u16, u32, i32, i64, f64);

/// A growable output buffer. All multi-byte values are written big endian,
/// which is what the class file format uses throughout.
#[derive(Debug, Clone, Default)]
pub struct ByteVector {
    data: BytesMut,
}

/**
This macro builds the `put_{number_type}` functions on ByteVector. They return
the buffer again so that writes can be chained.
 */
macro_rules! impl_put {
    ( $($type:ty),* ) => {
        impl ByteVector {
            paste::paste! {
                $(
                pub fn [<put_ $type>](&mut self, value: $type) -> &mut Self {
                    self.data.[<put_ $type>](value);
                    self
                }
                )*
            }
        }
    }
}

impl_put!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl ByteVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.put_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}
