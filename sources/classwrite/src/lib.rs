pub mod annotation;
pub mod classfile;
pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod flags;
pub mod pool;

extern crate bytes;
extern crate enum_as_inner;
extern crate support;

pub use annotation::{Annotation, ElementValue};
pub use classfile::ClassWriter;
pub use config::{ClassVersion, WriterConfig};
pub use error::{EncodeError, EncodeResult};
pub use field::FieldWriter;
pub use flags::{ClassAccessFlags, FieldAccessFlags};
pub use pool::{Constant, SymbolTable};
