//! Binary wire protocol used to exercise generated serialization plans.
//!
//! Mirrors the runtime interface the generated C code calls into:
//! struct, field and container markers plus one writer per primitive.

mod error;
mod protocol;
mod reader;
mod value;

pub use error::DecodeError;
pub use protocol::{BinaryProtocol, Protocol};
pub use reader::BinaryReader;
pub use tidl_core::wire::WireTag;
pub use value::Value;
