use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("couldn't read from transport")]
    Io(#[from] io::Error),
    #[error("unknown wire type {0}")]
    UnknownWireType(u8),
    #[error("string is not valid utf-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("negative length {0}")]
    NegativeLength(i32),
}
