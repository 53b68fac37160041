//! Diagnostics produced while generating C code.

use std::{io, path::PathBuf};

use strum::IntoDiscriminant;
use strum_macros::{EnumDiscriminants, EnumIter};
use thiserror::Error;

/// Fatal problem: generation of the whole program stops.
#[derive(Debug, Error, EnumDiscriminants)]
#[strum_discriminants(derive(EnumIter))]
pub enum CodegenError {
    #[error("`{symbol}`: void cannot be used as a value type")]
    VoidValue { symbol: String },
    #[error("`{symbol}`: constants of type `{ty}` are not supported by the C backend")]
    UnsupportedConstant { symbol: String, ty: String },
    #[error("`{symbol}`: literal does not match type `{ty}`")]
    ConstantMismatch { symbol: String, ty: String },
    #[error("`{symbol}`: typedef of enum `{target}` would precede the enum declaration")]
    EnumAliasedEarly { symbol: String, target: String },
    #[error("{0}")]
    NotYetSupported(Notice),
    #[error("couldn't write `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CodegenError {
    pub fn void_value(symbol: impl Into<String>) -> Self {
        CodegenError::VoidValue {
            symbol: symbol.into(),
        }
    }

    pub fn get_code(&self) -> i64 {
        self.discriminant().get_code()
    }
}

impl CodegenErrorDiscriminants {
    pub fn get_code(self) -> i64 {
        1000 + self as i64
    }
}

/// Something the backend knowingly leaves undone.
///
/// Reported alongside the generated files, or raised as
/// [`CodegenError::NotYetSupported`] in strict mode.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Notice {
    #[error("`{strukt}.{field}`: required field is written without checking that it is set")]
    UncheckedRequired { strukt: String, field: String },
    #[error("service `{0}`: service generation is not supported by the C backend")]
    ServiceSkipped(String),
}
