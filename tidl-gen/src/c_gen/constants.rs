//! C literals for constants and field defaults.

use std::fmt::Write as _;

use tidl_core::ast::{BaseType, ConstValue, TypeNode};

use super::{Namespace, types::native_type_name};
use crate::CodegenError;

/// Renders `value` as a C expression of type `ty`.
///
/// Struct and container values have no literal form and are rejected.
pub fn render_literal(
    names: &Namespace,
    ty: &TypeNode,
    value: &ConstValue,
    symbol: &str,
) -> Result<String, CodegenError> {
    let mismatch = || CodegenError::ConstantMismatch {
        symbol: symbol.to_owned(),
        ty: ty.to_string(),
    };

    let rendered = match (ty.true_type(), value) {
        (TypeNode::Base { base, binary }, value) => match (base, value) {
            (BaseType::Void, _) => return Err(CodegenError::void_value(symbol)),
            (BaseType::String, _) if *binary => {
                return Err(CodegenError::UnsupportedConstant {
                    symbol: symbol.to_owned(),
                    ty: ty.to_string(),
                });
            }
            (BaseType::String, ConstValue::String(string)) => quote(string),
            (BaseType::Bool, ConstValue::Integer(integer)) => {
                String::from(if *integer != 0 { "TRUE" } else { "FALSE" })
            }
            (
                BaseType::Byte | BaseType::I16 | BaseType::I32 | BaseType::I64,
                ConstValue::Integer(integer),
            ) => integer.to_string(),
            (BaseType::Double, ConstValue::Integer(integer)) => integer.to_string(),
            (BaseType::Double, ConstValue::Double(double)) if !double.is_finite() => {
                return Err(CodegenError::UnsupportedConstant {
                    symbol: symbol.to_owned(),
                    ty: ty.to_string(),
                });
            }
            (BaseType::Double, ConstValue::Double(double)) => format!("{double:?}"),
            _ => return Err(mismatch()),
        },
        (TypeNode::Enum { .. }, ConstValue::Integer(integer)) => {
            format!("({}) {integer}", native_type_name(names, ty, symbol)?)
        }
        (TypeNode::Enum { .. }, _) => return Err(mismatch()),
        (TypeNode::Typedef { .. }, _) => unreachable!("true type is never a typedef"),
        _ => {
            return Err(CodegenError::UnsupportedConstant {
                symbol: symbol.to_owned(),
                ty: ty.to_string(),
            });
        }
    };
    Ok(rendered)
}

fn quote(string: &str) -> String {
    let mut quoted = String::with_capacity(string.len() + 2);
    quoted.push('"');
    for c in string.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => {
                write!(quoted, "\\{:03o}", c as u32).expect("Writing into String is always ok")
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
