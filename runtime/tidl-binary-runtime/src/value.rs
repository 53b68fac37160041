use std::collections::BTreeMap;

use tidl_core::wire::WireTag;

/// Dynamically typed wire value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    /// Fields keyed by wire id. Unset optional fields are absent.
    Struct(BTreeMap<i16, Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn tag(&self) -> WireTag {
        match self {
            Value::Bool(_) => WireTag::Bool,
            Value::Byte(_) => WireTag::Byte,
            Value::I16(_) => WireTag::I16,
            Value::I32(_) => WireTag::I32,
            Value::I64(_) => WireTag::I64,
            Value::Double(_) => WireTag::Double,
            Value::String(_) | Value::Binary(_) => WireTag::String,
            Value::Struct(_) => WireTag::Struct,
            Value::List(_) => WireTag::List,
            Value::Set(_) => WireTag::Set,
            Value::Map(_) => WireTag::Map,
        }
    }

    pub fn structure<I: IntoIterator<Item = (i16, Value)>>(fields: I) -> Self {
        Value::Struct(fields.into_iter().collect())
    }
}
