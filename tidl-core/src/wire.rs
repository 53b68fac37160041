use strum_macros::{EnumIter, IntoStaticStr};

/// Marker written after the last field of a struct.
pub const FIELD_STOP: u8 = 0;

/// On-the-wire type of a value, independent of its in-memory representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum WireTag {
    String,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Struct,
    Map,
    Set,
    List,
}

impl WireTag {
    pub fn code(self) -> u8 {
        match self {
            WireTag::Bool => 2,
            WireTag::Byte => 3,
            WireTag::Double => 4,
            WireTag::I16 => 6,
            WireTag::I32 => 8,
            WireTag::I64 => 10,
            WireTag::String => 11,
            WireTag::Struct => 12,
            WireTag::Map => 13,
            WireTag::Set => 14,
            WireTag::List => 15,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        use strum::IntoEnumIterator;

        WireTag::iter().find(|tag| tag.code() == code)
    }

    /// Upper-case name, e.g. `I32`.
    pub fn name(self) -> &'static str {
        self.into()
    }
}
