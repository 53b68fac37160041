use std::fmt;

/// Type nodes are shared between fields, typedefs and containers.
/// Consider migrating to `Arc` when going multicore.
pub type Rec<T> = std::rc::Rc<T>;

/// Primitive types of the IDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseType {
    Void,
    String,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
}

/// Type as written in a definition.
///
/// Codegen never looks at a `Typedef` directly, it always follows the chain
/// with [`TypeNode::true_type`] first.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeNode {
    /// Primitive type. `binary` is only meaningful for strings.
    Base { base: BaseType, binary: bool },
    /// Reference to an enum definition.
    Enum { name: String },
    /// Named alias of another type.
    Typedef { name: String, target: Rec<TypeNode> },
    /// Reference to a struct definition.
    Struct { name: String },
    /// Reference to an exception definition.
    Exception { name: String },
    /// Ordered sequence.
    List { elem: Rec<TypeNode> },
    /// Unordered collection of unique elements.
    Set { elem: Rec<TypeNode> },
    /// Key-value table.
    Map { key: Rec<TypeNode>, value: Rec<TypeNode> },
}

impl TypeNode {
    pub fn base(base: BaseType) -> Self {
        TypeNode::Base {
            base,
            binary: false,
        }
    }

    pub fn void() -> Self {
        Self::base(BaseType::Void)
    }

    pub fn string() -> Self {
        Self::base(BaseType::String)
    }

    pub fn binary() -> Self {
        TypeNode::Base {
            base: BaseType::String,
            binary: true,
        }
    }

    pub fn bool() -> Self {
        Self::base(BaseType::Bool)
    }

    pub fn byte() -> Self {
        Self::base(BaseType::Byte)
    }

    pub fn i16() -> Self {
        Self::base(BaseType::I16)
    }

    pub fn i32() -> Self {
        Self::base(BaseType::I32)
    }

    pub fn i64() -> Self {
        Self::base(BaseType::I64)
    }

    pub fn double() -> Self {
        Self::base(BaseType::Double)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeNode::Enum { name: name.into() }
    }

    pub fn structure(name: impl Into<String>) -> Self {
        TypeNode::Struct { name: name.into() }
    }

    pub fn exception(name: impl Into<String>) -> Self {
        TypeNode::Exception { name: name.into() }
    }

    pub fn typedef(name: impl Into<String>, target: TypeNode) -> Self {
        TypeNode::Typedef {
            name: name.into(),
            target: Rec::new(target),
        }
    }

    pub fn list(elem: TypeNode) -> Self {
        TypeNode::List {
            elem: Rec::new(elem),
        }
    }

    pub fn set(elem: TypeNode) -> Self {
        TypeNode::Set {
            elem: Rec::new(elem),
        }
    }

    pub fn map(key: TypeNode, value: TypeNode) -> Self {
        TypeNode::Map {
            key: Rec::new(key),
            value: Rec::new(value),
        }
    }

    /// Follows typedef chains down to the first non-typedef node.
    pub fn true_type(&self) -> &TypeNode {
        let mut ty = self;
        while let TypeNode::Typedef { target, .. } = ty {
            ty = target.as_ref();
        }
        ty
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self.true_type(),
            TypeNode::Base {
                base: BaseType::Void,
                ..
            }
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self.true_type(),
            TypeNode::List { .. } | TypeNode::Set { .. } | TypeNode::Map { .. }
        )
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Base { base, binary } => {
                let name = match base {
                    BaseType::Void => "void",
                    BaseType::String if *binary => "binary",
                    BaseType::String => "string",
                    BaseType::Bool => "bool",
                    BaseType::Byte => "byte",
                    BaseType::I16 => "i16",
                    BaseType::I32 => "i32",
                    BaseType::I64 => "i64",
                    BaseType::Double => "double",
                };
                f.write_str(name)
            }
            TypeNode::Enum { name }
            | TypeNode::Typedef { name, .. }
            | TypeNode::Struct { name }
            | TypeNode::Exception { name } => f.write_str(name),
            TypeNode::List { elem } => write!(f, "list<{elem}>"),
            TypeNode::Set { elem } => write!(f, "set<{elem}>"),
            TypeNode::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

/// Literal value of a constant or of a field default.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Integer(i64),
    Double(f64),
    String(String),
    List(Vec<ConstValue>),
    Map(Vec<(ConstValue, ConstValue)>),
}

/// Governs whether a field is guarded when serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
    Default,
}

/// Member of a struct or exception.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    /// Wire id, unique within its struct. Not necessarily contiguous.
    pub id: i16,
    pub requiredness: Requiredness,
    pub ty: TypeNode,
    pub default: Option<ConstValue>,
}

impl Field {
    pub fn new(id: i16, requiredness: Requiredness, ty: TypeNode, name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            id,
            requiredness,
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, value: ConstValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Struct or exception definition.
#[derive(Clone, Debug, PartialEq)]
pub struct StructDef {
    pub name: String,
    /// Declaration order is also wire order.
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        StructDef {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    /// Explicit value, if the definition specified one.
    pub value: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumDef {
    pub fn new<'a>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (&'a str, Option<i64>)>,
    ) -> Self {
        EnumDef {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(name, value)| EnumValue {
                    name: name.to_owned(),
                    value,
                })
                .collect(),
        }
    }

    /// Values with unspecified entries numbered as previous + 1, starting from 0.
    pub fn resolved_values(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        let mut next = 0;
        self.values.iter().map(move |value| {
            let resolved = value.value.unwrap_or(next);
            next = resolved.wrapping_add(1);
            (value.name.as_str(), resolved)
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstDef {
    pub name: String,
    pub ty: TypeNode,
    pub value: ConstValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedefDef {
    /// Symbolic name introduced by the typedef.
    pub name: String,
    pub target: TypeNode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDef {
    pub name: String,
    pub functions: Vec<String>,
}

/// Verbatim include requested by the IDL author.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomInclude {
    /// `<path>`
    System(String),
    /// `"path"`
    Local(String),
}

impl CustomInclude {
    /// Angle-bracketed paths are system includes, everything else is local.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('<') {
            Some(rest) => CustomInclude::System(rest.strip_suffix('>').unwrap_or(rest).to_owned()),
            None => CustomInclude::Local(raw.to_owned()),
        }
    }
}

/// A complete IDL program, as produced by the front end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub name: String,
    /// Target namespace, `.` separated. Empty when none was declared.
    pub namespace: String,
    /// Names of upstream programs this one includes.
    pub includes: Vec<String>,
    pub custom_includes: Vec<CustomInclude>,
    pub typedefs: Vec<TypedefDef>,
    pub enums: Vec<EnumDef>,
    pub consts: Vec<ConstDef>,
    pub structs: Vec<StructDef>,
    pub exceptions: Vec<StructDef>,
    pub services: Vec<ServiceDef>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Structs followed by exceptions, both in definition order.
    pub fn objects(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.iter().chain(self.exceptions.iter())
    }

    pub fn object(&self, name: &str) -> Option<&StructDef> {
        self.objects().find(|object| object.name == name)
    }
}
