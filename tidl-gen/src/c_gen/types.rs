//! Mapping from IDL types to C types and wire tags.

use tidl_core::{
    ast::{BaseType, TypeNode},
    wire::WireTag,
};

use super::Namespace;
use crate::CodegenError;

/// Native C spelling of a value of type `ty`.
///
/// `symbol` names the definition the type belongs to and only shows up in
/// diagnostics.
pub fn native_type_name(
    names: &Namespace,
    ty: &TypeNode,
    symbol: &str,
) -> Result<String, CodegenError> {
    let name = match ty.true_type() {
        TypeNode::Base { base, binary } => match base {
            BaseType::Void => return Err(CodegenError::void_value(symbol)),
            BaseType::String if *binary => "GByteArray *".to_owned(),
            BaseType::String => "gchar *".to_owned(),
            BaseType::Bool => "gboolean".to_owned(),
            BaseType::Byte => "gint8".to_owned(),
            BaseType::I16 => "gint16".to_owned(),
            BaseType::I32 => "gint32".to_owned(),
            BaseType::I64 => "gint64".to_owned(),
            BaseType::Double => "gdouble".to_owned(),
        },
        TypeNode::List { .. } => "GPtrArray *".to_owned(),
        TypeNode::Set { .. } | TypeNode::Map { .. } => "GHashTable *".to_owned(),
        TypeNode::Enum { name } => names.type_name(name),
        TypeNode::Struct { name } | TypeNode::Exception { name } => {
            format!("{} *", names.type_name(name))
        }
        TypeNode::Typedef { .. } => unreachable!("true type is never a typedef"),
    };
    Ok(name)
}

/// Whether values of `ty` are held by value, which means container
/// elements of this type are boxed behind a pointer.
pub fn is_value_type(ty: &TypeNode) -> bool {
    match ty.true_type() {
        TypeNode::Base { base, .. } => !matches!(base, BaseType::String | BaseType::Void),
        TypeNode::Enum { .. } => true,
        _ => false,
    }
}

pub fn wire_tag(ty: &TypeNode, symbol: &str) -> Result<WireTag, CodegenError> {
    let tag = match ty.true_type() {
        TypeNode::Base { base, .. } => match base {
            BaseType::Void => return Err(CodegenError::void_value(symbol)),
            BaseType::String => WireTag::String,
            BaseType::Bool => WireTag::Bool,
            BaseType::Byte => WireTag::Byte,
            BaseType::I16 => WireTag::I16,
            BaseType::I32 => WireTag::I32,
            BaseType::I64 => WireTag::I64,
            BaseType::Double => WireTag::Double,
        },
        TypeNode::Enum { .. } => WireTag::I32,
        TypeNode::Struct { .. } | TypeNode::Exception { .. } => WireTag::Struct,
        TypeNode::List { .. } => WireTag::List,
        TypeNode::Set { .. } => WireTag::Set,
        TypeNode::Map { .. } => WireTag::Map,
        TypeNode::Typedef { .. } => unreachable!("true type is never a typedef"),
    };
    Ok(tag)
}

/// Name of the runtime constant for `tag`, e.g. `T_I32`.
pub fn tag_constant(tag: WireTag) -> String {
    format!("T_{}", tag.name())
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn every_kind() -> Vec<TypeNode> {
        vec![
            TypeNode::string(),
            TypeNode::binary(),
            TypeNode::bool(),
            TypeNode::byte(),
            TypeNode::i16(),
            TypeNode::i32(),
            TypeNode::i64(),
            TypeNode::double(),
            TypeNode::enumeration("Color"),
            TypeNode::structure("Point"),
            TypeNode::exception("Oops"),
            TypeNode::list(TypeNode::i32()),
            TypeNode::set(TypeNode::string()),
            TypeNode::map(TypeNode::string(), TypeNode::i64()),
        ]
    }

    #[test]
    fn native_names() {
        let names = Namespace::new("Ns");
        let native = |ty: TypeNode| native_type_name(&names, &ty, "test").expect("non-void");
        assert_eq!(native(TypeNode::string()), "gchar *");
        assert_eq!(native(TypeNode::binary()), "GByteArray *");
        assert_eq!(native(TypeNode::bool()), "gboolean");
        assert_eq!(native(TypeNode::byte()), "gint8");
        assert_eq!(native(TypeNode::i64()), "gint64");
        assert_eq!(native(TypeNode::double()), "gdouble");
        assert_eq!(native(TypeNode::list(TypeNode::i32())), "GPtrArray *");
        assert_eq!(native(TypeNode::set(TypeNode::i32())), "GHashTable *");
        assert_eq!(
            native(TypeNode::map(TypeNode::i32(), TypeNode::i32())),
            "GHashTable *"
        );
        assert_eq!(native(TypeNode::enumeration("Color")), "NsColor");
        assert_eq!(native(TypeNode::structure("Point")), "NsPoint *");
        assert_eq!(native(TypeNode::exception("Oops")), "NsOops *");
        assert_eq!(
            native(TypeNode::typedef("PointRef", TypeNode::structure("Point"))),
            "NsPoint *"
        );
    }

    #[test]
    fn void_is_rejected() {
        let names = Namespace::default();
        let error = native_type_name(&names, &TypeNode::void(), "Broken.field")
            .expect_err("void has no native type");
        assert!(matches!(error, CodegenError::VoidValue { ref symbol } if symbol == "Broken.field"));
        assert!(wire_tag(&TypeNode::typedef("Nothing", TypeNode::void()), "x").is_err());
    }

    #[test]
    fn tags_are_typedef_transparent() {
        for ty in every_kind() {
            let aliased = TypeNode::typedef("Alias", TypeNode::typedef("Inner", ty.clone()));
            assert_eq!(
                wire_tag(&aliased, "x").expect("non-void"),
                wire_tag(&ty, "x").expect("non-void")
            );
        }
    }

    #[test]
    fn tags_cover_all_kinds() {
        let tags = every_kind()
            .iter()
            .map(|ty| wire_tag(ty, "x").expect("non-void"))
            .collect::<Vec<_>>();
        for tag in WireTag::iter() {
            assert!(tags.contains(&tag), "{tag:?} is never produced");
        }
        assert_eq!(
            wire_tag(&TypeNode::enumeration("Color"), "x").expect("non-void"),
            WireTag::I32
        );
        assert_eq!(
            wire_tag(&TypeNode::exception("Oops"), "x").expect("non-void"),
            WireTag::Struct
        );
    }

    #[test]
    fn tag_constants() {
        assert_eq!(tag_constant(WireTag::I32), "T_I32");
        assert_eq!(tag_constant(WireTag::Struct), "T_STRUCT");
    }
}
