//! Write routines for structs and exceptions.
//!
//! A [`StructWriter`] is built first and rendered to C afterwards. The plan
//! mirrors field declaration order exactly, and nested structs are written
//! through the runtime's polymorphic `thrift_struct_write`, so recursive
//! types produce finite code.

use tidl_core::{
    ast::{BaseType, Requiredness, StructDef, TypeNode},
    wire::WireTag,
};

use super::{
    CodegenContext, Namespace,
    names::ObjectNames,
    types::{is_value_type, native_type_name, tag_constant, wire_tag},
};
use crate::{
    BoxAllocator, CodegenError, DocAllocator, DocBuilder, NEST_UNIT, identifiers::Temporaries,
};

/// Write routine of one struct.
#[derive(Clone, Debug, PartialEq)]
pub struct StructWriter {
    pub names: ObjectNames,
    /// In declaration order.
    pub fields: Vec<FieldWriter>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldWriter {
    pub name: String,
    pub id: i16,
    pub tag: WireTag,
    pub requiredness: Requiredness,
    pub value: ValueWriter,
}

impl FieldWriter {
    /// Optional fields are only written when their presence flag is set.
    pub fn is_guarded(&self) -> bool {
        self.requiredness == Requiredness::Optional
    }
}

/// Primitive protocol calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    String,
    Binary,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    /// Written as its 32-bit value.
    Enum,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueWriter {
    Primitive {
        kind: Primitive,
        place: Place,
    },
    /// Delegated to the runtime, which dispatches on the instance's class.
    Struct {
        place: Place,
    },
    List {
        elem: WireTag,
        place: Place,
        index: String,
        element: Box<ValueWriter>,
    },
    Set {
        elem: WireTag,
        place: Place,
        iter: String,
        slot: String,
        element: Box<ValueWriter>,
    },
    Map {
        key: WireTag,
        value: WireTag,
        place: Place,
        iter: String,
        key_slot: String,
        value_slot: String,
        key_writer: Box<ValueWriter>,
        value_writer: Box<ValueWriter>,
    },
}

/// Where the value being written lives.
#[derive(Clone, Debug, PartialEq)]
pub enum Place {
    /// Member of the struct being written.
    Member(String),
    /// Element of a list, addressed by a loop index.
    Element {
        list: Box<Place>,
        index: String,
        cast: Cast,
    },
    /// Key or value pointer produced by a hash table iterator.
    Slot { var: String, cast: Cast },
}

/// Conversion from the `gpointer` a container stores to the element type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cast {
    pub native: String,
    /// Value types are stored boxed and must be dereferenced.
    pub boxed: bool,
}

impl Cast {
    fn of(names: &Namespace, ty: &TypeNode, symbol: &str) -> Result<Self, CodegenError> {
        Ok(Cast {
            native: native_type_name(names, ty, symbol)?,
            boxed: is_value_type(ty),
        })
    }

    fn apply(&self, pointer: &str) -> String {
        if self.boxed {
            format!("(*({} *) {pointer})", self.native)
        } else {
            format!("(({}) {pointer})", self.native)
        }
    }
}

impl Place {
    pub fn expression(&self) -> String {
        match self {
            Place::Member(name) => format!("this_object->{name}"),
            Place::Element { list, index, cast } => cast.apply(&format!(
                "g_ptr_array_index ({}, {index})",
                list.expression()
            )),
            Place::Slot { var, cast } => cast.apply(var),
        }
    }
}

pub fn struct_writer(
    names: &Namespace,
    temporaries: &mut Temporaries,
    def: &StructDef,
) -> Result<StructWriter, CodegenError> {
    let fields = def
        .fields
        .iter()
        .map(|field| {
            let symbol = format!("{}.{}", def.name, field.name);
            Ok(FieldWriter {
                name: field.name.clone(),
                id: field.id,
                tag: wire_tag(&field.ty, &symbol)?,
                requiredness: field.requiredness,
                value: value_writer(
                    names,
                    temporaries,
                    &field.ty,
                    Place::Member(field.name.clone()),
                    &symbol,
                )?,
            })
        })
        .collect::<Result<Vec<_>, CodegenError>>()?;

    Ok(StructWriter {
        names: names.object(&def.name),
        fields,
    })
}

/// Plan for writing the value of type `ty` found at `place`.
pub fn value_writer(
    names: &Namespace,
    temporaries: &mut Temporaries,
    ty: &TypeNode,
    place: Place,
    symbol: &str,
) -> Result<ValueWriter, CodegenError> {
    let writer = match ty.true_type() {
        TypeNode::Base { base, binary } => {
            let kind = match base {
                BaseType::Void => return Err(CodegenError::void_value(symbol)),
                BaseType::String if *binary => Primitive::Binary,
                BaseType::String => Primitive::String,
                BaseType::Bool => Primitive::Bool,
                BaseType::Byte => Primitive::Byte,
                BaseType::I16 => Primitive::I16,
                BaseType::I32 => Primitive::I32,
                BaseType::I64 => Primitive::I64,
                BaseType::Double => Primitive::Double,
            };
            ValueWriter::Primitive { kind, place }
        }
        TypeNode::Enum { .. } => ValueWriter::Primitive {
            kind: Primitive::Enum,
            place,
        },
        TypeNode::Struct { .. } | TypeNode::Exception { .. } => ValueWriter::Struct { place },
        TypeNode::List { elem } => {
            let symbol = format!("{symbol}.elem");
            let index = temporaries.fresh("_i");
            let element_place = Place::Element {
                list: Box::new(place.clone()),
                index: index.clone(),
                cast: Cast::of(names, elem, &symbol)?,
            };
            ValueWriter::List {
                elem: wire_tag(elem, &symbol)?,
                element: Box::new(value_writer(
                    names,
                    temporaries,
                    elem,
                    element_place,
                    &symbol,
                )?),
                place,
                index,
            }
        }
        TypeNode::Set { elem } => {
            let symbol = format!("{symbol}.elem");
            let iter = temporaries.fresh("_iter");
            let slot = temporaries.fresh("_key");
            let element_place = Place::Slot {
                var: slot.clone(),
                cast: Cast::of(names, elem, &symbol)?,
            };
            ValueWriter::Set {
                elem: wire_tag(elem, &symbol)?,
                element: Box::new(value_writer(
                    names,
                    temporaries,
                    elem,
                    element_place,
                    &symbol,
                )?),
                place,
                iter,
                slot,
            }
        }
        TypeNode::Map { key, value } => {
            let key_symbol = format!("{symbol}.key");
            let value_symbol = format!("{symbol}.value");
            let iter = temporaries.fresh("_iter");
            let key_slot = temporaries.fresh("_key");
            let value_slot = temporaries.fresh("_value");
            let key_place = Place::Slot {
                var: key_slot.clone(),
                cast: Cast::of(names, key, &key_symbol)?,
            };
            let value_place = Place::Slot {
                var: value_slot.clone(),
                cast: Cast::of(names, value, &value_symbol)?,
            };
            ValueWriter::Map {
                key: wire_tag(key, &key_symbol)?,
                value: wire_tag(value, &value_symbol)?,
                key_writer: Box::new(value_writer(
                    names,
                    temporaries,
                    key,
                    key_place,
                    &key_symbol,
                )?),
                value_writer: Box::new(value_writer(
                    names,
                    temporaries,
                    value,
                    value_place,
                    &value_symbol,
                )?),
                place,
                iter,
                key_slot,
                value_slot,
            }
        }
        TypeNode::Typedef { .. } => unreachable!("true type is never a typedef"),
    };
    Ok(writer)
}

type Doc<'a> = DocBuilder<'a, BoxAllocator>;

/// Statements on their own lines, indented one level, between the
/// surrounding braces.
fn body<'a>(alloc: &'a BoxAllocator, statements: Vec<Doc<'a>>) -> Doc<'a> {
    alloc
        .hardline()
        .append(alloc.intersperse(statements, alloc.hardline()))
        .nest(NEST_UNIT)
        .append(alloc.hardline())
}

fn block<'a>(alloc: &'a BoxAllocator, head: String, statements: Vec<Doc<'a>>) -> Doc<'a> {
    alloc
        .text(head)
        .append(" {")
        .append(body(alloc, statements))
        .append("}")
}

/// Bare `{ ... }` so loop variables stay local.
fn scope<'a>(alloc: &'a BoxAllocator, statements: Vec<Doc<'a>>) -> Doc<'a> {
    alloc.text("{").append(body(alloc, statements)).append("}")
}

fn call<'a>(alloc: &'a BoxAllocator, call: String) -> Doc<'a> {
    alloc.text(format!("xfer += {call};"))
}

fn protocol<'a>(alloc: &'a BoxAllocator, function: &str, args: &[&str]) -> Doc<'a> {
    let args = std::iter::once("thrift_protocol")
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(", ");
    call(alloc, format!("thrift_protocol_{function} ({args})"))
}

impl StructWriter {
    pub fn generate<'a>(&self, ctx: CodegenContext<'a>) -> Doc<'a> {
        let alloc = ctx.alloc;
        let names = &self.names;

        let mut statements = vec![
            alloc.text("gint32 xfer = 0;"),
            alloc.text(format!(
                "{} * this_object = {} (object);",
                names.type_name, names.cast_macro
            )),
            protocol(alloc, "write_struct_begin", &[&format!("\"{}\"", names.name)]),
        ];
        statements.extend(self.fields.iter().map(|field| field.generate(ctx)));
        statements.extend([
            protocol(alloc, "write_field_stop", &[]),
            protocol(alloc, "write_struct_end", &[]),
            alloc.text("return xfer;"),
        ]);

        alloc
            .text("static gint32")
            .append(alloc.hardline())
            .append(format!(
                "{} (ThriftStruct * object, ThriftProtocol * thrift_protocol)",
                names.function("write")
            ))
            .append(alloc.hardline())
            .append("{")
            .append(body(alloc, statements))
            .append("}")
    }
}

impl FieldWriter {
    pub fn generate<'a>(&self, ctx: CodegenContext<'a>) -> Doc<'a> {
        let alloc = ctx.alloc;

        let statements = vec![
            protocol(
                alloc,
                "write_field_begin",
                &[
                    &format!("\"{}\"", self.name),
                    &tag_constant(self.tag),
                    &self.id.to_string(),
                ],
            ),
            self.value.generate(ctx),
            protocol(alloc, "write_field_end", &[]),
        ];

        if self.is_guarded() {
            block(
                alloc,
                format!("if (this_object->__isset.{})", self.name),
                statements,
            )
        } else {
            alloc.intersperse(statements, alloc.hardline())
        }
    }
}

impl ValueWriter {
    pub fn generate<'a>(&self, ctx: CodegenContext<'a>) -> Doc<'a> {
        let alloc = ctx.alloc;

        match self {
            ValueWriter::Primitive { kind, place } => {
                let value = place.expression();
                match kind {
                    Primitive::String => protocol(alloc, "write_string", &[&value]),
                    Primitive::Binary => protocol(
                        alloc,
                        "write_binary",
                        &[&format!("{value}->data"), &format!("{value}->len")],
                    ),
                    Primitive::Bool => protocol(alloc, "write_bool", &[&value]),
                    Primitive::Byte => protocol(alloc, "write_byte", &[&value]),
                    Primitive::I16 => protocol(alloc, "write_i16", &[&value]),
                    Primitive::I32 => protocol(alloc, "write_i32", &[&value]),
                    Primitive::I64 => protocol(alloc, "write_i64", &[&value]),
                    Primitive::Double => protocol(alloc, "write_double", &[&value]),
                    Primitive::Enum => {
                        protocol(alloc, "write_i32", &[&format!("(gint32) {value}")])
                    }
                }
            }
            ValueWriter::Struct { place } => call(
                alloc,
                format!(
                    "thrift_struct_write (THRIFT_STRUCT ({}), thrift_protocol)",
                    place.expression()
                ),
            ),
            ValueWriter::List {
                elem,
                place,
                index,
                element,
            } => {
                let list = place.expression();
                let statements = vec![
                    alloc.text(format!("guint {index};")),
                    protocol(
                        alloc,
                        "write_list_begin",
                        &[&tag_constant(*elem), &format!("{list}->len")],
                    ),
                    block(
                        alloc,
                        format!("for ({index} = 0; {index} < {list}->len; {index}++)"),
                        vec![element.generate(ctx)],
                    ),
                    protocol(alloc, "write_list_end", &[]),
                ];
                scope(alloc, statements)
            }
            ValueWriter::Set {
                elem,
                place,
                iter,
                slot,
                element,
            } => {
                let table = place.expression();
                let statements = vec![
                    alloc.text(format!("GHashTableIter {iter};")),
                    alloc.text(format!("gpointer {slot};")),
                    protocol(
                        alloc,
                        "write_set_begin",
                        &[
                            &tag_constant(*elem),
                            &format!("g_hash_table_size ({table})"),
                        ],
                    ),
                    alloc.text(format!("g_hash_table_iter_init (&{iter}, {table});")),
                    block(
                        alloc,
                        format!("while (g_hash_table_iter_next (&{iter}, &{slot}, NULL))"),
                        vec![element.generate(ctx)],
                    ),
                    protocol(alloc, "write_set_end", &[]),
                ];
                scope(alloc, statements)
            }
            ValueWriter::Map {
                key,
                value,
                place,
                iter,
                key_slot,
                value_slot,
                key_writer,
                value_writer,
            } => {
                let table = place.expression();
                let statements = vec![
                    alloc.text(format!("GHashTableIter {iter};")),
                    alloc.text(format!("gpointer {key_slot}, {value_slot};")),
                    protocol(
                        alloc,
                        "write_map_begin",
                        &[
                            &tag_constant(*key),
                            &tag_constant(*value),
                            &format!("g_hash_table_size ({table})"),
                        ],
                    ),
                    alloc.text(format!("g_hash_table_iter_init (&{iter}, {table});")),
                    block(
                        alloc,
                        format!(
                            "while (g_hash_table_iter_next (&{iter}, &{key_slot}, &{value_slot}))"
                        ),
                        vec![key_writer.generate(ctx), value_writer.generate(ctx)],
                    ),
                    protocol(alloc, "write_map_end", &[]),
                ];
                scope(alloc, statements)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tidl_core::ast::Field;

    use super::*;
    use crate::format::render;

    fn plan(def: &StructDef) -> StructWriter {
        struct_writer(&Namespace::new("Ns"), &mut Temporaries::new(), def).expect("valid struct")
    }

    fn text(writer: &StructWriter) -> String {
        let alloc = BoxAllocator;
        let names = Namespace::new("Ns");
        let ctx = CodegenContext {
            alloc: &alloc,
            names: &names,
        };
        render(writer.generate(ctx).into_doc(), 100)
    }

    fn user() -> StructDef {
        StructDef::new(
            "User",
            vec![
                Field::new(1, Requiredness::Required, TypeNode::i32(), "id"),
                Field::new(2, Requiredness::Optional, TypeNode::string(), "name"),
            ],
        )
    }

    #[test]
    fn fields_keep_declaration_order() {
        let def = StructDef::new(
            "Mixed",
            vec![
                Field::new(7, Requiredness::Default, TypeNode::i64(), "c"),
                Field::new(1, Requiredness::Default, TypeNode::string(), "a"),
                Field::new(3, Requiredness::Default, TypeNode::bool(), "b"),
            ],
        );
        let writer = plan(&def);
        let order = writer
            .fields
            .iter()
            .map(|field| (field.name.as_str(), field.id))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![("c", 7), ("a", 1), ("b", 3)]);

        let code = text(&writer);
        let c = code.find("\"c\", T_I64, 7").expect("c is written");
        let a = code.find("\"a\", T_STRING, 1").expect("a is written");
        let b = code.find("\"b\", T_BOOL, 3").expect("b is written");
        assert!(c < a && a < b);
        assert_eq!(code.matches("write_field_stop").count(), 1);
        assert_eq!(code.matches("write_field_begin").count(), 3);
        assert_eq!(code.matches("write_field_end").count(), 3);
    }

    #[test]
    fn only_optional_fields_are_guarded() {
        let writer = plan(&user());
        assert!(!writer.fields[0].is_guarded());
        assert!(writer.fields[1].is_guarded());

        let code = text(&writer);
        assert!(code.contains("if (this_object->__isset.name) {"));
        assert!(!code.contains("__isset.id"));
    }

    #[test]
    fn write_routine() {
        let expected = [
            "static gint32",
            "ns_user_write (ThriftStruct * object, ThriftProtocol * thrift_protocol)",
            "{",
            "  gint32 xfer = 0;",
            "  NsUser * this_object = NS_USER (object);",
            "  xfer += thrift_protocol_write_struct_begin (thrift_protocol, \"User\");",
            "  xfer += thrift_protocol_write_field_begin (thrift_protocol, \"id\", T_I32, 1);",
            "  xfer += thrift_protocol_write_i32 (thrift_protocol, this_object->id);",
            "  xfer += thrift_protocol_write_field_end (thrift_protocol);",
            "  if (this_object->__isset.name) {",
            "    xfer += thrift_protocol_write_field_begin (thrift_protocol, \"name\", T_STRING, 2);",
            "    xfer += thrift_protocol_write_string (thrift_protocol, this_object->name);",
            "    xfer += thrift_protocol_write_field_end (thrift_protocol);",
            "  }",
            "  xfer += thrift_protocol_write_field_stop (thrift_protocol);",
            "  xfer += thrift_protocol_write_struct_end (thrift_protocol);",
            "  return xfer;",
            "}",
        ]
        .join("\n");
        assert_eq!(text(&plan(&user())), expected);
    }

    #[test]
    fn self_reference_is_delegated() {
        let node = StructDef::new(
            "Node",
            vec![Field::new(
                1,
                Requiredness::Optional,
                TypeNode::structure("Node"),
                "next",
            )],
        );
        let writer = plan(&node);
        assert_eq!(
            writer.fields[0].value,
            ValueWriter::Struct {
                place: Place::Member("next".to_owned())
            }
        );
        let code = text(&writer);
        assert!(code.contains(
            "xfer += thrift_struct_write (THRIFT_STRUCT (this_object->next), thrift_protocol);"
        ));
        assert_eq!(code.matches("thrift_struct_write").count(), 1);
    }

    #[test]
    fn enums_are_written_as_i32() {
        let def = StructDef::new(
            "Paint",
            vec![Field::new(
                1,
                Requiredness::Default,
                TypeNode::enumeration("Color"),
                "color",
            )],
        );
        let writer = plan(&def);
        assert_eq!(writer.fields[0].tag, WireTag::I32);
        assert!(text(&writer).contains(
            "xfer += thrift_protocol_write_i32 (thrift_protocol, (gint32) this_object->color);"
        ));
    }

    #[test]
    fn nested_lists_use_distinct_indices() {
        let def = StructDef::new(
            "Grid",
            vec![Field::new(
                1,
                Requiredness::Default,
                TypeNode::list(TypeNode::list(TypeNode::i32())),
                "rows",
            )],
        );
        let writer = plan(&def);
        let ValueWriter::List {
            index: outer,
            element,
            ..
        } = &writer.fields[0].value
        else {
            panic!("rows is a list");
        };
        let ValueWriter::List { index: inner, .. } = element.as_ref() else {
            panic!("rows.elem is a list");
        };
        assert_ne!(outer, inner);

        let code = text(&writer);
        assert!(code.contains("write_list_begin (thrift_protocol, T_LIST, this_object->rows->len);"));
        assert!(code.contains(
            "(*(gint32 *) g_ptr_array_index (((GPtrArray *) g_ptr_array_index (this_object->rows, _i0)), _i1))"
        ));
    }

    #[test]
    fn maps_write_key_then_value() {
        let def = StructDef::new(
            "Scores",
            vec![Field::new(
                1,
                Requiredness::Default,
                TypeNode::map(TypeNode::string(), TypeNode::double()),
                "by_name",
            )],
        );
        let code = text(&plan(&def));
        assert!(code.contains(
            "write_map_begin (thrift_protocol, T_STRING, T_DOUBLE, g_hash_table_size (this_object->by_name));"
        ));
        let key = code
            .find("write_string (thrift_protocol, ((gchar *) _key1));")
            .expect("key is written");
        let value = code
            .find("write_double (thrift_protocol, (*(gdouble *) _value2));")
            .expect("value is written");
        assert!(key < value);
    }

    #[test]
    fn sets_iterate_keys() {
        let def = StructDef::new(
            "Tags",
            vec![Field::new(
                1,
                Requiredness::Default,
                TypeNode::set(TypeNode::structure("Tag")),
                "tags",
            )],
        );
        let code = text(&plan(&def));
        assert!(code.contains("while (g_hash_table_iter_next (&_iter0, &_key1, NULL)) {"));
        assert!(code.contains("thrift_struct_write (THRIFT_STRUCT (((NsTag *) _key1)), thrift_protocol);"));
    }

    #[test]
    fn void_fields_are_fatal() {
        let def = StructDef::new(
            "Broken",
            vec![Field::new(
                1,
                Requiredness::Default,
                TypeNode::list(TypeNode::void()),
                "nothing",
            )],
        );
        let error = struct_writer(&Namespace::default(), &mut Temporaries::new(), &def)
            .expect_err("void elements can't be written");
        assert!(
            matches!(error, CodegenError::VoidValue { ref symbol } if symbol == "Broken.nothing.elem")
        );
    }
}
