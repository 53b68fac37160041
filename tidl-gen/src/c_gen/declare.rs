//! Declarations for the header and object boilerplate for the source file.

use tidl_core::ast::{
    BaseType, ConstDef, ConstValue, EnumDef, Requiredness, StructDef, TypeNode, TypedefDef,
};

use super::{
    CodegenContext,
    constants::render_literal,
    names::ObjectNames,
    serialize::StructWriter,
    types::native_type_name,
};
use crate::{BoxAllocator, CodegenError, DocAllocator, DocBuilder, NEST_UNIT};

type Doc<'a> = DocBuilder<'a, BoxAllocator>;

fn lines<'a>(alloc: &'a BoxAllocator, lines: Vec<Doc<'a>>) -> Doc<'a> {
    alloc.intersperse(lines, alloc.hardline())
}

/// `head`, then `{ ... }` on their own lines with the body indented.
fn braced<'a>(alloc: &'a BoxAllocator, head: String, body: Vec<Doc<'a>>, tail: &str) -> Doc<'a> {
    alloc
        .text(head)
        .append(alloc.hardline())
        .append("{")
        .append(alloc.hardline().append(lines(alloc, body)).nest(NEST_UNIT))
        .append(alloc.hardline())
        .append("}")
        .append(tail.to_owned())
}

/// `typedef struct _NsFoo NsFoo;`
pub fn forward_declaration<'a>(ctx: CodegenContext<'a>, def: &StructDef) -> Doc<'a> {
    let type_name = ctx.names.type_name(&def.name);
    ctx.alloc
        .text(format!("typedef struct _{type_name} {type_name};"))
}

pub fn typedef_declaration<'a>(
    ctx: CodegenContext<'a>,
    def: &TypedefDef,
) -> Result<Doc<'a>, CodegenError> {
    let target = native_type_name(ctx.names, &def.target, &def.name)?;
    Ok(ctx.alloc.text(format!(
        "typedef {target} {};",
        ctx.names.type_name(&def.name)
    )))
}

/// Values are emitted only where the definition gave them, so the C
/// compiler numbers the rest exactly like [`EnumDef::resolved_values`].
pub fn enum_declaration<'a>(ctx: CodegenContext<'a>, def: &EnumDef) -> Doc<'a> {
    let alloc = ctx.alloc;
    let type_name = ctx.names.type_name(&def.name);

    let count = def.values.len();
    let enumerators = def
        .values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let separator = if i + 1 < count { "," } else { "" };
            match value.value {
                Some(explicit) => alloc.text(format!("{} = {explicit}{separator}", value.name)),
                None => alloc.text(format!("{}{separator}", value.name)),
            }
        })
        .collect();

    braced(alloc, format!("enum _{type_name}"), enumerators, ";")
        .append(alloc.hardline())
        .append(format!("typedef enum _{type_name} {type_name};"))
}

pub fn constant_declaration<'a>(
    ctx: CodegenContext<'a>,
    def: &ConstDef,
) -> Result<Doc<'a>, CodegenError> {
    let literal = render_literal(ctx.names, &def.ty, &def.value, &def.name)?;
    Ok(ctx.alloc.text(format!(
        "#define {} {literal}",
        ctx.names.constant(&def.name)
    )))
}

/// Instance and class layout, type accessor and the standard GObject macros.
pub fn object_declaration<'a>(
    ctx: CodegenContext<'a>,
    def: &StructDef,
) -> Result<Doc<'a>, CodegenError> {
    let alloc = ctx.alloc;
    let names = ctx.names.object(&def.name);

    let mut members = vec![alloc.text("ThriftStruct parent;")];
    for field in &def.fields {
        let symbol = format!("{}.{}", def.name, field.name);
        let native = native_type_name(ctx.names, &field.ty, &symbol)?;
        members.push(alloc.text(format!("{native} {};", field.name)));
    }

    let optional = def
        .fields
        .iter()
        .filter(|field| field.requiredness == Requiredness::Optional)
        .map(|field| alloc.text(format!("gboolean {};", field.name)))
        .collect::<Vec<_>>();
    if !optional.is_empty() {
        members.push(
            alloc
                .text("struct {")
                .append(alloc.hardline().append(lines(alloc, optional)).nest(NEST_UNIT))
                .append(alloc.hardline())
                .append("} __isset;"),
        );
    }

    let instance = braced(alloc, format!("struct _{}", names.type_name), members, ";");
    let class = lines(
        alloc,
        vec![
            alloc.text(format!(
                "typedef struct _{0} {0};",
                names.class_name
            )),
            braced(
                alloc,
                format!("struct _{}", names.class_name),
                vec![alloc.text("ThriftStructClass parent;")],
                ";",
            ),
        ],
    );

    Ok(lines(
        alloc,
        vec![
            instance,
            class,
            alloc.text(format!("GType {} (void);", names.function("get_type"))),
            macros(alloc, &names),
        ],
    ))
}

fn macros<'a>(alloc: &'a BoxAllocator, names: &ObjectNames) -> Doc<'a> {
    let ObjectNames {
        type_name,
        class_name,
        cast_macro,
        type_macro,
        check_macro,
        ..
    } = names;

    lines(
        alloc,
        vec![
            alloc.text(format!(
                "#define {type_macro} ({} ())",
                names.function("get_type")
            )),
            alloc.text(format!(
                "#define {cast_macro}(obj) (G_TYPE_CHECK_INSTANCE_CAST ((obj), {type_macro}, {type_name}))"
            )),
            alloc.text(format!(
                "#define {cast_macro}_CLASS(c) (G_TYPE_CHECK_CLASS_CAST ((c), {type_macro}, {class_name}))"
            )),
            alloc.text(format!(
                "#define {check_macro}(obj) (G_TYPE_CHECK_INSTANCE_TYPE ((obj), {type_macro}))"
            )),
            alloc.text(format!(
                "#define {check_macro}_CLASS(c) (G_TYPE_CHECK_CLASS_TYPE ((c), {type_macro}))"
            )),
            alloc.text(format!(
                "#define {cast_macro}_GET_CLASS(obj) (G_TYPE_INSTANCE_GET_CLASS ((obj), {type_macro}, {class_name}))"
            )),
        ],
    )
}

/// Write routine, instance and class initializers and type registration.
pub fn object_definition<'a>(
    ctx: CodegenContext<'a>,
    def: &StructDef,
    writer: &StructWriter,
) -> Result<Doc<'a>, CodegenError> {
    let alloc = ctx.alloc;
    let names = &writer.names;

    let parts = vec![
        writer.generate(ctx),
        instance_init(ctx, def, names)?,
        class_init(alloc, names),
        get_type(alloc, names),
    ];
    Ok(alloc.intersperse(parts, alloc.hardline().append(alloc.hardline())))
}

/// Initial value of a member, `None` for members left zeroed.
fn initial_value(
    ctx: CodegenContext<'_>,
    symbol: &str,
    ty: &TypeNode,
    default: Option<&ConstValue>,
) -> Result<Option<String>, CodegenError> {
    let literal = default
        .map(|value| render_literal(ctx.names, ty, value, symbol))
        .transpose()?;

    let value = match (ty.true_type(), literal) {
        (TypeNode::Base { base, binary }, literal) => match base {
            BaseType::Void => return Err(CodegenError::void_value(symbol)),
            BaseType::String if *binary => "g_byte_array_new ()".to_owned(),
            BaseType::String => format!(
                "g_strdup ({})",
                literal.as_deref().unwrap_or("\"\"")
            ),
            BaseType::Bool => literal.unwrap_or_else(|| "FALSE".to_owned()),
            _ => literal.unwrap_or_else(|| "0".to_owned()),
        },
        (TypeNode::Enum { .. }, Some(literal)) => literal,
        (TypeNode::Enum { .. }, None) => {
            format!("({}) 0", native_type_name(ctx.names, ty, symbol)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn instance_init<'a>(
    ctx: CodegenContext<'a>,
    def: &StructDef,
    names: &ObjectNames,
) -> Result<Doc<'a>, CodegenError> {
    let alloc = ctx.alloc;

    let mut statements = Vec::new();
    for field in &def.fields {
        let symbol = format!("{}.{}", def.name, field.name);
        if let Some(value) = initial_value(ctx, &symbol, &field.ty, field.default.as_ref())? {
            statements.push(alloc.text(format!("object->{} = {value};", field.name)));
        }
        if field.requiredness == Requiredness::Optional {
            let set = if field.default.is_some() { "TRUE" } else { "FALSE" };
            statements.push(alloc.text(format!("object->__isset.{} = {set};", field.name)));
        }
    }

    let signature = format!(
        "{} ({} * object)",
        names.function("instance_init"),
        names.type_name
    );
    let head = alloc.text("static void").append(alloc.hardline());
    if statements.is_empty() {
        return Ok(head
            .append(signature)
            .append(alloc.hardline())
            .append("{")
            .append(alloc.hardline())
            .append("}"));
    }
    Ok(head.append(braced(alloc, signature, statements, "")))
}

fn class_init<'a>(alloc: &'a BoxAllocator, names: &ObjectNames) -> Doc<'a> {
    alloc.text("static void").append(alloc.hardline()).append(braced(
        alloc,
        format!(
            "{} (ThriftStructClass * thrift_struct_class)",
            names.function("class_init")
        ),
        vec![alloc.text(format!(
            "thrift_struct_class->write = {};",
            names.function("write")
        ))],
        "",
    ))
}

fn get_type<'a>(alloc: &'a BoxAllocator, names: &ObjectNames) -> Doc<'a> {
    let type_info = braced(
        alloc,
        "static const GTypeInfo type_info =".to_owned(),
        vec![
            alloc.text(format!("sizeof ({}),", names.class_name)),
            alloc.text("NULL, /* base_init */"),
            alloc.text("NULL, /* base_finalize */"),
            alloc.text(format!(
                "(GClassInitFunc) {},",
                names.function("class_init")
            )),
            alloc.text("NULL, /* class_finalize */"),
            alloc.text("NULL, /* class_data */"),
            alloc.text(format!("sizeof ({}),", names.type_name)),
            alloc.text("0, /* n_preallocs */"),
            alloc.text(format!(
                "(GInstanceInitFunc) {},",
                names.function("instance_init")
            )),
            alloc.text("NULL, /* value_table */"),
        ],
        ";",
    );
    let register = alloc.text(format!(
        "type = g_type_register_static (THRIFT_TYPE_STRUCT, \"{}Type\", &type_info, 0);",
        names.type_name
    ));

    alloc.text("GType").append(alloc.hardline()).append(braced(
        alloc,
        format!("{} (void)", names.function("get_type")),
        vec![
            alloc.text("static GType type = 0;"),
            braced(alloc, "if (type == 0)".to_owned(), vec![type_info, register], ""),
            alloc.text("return type;"),
        ],
        "",
    ))
}
