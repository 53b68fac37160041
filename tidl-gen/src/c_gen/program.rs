//! One program in, one declarations file and one definitions file out.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tidl_core::ast::{CustomInclude, Program, Requiredness, TypeNode};
use tracing::{debug, info, warn};

use super::{
    CodegenContext, Namespace,
    declare::{
        constant_declaration, enum_declaration, forward_declaration, object_declaration,
        object_definition, typedef_declaration,
    },
    serialize::struct_writer,
};
use crate::{
    BoxAllocator, CodegenError, DocAllocator, DocBuilder, Notice, Options,
    caser::to_upper_snake_case, format::render, identifiers::Temporaries,
};

type Doc<'a> = DocBuilder<'a, BoxAllocator>;

const BANNER: &str = "/**
 * Autogenerated by Thrift
 *
 * DO NOT EDIT UNLESS YOU ARE SURE THAT YOU KNOW WHAT YOU ARE DOING
 */";

/// Both files of a program, fully rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedProgram {
    pub name: String,
    pub declarations: String,
    pub definitions: String,
    /// Known gaps in the generated code, in emission order.
    pub notices: Vec<Notice>,
    declarations_file: String,
    definitions_file: String,
}

impl GeneratedProgram {
    /// `<name>_types.h` unless configured otherwise.
    pub fn declarations_file(&self) -> &str {
        &self.declarations_file
    }

    pub fn definitions_file(&self) -> &str {
        &self.definitions_file
    }

    /// Flushes both files into `dir`, which must exist. Either both files
    /// land or neither does.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(), CodegenError> {
        let dir = dir.as_ref();
        let staged = [
            (&self.declarations_file, &self.declarations),
            (&self.definitions_file, &self.definitions),
        ]
        .into_iter()
        .map(|(file, contents)| {
            let path = dir.join(file);
            let failed = |source: io::Error| CodegenError::Io {
                path: path.clone(),
                source,
            };
            let mut staged = NamedTempFile::new_in(dir).map_err(failed)?;
            staged.write_all(contents.as_bytes()).map_err(failed)?;
            Ok::<_, CodegenError>((staged, path))
        })
        .collect::<Result<Vec<_>, CodegenError>>()?;

        let mut flushed: Vec<PathBuf> = Vec::new();
        for (staged, path) in staged {
            if let Err(error) = staged.persist(&path) {
                for path in &flushed {
                    if let Err(error) = fs::remove_file(path) {
                        warn!(path = %path.display(), %error, "couldn't roll back");
                    }
                }
                return Err(CodegenError::Io {
                    path,
                    source: error.error,
                });
            }
            flushed.push(path);
        }
        for path in &flushed {
            info!(path = %path.display(), "flushed");
        }
        Ok(())
    }
}

pub fn generate_program(
    program: &Program,
    options: &Options,
) -> Result<GeneratedProgram, CodegenError> {
    info!(program = %program.name, "generating C types");

    let alloc = BoxAllocator;
    let names = Namespace::new(&program.namespace);
    let ctx = CodegenContext {
        alloc: &alloc,
        names: &names,
    };

    let stem = format!("{}_types", program.name);
    let declarations_file = format!("{stem}.{}", options.declarations_extension);
    let definitions_file = format!("{stem}.{}", options.definitions_extension);

    let notices = collect_notices(program);
    for notice in &notices {
        warn!(code = notice_code(notice), "{notice}");
    }
    if let Some(notice) = notices.first().filter(|_| options.strict) {
        return Err(CodegenError::NotYetSupported(notice.clone()));
    }

    let declarations = declarations(ctx, program, options)?;
    let definitions = definitions(ctx, program, &declarations_file)?;

    let generated = GeneratedProgram {
        name: program.name.clone(),
        declarations: finish(declarations, options),
        definitions: finish(definitions, options),
        notices,
        declarations_file,
        definitions_file,
    };
    info!(
        program = %program.name,
        notices = generated.notices.len(),
        "generated C types"
    );
    Ok(generated)
}

fn finish(doc: Doc<'_>, options: &Options) -> String {
    let mut text = render(doc.into_doc(), options.line_width);
    text.push('\n');
    text
}

fn notice_code(notice: &Notice) -> &'static str {
    match notice {
        Notice::UncheckedRequired { .. } => "unchecked-required",
        Notice::ServiceSkipped(_) => "service-skipped",
    }
}

fn collect_notices(program: &Program) -> Vec<Notice> {
    let required = program.objects().flat_map(|object| {
        object
            .fields
            .iter()
            .filter(|field| field.requiredness == Requiredness::Required)
            .map(|field| Notice::UncheckedRequired {
                strukt: object.name.clone(),
                field: field.name.clone(),
            })
    });
    let services = program
        .services
        .iter()
        .map(|service| {
            debug!(
                service = %service.name,
                functions = service.functions.len(),
                "skipping service"
            );
            Notice::ServiceSkipped(service.name.clone())
        });
    required.chain(services).collect()
}

/// Sections separated by blank lines.
fn sections<'a>(alloc: &'a BoxAllocator, sections: Vec<Doc<'a>>) -> Doc<'a> {
    alloc.intersperse(sections, alloc.hardline().append(alloc.hardline()))
}

fn lines<'a>(alloc: &'a BoxAllocator, lines: impl IntoIterator<Item = String>) -> Doc<'a> {
    alloc.intersperse(lines.into_iter().map(|line| alloc.text(line)), alloc.hardline())
}

fn banner(alloc: &BoxAllocator) -> Doc<'_> {
    lines(alloc, BANNER.lines().map(str::to_owned))
}

fn declarations<'a>(
    ctx: CodegenContext<'a>,
    program: &Program,
    options: &Options,
) -> Result<Doc<'a>, CodegenError> {
    let alloc = ctx.alloc;
    let guard = format!("{}_TYPES_H", to_upper_snake_case(&program.name));

    let mut parts = vec![
        banner(alloc),
        lines(alloc, [format!("#ifndef {guard}"), format!("#define {guard}")]),
        lines(
            alloc,
            [
                "/* base includes */",
                "#include <glib-object.h>",
                "#include \"thrift_protocol.h\"",
                "#include \"thrift_struct.h\"",
            ]
            .map(str::to_owned),
        ),
    ];

    if !program.includes.is_empty() {
        let includes = program.includes.iter().map(|include| {
            format!(
                "#include \"{include}_types.{}\"",
                options.declarations_extension
            )
        });
        parts.push(lines(
            alloc,
            std::iter::once("/* other thrift includes */".to_owned()).chain(includes),
        ));
    }

    if !program.custom_includes.is_empty() {
        let includes = program.custom_includes.iter().map(|include| match include {
            CustomInclude::System(path) => format!("#include <{path}>"),
            CustomInclude::Local(path) => format!("#include \"{path}\""),
        });
        parts.push(lines(
            alloc,
            std::iter::once("/* custom thrift includes */".to_owned()).chain(includes),
        ));
    }

    if program.objects().next().is_some() {
        let forward = program
            .objects()
            .map(|object| forward_declaration(ctx, object))
            .collect::<Vec<_>>();
        parts.push(alloc.intersperse(forward, alloc.hardline()));
    }

    for typedef in &program.typedefs {
        debug!(name = %typedef.name, "typedef");
        // Enums can't be forward-declared, so the alias would name an unknown type.
        if let TypeNode::Enum { name } = typedef.target.true_type() {
            if program.enums.iter().any(|enumeration| enumeration.name == *name) {
                return Err(CodegenError::EnumAliasedEarly {
                    symbol: typedef.name.clone(),
                    target: name.clone(),
                });
            }
        }
        parts.push(typedef_declaration(ctx, typedef)?);
    }
    for enumeration in &program.enums {
        debug!(name = %enumeration.name, "enum");
        parts.push(enum_declaration(ctx, enumeration));
    }
    for constant in &program.consts {
        debug!(name = %constant.name, "const");
        parts.push(constant_declaration(ctx, constant)?);
    }
    for object in &program.structs {
        debug!(name = %object.name, "struct");
        parts.push(object_declaration(ctx, object)?);
    }
    for object in &program.exceptions {
        debug!(name = %object.name, "exception");
        parts.push(object_declaration(ctx, object)?);
    }

    parts.push(alloc.text(format!("#endif /* {guard} */")));
    Ok(sections(alloc, parts))
}

fn definitions<'a>(
    ctx: CodegenContext<'a>,
    program: &Program,
    declarations_file: &str,
) -> Result<Doc<'a>, CodegenError> {
    let alloc = ctx.alloc;
    let mut temporaries = Temporaries::new();

    let mut parts = vec![
        banner(alloc),
        alloc.text(format!("#include \"{declarations_file}\"")),
    ];
    for object in program.objects() {
        let writer = struct_writer(ctx.names, &mut temporaries, object)?;
        parts.push(object_definition(ctx, object, &writer)?);
    }
    Ok(sections(alloc, parts))
}
