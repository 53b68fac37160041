use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io,
};

use tidl_binary_runtime::{BinaryProtocol, BinaryReader, Protocol, Value};
use tidl_core::ast::Program;
use tidl_gen::{
    c_gen::{
        Namespace,
        serialize::{Place, Primitive, StructWriter, ValueWriter, struct_writer},
    },
    identifiers::Temporaries,
};

/// In-memory instance shaped like the generated C structs.
#[derive(Clone, Debug)]
pub enum Datum {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
    Object(Object),
    List(Vec<Datum>),
    /// Hash table entries in iteration order. Sets have no values.
    Table(Vec<(Datum, Option<Datum>)>),
}

#[derive(Clone, Debug)]
pub struct Object {
    pub class: String,
    pub members: HashMap<String, Datum>,
    pub isset: HashSet<String>,
}

impl Object {
    pub fn new(class: &str) -> Self {
        Object {
            class: class.to_owned(),
            members: HashMap::new(),
            isset: HashSet::new(),
        }
    }

    pub fn with(mut self, member: &str, value: Datum) -> Self {
        self.members.insert(member.to_owned(), value);
        self
    }

    /// Assigns an optional member and raises its presence flag.
    pub fn with_set(mut self, member: &str, value: Datum) -> Self {
        self.isset.insert(member.to_owned());
        self.with(member, value)
    }
}

#[derive(Default)]
struct Bindings {
    indices: HashMap<String, usize>,
    slots: HashMap<String, Datum>,
}

/// Runs serialization plans the way the generated C runs: struct writes are
/// dispatched on the instance's class, like the vtable `class_init` fills.
pub struct Interpreter {
    classes: HashMap<String, StructWriter>,
}

impl Interpreter {
    pub fn new(program: &Program) -> Self {
        let names = Namespace::new(&program.namespace);
        let mut temporaries = Temporaries::new();
        let classes = program
            .objects()
            .map(|def| {
                let writer =
                    struct_writer(&names, &mut temporaries, def).expect("writable struct");
                (def.name.clone(), writer)
            })
            .collect();
        Interpreter { classes }
    }

    pub fn writer(&self, class: &str) -> &StructWriter {
        &self.classes[class]
    }

    pub fn write<P: Protocol>(&self, protocol: &mut P, object: &Object) -> io::Result<usize> {
        let writer = self.writer(&object.class);
        let mut bindings = Bindings::default();
        let mut xfer = protocol.write_struct_begin(&writer.names.name)?;
        for field in &writer.fields {
            if field.is_guarded() && !object.isset.contains(&field.name) {
                continue;
            }
            xfer += protocol.write_field_begin(&field.name, field.tag, field.id)?;
            xfer += self.write_value(protocol, object, &mut bindings, &field.value)?;
            xfer += protocol.write_field_end()?;
        }
        xfer += protocol.write_field_stop()?;
        xfer += protocol.write_struct_end()?;
        Ok(xfer)
    }

    fn write_value<P: Protocol>(
        &self,
        protocol: &mut P,
        object: &Object,
        bindings: &mut Bindings,
        writer: &ValueWriter,
    ) -> io::Result<usize> {
        match writer {
            ValueWriter::Primitive { kind, place } => {
                let datum = evaluate(object, bindings, place);
                match (kind, datum) {
                    (Primitive::String, Datum::Str(value)) => protocol.write_string(&value),
                    (Primitive::Binary, Datum::Bytes(value)) => protocol.write_binary(&value),
                    (Primitive::Bool, Datum::Bool(value)) => protocol.write_bool(value),
                    (Primitive::Byte, Datum::Int(value)) => protocol.write_byte(value as i8),
                    (Primitive::I16, Datum::Int(value)) => protocol.write_i16(value as i16),
                    (Primitive::I32 | Primitive::Enum, Datum::Int(value)) => {
                        protocol.write_i32(value as i32)
                    }
                    (Primitive::I64, Datum::Int(value)) => protocol.write_i64(value),
                    (Primitive::Double, Datum::Double(value)) => protocol.write_double(value),
                    (kind, datum) => panic!("{datum:?} can't be written as {kind:?}"),
                }
            }
            ValueWriter::Struct { place } => match evaluate(object, bindings, place) {
                Datum::Object(nested) => self.write(protocol, &nested),
                datum => panic!("{datum:?} is not an object"),
            },
            ValueWriter::List {
                elem,
                place,
                index,
                element,
            } => {
                let Datum::List(items) = evaluate(object, bindings, place) else {
                    panic!("{place:?} is not a list");
                };
                let mut xfer = protocol.write_list_begin(*elem, items.len())?;
                for i in 0..items.len() {
                    bindings.indices.insert(index.clone(), i);
                    xfer += self.write_value(protocol, object, bindings, element)?;
                }
                xfer += protocol.write_list_end()?;
                Ok(xfer)
            }
            ValueWriter::Set {
                elem,
                place,
                slot,
                element,
                ..
            } => {
                let Datum::Table(entries) = evaluate(object, bindings, place) else {
                    panic!("{place:?} is not a table");
                };
                let mut xfer = protocol.write_set_begin(*elem, entries.len())?;
                for (key, _) in entries {
                    bindings.slots.insert(slot.clone(), key);
                    xfer += self.write_value(protocol, object, bindings, element)?;
                }
                xfer += protocol.write_set_end()?;
                Ok(xfer)
            }
            ValueWriter::Map {
                key,
                value,
                place,
                key_slot,
                value_slot,
                key_writer,
                value_writer,
                ..
            } => {
                let Datum::Table(entries) = evaluate(object, bindings, place) else {
                    panic!("{place:?} is not a table");
                };
                let mut xfer = protocol.write_map_begin(*key, *value, entries.len())?;
                for (k, v) in entries {
                    bindings.slots.insert(key_slot.clone(), k);
                    bindings
                        .slots
                        .insert(value_slot.clone(), v.expect("map entries have values"));
                    xfer += self.write_value(protocol, object, bindings, key_writer)?;
                    xfer += self.write_value(protocol, object, bindings, value_writer)?;
                }
                xfer += protocol.write_map_end()?;
                Ok(xfer)
            }
        }
    }
}

fn evaluate(object: &Object, bindings: &Bindings, place: &Place) -> Datum {
    match place {
        Place::Member(name) => object
            .members
            .get(name)
            .unwrap_or_else(|| panic!("`{}.{name}` is not assigned", object.class))
            .clone(),
        Place::Element { list, index, .. } => match evaluate(object, bindings, list) {
            Datum::List(items) => items[bindings.indices[index]].clone(),
            datum => panic!("{datum:?} is not a list"),
        },
        Place::Slot { var, .. } => bindings.slots[var].clone(),
    }
}

/// Serializes `object` and decodes the bytes back into wire values.
pub fn roundtrip(program: &Program, object: &Object) -> BTreeMap<i16, Value> {
    let interpreter = Interpreter::new(program);
    let mut protocol = BinaryProtocol::new(Vec::new());
    let written = interpreter
        .write(&mut protocol, object)
        .expect("writing into Vec is always ok");
    let bytes = protocol.into_inner();
    assert_eq!(written, bytes.len());

    let decoded = BinaryReader::new(bytes.as_slice())
        .read_struct()
        .expect("written bytes decode");
    for field in &interpreter.writer(&object.class).fields {
        if let Some(value) = decoded.get(&field.id) {
            assert_eq!(value.tag(), field.tag, "`{}` decoded with another tag", field.name);
        }
    }
    decoded
}
