//! C backend targeting the GLib object system and the thrift_c_glib runtime.

pub mod constants;
pub mod declare;
pub mod names;
pub mod program;
pub mod serialize;
pub mod types;

pub use names::Namespace;
pub use program::{GeneratedProgram, generate_program};

use crate::BoxAllocator;

#[derive(Clone, Copy)]
pub struct CodegenContext<'a> {
    pub alloc: &'a BoxAllocator,
    pub names: &'a Namespace,
}
