pub mod ast;
pub mod wire;
