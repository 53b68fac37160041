pub mod c_gen;
pub mod caser;
pub mod error;
mod format;
pub mod identifiers;
pub mod options;

pub use error::{CodegenError, Notice};
pub use options::Options;

use format::{BoxAllocator, DocAllocator, DocBuilder, NEST_UNIT};
