//! A 32-bit "universal machine": eight registers, a pile of word arrays, and
//! fourteen instructions, one of which replaces the running program.

mod arena;
pub use arena::*;
mod error;
pub use error::*;
mod image;
pub use image::*;
pub mod instruction;
pub use instruction::Operation;
mod io;
pub use io::*;
mod machine;
pub use machine::*;
pub mod session;
pub use session::Session;

/// Names a live array. Handle 0 is always the program.
pub type Handle = u32;
