//! Transforms a small imperative scripting language into a collection of
//! ordinary functions wired together through a process-wide event-pointer
//! table, so that every `await` boundary in the source becomes an event-loop
//! yield in the output.
//!
//! Pipeline: [`surface::grammar::parse`] produces a [`surface::ast::Chunk`],
//! [`driver::compile`] runs the six IR passes over it, and [`output::render`]'s
//! `Display` impl turns the resulting [`output::ast::Program`] back into
//! source text.

pub mod config;
pub mod driver;
pub mod error;
pub mod ident;
pub mod ir;
pub mod output;
pub mod passes;
pub mod surface;

pub use config::Options;
pub use driver::{Compilation, compile};
pub use error::Error;
pub use output::ast::Program;
pub use surface::ast::Chunk;

/// Parses `input` with the toy surface grammar and compiles it in one call —
/// the entry point the CLI binary (and integration tests) call.
pub fn compile_source(input: &str, options: &Options) -> Result<Compilation, Error> {
    let body = surface::grammar::parse(input).map_err(|e| Error::ParseError(e.to_string()))?;
    let chunk = Chunk { body };
    driver::compile(&chunk, options)
}
