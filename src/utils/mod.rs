//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Process invocation with exit-code classification
//! - `executable` - Executable discovery on the search path
//! - `io` - File I/O with consistent error handling

pub mod command;
pub mod executable;
pub mod io;
