//! The `:command` interpreter.
//!
//! - Registry: command descriptors and prefix lookup (registry.rs)
//! - Parsing: chains, segments, name/args/bang (parse.rs)
//! - Dispatch: resolving and running lines, live and confirmed (dispatch.rs)
//! - Builtins: the command table (builtins.rs)
//! - Completion: suggestions and history (complete.rs)
//!
//! Commands are abbreviated Vim style: any prefix that names exactly one
//! command runs it.

mod builtins;
mod complete;
mod dispatch;
mod parse;
mod registry;

pub use complete::{complete, History};
pub use dispatch::{execute_line, type_line};
pub use registry::CommandRegistry;
