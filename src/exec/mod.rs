//! External command module
//!
//! Structured command construction for `dd`/`lfs` and the runner that
//! executes them.

pub mod runner;
pub mod tools;

pub use runner::{CommandRunner, CommandSpec, SystemRunner};
pub use tools::{Dd, Lfs};
