//! Command construction and process execution for `flutterkit`.
//!
//! [`spec::CommandSpec`] is the immutable description of one `flutter`
//! invocation; [`executor`] turns a spec into an OS process, either blocking
//! until exit or spawning it with a streamed-output handle.

pub mod executor;
pub mod spec;

pub use self::{
    executor::{run_and_wait, spawn, CommandEvent, RunningCommand},
    spec::{CommandSpec, OperationKind},
};
