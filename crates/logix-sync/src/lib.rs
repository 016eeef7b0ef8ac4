//! Push updates from a master Logix project into site projects.
//!
//! A master program's routines are merged into every target program that
//! carries the same role, with driver routines renamed per instance. Data
//! types, add-on instructions and tags the pushed logic depends on come along
//! and replace their target counterparts. See [`push_controller`].

pub mod error;
pub mod matching;
pub mod options;
pub mod push;
pub mod report;

pub use error::{Result, SyncError};
pub use matching::{similarity, DriverName};
pub use options::PushOptions;
pub use push::push_controller;
pub use report::{ProgramPush, PushReport, RoutinePush, SkippedRoutine};
