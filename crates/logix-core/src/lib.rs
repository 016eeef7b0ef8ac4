//! Domain model for Logix controller projects.
//!
//! A [`Controller`] owns six name-keyed collections (data types, modules,
//! add-on instructions, tags, programs and tasks). Cross references between
//! them are typed arena ids recomputed by [`Controller::rebind`], so the graph
//! can be edited freely and rebound afterwards.
//!
//! ## Modules
//!
//! - [`collection`]: ordered, name-unique arenas with stable ids
//! - [`vocab`]: closed attribute vocabularies
//! - [`description`]: `<@KEY value>` property tokens inside descriptions
//! - [`value`]: structured tag value trees derived from data types
//! - [`miner`]: instruction and operand extraction from rung text
//! - [`rebind`]: name resolution across the whole graph
//! - [`closure`]: dependency closure of any object
//! - [`substitute`]: simultaneous string substitution for renaming

pub mod aoi;
pub mod closure;
pub mod collection;
pub mod controller;
pub mod datatype;
pub mod description;
pub mod error;
pub mod miner;
pub mod module;
pub mod name;
pub mod program;
pub mod rebind;
pub mod routine;
pub mod substitute;
pub mod tag;
pub mod task;
pub mod value;
pub mod vocab;

pub use aoi::{AddOnInstruction, AoiParameter, LocalTag};
pub use closure::{Dependencies, DependencyResolver};
pub use collection::{Collection, Id, Named};
pub use controller::{Controller, Entity, EntityKind, RedundancyInfo, SafetyInfo, SecurityInfo};
pub use datatype::{DataType, DataTypeMember};
pub use description::DescriptionProperties;
pub use error::{CoreError, Result};
pub use module::{ExtensionElement, Module, ModulePort};
pub use program::{Program, Role};
pub use routine::{Routine, Rung};
pub use substitute::Substitution;
pub use tag::{Tag, TagRef};
pub use task::Task;
pub use value::{ArrayElements, MemberValue, TagValue};
