#![doc(html_root_url = "https://docs.rs/vdom-patch/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Virtual DOM diffing: computes minimal, index-based [`ListPatch`]es between two [`Element`] trees and applies them.
//!
//! [`diff`] and [`apply`] are pure. [`apply_in_place`] and [`NodeArena::apply_mutating`] mutate, but only after
//! the whole patch has been validated against the tree it is applied to.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod apply;
pub mod arena;
pub mod diff;
pub mod element;
pub mod error;
pub mod export;
pub mod js;
pub mod load;
pub mod patch;

mod path;
mod reconcile;

pub use apply::{apply, apply_in_place, validate};
pub use arena::{ArenaContent, ArenaNode, NodeArena, NodeId};
pub use diff::{diff, Differ};
pub use element::{attributes, AttrValue, Attributes, Content, Element};
pub use error::{ApplyError, ApplyErrorKind, ElementError, ImportError};
pub use export::PatchRecord;
pub use patch::{AttributeDelta, ListPatch, OpKind, PatchOp, PatchStats};
