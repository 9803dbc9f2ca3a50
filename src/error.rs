//! Error types for tree construction, patch application and patch import.

use crate::patch::OpKind;

/// Rejected [`Element`](`crate::Element`) construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
	/// Element nodes (those with a child list) need a non-empty tag.
	#[error("element nodes require a non-empty tag")]
	EmptyTag,
}

/// A [`ListPatch`](`crate::ListPatch`) did not fit the tree it was applied to.
///
/// This always means the patch was computed against a different tree, which is a programmer error.
/// Indices are never clamped and operations are never skipped to work around it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at child path {})", crate::path::format(.path))]
pub struct ApplyError {
	pub kind: ApplyErrorKind,
	/// Child indices from the root of the patched tree to the offending node.
	pub path: Vec<usize>,
}

impl ApplyError {
	pub(crate) fn new(kind: ApplyErrorKind) -> Self {
		Self { kind, path: Vec::new() }
	}

	/// Prefixes the path while the error propagates out of a [`PatchOp::Recurse`](`crate::PatchOp::Recurse`).
	#[must_use]
	pub(crate) fn within(mut self, index: usize) -> Self {
		self.path.insert(0, index);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyErrorKind {
	#[error("`{op}` references child index {index}, but there are only {len} child(ren) at that point")]
	IndexOutOfBounds { op: OpKind, index: usize, len: usize },

	#[error("child index {index} is removed more than once")]
	DuplicateRemoval { index: usize },

	#[error("`{op}` targets a text node, which has no child list")]
	TextNodeHasNoChildren { op: OpKind },

	#[error("`text` update targets an element node")]
	ElementHasNoText,

	#[error("node {id} is not in the arena")]
	UnknownRoot { id: usize },
}

/// A [`PatchRecord`](`crate::PatchRecord`) sequence could not be turned back into a [`ListPatch`](`crate::ListPatch`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
	#[error("`{op}` record is missing its `{field}` field")]
	MissingField { op: OpKind, field: &'static str },

	#[error("unknown patch op {0:?}")]
	UnknownOp(String),

	#[error("field `{field}` is not {expected}")]
	InvalidValue { field: &'static str, expected: &'static str },

	#[error(transparent)]
	Element(#[from] ElementError),
}
