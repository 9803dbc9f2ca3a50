//! The edit vocabulary produced by [`diff`](`crate::diff()`) and consumed by [`apply`](`crate::apply()`).

use crate::element::{Attributes, Element};
use core::{
	fmt::{self, Display, Formatter},
	str::FromStr,
};

/// Attribute-level changes of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDelta {
	/// Names missing in the source, with their destination values.
	pub added: Attributes,
	/// Names present in both with differing values, with their destination values.
	pub changed: Attributes,
	/// Names missing in the destination.
	pub removed: Vec<String>,
}

impl AttributeDelta {
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
	}
}

/// One edit at the tree position a [`ListPatch`] is scoped to.
///
/// Child indices refer to the child list *as it is during the pass that handles the op*, see [`ListPatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
	/// Discard the whole subtree at this position. Any further ops at this level are moot.
	ReplaceNode(Element),
	UpdateAttributes(AttributeDelta),
	/// Only valid on text nodes.
	UpdateText(String),
	InsertChild { index: usize, element: Element },
	RemoveChild { index: usize },
	/// Remove the child at `from`, then insert it at `to` in the shortened list.
	MoveChild { from: usize, to: usize },
	/// Retained child at its final `index`, with edits inside it.
	Recurse { index: usize, patch: ListPatch },
}

impl PatchOp {
	#[must_use]
	pub fn kind(&self) -> OpKind {
		match self {
			PatchOp::ReplaceNode(_) => OpKind::ReplaceNode,
			PatchOp::UpdateAttributes(_) => OpKind::UpdateAttributes,
			PatchOp::UpdateText(_) => OpKind::UpdateText,
			PatchOp::InsertChild { .. } => OpKind::InsertChild,
			PatchOp::RemoveChild { .. } => OpKind::RemoveChild,
			PatchOp::MoveChild { .. } => OpKind::MoveChild,
			PatchOp::Recurse { .. } => OpKind::Recurse,
		}
	}
}

/// Field-less mirror of [`PatchOp`], used as the tag of exported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
	ReplaceNode,
	UpdateAttributes,
	UpdateText,
	InsertChild,
	RemoveChild,
	MoveChild,
	Recurse,
}

impl OpKind {
	pub const ALL: [OpKind; 7] = [
		OpKind::ReplaceNode,
		OpKind::UpdateAttributes,
		OpKind::UpdateText,
		OpKind::InsertChild,
		OpKind::RemoveChild,
		OpKind::MoveChild,
		OpKind::Recurse,
	];

	/// Stable name used in exports.
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			OpKind::ReplaceNode => "replace",
			OpKind::UpdateAttributes => "attributes",
			OpKind::UpdateText => "text",
			OpKind::InsertChild => "insert",
			OpKind::RemoveChild => "remove",
			OpKind::MoveChild => "move",
			OpKind::Recurse => "recurse",
		}
	}
}

impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OpKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		OpKind::ALL.iter().copied().find(|kind| kind.as_str() == s).ok_or_else(|| s.to_owned())
	}
}

/// Ordered edits for one tree position, with nested patches for retained children.
///
/// An applier processes a `ListPatch` as follows:
///
/// 1. Node-level ops ([`PatchOp::UpdateAttributes`], [`PatchOp::UpdateText`], [`PatchOp::ReplaceNode`]) in listed order.
///    A [`PatchOp::ReplaceNode`] ends processing of this `ListPatch`.
/// 2. All [`PatchOp::RemoveChild`] by descending index.
/// 3. All [`PatchOp::InsertChild`] by ascending index, against the list left by step 2.
/// 4. All [`PatchOp::MoveChild`] in listed order.
/// 5. Each [`PatchOp::Recurse`], with indices into the final child list.
///
/// [`diff`](`crate::diff()`) emits ops in exactly this order.
/// A `ListPatch` is only meaningful for the tree it was computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPatch {
	ops: Vec<PatchOp>,
}

impl ListPatch {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps hand-assembled ops without checking them. Mismatches surface when applying.
	#[must_use]
	pub fn from_ops(ops: Vec<PatchOp>) -> Self {
		Self { ops }
	}

	#[must_use]
	pub fn ops(&self) -> &[PatchOp] {
		&self.ops
	}

	#[must_use]
	pub fn into_ops(self) -> Vec<PatchOp> {
		self.ops
	}

	/// Number of ops at this level only.
	#[must_use]
	pub fn len(&self) -> usize {
		self.ops.len()
	}

	/// `true` iff applying this patch can't change anything.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.ops.iter().all(|op| matches!(op, PatchOp::Recurse { patch, .. } if patch.is_empty()))
	}

	/// Op counts over this patch and all nested ones.
	#[must_use]
	pub fn stats(&self) -> PatchStats {
		let mut stats = PatchStats::default();
		stats.add(self);
		stats
	}

	pub(crate) fn push(&mut self, op: PatchOp) {
		self.ops.push(op)
	}
}

impl IntoIterator for ListPatch {
	type Item = PatchOp;
	type IntoIter = std::vec::IntoIter<PatchOp>;

	fn into_iter(self) -> Self::IntoIter {
		self.ops.into_iter()
	}
}

impl<'a> IntoIterator for &'a ListPatch {
	type Item = &'a PatchOp;
	type IntoIter = core::slice::Iter<'a, PatchOp>;

	fn into_iter(self) -> Self::IntoIter {
		self.ops.iter()
	}
}

/// Recursive per-kind op counts of a [`ListPatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
	pub replaced: usize,
	pub attribute_updates: usize,
	pub text_updates: usize,
	pub inserted: usize,
	pub removed: usize,
	pub moved: usize,
	pub recursions: usize,
}

impl PatchStats {
	fn add(&mut self, patch: &ListPatch) {
		for op in patch {
			match op {
				PatchOp::ReplaceNode(_) => self.replaced += 1,
				PatchOp::UpdateAttributes(_) => self.attribute_updates += 1,
				PatchOp::UpdateText(_) => self.text_updates += 1,
				PatchOp::InsertChild { .. } => self.inserted += 1,
				PatchOp::RemoveChild { .. } => self.removed += 1,
				PatchOp::MoveChild { .. } => self.moved += 1,
				PatchOp::Recurse { patch, .. } => {
					self.recursions += 1;
					self.add(patch)
				}
			}
		}
	}

	/// Total number of ops, nested ones included.
	#[must_use]
	pub fn total(&self) -> usize {
		self.replaced + self.attribute_updates + self.text_updates + self.inserted + self.removed + self.moved + self.recursions
	}
}
