use crate::{
	element::{Attributes, Content, Element},
	patch::{AttributeDelta, ListPatch, PatchOp},
	path::TracePath,
	reconcile::{reconcile, Reconciliation},
};
use tracing::{debug, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Computes a [`ListPatch`] that turns `source` into `destination`, with default settings.
///
/// See [`Differ::diff`].
#[must_use]
pub fn diff(source: &Element, destination: &Element) -> ListPatch {
	Differ::default().diff(source, destination)
}

/// Configurable tree differ. Stateless between calls, so one instance can be shared freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Differ {
	depth_limit: usize,
}

impl Default for Differ {
	fn default() -> Self {
		Self::new()
	}
}

impl Differ {
	pub const DEFAULT_DEPTH_LIMIT: usize = 512;

	#[must_use]
	pub fn new() -> Self {
		Self { depth_limit: Self::DEFAULT_DEPTH_LIMIT }
	}

	/// How many levels below the root are diffed.
	///
	/// Differing nodes found beyond that are replaced wholesale instead, which is still correct but less minimal.
	#[must_use]
	pub fn depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	/// Computes the edits that turn `source` into `destination`. Neither input is modified.
	///
	/// - A differing tag, node kind (text vs. child list) or key replaces the node.
	/// - Text nodes get an attribute delta and a text update.
	/// - Child lists are reconciled by key, then by position among unkeyed children.
	///   Matched children are diffed recursively and only appear as [`PatchOp::Recurse`] if anything changed inside them.
	#[must_use]
	#[instrument(skip(source, destination), fields(source_tag = source.tag(), destination_tag = destination.tag()))]
	pub fn diff(&self, source: &Element, destination: &Element) -> ListPatch {
		let mut path = TracePath::default();
		let patch = self.diff_node(source, destination, self.depth_limit, &mut path);
		if STATIC_MAX_LEVEL >= Level::DEBUG {
			debug!(stats = ?patch.stats(), "Diff complete.");
		}
		patch
	}

	fn diff_node(&self, source: &Element, destination: &Element, depth_limit: usize, path: &mut TracePath) -> ListPatch {
		let mut patch = ListPatch::new();
		if source == destination {
			return patch;
		}

		if source.tag() != destination.tag() || source.key() != destination.key() || source.is_text() != destination.is_text() {
			trace!(source.tag = source.tag(), destination.tag = destination.tag(), "Replacing mismatching node.");
			patch.push(PatchOp::ReplaceNode(destination.clone()));
			return patch;
		}

		if depth_limit == 0 {
			warn!("Depth limit reached at {}. Replacing the <{}> subtree instead of diffing it.", path, destination.tag());
			patch.push(PatchOp::ReplaceNode(destination.clone()));
			return patch;
		}

		let delta = diff_attributes(source.attributes(), destination.attributes());
		if !delta.is_empty() {
			if cfg!(feature = "dangerous-logging") {
				trace!(?delta, "Updating attributes.");
			} else {
				trace!(added = delta.added.len(), changed = delta.changed.len(), removed = delta.removed.len(), "Updating attributes.");
			}
			patch.push(PatchOp::UpdateAttributes(delta));
		}

		match (source.content(), destination.content()) {
			(Content::Text(t_1), Content::Text(t_2)) => {
				if t_1 != t_2 {
					if cfg!(feature = "dangerous-logging") {
						trace!(t_1 = t_1.as_str(), t_2 = t_2.as_str(), "Updating text.");
					} else {
						trace!("Updating text.");
					}
					patch.push(PatchOp::UpdateText(t_2.clone()));
				}
			}
			(Content::Children(c_1), Content::Children(c_2)) => self.diff_children(c_1, c_2, &mut patch, depth_limit, path),
			(Content::Text(_), Content::Children(_)) | (Content::Children(_), Content::Text(_)) => {
				unreachable!("vdom-patch bug: node kind mismatch slipped past the replacement check")
			}
		}

		patch
	}

	fn diff_children(&self, c_1: &[Element], c_2: &[Element], patch: &mut ListPatch, depth_limit: usize, path: &mut TracePath) {
		let Reconciliation { removals, insertions, moves, matches } = reconcile(c_1, c_2, path);

		for index in removals {
			patch.push(PatchOp::RemoveChild { index });
		}
		for (index, d) in insertions {
			patch.push(PatchOp::InsertChild { index, element: c_2[d].clone() });
		}
		for (from, to) in moves {
			patch.push(PatchOp::MoveChild { from, to });
		}

		for (d, s) in matches {
			let span = trace_span!("Diffing child", index = d, tag = c_2[d].tag(), key = ?c_2[d].key());
			let _enter = span.enter();

			path.push(d);
			let nested = self.diff_node(&c_1[s], &c_2[d], depth_limit - 1, path);
			path.pop();

			if !nested.is_empty() {
				patch.push(PatchOp::Recurse { index: d, patch: nested });
			}
		}
	}
}

fn diff_attributes(a_1: &Attributes, a_2: &Attributes) -> AttributeDelta {
	let mut delta = AttributeDelta::default();
	for (name, value) in a_2 {
		match a_1.get(name) {
			None => {
				delta.added.insert(name.clone(), value.clone());
			}
			Some(old) if old != value => {
				delta.changed.insert(name.clone(), value.clone());
			}
			Some(_) => (),
		}
	}
	delta.removed = a_1.keys().filter(|name| !a_2.contains_key(name.as_str())).cloned().collect();
	delta
}
