//! Arena-of-nodes tree storage with index-based children, which [`ListPatch`]es can mutate in place.

use crate::{
	apply::{check_index, mismatch, update_attributes, validate_probe, Passes, Probe, Step},
	element::{Attributes, Content, Element},
	error::{ApplyError, ApplyErrorKind},
	patch::{ListPatch, OpKind},
};
use core::mem;
use std::borrow::Cow;
use tracing::{debug, instrument, trace, trace_span, warn};

/// Handle of a node slot in a [`NodeArena`].
///
/// Slots of removed subtrees are reused, so a stale handle may point at an unrelated node later on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
	#[must_use]
	pub fn index(self) -> usize {
		self.0
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArenaContent {
	Text(String),
	Children(Vec<NodeId>),
}

/// An [`Element`] whose children live elsewhere in the same [`NodeArena`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaNode {
	tag: String,
	attributes: Attributes,
	content: ArenaContent,
	key: Option<String>,
	parent: Option<NodeId>,
}

impl ArenaNode {
	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	#[must_use]
	pub fn content(&self) -> &ArenaContent {
		&self.content
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self.content, ArenaContent::Text(_))
	}

	#[must_use]
	pub fn text_content(&self) -> Option<&str> {
		match &self.content {
			ArenaContent::Text(text) => Some(text),
			ArenaContent::Children(_) => None,
		}
	}

	#[must_use]
	pub fn children(&self) -> &[NodeId] {
		match &self.content {
			ArenaContent::Text(_) => &[],
			ArenaContent::Children(children) => children,
		}
	}

	/// [`None`] for tree roots.
	#[must_use]
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}
}

/// Shared node storage for any number of trees.
///
/// Unlike [`apply_in_place`](`crate::apply_in_place`), [`NodeArena::apply_mutating`] keeps the [`NodeId`] of every retained node stable,
/// so a renderer can keep side tables keyed by it.
///
/// # Concurrency
///
/// `apply_mutating` takes `&mut self`, so the borrow checker already rules out concurrent reads of a tree while it is patched.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
	slots: Vec<Option<ArenaNode>>,
	free: Vec<usize>,
}

impl NodeArena {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of live nodes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Copies `element` into the arena and returns the handle of its root.
	pub fn insert_tree(&mut self, element: &Element) -> NodeId {
		self.insert_owned(element.clone())
	}

	/// Moves `element` into the arena and returns the handle of its root.
	pub fn insert_owned(&mut self, element: Element) -> NodeId {
		let node = self.build(element);
		let id = self.allocate(node);
		self.adopt_children(id);
		id
	}

	#[must_use]
	pub fn get(&self, id: NodeId) -> Option<&ArenaNode> {
		self.slots.get(id.0).and_then(Option::as_ref)
	}

	/// Reassembles the subtree at `id` as a standalone [`Element`].
	#[must_use]
	pub fn to_element(&self, id: NodeId) -> Option<Element> {
		let node = self.get(id)?;
		let content = match &node.content {
			ArenaContent::Text(text) => Content::Text(text.clone()),
			ArenaContent::Children(children) => Content::Children(children.iter().map(|&child| self.to_element(child)).collect::<Option<_>>()?),
		};
		Some(Element::from_parts(node.tag.clone(), node.attributes.clone(), content, node.key.clone()))
	}

	/// Frees the whole tree rooted at `id`. Returns `false` iff `id` isn't a live root.
	///
	/// Child nodes can't be removed on their own, since their parent would keep a dangling handle.
	/// Remove them with a [`PatchOp::RemoveChild`](`crate::PatchOp::RemoveChild`) on the parent instead.
	pub fn remove_tree(&mut self, id: NodeId) -> bool {
		match self.get(id) {
			Some(node) if node.parent.is_none() => {
				self.free_subtree(id);
				true
			}
			Some(_) => {
				warn!("Refusing to remove {:?} on its own, as it is a child node.", id);
				false
			}
			None => false,
		}
	}

	/// Applies `patch` to the tree rooted at `root`, mutating its slots in place.
	///
	/// A [`PatchOp::ReplaceNode`](`crate::PatchOp::ReplaceNode`) at the root overwrites the root slot, so `root` stays valid.
	/// The patch is validated first, so nothing is modified unless the whole patch fits.
	///
	/// # Errors
	///
	/// Iff `root` isn't live or `patch` doesn't fit the tree at `root`.
	#[instrument(skip(self, patch))]
	pub fn apply_mutating(&mut self, root: NodeId, patch: ListPatch) -> Result<(), ApplyError> {
		if self.get(root).is_none() {
			return Err(mismatch(ApplyErrorKind::UnknownRoot { id: root.0 }));
		}
		validate_probe(Probe::Arena(self, root), &patch)?;
		self.patch_node(root, Cow::Owned(patch))?;
		debug!(live_nodes = self.len(), free_slots = self.free.len(), "Applied patch to arena.");
		Ok(())
	}

	pub(crate) fn node(&self, id: NodeId) -> &ArenaNode {
		self.get(id).unwrap_or_else(|| panic!("vdom-patch bug: dangling {:?}", id))
	}

	fn node_mut(&mut self, id: NodeId) -> &mut ArenaNode {
		self.slots.get_mut(id.0).and_then(Option::as_mut).unwrap_or_else(|| panic!("vdom-patch bug: dangling {:?}", id))
	}

	fn build(&mut self, element: Element) -> ArenaNode {
		let (tag, attributes, content, key) = element.into_parts();
		let content = match content {
			Content::Text(text) => ArenaContent::Text(text),
			Content::Children(children) => ArenaContent::Children(children.into_iter().map(|child| self.insert_owned(child)).collect()),
		};
		ArenaNode { tag, attributes, content, key, parent: None }
	}

	fn adopt_children(&mut self, id: NodeId) {
		for child in self.node(id).children().to_vec() {
			self.node_mut(child).parent = Some(id);
		}
	}

	fn allocate(&mut self, node: ArenaNode) -> NodeId {
		match self.free.pop() {
			Some(index) => {
				self.slots[index] = Some(node);
				NodeId(index)
			}
			None => {
				self.slots.push(Some(node));
				NodeId(self.slots.len() - 1)
			}
		}
	}

	fn free_subtree(&mut self, id: NodeId) {
		if let Some(node) = self.slots[id.0].take() {
			self.free.push(id.0);
			for &child in node.children() {
				self.free_subtree(child)
			}
		}
	}

	fn overwrite(&mut self, id: NodeId, element: Element) {
		let mut parent = None;
		if let Some(old) = self.slots[id.0].take() {
			parent = old.parent;
			for &child in old.children() {
				self.free_subtree(child)
			}
		}
		let node = self.build(element);
		self.slots[id.0] = Some(ArenaNode { parent, ..node });
		self.adopt_children(id);
	}

	fn patch_node(&mut self, id: NodeId, patch: Cow<'_, ListPatch>) -> Result<(), ApplyError> {
		let Passes { node: node_steps, removals, insertions, moves, recursions, first_structural } = Passes::split(patch)?;

		for step in node_steps {
			match step {
				Step::Replace(element) => {
					trace!(slot = id.0, tag = element.tag(), "Overwriting slot.");
					self.overwrite(id, element.into_owned());
					return Ok(());
				}
				Step::Attributes(delta) => update_attributes(&mut self.node_mut(id).attributes, delta.into_owned()),
				Step::Text(text) => match &mut self.node_mut(id).content {
					ArenaContent::Text(old) => *old = text.into_owned(),
					ArenaContent::Children(_) => return Err(mismatch(ApplyErrorKind::ElementHasNoText)),
				},
				_ => unreachable!("vdom-patch bug: structural op among node-level ops"),
			}
		}

		let op = match first_structural {
			None => return Ok(()),
			Some(op) => op,
		};
		let mut children = match &mut self.node_mut(id).content {
			ArenaContent::Children(children) => mem::take(children),
			ArenaContent::Text(_) => return Err(mismatch(ApplyErrorKind::TextNodeHasNoChildren { op })),
		};

		let restructured = self.restructure(id, &mut children, removals, insertions, moves);
		self.node_mut(id).content = ArenaContent::Children(children);
		restructured?;

		for (index, patch) in recursions {
			let child = match self.node(id).children().get(index) {
				Some(&child) => child,
				None => return Err(mismatch(ApplyErrorKind::IndexOutOfBounds { op: OpKind::Recurse, index, len: self.node(id).children().len() })),
			};
			let span = trace_span!("Patching child", index, slot = child.0);
			let _enter = span.enter();
			self.patch_node(child, patch).map_err(|error| error.within(index))?;
		}
		Ok(())
	}

	fn restructure(
		&mut self,
		parent: NodeId,
		children: &mut Vec<NodeId>,
		removals: Vec<usize>,
		insertions: Vec<(usize, Cow<'_, Element>)>,
		moves: Vec<(usize, usize)>,
	) -> Result<(), ApplyError> {
		for index in removals {
			check_index(OpKind::RemoveChild, index, children.len())?;
			let removed = children.remove(index);
			self.free_subtree(removed);
		}
		for (index, element) in insertions {
			check_index(OpKind::InsertChild, index, children.len() + 1)?;
			let inserted = self.insert_owned(element.into_owned());
			self.node_mut(inserted).parent = Some(parent);
			children.insert(index, inserted);
		}
		for (from, to) in moves {
			check_index(OpKind::MoveChild, from, children.len())?;
			check_index(OpKind::MoveChild, to, children.len())?;
			let child = children.remove(from);
			children.insert(to, child);
		}
		Ok(())
	}
}
