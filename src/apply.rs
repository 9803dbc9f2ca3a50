use crate::{
	arena::{NodeArena, NodeId},
	element::{Attributes, Content, Element},
	error::{ApplyError, ApplyErrorKind},
	patch::{AttributeDelta, ListPatch, OpKind, PatchOp},
};
use std::borrow::Cow;
use tracing::{debug, error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, Level};

/// Applies `patch` to a copy of `tree` and returns the copy. `tree` itself is left untouched.
///
/// The patch is only read. Inserted and replacement subtrees are cloned as they are placed.
///
/// # Errors
///
/// Iff `patch` doesn't fit `tree`, which means it was computed against a different tree.
#[instrument(skip(tree, patch), fields(tag = tree.tag()))]
pub fn apply(tree: &Element, patch: &ListPatch) -> Result<Element, ApplyError> {
	let mut result = tree.clone();
	patch_element(&mut result, Cow::Borrowed(patch))?;
	if STATIC_MAX_LEVEL >= Level::DEBUG {
		debug!(stats = ?patch.stats(), "Applied patch to a copy.");
	}
	Ok(result)
}

/// Applies `patch` to `tree` directly, moving inserted and replacement subtrees out of the patch.
///
/// The patch is [validated](`validate`) first, so `tree` is only modified if the whole patch fits.
///
/// # Errors
///
/// Iff `patch` doesn't fit `tree`, which means it was computed against a different tree.
#[instrument(skip(tree, patch), fields(tag = tree.tag()))]
pub fn apply_in_place(tree: &mut Element, patch: ListPatch) -> Result<(), ApplyError> {
	validate(tree, &patch)?;
	let stats = if STATIC_MAX_LEVEL >= Level::DEBUG { Some(patch.stats()) } else { None };
	patch_element(tree, Cow::Owned(patch))?;
	if let Some(stats) = stats {
		debug!(?stats, "Applied patch in place.");
	}
	Ok(())
}

/// Checks that `patch` fits `tree` without applying it.
///
/// # Errors
///
/// Iff [`apply`] would fail with the same arguments.
pub fn validate(tree: &Element, patch: &ListPatch) -> Result<(), ApplyError> {
	validate_probe(Probe::Tree(tree), patch)
}

/// Read access to a node that is either a plain [`Element`] or stored in a [`NodeArena`].
#[derive(Clone, Copy)]
pub(crate) enum Probe<'a> {
	Tree(&'a Element),
	Arena(&'a NodeArena, NodeId),
}

impl<'a> Probe<'a> {
	fn is_text(self) -> bool {
		match self {
			Probe::Tree(element) => element.is_text(),
			Probe::Arena(arena, id) => arena.node(id).is_text(),
		}
	}

	fn children(self) -> Vec<Probe<'a>> {
		match self {
			Probe::Tree(element) => element.children().iter().map(Probe::Tree).collect(),
			Probe::Arena(arena, id) => arena.node(id).children().iter().map(|&child| Probe::Arena(arena, child)).collect(),
		}
	}
}

pub(crate) fn validate_probe(node: Probe<'_>, patch: &ListPatch) -> Result<(), ApplyError> {
	let mut removals = Vec::new();
	let mut insertions = Vec::new();
	let mut moves = Vec::new();
	let mut recursions = Vec::new();
	let mut first_structural = None;

	for op in patch {
		match op {
			PatchOp::ReplaceNode(_) => return Ok(()),
			PatchOp::UpdateAttributes(_) => (),
			PatchOp::UpdateText(_) => {
				if !node.is_text() {
					return Err(mismatch(ApplyErrorKind::ElementHasNoText));
				}
			}
			PatchOp::RemoveChild { index } => removals.push(*index),
			PatchOp::InsertChild { index, element } => insertions.push((*index, element)),
			PatchOp::MoveChild { from, to } => moves.push((*from, *to)),
			PatchOp::Recurse { index, patch } => recursions.push((*index, patch)),
		}
		if first_structural.is_none() && !matches!(op, PatchOp::UpdateAttributes(_) | PatchOp::UpdateText(_)) {
			first_structural = Some(op.kind());
		}
	}

	let op = match first_structural {
		None => return Ok(()),
		Some(op) => op,
	};
	if node.is_text() {
		return Err(mismatch(ApplyErrorKind::TextNodeHasNoChildren { op }));
	}

	let mut children = node.children();
	sort_removals(&mut removals)?;
	for index in removals {
		check_index(OpKind::RemoveChild, index, children.len())?;
		children.remove(index);
	}
	insertions.sort_by_key(|&(index, _)| index);
	for (index, element) in insertions {
		check_index(OpKind::InsertChild, index, children.len() + 1)?;
		children.insert(index, Probe::Tree(element));
	}
	for (from, to) in moves {
		check_index(OpKind::MoveChild, from, children.len())?;
		check_index(OpKind::MoveChild, to, children.len())?;
		let child = children.remove(from);
		children.insert(to, child);
	}
	for (index, patch) in recursions {
		check_index(OpKind::Recurse, index, children.len())?;
		validate_probe(children[index], patch).map_err(|error| error.within(index))?;
	}
	Ok(())
}

/// One op, sorted by the pass it belongs to.
///
/// Ops of a borrowed patch stay borrowed, so that only what ends up in the tree is cloned.
pub(crate) enum Step<'a> {
	Replace(Cow<'a, Element>),
	Attributes(Cow<'a, AttributeDelta>),
	Text(Cow<'a, str>),
	Insert(usize, Cow<'a, Element>),
	Remove(usize),
	Move(usize, usize),
	Recurse(usize, Cow<'a, ListPatch>),
}

impl<'a> Step<'a> {
	fn owned(op: PatchOp) -> Self {
		match op {
			PatchOp::ReplaceNode(element) => Step::Replace(Cow::Owned(element)),
			PatchOp::UpdateAttributes(delta) => Step::Attributes(Cow::Owned(delta)),
			PatchOp::UpdateText(text) => Step::Text(Cow::Owned(text)),
			PatchOp::InsertChild { index, element } => Step::Insert(index, Cow::Owned(element)),
			PatchOp::RemoveChild { index } => Step::Remove(index),
			PatchOp::MoveChild { from, to } => Step::Move(from, to),
			PatchOp::Recurse { index, patch } => Step::Recurse(index, Cow::Owned(patch)),
		}
	}

	fn borrowed(op: &'a PatchOp) -> Self {
		match op {
			PatchOp::ReplaceNode(element) => Step::Replace(Cow::Borrowed(element)),
			PatchOp::UpdateAttributes(delta) => Step::Attributes(Cow::Borrowed(delta)),
			PatchOp::UpdateText(text) => Step::Text(Cow::Borrowed(text)),
			PatchOp::InsertChild { index, element } => Step::Insert(*index, Cow::Borrowed(element)),
			PatchOp::RemoveChild { index } => Step::Remove(*index),
			PatchOp::MoveChild { from, to } => Step::Move(*from, *to),
			PatchOp::Recurse { index, patch } => Step::Recurse(*index, Cow::Borrowed(patch)),
		}
	}
}

/// A [`ListPatch`] level, split into the passes it is applied in.
pub(crate) struct Passes<'a> {
	/// [`Step::Replace`], [`Step::Attributes`] and [`Step::Text`] in listed order, ending early with the first replacement.
	pub node: Vec<Step<'a>>,
	/// Descending.
	pub removals: Vec<usize>,
	/// Ascending, stable.
	pub insertions: Vec<(usize, Cow<'a, Element>)>,
	pub moves: Vec<(usize, usize)>,
	pub recursions: Vec<(usize, Cow<'a, ListPatch>)>,
	pub first_structural: Option<OpKind>,
}

impl<'a> Passes<'a> {
	pub(crate) fn split(patch: Cow<'a, ListPatch>) -> Result<Self, ApplyError> {
		let steps: Vec<Step<'a>> = match patch {
			Cow::Owned(patch) => patch.into_iter().map(Step::owned).collect(),
			Cow::Borrowed(patch) => patch.ops().iter().map(Step::borrowed).collect(),
		};

		let mut passes = Self {
			node: Vec::new(),
			removals: Vec::new(),
			insertions: Vec::new(),
			moves: Vec::new(),
			recursions: Vec::new(),
			first_structural: None,
		};

		for step in steps {
			let kind = match step {
				Step::Replace(_) => {
					passes.node.push(step);
					passes.removals.clear();
					passes.insertions.clear();
					passes.moves.clear();
					passes.recursions.clear();
					passes.first_structural = None;
					return Ok(passes);
				}
				Step::Attributes(_) | Step::Text(_) => {
					passes.node.push(step);
					continue;
				}
				Step::Remove(index) => {
					passes.removals.push(index);
					OpKind::RemoveChild
				}
				Step::Insert(index, element) => {
					passes.insertions.push((index, element));
					OpKind::InsertChild
				}
				Step::Move(from, to) => {
					passes.moves.push((from, to));
					OpKind::MoveChild
				}
				Step::Recurse(index, patch) => {
					passes.recursions.push((index, patch));
					OpKind::Recurse
				}
			};
			passes.first_structural.get_or_insert(kind);
		}

		sort_removals(&mut passes.removals)?;
		passes.insertions.sort_by_key(|&(index, _)| index);
		Ok(passes)
	}
}

/// Sorts descending and rejects duplicates.
fn sort_removals(removals: &mut [usize]) -> Result<(), ApplyError> {
	removals.sort_unstable_by(|a, b| b.cmp(a));
	match removals.windows(2).find(|pair| pair[0] == pair[1]) {
		Some(pair) => Err(mismatch(ApplyErrorKind::DuplicateRemoval { index: pair[0] })),
		None => Ok(()),
	}
}

/// Checks `index < len`.
pub(crate) fn check_index(op: OpKind, index: usize, len: usize) -> Result<(), ApplyError> {
	if index < len {
		Ok(())
	} else {
		let len = if op == OpKind::InsertChild { len - 1 } else { len };
		Err(mismatch(ApplyErrorKind::IndexOutOfBounds { op, index, len }))
	}
}

pub(crate) fn mismatch(kind: ApplyErrorKind) -> ApplyError {
	error!("Patch doesn't fit the tree: {}", kind);
	ApplyError::new(kind)
}

pub(crate) fn update_attributes(attributes: &mut Attributes, delta: AttributeDelta) {
	let AttributeDelta { added, changed, removed } = delta;
	for name in &removed {
		attributes.shift_remove(name.as_str());
	}
	attributes.extend(added);
	attributes.extend(changed);
}

fn patch_element(node: &mut Element, patch: Cow<'_, ListPatch>) -> Result<(), ApplyError> {
	let Passes { node: node_steps, removals, insertions, moves, recursions, first_structural } = Passes::split(patch)?;

	for step in node_steps {
		match step {
			Step::Replace(element) => {
				trace!(from = node.tag(), to = element.tag(), "Replacing node.");
				*node = element.into_owned();
				return Ok(());
			}
			Step::Attributes(delta) => update_attributes(node.attributes_mut(), delta.into_owned()),
			Step::Text(text) => match node.content_mut() {
				Content::Text(old) => {
					if cfg!(feature = "dangerous-logging") {
						trace!(from = old.as_str(), to = &*text, "Updating text.");
					}
					*old = text.into_owned()
				}
				Content::Children(_) => return Err(mismatch(ApplyErrorKind::ElementHasNoText)),
			},
			_ => unreachable!("vdom-patch bug: structural op among node-level ops"),
		}
	}

	let op = match first_structural {
		None => return Ok(()),
		Some(op) => op,
	};
	let children = match node.content_mut() {
		Content::Children(children) => children,
		Content::Text(_) => return Err(mismatch(ApplyErrorKind::TextNodeHasNoChildren { op })),
	};

	for index in removals {
		check_index(OpKind::RemoveChild, index, children.len())?;
		children.remove(index);
	}
	for (index, element) in insertions {
		check_index(OpKind::InsertChild, index, children.len() + 1)?;
		children.insert(index, element.into_owned());
	}
	for (from, to) in moves {
		check_index(OpKind::MoveChild, from, children.len())?;
		check_index(OpKind::MoveChild, to, children.len())?;
		let child = children.remove(from);
		children.insert(to, child);
	}

	for (index, patch) in recursions {
		check_index(OpKind::Recurse, index, children.len())?;
		let span = trace_span!("Patching child", index, tag = children[index].tag());
		let _enter = span.enter();
		patch_element(&mut children[index], patch).map_err(|error| error.within(index))?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::attributes;

	fn list(items: &[&str]) -> Element {
		Element::with_children("ul", Attributes::new(), items.iter().map(|item| Element::text("li", Attributes::new(), *item)).collect()).unwrap()
	}

	#[test]
	fn out_of_bounds_fails_loudly_with_path() {
		let tree = Element::with_children("div", Attributes::new(), vec![list(&["a"])]).unwrap();
		let patch = ListPatch::from_ops(vec![PatchOp::Recurse {
			index: 0,
			patch: ListPatch::from_ops(vec![PatchOp::RemoveChild { index: 5 }]),
		}]);

		let error = apply(&tree, &patch).unwrap_err();
		assert_eq!(error.kind, ApplyErrorKind::IndexOutOfBounds { op: OpKind::RemoveChild, index: 5, len: 1 });
		assert_eq!(error.path, [0]);
		assert_eq!(validate(&tree, &patch), Err(error));
	}

	#[test]
	fn in_place_leaves_tree_untouched_on_error() {
		let mut tree = list(&["a", "b"]);
		let before = tree.clone();
		let patch = ListPatch::from_ops(vec![PatchOp::RemoveChild { index: 0 }, PatchOp::MoveChild { from: 1, to: 0 }]);

		let error = apply_in_place(&mut tree, patch).unwrap_err();
		assert_eq!(error.kind, ApplyErrorKind::IndexOutOfBounds { op: OpKind::MoveChild, index: 1, len: 1 });
		assert_eq!(tree, before);
	}

	#[test]
	fn duplicate_removals_are_rejected() {
		let patch = ListPatch::from_ops(vec![PatchOp::RemoveChild { index: 1 }, PatchOp::RemoveChild { index: 1 }]);
		assert_eq!(apply(&list(&["a", "b"]), &patch).unwrap_err().kind, ApplyErrorKind::DuplicateRemoval { index: 1 });
	}

	#[test]
	fn text_nodes_have_no_children() {
		let patch = ListPatch::from_ops(vec![PatchOp::RemoveChild { index: 0 }]);
		let text = Element::text("p", Attributes::new(), "x");
		assert_eq!(apply(&text, &patch).unwrap_err().kind, ApplyErrorKind::TextNodeHasNoChildren { op: OpKind::RemoveChild });

		let patch = ListPatch::from_ops(vec![PatchOp::UpdateText("y".to_owned())]);
		assert_eq!(apply(&list(&[]), &patch).unwrap_err().kind, ApplyErrorKind::ElementHasNoText);
	}

	#[test]
	fn passes_run_in_order_regardless_of_listing() {
		// Listed out of pass order on purpose.
		let patch = ListPatch::from_ops(vec![
			PatchOp::MoveChild { from: 0, to: 2 },
			PatchOp::InsertChild { index: 1, element: Element::text("li", Attributes::new(), "new") },
			PatchOp::RemoveChild { index: 0 },
			PatchOp::RemoveChild { index: 2 },
		]);
		// [a b c] → remove 2, 0 → [b] → insert → [b new] → move 0 to... out of bounds.
		assert!(apply(&list(&["a", "b", "c"]), &patch).is_err());

		let patch = ListPatch::from_ops(vec![
			PatchOp::MoveChild { from: 0, to: 1 },
			PatchOp::InsertChild { index: 1, element: Element::text("li", Attributes::new(), "new") },
			PatchOp::RemoveChild { index: 0 },
			PatchOp::RemoveChild { index: 2 },
		]);
		assert_eq!(apply(&list(&["a", "b", "c"]), &patch), Ok(list(&["new", "b"])));
	}

	#[test]
	fn replace_short_circuits() {
		let replacement = Element::text("p", Attributes::new(), "gone");
		let patch = ListPatch::from_ops(vec![
			PatchOp::UpdateAttributes(AttributeDelta { added: attributes([("id", "x")]), ..AttributeDelta::default() }),
			PatchOp::ReplaceNode(replacement.clone()),
			PatchOp::RemoveChild { index: 99 },
		]);
		assert_eq!(apply(&list(&["a"]), &patch), Ok(replacement));
	}

	#[test]
	fn pure_apply_only_reads_the_patch() {
		let source = list(&["a"]);
		let destination = Element::with_children("ul", Attributes::new(), vec![list(&["b", "c"]), Element::text("li", Attributes::new(), "a!")]).unwrap();
		let patch = crate::diff(&source, &destination);
		let snapshot = patch.clone();

		assert_eq!(apply(&source, &patch), Ok(destination.clone()));
		assert_eq!(apply(&source, &patch), Ok(destination.clone()));
		assert_eq!(patch, snapshot);

		let mut in_place = source.clone();
		apply_in_place(&mut in_place, patch).unwrap();
		assert_eq!(in_place, destination);
	}
}
