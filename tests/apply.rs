use vdom_patch::{
	apply, apply_in_place, attributes, diff, validate, ApplyErrorKind, AttributeDelta, Attributes, Element, ListPatch, NodeArena, OpKind, PatchOp,
};


fn item(key: &str) -> Element {
	Element::text("li", Attributes::new(), key.to_uppercase()).with_key(key)
}

fn list(keys: &[&str]) -> Element {
	Element::with_children("ul", attributes([("id", "list")]), keys.iter().copied().map(item).collect()).unwrap()
}

#[test]
fn apply_leaves_input_untouched() {
	logging_::init();

	let source = list(&["a", "b", "c"]);
	let snapshot = source.clone();
	let destination = list(&["c", "b", "d"]);

	let patch = diff(&source, &destination);
	assert_eq!(apply(&source, &patch).unwrap(), destination);
	assert_eq!(source, snapshot);
}

#[test]
fn all_three_applications_agree() {
	logging_::init();

	let source = list(&["a", "b", "c", "d", "e"]);
	let destination = list(&["e", "x", "b", "a", "y", "d"]);
	let patch = diff(&source, &destination);

	assert_eq!(apply(&source, &patch).unwrap(), destination);

	let mut in_place = source.clone();
	apply_in_place(&mut in_place, patch.clone()).unwrap();
	assert_eq!(in_place, destination);

	let mut arena = NodeArena::new();
	let root = arena.insert_tree(&source);
	arena.apply_mutating(root, patch).unwrap();
	assert_eq!(arena.to_element(root), Some(destination));
}

#[test]
fn attribute_delta_is_applied() {
	logging_::init();

	let source = Element::text("input", attributes([("a", 1), ("b", 2)]), "");
	let patch = ListPatch::from_ops(vec![PatchOp::UpdateAttributes(AttributeDelta {
		added: attributes([("c", 4)]),
		changed: attributes([("b", 3)]),
		removed: vec!["a".to_owned()],
	})]);

	let patched = apply(&source, &patch).unwrap();
	assert_eq!(patched.attributes(), &attributes([("b", 3), ("c", 4)]));
}

#[test]
fn moves_apply_in_listed_order() {
	logging_::init();

	let source = list(&["a", "b", "c"]);
	let patch = ListPatch::from_ops(vec![PatchOp::MoveChild { from: 0, to: 2 }, PatchOp::MoveChild { from: 0, to: 1 }]);
	assert_eq!(apply(&source, &patch).unwrap(), list(&["c", "b", "a"]));
}

#[test]
fn stale_patch_is_rejected_everywhere() {
	logging_::init();

	let patch = diff(&list(&["a", "b", "c"]), &list(&["a"]));
	let short = list(&["a"]);

	let error = validate(&short, &patch).unwrap_err();
	assert_eq!(error.kind, ApplyErrorKind::IndexOutOfBounds { op: OpKind::RemoveChild, index: 2, len: 1 });
	assert!(error.path.is_empty());
	assert_eq!(error.to_string(), "`remove` references child index 2, but there are only 1 child(ren) at that point (at child path /)");

	assert_eq!(apply(&short, &patch), Err(error.clone()));

	let mut in_place = short.clone();
	assert_eq!(apply_in_place(&mut in_place, patch.clone()), Err(error.clone()));
	assert_eq!(in_place, short);

	let mut arena = NodeArena::new();
	let root = arena.insert_tree(&short);
	assert_eq!(arena.apply_mutating(root, patch), Err(error));
	assert_eq!(arena.to_element(root), Some(short));
}

#[test]
fn insert_past_end_is_rejected() {
	logging_::init();

	let patch = ListPatch::from_ops(vec![PatchOp::InsertChild { index: 2, element: item("z") }]);
	assert_eq!(
		validate(&list(&["a"]), &patch).unwrap_err().kind,
		ApplyErrorKind::IndexOutOfBounds { op: OpKind::InsertChild, index: 2, len: 1 }
	);
	assert!(apply(&list(&["a"]), &patch).is_err());

	let appended = ListPatch::from_ops(vec![PatchOp::InsertChild { index: 1, element: item("z") }]);
	assert_eq!(apply(&list(&["a"]), &appended).unwrap(), list(&["a", "z"]));
}

#[test]
fn text_and_children_mismatches_are_rejected() {
	logging_::init();

	let text = item("a");
	let children = ListPatch::from_ops(vec![PatchOp::RemoveChild { index: 0 }]);
	assert_eq!(
		apply(&text, &children).unwrap_err().kind,
		ApplyErrorKind::TextNodeHasNoChildren { op: OpKind::RemoveChild }
	);

	let update_text = ListPatch::from_ops(vec![PatchOp::UpdateText("nope".to_owned())]);
	assert_eq!(apply(&list(&[]), &update_text).unwrap_err().kind, ApplyErrorKind::ElementHasNoText);
}
