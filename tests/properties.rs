use proptest::{collection::vec, prelude::*};
use vdom_patch::{apply, apply_in_place, diff, AttrValue, Attributes, Element, ListPatch, NodeArena};

fn attribute_map() -> impl Strategy<Value = Attributes> {
	let value = prop_oneof![
		"[a-c]{0,2}".prop_map(AttrValue::Str),
		(-2_i32..3).prop_map(AttrValue::from),
		prop_oneof![Just(f64::NAN), Just(0.0), Just(-0.0), Just(f64::INFINITY), Just(f64::NEG_INFINITY)].prop_map(AttrValue::Number),
		any::<bool>().prop_map(AttrValue::Bool),
	];
	vec(("[a-d]", value), 0..3).prop_map(|pairs| pairs.into_iter().collect())
}

fn key() -> impl Strategy<Value = Option<String>> {
	prop_oneof![Just(None), "[a-f]".prop_map(Some)]
}

fn keyed(element: Element, key: Option<String>) -> Element {
	match key {
		Some(key) => element.with_key(key),
		None => element,
	}
}

/// Small trees with colliding tags, keys and texts, so that diffs hit every op kind.
fn tree() -> impl Strategy<Value = Element> {
	let leaf = (prop_oneof![Just("span"), Just("#text")], attribute_map(), "[xyz]{0,2}", key())
		.prop_map(|(tag, attributes, text, key)| keyed(Element::text(tag, attributes, text), key));
	leaf.prop_recursive(4, 48, 6, |inner| {
		(prop_oneof![Just("div"), Just("ul")], attribute_map(), vec(inner, 0..6), key())
			.prop_map(|(tag, attributes, children, key)| keyed(Element::with_children(tag, attributes, children).unwrap(), key))
	})
}

proptest! {
	#[test]
	fn diff_of_identical_trees_is_empty(tree in tree()) {
		let patch = diff(&tree, &tree.clone());
		prop_assert!(patch.is_empty());
		prop_assert_eq!(patch.stats().total(), 0);
	}

	#[test]
	fn applying_the_diff_yields_the_destination(source in tree(), destination in tree()) {
		let patch = diff(&source, &destination);
		prop_assert_eq!(apply(&source, &patch).unwrap(), destination.clone());

		let mut in_place = source.clone();
		apply_in_place(&mut in_place, patch.clone()).unwrap();
		prop_assert_eq!(&in_place, &destination);

		let mut arena = NodeArena::new();
		let root = arena.insert_tree(&source);
		arena.apply_mutating(root, patch).unwrap();
		prop_assert_eq!(arena.to_element(root), Some(destination.clone()));
		prop_assert_eq!(arena.len(), destination.node_count());
	}

	#[test]
	fn export_round_trips(source in tree(), destination in tree()) {
		let patch = diff(&source, &destination);
		let records = patch.export();
		let imported = ListPatch::import(records.clone()).unwrap();
		prop_assert_eq!(&imported, &patch);
		prop_assert_eq!(imported.export(), records);
	}
}
