//! Snapshots of live DOM content, so that the first diff can start from what the page actually shows.

use crate::element::{Attributes, Element};
use tracing::{trace, warn};
use wasm_bindgen::JsCast;
use web_sys::{Attr, Comment, NamedNodeMap, Node, NodeList, Text};

/// Tag given to text nodes that don't stand in for their parent element.
pub const TEXT_TAG: &str = "#text";

/// Attribute that is read back as the node's [key](`Element::key`).
pub const KEY_ATTRIBUTE: &str = "data-key";

/// Loads `element` and its subtree.
///
/// An element whose only child is one text node becomes a text node carrying the element's tag.
#[must_use]
pub fn load_element(element: &web_sys::Element) -> Element {
	let node: &Node = element.as_ref();
	let attributes = load_attributes(&element.attributes());
	let child_nodes = node.child_nodes();

	let loaded = match child_nodes.item(0).and_then(|child| child.dyn_into::<Text>().ok()) {
		Some(text) if child_nodes.length() == 1 => Element::text(element.tag_name(), attributes, text.data()),
		_ => Element::with_children(element.tag_name(), attributes, load_child_nodes(&child_nodes))
			.unwrap_or_else(|error| unreachable!("DOM elements always have a tag name: {}", error)),
	};

	match element.get_attribute(KEY_ATTRIBUTE) {
		Some(key) => loaded.with_key(key),
		None => loaded,
	}
}

/// Loads element and text nodes. Comments and other node types are skipped.
#[must_use]
pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<Element> {
	(0..child_nodes.length())
		.filter_map(|i| child_nodes.item(i))
		.filter_map(|child| {
			if let Some(element) = child.dyn_ref::<web_sys::Element>() {
				Some(load_element(element))
			} else if let Some(text) = child.dyn_ref::<Text>() {
				Some(Element::text(TEXT_TAG, Attributes::new(), text.data()))
			} else if child.dyn_ref::<Comment>().is_some() {
				trace!("Skipping comment.");
				None
			} else {
				warn!("Skipping unrecognised child node: {:?}", child);
				None
			}
		})
		.collect()
}

/// Loads attributes in DOM order. The [`KEY_ATTRIBUTE`] is left out.
#[must_use]
pub fn load_attributes(attributes: &NamedNodeMap) -> Attributes {
	(0..attributes.length())
		.filter_map(|i| attributes.item(i))
		.map(|attribute: Attr| (attribute.name(), attribute.value()))
		.filter(|(name, _)| name != KEY_ATTRIBUTE)
		.map(|(name, value)| (name, value.into()))
		.collect()
}
