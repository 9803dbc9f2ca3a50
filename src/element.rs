//! The immutable tree snapshot that is diffed and patched.

use crate::error::ElementError;
use core::fmt::{self, Display, Formatter};
use indexmap::IndexMap;

/// Attribute map of an [`Element`].
///
/// Insertion order is kept so that exports are deterministic, but it doesn't take part in equality.
pub type Attributes = IndexMap<String, AttrValue>;

/// Collects `(name, value)` pairs into [`Attributes`].
///
/// Later duplicates overwrite earlier values but keep the first position.
pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Attributes
where
	K: Into<String>,
	V: Into<AttrValue>,
{
	pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// A primitive attribute value.
///
/// The variants line up with JavaScript primitives so that [`crate::js`] exports are lossless.
///
/// Numbers compare by bit pattern, except that all `NaN`s are equal. `0.0` and `-0.0` differ.
#[derive(Debug, Clone)]
pub enum AttrValue {
	Str(String),
	Number(f64),
	Bool(bool),
}

impl PartialEq for AttrValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Str(a), AttrValue::Str(b)) => a == b,
			(AttrValue::Number(a), AttrValue::Number(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
			(AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for AttrValue {}

impl Display for AttrValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			AttrValue::Str(s) => f.write_str(s),
			AttrValue::Number(n) => Display::fmt(n, f),
			AttrValue::Bool(b) => Display::fmt(b, f),
		}
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_owned())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		Self::Number(value.into())
	}
}

impl From<u32> for AttrValue {
	fn from(value: u32) -> Self {
		Self::Number(value.into())
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// What an [`Element`] holds besides its tag and attributes.
///
/// A node is *either* a text node or has a (possibly empty) child list, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
	Text(String),
	Children(Vec<Element>),
}

/// An immutable VDOM node.
///
/// Text nodes also carry a tag and attributes, since the builder accepts those for both shapes.
/// The `key` is an identity hint for reconciling sibling lists and is only required to be unique among siblings.
///
/// # Duplicate keys
///
/// Duplicate sibling keys are a caller error, but are resolved deterministically:
/// The first occurrence among the source children is matched and later ones are removed,
/// while later occurrences among the destination children are inserted as new subtrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	tag: String,
	attributes: Attributes,
	content: Content,
	key: Option<String>,
}

impl Element {
	/// Creates a node from an explicit [`Content`] discriminant.
	///
	/// # Errors
	///
	/// [`ElementError::EmptyTag`] iff `content` is a child list and `tag` is empty.
	pub fn new(tag: impl Into<String>, attributes: Attributes, content: Content) -> Result<Self, ElementError> {
		let tag = tag.into();
		if tag.is_empty() && matches!(content, Content::Children(_)) {
			return Err(ElementError::EmptyTag);
		}
		Ok(Self { tag, attributes, content, key: None })
	}

	/// Creates a text node.
	#[must_use]
	pub fn text(tag: impl Into<String>, attributes: Attributes, text: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attributes,
			content: Content::Text(text.into()),
			key: None,
		}
	}

	/// Creates an element node.
	///
	/// # Errors
	///
	/// [`ElementError::EmptyTag`] iff `tag` is empty.
	pub fn with_children(tag: impl Into<String>, attributes: Attributes, children: Vec<Element>) -> Result<Self, ElementError> {
		Self::new(tag, attributes, Content::Children(children))
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	#[must_use]
	pub fn content(&self) -> &Content {
		&self.content
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self.content, Content::Text(_))
	}

	/// The text of a text node, otherwise [`None`].
	#[must_use]
	pub fn text_content(&self) -> Option<&str> {
		match &self.content {
			Content::Text(text) => Some(text),
			Content::Children(_) => None,
		}
	}

	/// The child list of an element node. Text nodes have none.
	#[must_use]
	pub fn children(&self) -> &[Element] {
		match &self.content {
			Content::Text(_) => &[],
			Content::Children(children) => children,
		}
	}

	/// Number of nodes in this subtree, including `self`.
	#[must_use]
	pub fn node_count(&self) -> usize {
		1 + self.children().iter().map(Element::node_count).sum::<usize>()
	}

	pub(crate) fn attributes_mut(&mut self) -> &mut Attributes {
		&mut self.attributes
	}

	pub(crate) fn content_mut(&mut self) -> &mut Content {
		&mut self.content
	}

	pub(crate) fn into_parts(self) -> (String, Attributes, Content, Option<String>) {
		(self.tag, self.attributes, self.content, self.key)
	}

	pub(crate) fn from_parts(tag: String, attributes: Attributes, content: Content, key: Option<String>) -> Self {
		Self { tag, attributes, content, key }
	}
}
