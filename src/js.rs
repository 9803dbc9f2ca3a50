//! JavaScript-native export of patches and trees, for handing them across the Wasm boundary.
//!
//! Records become plain objects with the same field names as [`PatchRecord`], with absent fields left out.
//! Elements become `{ tag, attributes, key?, text }` or `{ tag, attributes, key?, children }`.
//!
//! These functions only work on `wasm32` targets with a JavaScript host.

use crate::{
	element::{AttrValue, Attributes, Content, Element},
	error::ImportError,
	export::PatchRecord,
	patch::{ListPatch, OpKind},
};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue, UnwrapThrowExt};

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Exports `patch` as an `Array` of record objects.
#[must_use]
pub fn export_js(patch: &ListPatch) -> Array {
	patch.export().iter().map(PatchRecord::to_js).collect()
}

/// Inverse of [`export_js`].
///
/// # Errors
///
/// Iff `value` isn't an array of well-formed records.
pub fn import_js(value: &JsValue) -> Result<ListPatch, ImportError> {
	ListPatch::import(records_from_js(value, "patch")?)
}

impl PatchRecord {
	#[must_use]
	pub fn to_js(&self) -> JsValue {
		let object = Object::new();
		set(&object, "op", &JsValue::from_str(self.op.as_str()));
		if let Some(index) = self.index {
			set(&object, "index", &index_to_js(index));
		}
		if let Some(to) = self.to {
			set(&object, "to", &index_to_js(to));
		}
		if let Some(element) = &self.element {
			set(&object, "element", &element_to_js(element));
		}
		if let Some(text) = &self.text {
			set(&object, "text", &JsValue::from_str(text));
		}
		if let Some(added) = &self.added {
			set(&object, "added", &attributes_to_js(added));
		}
		if let Some(changed) = &self.changed {
			set(&object, "changed", &attributes_to_js(changed));
		}
		if let Some(removed) = &self.removed {
			set(&object, "removed", &removed.iter().map(|name| JsValue::from_str(name)).collect::<Array>());
		}
		if let Some(patch) = &self.patch {
			set(&object, "patch", &patch.iter().map(PatchRecord::to_js).collect::<Array>());
		}
		object.into()
	}

	/// # Errors
	///
	/// Iff `value` isn't a record object or one of its present fields has the wrong type.
	pub fn from_js(value: &JsValue) -> Result<Self, ImportError> {
		let op = get(value, "op")?
			.and_then(|op| op.as_string())
			.ok_or(ImportError::InvalidValue { field: "op", expected: "a string" })?;
		let op = op.parse::<OpKind>().map_err(ImportError::UnknownOp)?;

		Ok(Self {
			op,
			index: get(value, "index")?.map(|index| index_from_js(&index, "index")).transpose()?,
			to: get(value, "to")?.map(|to| index_from_js(&to, "to")).transpose()?,
			element: get(value, "element")?.map(|element| element_from_js(&element)).transpose()?,
			text: get(value, "text")?.map(|text| string_from_js(&text, "text")).transpose()?,
			added: get(value, "added")?.map(|added| attributes_from_js(&added, "added")).transpose()?,
			changed: get(value, "changed")?.map(|changed| attributes_from_js(&changed, "changed")).transpose()?,
			removed: get(value, "removed")?
				.map(|removed| array_from_js(&removed, "removed")?.iter().map(|name| string_from_js(&name, "removed")).collect::<Result<Vec<_>, _>>())
				.transpose()?,
			patch: get(value, "patch")?.map(|patch| records_from_js(&patch, "patch")).transpose()?,
		})
	}
}

#[must_use]
pub fn element_to_js(element: &Element) -> JsValue {
	let object = Object::new();
	set(&object, "tag", &JsValue::from_str(element.tag()));
	set(&object, "attributes", &attributes_to_js(element.attributes()));
	if let Some(key) = element.key() {
		set(&object, "key", &JsValue::from_str(key));
	}
	match element.content() {
		Content::Text(text) => set(&object, "text", &JsValue::from_str(text)),
		Content::Children(children) => set(&object, "children", &children.iter().map(element_to_js).collect::<Array>()),
	}
	object.into()
}

/// Inverse of [`element_to_js`]. `attributes` may be left out.
///
/// # Errors
///
/// Iff `value` isn't an element object, or describes an element node without a tag.
pub fn element_from_js(value: &JsValue) -> Result<Element, ImportError> {
	let tag = get(value, "tag")?.map(|tag| string_from_js(&tag, "tag")).transpose()?.unwrap_or_default();
	let attributes = get(value, "attributes")?.map(|attributes| attributes_from_js(&attributes, "attributes")).transpose()?.unwrap_or_default();

	let content = match get(value, "text")? {
		Some(text) => Content::Text(string_from_js(&text, "text")?),
		None => {
			let children = get(value, "children")?.ok_or(ImportError::InvalidValue {
				field: "children",
				expected: "present when `text` is absent",
			})?;
			Content::Children(array_from_js(&children, "children")?.iter().map(|child| element_from_js(&child)).collect::<Result<_, _>>()?)
		}
	};

	let element = Element::new(tag, attributes, content)?;
	Ok(match get(value, "key")? {
		Some(key) => element.with_key(string_from_js(&key, "key")?),
		None => element,
	})
}

fn set(object: &Object, field: &str, value: &JsValue) {
	Reflect::set(object, &JsValue::from_str(field), value).expect_throw("vdom-patch: Failed to set a field on a plain object.");
}

/// Reads `field`, treating `undefined` and `null` as absent.
fn get(object: &JsValue, field: &'static str) -> Result<Option<JsValue>, ImportError> {
	if !object.is_object() {
		return Err(ImportError::InvalidValue { field, expected: "a field of an object" });
	}
	let value = Reflect::get(object, &JsValue::from_str(field)).map_err(|_| ImportError::InvalidValue { field, expected: "readable" })?;
	Ok(if value.is_undefined() || value.is_null() { None } else { Some(value) })
}

#[allow(clippy::cast_precision_loss)]
fn index_to_js(index: usize) -> JsValue {
	JsValue::from_f64(index as f64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn index_from_js(value: &JsValue, field: &'static str) -> Result<usize, ImportError> {
	match value.as_f64() {
		Some(number) if number >= 0.0 && number.fract() == 0.0 && number <= MAX_SAFE_INTEGER => Ok(number as usize),
		_ => Err(ImportError::InvalidValue { field, expected: "a non-negative integer" }),
	}
}

fn string_from_js(value: &JsValue, field: &'static str) -> Result<String, ImportError> {
	value.as_string().ok_or(ImportError::InvalidValue { field, expected: "a string" })
}

fn array_from_js(value: &JsValue, field: &'static str) -> Result<Array, ImportError> {
	if Array::is_array(value) {
		Ok(value.clone().unchecked_into())
	} else {
		Err(ImportError::InvalidValue { field, expected: "an array" })
	}
}

fn records_from_js(value: &JsValue, field: &'static str) -> Result<Vec<PatchRecord>, ImportError> {
	array_from_js(value, field)?.iter().map(|record| PatchRecord::from_js(&record)).collect()
}

fn attributes_to_js(attributes: &Attributes) -> JsValue {
	let object = Object::new();
	for (name, value) in attributes {
		let value = match value {
			AttrValue::Str(s) => JsValue::from_str(s),
			AttrValue::Number(n) => JsValue::from_f64(*n),
			AttrValue::Bool(b) => JsValue::from_bool(*b),
		};
		set(&object, name, &value);
	}
	object.into()
}

fn attributes_from_js(value: &JsValue, field: &'static str) -> Result<Attributes, ImportError> {
	let object = value.dyn_ref::<Object>().ok_or(ImportError::InvalidValue { field, expected: "an object" })?;
	// `Object.entries` keeps insertion order for non-numeric keys.
	Object::entries(object)
		.iter()
		.map(|entry| {
			let entry: Array = entry.unchecked_into();
			let name = string_from_js(&entry.get(0), field)?;
			let value = entry.get(1);
			let value = if let Some(s) = value.as_string() {
				AttrValue::Str(s)
			} else if let Some(b) = value.as_bool() {
				AttrValue::Bool(b)
			} else if let Some(n) = value.as_f64() {
				AttrValue::Number(n)
			} else {
				return Err(ImportError::InvalidValue { field, expected: "an object of strings, numbers and booleans" });
			};
			Ok((name, value))
		})
		.collect()
}
