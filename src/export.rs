//! Plain record form of a [`ListPatch`], for code outside this crate (for example a renderer bridge).

use crate::{
	element::{Attributes, Element},
	error::ImportError,
	patch::{AttributeDelta, ListPatch, OpKind, PatchOp},
};

/// One exported [`PatchOp`]. Which fields are set depends on `op`:
///
/// | `op`         | fields                                  |
/// |--------------|-----------------------------------------|
/// | `replace`    | `element`                               |
/// | `attributes` | `added`, `changed`, `removed`           |
/// | `text`       | `text`                                  |
/// | `insert`     | `index`, `element`                      |
/// | `remove`     | `index`                                 |
/// | `move`       | `index` (from), `to`                    |
/// | `recurse`    | `index`, `patch`                        |
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRecord {
	pub op: OpKind,
	pub index: Option<usize>,
	pub to: Option<usize>,
	pub element: Option<Element>,
	pub text: Option<String>,
	pub added: Option<Attributes>,
	pub changed: Option<Attributes>,
	pub removed: Option<Vec<String>>,
	pub patch: Option<Vec<PatchRecord>>,
}

impl PatchRecord {
	#[must_use]
	pub fn new(op: OpKind) -> Self {
		Self {
			op,
			index: None,
			to: None,
			element: None,
			text: None,
			added: None,
			changed: None,
			removed: None,
			patch: None,
		}
	}

	fn from_op(op: &PatchOp) -> Self {
		let mut record = Self::new(op.kind());
		match op {
			PatchOp::ReplaceNode(element) => record.element = Some(element.clone()),
			PatchOp::UpdateAttributes(AttributeDelta { added, changed, removed }) => {
				record.added = Some(added.clone());
				record.changed = Some(changed.clone());
				record.removed = Some(removed.clone());
			}
			PatchOp::UpdateText(text) => record.text = Some(text.clone()),
			PatchOp::InsertChild { index, element } => {
				record.index = Some(*index);
				record.element = Some(element.clone());
			}
			PatchOp::RemoveChild { index } => record.index = Some(*index),
			PatchOp::MoveChild { from, to } => {
				record.index = Some(*from);
				record.to = Some(*to);
			}
			PatchOp::Recurse { index, patch } => {
				record.index = Some(*index);
				record.patch = Some(patch.export());
			}
		}
		record
	}

	fn into_op(self) -> Result<PatchOp, ImportError> {
		let op = self.op;
		let missing = |field| ImportError::MissingField { op, field };
		Ok(match op {
			OpKind::ReplaceNode => PatchOp::ReplaceNode(self.element.ok_or_else(|| missing("element"))?),
			OpKind::UpdateAttributes => PatchOp::UpdateAttributes(AttributeDelta {
				added: self.added.unwrap_or_default(),
				changed: self.changed.unwrap_or_default(),
				removed: self.removed.unwrap_or_default(),
			}),
			OpKind::UpdateText => PatchOp::UpdateText(self.text.ok_or_else(|| missing("text"))?),
			OpKind::InsertChild => PatchOp::InsertChild {
				index: self.index.ok_or_else(|| missing("index"))?,
				element: self.element.ok_or_else(|| missing("element"))?,
			},
			OpKind::RemoveChild => PatchOp::RemoveChild { index: self.index.ok_or_else(|| missing("index"))? },
			OpKind::MoveChild => PatchOp::MoveChild {
				from: self.index.ok_or_else(|| missing("index"))?,
				to: self.to.ok_or_else(|| missing("to"))?,
			},
			OpKind::Recurse => PatchOp::Recurse {
				index: self.index.ok_or_else(|| missing("index"))?,
				patch: ListPatch::import(self.patch.ok_or_else(|| missing("patch"))?)?,
			},
		})
	}
}

impl ListPatch {
	/// One record per op, in order, with nested patches exported recursively.
	#[must_use]
	pub fn export(&self) -> Vec<PatchRecord> {
		self.ops().iter().map(PatchRecord::from_op).collect()
	}

	/// Inverse of [`ListPatch::export`]. Absent attribute sets on `attributes` records count as empty.
	///
	/// # Errors
	///
	/// Iff a record lacks a field its `op` requires.
	pub fn import(records: Vec<PatchRecord>) -> Result<Self, ImportError> {
		records.into_iter().map(PatchRecord::into_op).collect::<Result<_, _>>().map(ListPatch::from_ops)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::attributes;

	#[test]
	fn move_exports_from_as_index() {
		let records = ListPatch::from_ops(vec![PatchOp::MoveChild { from: 4, to: 1 }]).export();
		assert_eq!(records, [PatchRecord { index: Some(4), to: Some(1), ..PatchRecord::new(OpKind::MoveChild) }]);
	}

	#[test]
	fn attribute_sets_default_to_empty() {
		let record = PatchRecord { removed: Some(vec!["hidden".to_owned()]), ..PatchRecord::new(OpKind::UpdateAttributes) };
		let patch = ListPatch::import(vec![record]).unwrap();
		assert_eq!(
			patch.ops(),
			[PatchOp::UpdateAttributes(AttributeDelta {
				added: attributes::<&str, &str>([]),
				changed: Attributes::new(),
				removed: vec!["hidden".to_owned()],
			})]
		);
	}

	#[test]
	fn missing_fields_are_reported() {
		let nested = PatchRecord { index: Some(0), patch: Some(vec![PatchRecord::new(OpKind::InsertChild)]), ..PatchRecord::new(OpKind::Recurse) };
		assert_eq!(
			ListPatch::import(vec![nested]),
			Err(ImportError::MissingField { op: OpKind::InsertChild, field: "index" })
		);
	}
}
