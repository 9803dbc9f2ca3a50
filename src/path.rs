use core::fmt::{self, Display, Formatter};

/// Formats child indices root-first, like `/0/3/1`. The root itself is `/`.
pub(crate) fn format(path: &[usize]) -> String {
	if path.is_empty() {
		return "/".to_owned();
	}
	path.iter().map(|i| format!("/{}", i)).collect()
}

/// Child index path of the node currently being visited.
///
/// Only tracked with the `log-paths` feature. Otherwise all operations are no-ops.
#[derive(Debug, Default)]
pub(crate) struct TracePath {
	#[cfg(feature = "log-paths")]
	indices: Vec<usize>,
}

impl TracePath {
	#[allow(unused_variables)]
	pub(crate) fn push(&mut self, index: usize) {
		#[cfg(feature = "log-paths")]
		self.indices.push(index);
	}

	pub(crate) fn pop(&mut self) {
		#[cfg(feature = "log-paths")]
		self.indices.pop();
	}
}

impl Display for TracePath {
	#[cfg(feature = "log-paths")]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&format(&self.indices))
	}

	#[cfg(not(feature = "log-paths"))]
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("(path unavailable, enable `log-paths`)")
	}
}

#[cfg(test)]
mod tests {
	use super::format;

	#[test]
	fn formats_root_first() {
		assert_eq!(format(&[]), "/");
		assert_eq!(format(&[0, 3, 1]), "/0/3/1");
	}
}
