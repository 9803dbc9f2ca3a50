//! Sibling list reconciliation: classifies children as matched, removed, inserted or moved.

use crate::{element::Element, path::TracePath};
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use tracing::{trace, trace_span, warn};

/// Structural plan for one child list, in application order.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Reconciliation {
	/// Source indices, descending.
	pub removals: Vec<usize>,
	/// `(insert index, destination index)`, ascending.
	pub insertions: Vec<(usize, usize)>,
	/// `(from, to)`, to be applied in order.
	pub moves: Vec<(usize, usize)>,
	/// `(destination index, source index)` of retained children, ascending by destination index.
	pub matches: Vec<(usize, usize)>,
}

/// Matches `source` against `destination` children by key, then unkeyed children by position among unkeyed children.
///
/// Retained children on a longest increasing subsequence of destination positions stay put, all others are moved.
/// Insert indices are picked so that inserted and non-moving children are in destination order after the insert pass,
/// which lets each move place its child directly after its destination predecessor.
///
/// Runs in O((n + m) log m) for `n` source and `m` destination children.
pub(crate) fn reconcile(source: &[Element], destination: &[Element], path: &TracePath) -> Reconciliation {
	let span = trace_span!("Reconciling children", "source.len()" = source.len(), "destination.len()" = destination.len());
	let _enter = span.enter();

	let (source_match, destination_match) = match_children(source, destination, path);

	let removals = (0..source.len()).rev().filter(|&i| source_match[i].is_none()).collect();

	// Destination indices of retained children, in source order, i.e. the child list after the removal pass.
	let retained: Vec<usize> = source_match.iter().filter_map(|m| *m).collect();

	let mut mover = vec![false; destination.len()];
	for (stays, &d) in longest_increasing_subsequence(&retained).into_iter().zip(&retained) {
		if !stays {
			mover[d] = true;
		}
	}

	// Each inserted child goes directly behind the closest non-moving child before it in destination order.
	// `groups[0]` holds those without one, `groups[d + 1]` those behind non-mover `d`.
	let mut groups = vec![Vec::new(); destination.len() + 1];
	let mut anchor = 0;
	for (d, matched) in destination_match.iter().enumerate() {
		match matched {
			None => groups[anchor].push(d),
			Some(_) if !mover[d] => anchor = d + 1,
			Some(_) => (),
		}
	}

	// Position of each child in the list after the insert pass.
	// Groups are in ascending destination order along that list, so each insert index is the child's final slot there.
	let mut slot = vec![0; destination.len()];
	let mut layout = Vec::with_capacity(destination.len());
	layout.extend(groups[0].iter().copied());
	for &d in &retained {
		layout.push(d);
		if !mover[d] {
			layout.extend(groups[d + 1].iter().copied());
		}
	}
	for (i, &d) in layout.iter().enumerate() {
		slot[d] = i;
	}

	let insertions = (0..destination.len()).filter(|&d| destination_match[d].is_none()).map(|d| (slot[d], d)).collect();

	let moves = plan_moves(&slot, &mover);

	let matches = destination_match.iter().enumerate().filter_map(|(d, s)| s.map(|s| (d, s))).collect();

	let reconciliation = Reconciliation { removals, insertions, moves, matches };
	trace!(
		removals = reconciliation.removals.len(),
		insertions = reconciliation.insertions.len(),
		moves = reconciliation.moves.len(),
		matches = reconciliation.matches.len(),
		"Reconciled."
	);
	reconciliation
}

/// Returns `(source → destination, destination → source)` index maps.
fn match_children(source: &[Element], destination: &[Element], path: &TracePath) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
	let mut keyed = HashMap::<&str, usize>::new();
	let mut unkeyed = Vec::new();
	for (i, child) in source.iter().enumerate() {
		match child.key() {
			None => unkeyed.push(i),
			Some(key) => match keyed.entry(key) {
				Entry::Occupied(first) => warn!(
					"Duplicate key {:?} among source children at {} (indices {} and {}). Only the first is matched, the other is removed.",
					key,
					path,
					first.get(),
					i
				),
				Entry::Vacant(vacant) => {
					vacant.insert(i);
				}
			},
		}
	}

	let mut source_match = vec![None; source.len()];
	let mut destination_match = vec![None; destination.len()];
	let mut unkeyed = unkeyed.into_iter();
	let mut seen_keys = HashSet::<&str>::new();
	for (d, child) in destination.iter().enumerate() {
		let matched = match child.key() {
			None => unkeyed.next(),
			Some(key) => {
				if !seen_keys.insert(key) {
					warn!(
						"Duplicate key {:?} among destination children at {} (index {}). It is inserted as a new subtree.",
						key, path, d
					);
				}
				keyed.remove(key)
			}
		};
		if let Some(s) = matched {
			source_match[s] = Some(d);
			destination_match[d] = Some(s);
		}
	}

	(source_match, destination_match)
}

/// Orders children by the list they are in during the move pass.
///
/// A child that was not moved yet sits at `(slot + 1, 0)`. A child moved behind its destination predecessor `p`
/// sits at `(c, k + 1)` where `(c, k)` is `p`'s spot. The first destination child moves to `(0, 0)`.
/// Predecessors are always placed before their successors move, so these spots never collide.
type Spot = (usize, usize);

/// Emits `(from, to)` for each mover in ascending destination order, skipping those already in place.
fn plan_moves(slot: &[usize], mover: &[bool]) -> Vec<(usize, usize)> {
	let mut spot: Vec<Spot> = slot.iter().map(|&s| (s + 1, 0)).collect();
	let initial = spot.clone();

	let mut targets = Vec::new();
	for d in (0..spot.len()).filter(|&d| mover[d]) {
		let target = match d.checked_sub(1) {
			None => (0, 0),
			Some(predecessor) => (spot[predecessor].0, spot[predecessor].1 + 1),
		};
		spot[d] = target;
		targets.push((d, target));
	}
	debug_assert!(spot.windows(2).all(|pair| pair[0] < pair[1]), "vdom-patch bug: move plan ends out of order: {:?}", spot);

	let mut ranks: Vec<Spot> = initial.iter().copied().chain(targets.iter().map(|&(_, target)| target)).collect();
	ranks.sort_unstable();
	let rank = |spot: Spot| {
		ranks
			.binary_search(&spot)
			.unwrap_or_else(|_| unreachable!("vdom-patch bug: unranked spot {:?}", spot))
	};

	let mut occupied = Fenwick::new(ranks.len());
	for &spot in &initial {
		occupied.add(rank(spot), 1);
	}

	let mut moves = Vec::new();
	for (d, target) in targets {
		let from = occupied.count_below(rank(initial[d]));
		occupied.add(rank(initial[d]), -1);
		let to = occupied.count_below(rank(target));
		occupied.add(rank(target), 1);
		if from != to {
			moves.push((from, to));
		}
	}
	moves
}

/// Binary indexed tree over occupied ranks.
struct Fenwick {
	tree: Vec<isize>,
}

impl Fenwick {
	fn new(len: usize) -> Self {
		Self { tree: vec![0; len + 1] }
	}

	fn add(&mut self, index: usize, delta: isize) {
		let mut i = index + 1;
		while i < self.tree.len() {
			self.tree[i] += delta;
			i += i & i.wrapping_neg();
		}
	}

	/// Sum over `0..index`.
	#[allow(clippy::cast_sign_loss)]
	fn count_below(&self, index: usize) -> usize {
		let mut sum = 0;
		let mut i = index;
		while i > 0 {
			sum += self.tree[i];
			i -= i & i.wrapping_neg();
		}
		sum as usize
	}
}

/// Marks one longest strictly increasing subsequence of `values`.
pub(crate) fn longest_increasing_subsequence(values: &[usize]) -> Vec<bool> {
	// `tails[l]` is the index of the smallest value ending an increasing run of length `l + 1`.
	let mut tails: Vec<usize> = Vec::new();
	let mut predecessors = vec![None; values.len()];
	for (i, &value) in values.iter().enumerate() {
		let slot = tails.partition_point(|&t| values[t] < value);
		if slot > 0 {
			predecessors[i] = Some(tails[slot - 1]);
		}
		if slot == tails.len() {
			tails.push(i)
		} else {
			tails[slot] = i
		}
	}

	let mut members = vec![false; values.len()];
	let mut next = tails.last().copied();
	while let Some(i) = next {
		members[i] = true;
		next = predecessors[i];
	}
	members
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::{Attributes, Element};

	fn keyed(keys: &[&str]) -> Vec<Element> {
		keys.iter().map(|key| Element::text("li", Attributes::new(), *key).with_key(*key)).collect()
	}

	fn unkeyed(count: usize) -> Vec<Element> {
		(0..count).map(|i| Element::text("li", Attributes::new(), i.to_string())).collect()
	}

	#[test]
	fn lis_marks_longest_run() {
		assert_eq!(longest_increasing_subsequence(&[]), Vec::<bool>::new());
		assert_eq!(longest_increasing_subsequence(&[0, 1, 2]), [true, true, true]);
		assert_eq!(longest_increasing_subsequence(&[1, 2, 0]), [true, true, false]);
		assert_eq!(longest_increasing_subsequence(&[3, 0, 1, 2]), [false, true, true, true]);
		assert_eq!(longest_increasing_subsequence(&[2, 1, 0]).iter().filter(|&&m| m).count(), 1);
	}

	#[test]
	fn rotation_is_one_move() {
		let r = reconcile(&keyed(&["a", "b", "c", "d"]), &keyed(&["b", "c", "d", "a"]), &TracePath::default());
		assert_eq!(r.moves, [(0, 3)]);
		assert!(r.removals.is_empty() && r.insertions.is_empty());

		let r = reconcile(&keyed(&["b", "c", "d", "a"]), &keyed(&["a", "b", "c", "d"]), &TracePath::default());
		assert_eq!(r.moves, [(3, 0)]);
	}

	#[test]
	fn inserts_land_between_stationary_children() {
		// "s" has to move behind the new node, "a" stays.
		let r = reconcile(&keyed(&["s", "a"]), &keyed(&["a", "new", "s"]), &TracePath::default());
		assert_eq!(r.insertions, [(2, 1)]);
		assert_eq!(r.moves, [(0, 2)]);
		assert_eq!(r.matches, [(0, 1), (2, 0)]);
	}

	#[test]
	fn unkeyed_children_match_by_position_among_unkeyed() {
		let mut source = unkeyed(2);
		source.insert(1, Element::text("li", Attributes::new(), "k").with_key("k"));
		let destination = unkeyed(3);

		let r = reconcile(&source, &destination, &TracePath::default());
		assert_eq!(r.removals, [1]);
		assert_eq!(r.insertions, [(2, 2)]);
		assert_eq!(r.matches, [(0, 0), (1, 2)]);
		assert!(r.moves.is_empty());
	}

	#[test]
	fn first_duplicate_source_key_wins() {
		let source = vec![
			Element::text("li", Attributes::new(), "first").with_key("dup"),
			Element::text("li", Attributes::new(), "second").with_key("dup"),
		];
		let r = reconcile(&source, &keyed(&["dup"]), &TracePath::default());
		assert_eq!(r.matches, [(0, 0)]);
		assert_eq!(r.removals, [1]);
	}

	#[test]
	fn later_duplicate_destination_key_is_inserted() {
		let r = reconcile(&keyed(&["dup"]), &keyed(&["dup", "dup"]), &TracePath::default());
		assert_eq!(r.matches, [(0, 0)]);
		assert_eq!(r.insertions, [(1, 1)]);
	}

	/// Runs the passes of `r` over the source keys.
	fn replay(source: &[&str], destination: &[&str], r: &Reconciliation) -> Vec<String> {
		let mut list: Vec<String> = source.iter().map(|&key| key.to_owned()).collect();
		for &index in &r.removals {
			list.remove(index);
		}
		for &(index, d) in &r.insertions {
			list.insert(index, destination[d].to_owned());
		}
		for &(from, to) in &r.moves {
			let key = list.remove(from);
			list.insert(to, key);
		}
		list
	}

	#[test]
	fn mixed_edits_replay_to_destination() {
		let cases: &[(&[&str], &[&str])] = &[
			(&["a", "b", "c", "d", "e", "f", "g", "h"], &["h", "x", "c", "a", "y", "g", "b", "z"]),
			(&["a", "b", "c", "d"], &["d", "c", "b", "a"]),
			(&["a", "b", "c"], &["x", "y", "c", "b", "z"]),
			(&[], &["a", "b"]),
			(&["a", "b"], &[]),
		];
		for &(source, destination) in cases {
			let r = reconcile(&keyed(source), &keyed(destination), &TracePath::default());
			assert_eq!(replay(source, destination, &r), destination, "{:?} -> {:?}", source, destination);
		}
	}

	#[test]
	fn long_append_is_pure_insertion() {
		let keys: Vec<String> = (0..40_000).map(|i| i.to_string()).collect();
		let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

		let r = reconcile(&keyed(&keys[..20_000]), &keyed(&keys), &TracePath::default());
		assert!(r.removals.is_empty() && r.moves.is_empty());
		assert!(r.insertions.iter().copied().eq((20_000..40_000).map(|i| (i, i))));
	}
}
