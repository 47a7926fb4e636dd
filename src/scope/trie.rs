use std::collections::BTreeMap;

use super::path::PathKey;

/// One branch point in the trie. A node may carry a value, children, or
/// both; interior nodes created on the way to a deeper key carry neither
/// until something is inserted at them.
#[derive(Debug)]
struct Node<T> {
	value: Option<T>,
	children: BTreeMap<String, Node<T>>,
}

impl<T> Node<T> {
	fn new() -> Self {
		Node {
			value: None,
			children: BTreeMap::new(),
		}
	}
}

/// A prefix tree keyed by normalized path segments.
///
/// Lookup walks a query key segment by segment and remembers the deepest
/// node holding a value, so the closest enclosing scope wins no matter how
/// many ancestors also match. Children are kept in a `BTreeMap`, which
/// makes every traversal order deterministic.
#[derive(Debug)]
pub struct PathTrie<T> {
	root: Node<T>,
	len: usize,
}

impl<T> PathTrie<T> {
	/// Create an empty trie.
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert `value` at `key`, returning the value previously stored at
	/// exactly that key, if any.
	pub fn insert(&mut self, key: &PathKey, value: T) -> Option<T> {
		let mut node = &mut self.root;
		for seg in key.segments() {
			node = node.children.entry(seg.clone()).or_insert_with(Node::new);
		}
		let displaced = node.value.replace(value);
		if displaced.is_none() {
			self.len += 1;
		}
		displaced
	}

	/// The value stored at the deepest ancestor-or-self of `key`, together
	/// with the segment depth it was found at. `None` when no ancestor of
	/// `key` holds a value.
	pub fn longest_prefix(&self, key: &PathKey) -> Option<(usize, &T)> {
		let mut node = &self.root;
		let mut best = node.value.as_ref().map(|v| (0, v));
		for (idx, seg) in key.segments().iter().enumerate() {
			match node.children.get(seg) {
				Some(child) => {
					node = child;
					if let Some(v) = node.value.as_ref() {
						best = Some((idx + 1, v));
					}
				}
				None => break,
			}
		}
		best
	}

	/// Iterate every stored value, depth-first in segment order.
	pub fn values(&self) -> Values<'_, T> {
		Values {
			stack: vec![&self.root],
			prune: false,
		}
	}

	/// Iterate stored values whose key has no valued ancestor in the trie.
	///
	/// Each branch contributes only its shallowest value, giving the
	/// minimal set of scopes that still covers everything registered.
	pub fn shallowest_values(&self) -> Values<'_, T> {
		Values {
			stack: vec![&self.root],
			prune: true,
		}
	}

	/// Number of values stored.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

impl<T> Default for PathTrie<T> {
	fn default() -> Self {
		PathTrie {
			root: Node::new(),
			len: 0,
		}
	}
}

/// Depth-first iterator over stored values. With `prune` set, subtrees
/// below a valued node are never entered.
pub struct Values<'a, T> {
	stack: Vec<&'a Node<T>>,
	prune: bool,
}

impl<'a, T> Iterator for Values<'a, T> {
	type Item = &'a T;

	fn next(&mut self) -> Option<Self::Item> {
		while let Some(node) = self.stack.pop() {
			if !(self.prune && node.value.is_some()) {
				// Reversed so children pop off the stack in map order.
				self.stack.extend(node.children.values().rev());
			}
			if let Some(value) = node.value.as_ref() {
				return Some(value);
			}
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn key(raw: &str) -> PathKey {
		PathKey::parse(raw).unwrap()
	}

	#[test]
	fn test_longest_prefix_picks_closest_ancestor() {
		let mut trie = PathTrie::new();
		trie.insert(&key("/a"), "a");
		trie.insert(&key("/a/b"), "ab");
		trie.insert(&key("/a/b/c/d"), "abcd");

		let (depth, value) = trie.longest_prefix(&key("/a/b/c")).unwrap();
		assert_eq!(*value, "ab");
		assert_eq!(depth, 2);
	}

	#[test]
	fn test_longest_prefix_exact_match_wins() {
		let mut trie = PathTrie::new();
		trie.insert(&key("/a"), "a");
		trie.insert(&key("/a/b"), "ab");

		let (depth, value) = trie.longest_prefix(&key("/a/b")).unwrap();
		assert_eq!(*value, "ab");
		assert_eq!(depth, 2);
	}

	#[test]
	fn test_longest_prefix_misses_outside_registered_branches() {
		let mut trie = PathTrie::new();
		trie.insert(&key("/a/b"), "ab");

		assert!(trie.longest_prefix(&key("/x")).is_none());
		// An ancestor of a registered key holds no value itself.
		assert!(trie.longest_prefix(&key("/a")).is_none());
	}

	#[test]
	fn test_root_value_covers_every_key() {
		let mut trie = PathTrie::new();
		trie.insert(&key("/"), "root");

		let (depth, value) = trie.longest_prefix(&key("/any/where")).unwrap();
		assert_eq!(*value, "root");
		assert_eq!(depth, 0);

		let (_, value) = trie.longest_prefix(&key("C:\\Work")).unwrap();
		assert_eq!(*value, "root");
	}

	#[test]
	fn test_insert_displaces_existing_value() {
		let mut trie = PathTrie::new();
		assert!(trie.insert(&key("/a"), 1).is_none());
		assert_eq!(trie.insert(&key("/a"), 2), Some(1));
		assert_eq!(trie.len(), 1);
		assert_eq!(*trie.longest_prefix(&key("/a")).unwrap().1, 2);
	}

	#[test]
	fn test_len_counts_values_not_nodes() {
		let mut trie = PathTrie::new();
		assert!(trie.is_empty());
		trie.insert(&key("/deeply/nested/scope"), ());
		assert_eq!(trie.len(), 1);
		trie.insert(&key("/deeply"), ());
		assert_eq!(trie.len(), 2);
	}

	#[test]
	fn test_values_yields_all_in_stable_order() {
		let mut trie = PathTrie::new();
		trie.insert(&key("/b"), "b");
		trie.insert(&key("/a/y"), "ay");
		trie.insert(&key("/a"), "a");

		let all: Vec<&str> = trie.values().copied().collect();
		assert_eq!(all, ["a", "ay", "b"]);
	}

	#[test]
	fn test_shallowest_values_suppresses_covered_scopes() {
		let mut trie = PathTrie::new();
		trie.insert(&key("/a"), "a");
		trie.insert(&key("/a/b"), "ab");
		trie.insert(&key("/x/y"), "xy");

		let shallow: Vec<&str> = trie.shallowest_values().copied().collect();
		assert_eq!(shallow, ["a", "xy"]);

		let all: Vec<&str> = trie.values().copied().collect();
		assert_eq!(all, ["a", "ab", "xy"]);
	}

	#[test]
	fn test_drive_and_posix_branches_do_not_interfere() {
		let mut trie = PathTrie::new();
		trie.insert(&key("C:\\Work"), "win");
		trie.insert(&key("/srv"), "posix");

		assert_eq!(*trie.longest_prefix(&key("c:/Work/sub")).unwrap().1, "win");
		assert_eq!(*trie.longest_prefix(&key("/srv/app")).unwrap().1, "posix");
		assert!(trie.longest_prefix(&key("D:\\Work")).is_none());
	}
}
