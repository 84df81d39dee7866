//! Nested category taxonomy.
//!
//! Each key is a category segment and each value the subtree below it; leaves are
//! empty maps. The tree only ever grows: paths are merged in, never pruned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree(BTreeMap<String, CategoryTree>);

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, segment: &str) -> Option<&CategoryTree> {
        self.0.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &CategoryTree)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Folds `path` into the tree, reusing existing ancestors.
    ///
    /// Returns `true` when at least one new node was created. An empty path is a no-op.
    pub fn insert_path<S: AsRef<str>>(&mut self, path: &[S]) -> bool {
        let mut grew = false;
        let mut cursor = self;
        for segment in path {
            cursor = cursor
                .0
                .entry(segment.as_ref().to_owned())
                .or_insert_with(|| {
                    grew = true;
                    CategoryTree::new()
                });
        }
        grew
    }

    pub fn contains_path<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let mut cursor = self;
        for segment in path {
            match cursor.0.get(segment.as_ref()) {
                Some(next) => cursor = next,
                None => return false,
            }
        }
        true
    }

    /// Union of both trees; returns `true` when `self` gained nodes.
    pub fn merge(&mut self, other: CategoryTree) -> bool {
        let mut grew = false;
        for (segment, subtree) in other.0 {
            match self.0.get_mut(&segment) {
                Some(existing) => grew |= existing.merge(subtree),
                None => {
                    self.0.insert(segment, subtree);
                    grew = true;
                }
            }
        }
        grew
    }

    /// Every root-to-leaf path, in key order.
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect_leaves(self, &mut prefix, &mut out);
        out
    }
}

fn collect_leaves(node: &CategoryTree, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for (segment, child) in &node.0 {
        prefix.push(segment.clone());
        if child.is_empty() {
            out.push(prefix.clone());
        } else {
            collect_leaves(child, prefix, out);
        }
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shared_prefix_forms_single_branch() {
        let mut tree = CategoryTree::new();
        assert!(tree.insert_path(&["Electronics", "Phones", "Android"]));
        assert!(tree.insert_path(&["Electronics", "Phones", "iOS"]));
        assert!(tree.insert_path(&["Electronics", "Laptops"]));

        assert_eq!(tree.children().count(), 1);
        let electronics = tree.child("Electronics").unwrap();
        assert_eq!(electronics.children().count(), 2);
        assert_eq!(electronics.child("Phones").unwrap().children().count(), 2);
        assert_eq!(
            tree.to_json().unwrap(),
            r#"{"Electronics":{"Laptops":{},"Phones":{"Android":{},"iOS":{}}}}"#
        );
    }

    #[test]
    fn inserting_same_path_twice_is_idempotent() {
        let mut once = CategoryTree::new();
        once.insert_path(&path(&["Home", "Kitchen"]));

        let mut twice = once.clone();
        assert!(!twice.insert_path(&path(&["Home", "Kitchen"])));
        assert_eq!(once, twice);
    }

    #[test]
    fn prefix_of_existing_path_does_not_grow() {
        let mut tree = CategoryTree::new();
        tree.insert_path(&["Books", "Fiction", "Fantasy"]);
        assert!(!tree.insert_path(&["Books", "Fiction"]));
        assert!(tree.contains_path(&["Books", "Fiction", "Fantasy"]));
    }

    #[test]
    fn empty_path_leaves_tree_unchanged() {
        let mut tree = CategoryTree::new();
        tree.insert_path(&["Garden"]);
        let before = tree.clone();
        let empty: [&str; 0] = [];
        assert!(!tree.insert_path(&empty));
        assert_eq!(tree, before);
    }

    #[test]
    fn separate_roots_form_a_forest() {
        let mut tree = CategoryTree::new();
        tree.insert_path(&["Toys"]);
        tree.insert_path(&["Sports", "Cycling"]);
        assert_eq!(
            tree.leaf_paths(),
            vec![path(&["Sports", "Cycling"]), path(&["Toys"])]
        );
    }

    #[test]
    fn merge_is_a_union() {
        let mut left = CategoryTree::new();
        left.insert_path(&["A", "B"]);
        let mut right = CategoryTree::new();
        right.insert_path(&["A", "C"]);
        right.insert_path(&["D"]);

        assert!(left.merge(right.clone()));
        assert!(left.contains_path(&["A", "B"]));
        assert!(left.contains_path(&["A", "C"]));
        assert!(left.contains_path(&["D"]));
        assert!(!left.merge(right));
    }

    #[test]
    fn parses_stored_document() {
        let tree = CategoryTree::from_json(r#"{"Electronics":{"Phones":{}}}"#).unwrap();
        assert!(tree.contains_path(&["Electronics", "Phones"]));
        assert!(tree
            .child("Electronics")
            .and_then(|e| e.child("Phones"))
            .unwrap()
            .is_empty());
        assert!(!tree.contains_path(&["Phones"]));
    }
}
