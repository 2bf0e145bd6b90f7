//! Wildcard index over segmented patterns
//!
//! Each level of the index corresponds to one segment (host, path, method).
//! Children whose pattern starts with a literal are keyed by that literal
//! prefix, so a lookup only has to probe the prefixes of the queried
//! segment. Children whose pattern starts with a wildcard are kept in a
//! catch-all list that is always tested.

use crate::access_control::patterns::{Pattern, has_wildcard_prefix, literal_prefix};
use crate::error::PatternError;
use std::collections::BTreeMap;

/// Index mapping pattern sequences to attached data
#[derive(Debug)]
pub struct WildcardIndex<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    key: String,
    matcher: NodeMatcher,
    data: Vec<T>,
    literal: BTreeMap<String, Vec<Node<T>>>,
    catch_all: Vec<Node<T>>,
}

#[derive(Debug)]
enum NodeMatcher {
    /// Pattern without wildcards or escapes, compared as plain text
    Exact(String),
    Wildcard(Pattern),
}

impl<T> WildcardIndex<T> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            root: Node {
                key: String::new(),
                matcher: NodeMatcher::Exact(String::new()),
                data: Vec::new(),
                literal: BTreeMap::new(),
                catch_all: Vec::new(),
            },
            len: 0,
        }
    }

    /// Attach `data` to the node reached by following `segments`.
    ///
    /// Nodes along the way are shared with earlier insertions of the same
    /// pattern; inserting an identical sequence twice keeps both entries.
    pub fn insert(&mut self, segments: &[&str], data: T) -> Result<(), PatternError> {
        let mut node = &mut self.root;
        for segment in segments {
            node = node.child_mut(segment)?;
        }
        node.data.push(data);
        self.len += 1;
        Ok(())
    }

    /// Collect the data of every entry whose patterns match `segments`
    pub fn query(&self, segments: &[&str]) -> Vec<&T> {
        let mut frontier = vec![&self.root];

        for segment in segments {
            frontier = frontier
                .into_iter()
                .flat_map(|node| node.find(segment))
                .collect();
            if frontier.is_empty() {
                return Vec::new();
            }
        }

        frontier.into_iter().flat_map(|node| &node.data).collect()
    }

    /// Number of inserted entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for WildcardIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Node<T> {
    fn new(key: &str) -> Result<Self, PatternError> {
        // Escapes go through the matcher: an escaped separator never matches
        let (_, wildcard) = literal_prefix(key);
        let matcher = if wildcard || key.contains('\\') {
            NodeMatcher::Wildcard(Pattern::parse(key)?)
        } else {
            NodeMatcher::Exact(key.to_string())
        };

        Ok(Self {
            key: key.to_string(),
            matcher,
            data: Vec::new(),
            literal: BTreeMap::new(),
            catch_all: Vec::new(),
        })
    }

    fn matches(&self, segment: &str) -> bool {
        match &self.matcher {
            NodeMatcher::Exact(literal) => literal == segment,
            NodeMatcher::Wildcard(pattern) => pattern.matches(segment),
        }
    }

    /// Existing child with this exact pattern, or a freshly created one
    fn child_mut(&mut self, key: &str) -> Result<&mut Node<T>, PatternError> {
        let siblings = if has_wildcard_prefix(key) {
            &mut self.catch_all
        } else {
            let (prefix, _) = literal_prefix(key);
            self.literal.entry(prefix).or_default()
        };

        let position = match siblings.iter().position(|child| child.key == key) {
            Some(position) => position,
            None => {
                siblings.push(Node::new(key)?);
                siblings.len() - 1
            }
        };
        Ok(&mut siblings[position])
    }

    /// Children matching `segment`: every catch-all child plus the
    /// literal-keyed children whose key is a prefix of `segment`
    fn find(&self, segment: &str) -> Vec<&Node<T>> {
        let prefix_ends = segment
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(segment.len()));

        let keyed = prefix_ends
            .filter_map(|end| self.literal.get(&segment[..end]))
            .flatten();

        self.catch_all
            .iter()
            .chain(keyed)
            .filter(|child| child.matches(segment))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> WildcardIndex<&'static str> {
        let records = [
            (["*", "**", "*"], "global category"),
            (["api-{prod,sit}.domain.com", "/article", "*"], "article global category"),
            (["api-{prod,sit}.domain.com", "/article", "GET"], "article get category"),
            (["api-{prod,sit}.domain.com", "/article", "POST"], "article post category"),
            (["api-{prod,sit}.domain.com", "/article", "DELETE"], "article delete category"),
            (["api-{prod,sit}.domain.com", "/login", "*"], "login category"),
            (["api-{prod,sit}.domain.com", "/notice", "*"], "notice category"),
            (["api-{prod,sit}.domain.com", "/query/*", "GET"], "query category"),
            (["domain.com", "/login", "*"], "login category"),
        ];

        let mut index = WildcardIndex::new();
        for (segments, data) in records {
            index.insert(&segments, data).unwrap();
        }
        index
    }

    fn query(index: &WildcardIndex<&'static str>, segments: &[&str]) -> Vec<&'static str> {
        index.query(segments).into_iter().copied().collect()
    }

    #[test]
    fn test_query_wildcard_host_and_method() {
        let index = sample_index();
        assert_eq!(
            query(&index, &["api-prod.domain.com", "/article", "GET"]),
            vec!["global category", "article global category", "article get category"]
        );
        assert_eq!(
            query(&index, &["api-sit.domain.com", "/article", "DELETE"]),
            vec!["global category", "article global category", "article delete category"]
        );
    }

    #[test]
    fn test_query_literal_prefix_must_match() {
        let index = sample_index();
        assert_eq!(
            query(&index, &["api.domain.com", "/article", "POST"]),
            vec!["global category"]
        );
    }

    #[test]
    fn test_query_wildcard_path() {
        let index = sample_index();
        assert_eq!(
            query(&index, &["api-prod.domain.com", "/query/keywords", "GET"]),
            vec!["global category", "query category"]
        );
        assert_eq!(
            query(&index, &["api-prod.domain.com", "/query/a/b", "GET"]),
            vec!["global category"]
        );
    }

    #[test]
    fn test_duplicate_entries_are_all_returned() {
        let mut index = WildcardIndex::new();
        let segments = ["layer1", "layer2", "layer3"];
        for data in ["data1", "data2", "data3", "data4", "data5"] {
            index.insert(&segments, data).unwrap();
        }

        assert_eq!(index.len(), 5);
        assert_eq!(
            query(&index, &segments),
            vec!["data1", "data2", "data3", "data4", "data5"]
        );
    }

    #[test]
    fn test_empty_index() {
        let index: WildcardIndex<&str> = WildcardIndex::new();
        assert!(index.is_empty());
        assert!(index.query(&["domain.com", "/", "GET"]).is_empty());
    }

    #[test]
    fn test_escaped_literal_is_compared_unescaped() {
        let mut index = WildcardIndex::new();
        index.insert(&[r"test\[1]", "/", "GET"], 1).unwrap();

        assert_eq!(index.query(&["test[1]", "/", "GET"]), vec![&1]);
        assert!(index.query(&[r"test\[1]", "/", "GET"]).is_empty());
    }

    #[test]
    fn test_escaped_separator_is_not_a_separator() {
        let mut index = WildcardIndex::new();
        index.insert(&["domain.com", r"/a\/b", "GET"], 1).unwrap();
        index.insert(&["domain.com", "/a/b", "GET"], 2).unwrap();

        assert_eq!(index.query(&["domain.com", "/a/b", "GET"]), vec![&2]);
        assert!(index.query(&["domain.com", r"/a\/b", "GET"]).is_empty());
    }

    #[test]
    fn test_shorter_literal_keys_are_found_by_prefix() {
        let mut index = WildcardIndex::new();
        index.insert(&["a*", "/", "GET"], "short").unwrap();
        index.insert(&["ab*", "/", "GET"], "long").unwrap();
        index.insert(&["abc", "/", "GET"], "exact").unwrap();

        assert_eq!(
            query(&index, &["abc", "/", "GET"]),
            vec!["short", "long", "exact"]
        );
        assert_eq!(query(&index, &["abd", "/", "GET"]), vec!["short", "long"]);
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        let mut index = WildcardIndex::new();
        assert!(index.insert(&["{a,b", "/", "GET"], ()).is_err());
        assert!(index.insert(&["a", "/[x", "GET"], ()).is_err());
    }
}
