//! Report element tree
//!
//! An owned, DOM-like tree standing in for the rendered report region. The
//! view builder produces it, chart renderers contribute subtrees to it, the
//! exporter rewrites its presentation and rasterizers read it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Inline style declarations, property -> value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ReportNode>,
}

impl ReportNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Element carrying its own text, e.g. `<p>text</p>`
    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ReportNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ReportNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Heading level 1-6, `None` for non-heading elements
    pub fn heading_level(&self) -> Option<u8> {
        HEADING_TAGS
            .iter()
            .position(|t| *t == self.tag)
            .map(|i| i as u8 + 1)
    }

    pub fn set_style(&mut self, property: &str, value: impl Into<String>) {
        self.style.insert(property.to_string(), value.into());
    }

    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Pre-order traversal
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ReportNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// First node in document order matching `pred`, including `self`
    pub fn find(&self, pred: &impl Fn(&ReportNode) -> bool) -> Option<&ReportNode> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(pred))
    }

    pub fn count(&self, pred: &impl Fn(&ReportNode) -> bool) -> usize {
        let mut n = 0;
        self.walk(&mut |node| {
            if pred(node) {
                n += 1;
            }
        });
        n
    }

    /// Child-index path to the first descendant matching `pred`. An empty
    /// path means `self` matched.
    pub fn path_to(&self, pred: &impl Fn(&ReportNode) -> bool) -> Option<Vec<usize>> {
        if pred(self) {
            return Some(Vec::new());
        }
        for (i, child) in self.children.iter().enumerate() {
            if let Some(mut rest) = child.path_to(pred) {
                rest.insert(0, i);
                return Some(rest);
            }
        }
        None
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&ReportNode> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get(i))
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut ReportNode> {
        let mut node = self;
        for &i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Insert `sibling` directly before the node at `path`. Fails for the
    /// root (empty path) and for paths that do not resolve.
    pub fn insert_before(&mut self, path: &[usize], sibling: ReportNode) -> bool {
        let Some((&index, parent_path)) = path.split_last() else {
            return false;
        };
        match self.node_at_mut(parent_path) {
            Some(parent) if index <= parent.children.len() => {
                parent.children.insert(index, sibling);
                true
            }
            _ => false,
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        self.walk(&mut |node| {
            if let Some(text) = node.text.as_deref() {
                if !text.trim().is_empty() {
                    parts.push(text.trim());
                }
            }
        });
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReportNode {
        ReportNode::new("div")
            .with_class("report")
            .with_child(ReportNode::text("h1", "Report"))
            .with_child(
                ReportNode::new("div")
                    .with_class("grid")
                    .with_child(ReportNode::text("p", "one"))
                    .with_child(ReportNode::text("p", "two")),
            )
    }

    #[test]
    fn test_find_and_path() {
        let root = sample();
        let grid = root.find(&|n| n.has_class("grid")).unwrap();
        assert_eq!(grid.children.len(), 2);

        let path = root.path_to(&|n| n.text.as_deref() == Some("two")).unwrap();
        assert_eq!(path, vec![1, 1]);
        assert_eq!(root.node_at(&path).unwrap().text.as_deref(), Some("two"));
        assert!(root.path_to(&|n| n.tag == "svg").is_none());
    }

    #[test]
    fn test_insert_before() {
        let mut root = sample();
        let path = root.path_to(&|n| n.has_class("grid")).unwrap();
        assert!(root.insert_before(&path, ReportNode::text("h2", "Summary")));
        assert_eq!(root.children[1].text.as_deref(), Some("Summary"));
        assert!(root.children[2].has_class("grid"));

        // The root has no parent to insert into
        assert!(!root.insert_before(&[], ReportNode::new("p")));
        assert!(!root.insert_before(&[9, 0], ReportNode::new("p")));
    }

    #[test]
    fn test_heading_level_and_text_content() {
        let root = sample();
        assert_eq!(root.children[0].heading_level(), Some(1));
        assert_eq!(root.heading_level(), None);
        assert_eq!(root.text_content(), "Report one two");
        assert_eq!(root.count(&|n| n.tag == "p"), 2);
    }
}
