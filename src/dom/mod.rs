//! Live ancestor stack rebuilt from open/close events.
//!
//! Only the elements between the document root and the current position are
//! kept. A node is released as soon as its close event has been handled, so
//! memory is bounded by nesting depth rather than document size.
//!
//! Nodes refer to their parent by [`NodeId`]. Ids increase monotonically, so
//! ids along the stack are sorted and a parent lookup is a binary search.

use crate::errors::ScrapeError;
use std::fmt;
use std::iter::FusedIterator;
use tracing::trace;

// ── Node ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

/// One markup element. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whitespace-separated, lowercased values of every `attr` attribute.
    pub fn attr_values(&self, attr: &str) -> Vec<String> {
        self.attrs
            .iter()
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case(attr))
            .flat_map(|(_, value)| value.split_whitespace().map(str::to_lowercase))
            .collect()
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr_values("class")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    pub fn has_attr(&self, attr: &str) -> bool {
        self.attrs
            .iter()
            .any(|(name, _)| name.trim().eq_ignore_ascii_case(attr))
    }

    pub fn attr_has_value(&self, attr: &str, value: &str) -> bool {
        let value = value.to_lowercase();
        self.attr_values(attr).contains(&value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            if value.is_empty() {
                write!(f, " {name}")?;
            } else {
                write!(f, " {name}='{value}'")?;
            }
        }
        f.write_str(">")
    }
}

// ── Tree builder ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<Node>,
    next_id: u64,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new node under the current stack top.
    pub fn open(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeRef<'_> {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let node = Node {
            id,
            tag: tag.to_lowercase(),
            attrs,
            parent: self.stack.last().map(|n| n.id),
        };
        self.stack.push(node);

        let tree = &*self;
        NodeRef {
            node: &tree.stack[tree.stack.len() - 1],
            tree,
        }
    }

    /// Pop the stack top. The popped node's ancestors stay resolvable through
    /// [`TreeBuilder::resolve`] until they are closed in turn.
    pub fn close(&mut self, tag: &str) -> Result<Node, ScrapeError> {
        let node = self.stack.pop().ok_or_else(|| ScrapeError::UnbalancedClose {
            tag: tag.to_string(),
        })?;

        if !node.tag.eq_ignore_ascii_case(tag) {
            trace!("</{}> closed {} (tags disagree)", tag, node);
        }
        Ok(node)
    }

    pub fn current(&self) -> Option<NodeRef<'_>> {
        self.stack.last().map(|node| NodeRef { node, tree: self })
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.stack
            .binary_search_by_key(&id, |n| n.id)
            .ok()
            .map(|i| &self.stack[i])
    }

    /// View a node (possibly one just popped) with its live ancestry.
    pub fn resolve<'a>(&'a self, node: &'a Node) -> NodeRef<'a> {
        NodeRef { node, tree: self }
    }

    pub fn ancestors_with_tag<'t>(&self, tag: &'t str) -> AncestorsWithTag<'_, 't> {
        match self.current() {
            Some(cur) => cur.ancestors_with_tag(tag),
            None => AncestorsWithTag {
                tree: self,
                next: None,
                tag,
            },
        }
    }
}

// ── Node views ────────────────────────────────────────────────────────────────

/// A node together with the builder that can resolve its parents.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    node: &'a Node,
    tree: &'a TreeBuilder,
}

impl<'a> NodeRef<'a> {
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn tag(&self) -> &'a str {
        &self.node.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.has_class(class)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let id = self.node.parent?;
        self.tree.get(id).map(|node| NodeRef {
            node,
            tree: self.tree,
        })
    }

    pub fn first_ancestor_tag(&self, tag: &str) -> Option<NodeRef<'a>> {
        self.ancestors_with_tag(tag).next()
    }

    /// Ancestors tagged `tag`, nearest first.
    pub fn ancestors_with_tag<'t>(&self, tag: &'t str) -> AncestorsWithTag<'a, 't> {
        AncestorsWithTag {
            tree: self.tree,
            next: self.node.parent,
            tag,
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.node, f)
    }
}

/// Single-pass walk up the parent chain.
pub struct AncestorsWithTag<'a, 't> {
    tree: &'a TreeBuilder,
    next: Option<NodeId>,
    tag: &'t str,
}

impl<'a> Iterator for AncestorsWithTag<'a, '_> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.next {
            let node = self.tree.get(id)?;
            self.next = node.parent;
            if node.tag == self.tag {
                return Some(NodeRef {
                    node,
                    tree: self.tree,
                });
            }
        }
        None
    }
}

impl FusedIterator for AncestorsWithTag<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(value: &str) -> Vec<(String, String)> {
        vec![("class".to_string(), value.to_string())]
    }

    #[test]
    fn test_balanced_stream_empties_stack() {
        let mut tree = TreeBuilder::new();
        let tags = ["html", "body", "div", "span"];
        for t in tags {
            tree.open(t, vec![]);
        }
        assert_eq!(tree.depth(), 4);
        for t in tags.iter().rev() {
            tree.close(t).unwrap();
        }
        assert_eq!(tree.depth(), 0);
        assert!(tree.current().is_none());
    }

    #[test]
    fn test_close_on_empty_stack_is_structural_error() {
        let mut tree = TreeBuilder::new();
        assert!(matches!(
            tree.close("div"),
            Err(ScrapeError::UnbalancedClose { ref tag }) if tag == "div"
        ));
    }

    #[test]
    fn test_parent_links_follow_stack() {
        let mut tree = TreeBuilder::new();
        let outer = tree.open("DIV", class("Product")).id();
        let inner = tree.open("a", vec![]);
        assert_eq!(inner.tag(), "a");
        let parent = inner.parent().unwrap();
        assert_eq!(parent.id(), outer);
        assert_eq!(parent.tag(), "div");
        assert!(parent.has_class("product"));
    }

    #[test]
    fn test_ancestors_with_tag_nearest_first() {
        let mut tree = TreeBuilder::new();
        let far = tree.open("a", class("far")).id();
        tree.open("b", vec![]);
        let near = tree.open("a", class("near")).id();
        tree.open("span", vec![]);

        let mut it = tree.ancestors_with_tag("a");
        assert_eq!(it.next().map(|n| n.id()), Some(near));
        assert_eq!(it.next().map(|n| n.id()), Some(far));
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_popped_node_still_sees_ancestors() {
        let mut tree = TreeBuilder::new();
        tree.open("div", class("available-tag"));
        tree.open("p", vec![]);
        tree.open("b", vec![]);
        let b = tree.close("b").unwrap();

        let view = tree.resolve(&b);
        let div = view.first_ancestor_tag("div").unwrap();
        assert!(div.has_class("available-tag"));
        assert_eq!(view.parent().map(|p| p.tag()), Some("p"));
    }

    #[test]
    fn test_attr_helpers() {
        let mut tree = TreeBuilder::new();
        let node = tree
            .open(
                "span",
                vec![
                    ("class".into(), "price  Sale".into()),
                    ("data-sku".into(), "ABC".into()),
                    ("hidden".into(), String::new()),
                ],
            )
            .node()
            .clone();
        assert_eq!(node.classes(), vec!["price", "sale"]);
        assert!(node.has_class("sale"));
        assert!(node.has_attr("HIDDEN"));
        assert!(node.attr_has_value("data-sku", "abc"));
        assert_eq!(
            node.to_string(),
            "<span class='price  Sale' data-sku='ABC' hidden>"
        );
    }
}
