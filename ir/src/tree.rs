//! Tree visualization for node graphs.
//!
//! Nodes can be shared by several consumers, so the renderer prints a
//! back-reference `%id → (see above)` for every node already written.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use ptree::{Style, TreeItem};

use crate::error::Result;
use crate::graph::Graph;
use crate::node::{NodeId, Output};

#[derive(Clone)]
struct NodeTree<'g> {
    graph: &'g Graph,
    edge: Output,
    visited: Rc<RefCell<HashSet<NodeId>>>,
    is_backref: RefCell<bool>,
}

impl<'g> NodeTree<'g> {
    fn new(graph: &'g Graph, root: NodeId) -> Self {
        Self {
            graph,
            edge: Output::new(root, 0),
            visited: Rc::new(RefCell::new(HashSet::new())),
            is_backref: RefCell::new(false),
        }
    }

    fn child(&self, edge: Output) -> Self {
        Self { graph: self.graph, edge, visited: self.visited.clone(), is_backref: RefCell::new(false) }
    }
}

impl TreeItem for NodeTree<'_> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        let id = self.edge.node;
        let mut visited = self.visited.borrow_mut();
        let Ok(node) = self.graph.node(id) else {
            return write!(f, "{id} <collected>");
        };
        let prefix = if self.edge.index == 0 { String::new() } else { format!("[{}] ", self.edge.index) };
        if visited.contains(&id) {
            *self.is_backref.borrow_mut() = true;
            write!(f, "{prefix}{id} → (see above)")
        } else {
            visited.insert(id);
            write!(f, "{prefix}{id} {node}")
        }
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        if *self.is_backref.borrow() {
            return Cow::Borrowed(&[]);
        }
        let Ok(node) = self.graph.node(self.edge.node) else {
            return Cow::Borrowed(&[]);
        };
        Cow::Owned(node.operands().iter().map(|&edge| self.child(edge)).collect())
    }
}

pub(crate) fn render_tree(graph: &Graph, root: NodeId) -> Result<String> {
    graph.node(root)?;
    let tree = NodeTree::new(graph, root);
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = ptree::write_tree(&tree, &mut buf);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
