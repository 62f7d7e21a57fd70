//! Host document contract and the in-memory document tree.
//!
//! The engine never touches a concrete tree directly. It talks to a
//! [`DocumentHost`], which any document engine can implement. [`Document`] is
//! the implementation shipped with the crate: an arena tree that round-trips
//! through JSON.
//!
//! ```text
//! DocumentSource (JSON, nested)
//!     │  Document::from(..)
//!     ▼
//! Document (arena: Vec<Node>, parent links)
//!     │  engine inserts OutputNodes via DocumentHost::insert
//!     ▼
//! DocumentSource (JSON, nested) ──► html::render (preview)
//! ```

pub mod html;
mod node;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use node::{Block, ListingBlock, NodeId, OutputNode};

/// What the engine needs from a host document.
pub trait DocumentHost {
    /// Name of the document (usually its file name).
    fn name(&self) -> &str;

    /// Document-level attribute.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// All source listings in traversal order.
    fn listings(&self) -> Vec<NodeId>;

    /// Read access to one listing.
    fn listing(&self, id: NodeId) -> Option<&ListingBlock>;

    /// Parent of `id` and the current index of `id` among its siblings.
    fn position(&self, id: NodeId) -> Option<(NodeId, usize)>;

    /// Insert `node` as child `index` of `parent`.
    fn insert(&mut self, parent: NodeId, index: usize, node: OutputNode) -> Result<NodeId>;
}

/// Serialized form of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Section { title: String },
    Paragraph { text: String },
    Listing(ListingBlock),
    Literal {
        text: String,
        role: Option<String>,
        escaped: bool,
    },
    Pass { content: String, role: Option<String> },
    Example {
        title: Option<String>,
        roles: Vec<String>,
        options: BTreeSet<String>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    attributes: BTreeMap<String, String>,
    nodes: Vec<Node>,
}

impl Document {
    /// Create an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse the JSON form of a document.
    pub fn from_json(json: &str) -> Result<Self> {
        let source: DocumentSource = serde_json::from_str(json)?;
        Ok(Self::from(source))
    }

    /// Serialize the document back to its JSON form.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_source())?)
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Append a block (and its descendants) under `parent`.
    pub fn push(&mut self, parent: NodeId, block: Block) -> NodeId {
        let (kind, children) = match block {
            Block::Section { title, blocks } => (NodeKind::Section { title }, blocks),
            Block::Paragraph { text } => (NodeKind::Paragraph { text }, Vec::new()),
            Block::Listing(listing) => (NodeKind::Listing(listing), Vec::new()),
            Block::Literal {
                text,
                role,
                escaped,
            } => (
                NodeKind::Literal {
                    text,
                    role,
                    escaped,
                },
                Vec::new(),
            ),
            Block::Pass { content, role } => (NodeKind::Pass { content, role }, Vec::new()),
            Block::Example {
                title,
                roles,
                options,
                blocks,
            } => (
                NodeKind::Example {
                    title,
                    roles,
                    options,
                },
                blocks,
            ),
        };

        let id = self.alloc(kind, parent);
        self.nodes[parent.0].children.push(id);
        for child in children {
            self.push(id, child);
        }
        id
    }

    /// Children of a node, in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Nested form of one node.
    pub fn block(&self, id: NodeId) -> Option<Block> {
        let node = self.nodes.get(id.0)?;
        let children = || -> Vec<Block> {
            node.children
                .iter()
                .filter_map(|&c| self.block(c))
                .collect()
        };

        let block = match &node.kind {
            NodeKind::Root => return None,
            NodeKind::Section { title } => Block::Section {
                title: title.clone(),
                blocks: children(),
            },
            NodeKind::Paragraph { text } => Block::Paragraph { text: text.clone() },
            NodeKind::Listing(listing) => Block::Listing(listing.clone()),
            NodeKind::Literal {
                text,
                role,
                escaped,
            } => Block::Literal {
                text: text.clone(),
                role: role.clone(),
                escaped: *escaped,
            },
            NodeKind::Pass { content, role } => Block::Pass {
                content: content.clone(),
                role: role.clone(),
            },
            NodeKind::Example {
                title,
                roles,
                options,
            } => Block::Example {
                title: title.clone(),
                roles: roles.clone(),
                options: options.clone(),
                blocks: children(),
            },
        };
        Some(block)
    }

    /// Top-level blocks in nested form.
    pub fn blocks(&self) -> Vec<Block> {
        self.children(self.root())
            .iter()
            .filter_map(|&id| self.block(id))
            .collect()
    }

    /// Nested, serializable form of the whole document.
    pub fn to_source(&self) -> DocumentSource {
        DocumentSource {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            blocks: self.blocks(),
        }
    }

    fn alloc(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        id
    }

    fn collect_listings(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            if matches!(self.nodes[child.0].kind, NodeKind::Listing(_)) {
                out.push(child);
            }
            self.collect_listings(child, out);
        }
    }
}

impl From<DocumentSource> for Document {
    fn from(source: DocumentSource) -> Self {
        let mut doc = Document::new(source.name);
        doc.attributes = source.attributes;
        let root = doc.root();
        for block in source.blocks {
            doc.push(root, block);
        }
        doc
    }
}

impl DocumentHost for Document {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn listings(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_listings(self.root(), &mut out);
        out
    }

    fn listing(&self, id: NodeId) -> Option<&ListingBlock> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Listing(listing) => Some(listing),
            _ => None,
        }
    }

    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.nodes.get(id.0)?.parent?;
        let index = self.nodes[parent.0].children.iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    fn insert(&mut self, parent: NodeId, index: usize, node: OutputNode) -> Result<NodeId> {
        let Some(parent_node) = self.nodes.get(parent.0) else {
            return Err(Error::Document(format!("no such node: {}", parent)));
        };
        if index > parent_node.children.len() {
            return Err(Error::Document(format!(
                "insert index {} out of bounds for {} ({} children)",
                index,
                parent,
                parent_node.children.len()
            )));
        }

        // Build the subtree detached, then move it into place.
        let id = self.push(parent, Block::from(node));
        let children = &mut self.nodes[parent.0].children;
        children.pop();
        children.insert(index, id);
        Ok(id)
    }
}
