//! Block and output node model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identifier of a node inside a [`super::Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// A source listing as read from the document.
///
/// Options are the boolean flags of the block (`%dynamic%open` in AsciiDoc);
/// attributes are the named ones (`compile=cmake`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub options: BTreeSet<String>,
}

impl ListingBlock {
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Builder-style option flag.
    pub fn with_option(mut self, name: impl Into<String>) -> Self {
        self.options.insert(name.into());
        self
    }

    /// Builder-style named attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }
}

/// Nested, serializable form of a document block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        title: String,
        #[serde(default)]
        blocks: Vec<Block>,
    },
    Paragraph {
        text: String,
    },
    Listing(ListingBlock),
    Literal {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        /// Text is already escaped for the output markup.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        escaped: bool,
    },
    Pass {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
    },
    Example {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        roles: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        options: BTreeSet<String>,
        #[serde(default)]
        blocks: Vec<Block>,
    },
}

/// A node produced by the engine for embedding after a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNode {
    /// Pre-formatted literal text.
    Literal {
        text: String,
        role: String,
        escaped: bool,
    },
    /// Markup passed through unescaped.
    Pass { content: String, role: Option<String> },
    /// Titled container.
    Example {
        title: String,
        roles: Vec<String>,
        options: BTreeSet<String>,
        children: Vec<OutputNode>,
    },
}

impl OutputNode {
    pub fn literal(text: impl Into<String>, role: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            role: role.into(),
            escaped: false,
        }
    }

    pub fn escaped_literal(text: impl Into<String>, role: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            role: role.into(),
            escaped: true,
        }
    }

    pub fn pass(content: impl Into<String>, role: Option<&str>) -> Self {
        Self::Pass {
            content: content.into(),
            role: role.map(str::to_string),
        }
    }

    pub fn example(title: impl Into<String>) -> Self {
        Self::Example {
            title: title.into(),
            roles: Vec::new(),
            options: BTreeSet::new(),
            children: Vec::new(),
        }
    }

    /// Add a role to an example container. Duplicates are ignored.
    pub fn add_role(&mut self, role: &str) {
        if let Self::Example { roles, .. } = self
            && !roles.iter().any(|r| r == role)
        {
            roles.push(role.to_string());
        }
    }

    /// Set an option flag on an example container.
    pub fn set_option(&mut self, name: &str) {
        if let Self::Example { options, .. } = self {
            options.insert(name.to_string());
        }
    }

    /// Append a child to an example container.
    pub fn append(&mut self, child: OutputNode) {
        if let Self::Example { children, .. } = self {
            children.push(child);
        }
    }

    pub fn roles(&self) -> &[String] {
        match self {
            Self::Example { roles, .. } => roles,
            _ => &[],
        }
    }

    pub fn children(&self) -> &[OutputNode] {
        match self {
            Self::Example { children, .. } => children,
            _ => &[],
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Example { title, .. } => Some(title),
            _ => None,
        }
    }
}

impl From<OutputNode> for Block {
    fn from(node: OutputNode) -> Self {
        match node {
            OutputNode::Literal {
                text,
                role,
                escaped,
            } => Block::Literal {
                text,
                role: Some(role),
                escaped,
            },
            OutputNode::Pass { content, role } => Block::Pass { content, role },
            OutputNode::Example {
                title,
                roles,
                options,
                children,
            } => Block::Example {
                title: Some(title),
                roles,
                options,
                blocks: children.into_iter().map(Block::from).collect(),
            },
        }
    }
}
