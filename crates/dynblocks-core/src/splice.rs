//! Document splicer.

use crate::document::{DocumentHost, NodeId, OutputNode};
use crate::error::{Error, Result};

/// Insert `nodes` directly after `fragment`, in order.
///
/// The fragment's sibling index is looked up at call time, so earlier
/// insertions elsewhere in the same parent are accounted for.
pub fn insert_after<D: DocumentHost + ?Sized>(
    doc: &mut D,
    fragment: NodeId,
    nodes: Vec<OutputNode>,
) -> Result<Vec<NodeId>> {
    let (parent, index) = doc
        .position(fragment)
        .ok_or_else(|| Error::Document(format!("fragment {} is not attached to the tree", fragment)))?;

    nodes
        .into_iter()
        .enumerate()
        .map(|(offset, node)| doc.insert(parent, index + 1 + offset, node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document, ListingBlock};

    fn text(block: &Block) -> String {
        match block {
            Block::Listing(listing) => listing.source.clone(),
            Block::Literal { text, .. } => text.clone(),
            other => format!("{:?}", other),
        }
    }

    #[test]
    fn test_shifted_indices() {
        let mut doc = Document::new("doc.adoc");
        let root = doc.root();
        let a = doc.push(root, Block::Listing(ListingBlock::new("python", "a")));
        let b = doc.push(root, Block::Listing(ListingBlock::new("python", "b")));

        insert_after(
            &mut doc,
            a,
            vec![OutputNode::literal("a1", "r"), OutputNode::literal("a2", "r")],
        )
        .unwrap();
        insert_after(&mut doc, b, vec![OutputNode::literal("b1", "r")]).unwrap();

        let order: Vec<String> = doc.blocks().iter().map(text).collect();
        assert_eq!(order, vec!["a", "a1", "a2", "b", "b1"]);
    }

    #[test]
    fn test_detached_fragment() {
        let mut doc = Document::new("doc.adoc");
        let root = doc.root();
        let err = insert_after(&mut doc, root, vec![OutputNode::literal("x", "r")]).unwrap_err();
        assert!(matches!(err, Error::Document(_)));
    }
}
