//! Fragment discovery.

use rustc_hash::FxHashSet;

use crate::document::{DocumentHost, NodeId};
use crate::options::{DOCUMENT_MARKER, FragmentOptions};

/// One executable fragment read from the document.
#[derive(Debug, Clone)]
pub struct SourceFragment {
    /// Node of the originating listing.
    pub node: NodeId,
    /// Position among fragments discovered for the same strategy.
    pub ordinal: usize,
    /// Language tag.
    pub language: String,
    /// Raw code text.
    pub code: String,
    /// Declared options.
    pub options: FragmentOptions,
}

impl SourceFragment {
    /// Short label for logs and error messages.
    pub fn label(&self) -> String {
        format!("{} fragment #{}", self.language, self.ordinal)
    }
}

/// Whether the document enables dynamic execution.
pub fn is_enabled<D: DocumentHost + ?Sized>(doc: &D) -> bool {
    doc.attribute(DOCUMENT_MARKER).is_some()
}

/// Find fragments whose language is in `languages` and that carry the
/// execute option, in traversal order.
///
/// Never mutates the document.
pub fn discover<D: DocumentHost + ?Sized>(doc: &D, languages: &[String]) -> Vec<SourceFragment> {
    let wanted: FxHashSet<&str> = languages.iter().map(String::as_str).collect();

    doc.listings()
        .into_iter()
        .filter_map(|node| {
            let listing = doc.listing(node)?;
            let language = listing.language()?;
            if !wanted.contains(language) {
                return None;
            }
            let options = FragmentOptions::from_listing(listing);
            if !options.execute {
                return None;
            }
            Some((node, language.to_string(), listing.source.clone(), options))
        })
        .enumerate()
        .map(|(ordinal, (node, language, code, options))| SourceFragment {
            node,
            ordinal,
            language,
            code,
            options,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document, ListingBlock};

    fn doc_with(listings: Vec<ListingBlock>) -> Document {
        let mut doc = Document::new("test.adoc");
        let root = doc.root();
        doc.push(root, Block::Paragraph { text: "intro".into() });
        for listing in listings {
            doc.push(root, Block::Listing(listing));
        }
        doc
    }

    #[test]
    fn test_filters_by_language_and_option() {
        let doc = doc_with(vec![
            ListingBlock::new("python", "a = 1").with_option("dynamic"),
            ListingBlock::new("python", "static = True"),
            ListingBlock::new("ruby", "puts 1").with_option("dynamic"),
            ListingBlock::new("python", "print(a)").with_option("dynamic"),
        ]);

        let fragments = discover(&doc, &["python".to_string()]);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].code, "a = 1");
        assert_eq!(fragments[0].ordinal, 0);
        assert_eq!(fragments[1].code, "print(a)");
        assert_eq!(fragments[1].ordinal, 1);
    }

    #[test]
    fn test_marker() {
        let mut doc = doc_with(Vec::new());
        assert!(!is_enabled(&doc));
        doc.set_attribute(DOCUMENT_MARKER, "");
        assert!(is_enabled(&doc));
    }
}
