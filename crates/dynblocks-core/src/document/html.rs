//! Minimal HTML preview of a document.
//!
//! Produces the block structure only (no page template), close to what an
//! AsciiDoc converter would emit for the same nodes.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{Block, Document};

/// Render the document body as HTML.
pub fn render(doc: &Document) -> String {
    render_blocks(&doc.blocks())
}

/// Render a sequence of blocks.
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Section { title, blocks } => format!(
            "<div class=\"sect\">\n<h2>{}</h2>\n{}\n</div>",
            encode_text(title),
            render_blocks(blocks)
        ),
        Block::Paragraph { text } => format!(
            "<div class=\"paragraph\">\n<p>{}</p>\n</div>",
            encode_text(text)
        ),
        Block::Listing(listing) => {
            let code = encode_text(&listing.source);
            match listing.language() {
                Some(lang) => {
                    let lang = encode_double_quoted_attribute(lang);
                    format!(
                        "<div class=\"listingblock\">\n<div class=\"content\">\n<pre class=\"highlight\"><code class=\"language-{lang}\" data-lang=\"{lang}\">{code}</code></pre>\n</div>\n</div>"
                    )
                }
                None => format!(
                    "<div class=\"listingblock\">\n<div class=\"content\">\n<pre>{code}</pre>\n</div>\n</div>"
                ),
            }
        }
        Block::Literal {
            text,
            role,
            escaped,
        } => {
            let class = match role {
                Some(role) => format!("literalblock {}", encode_double_quoted_attribute(role)),
                None => "literalblock".to_string(),
            };
            let text = if *escaped {
                text.clone()
            } else {
                encode_text(text).into_owned()
            };
            format!("<div class=\"{class}\">\n<div class=\"content\">\n<pre>{text}</pre>\n</div>\n</div>")
        }
        Block::Pass { content, .. } => content.clone(),
        Block::Example {
            title,
            roles,
            options,
            blocks,
        } => {
            let body = render_blocks(blocks);
            let classes = roles
                .iter()
                .map(|r| encode_double_quoted_attribute(r).into_owned())
                .collect::<Vec<_>>()
                .join(" ");

            if options.contains("collapsible") {
                let mut open_tag = String::from("<details");
                if !classes.is_empty() {
                    open_tag.push_str(&format!(" class=\"{classes}\""));
                }
                if options.contains("open") {
                    open_tag.push_str(" open");
                }
                open_tag.push('>');
                let summary = title.as_deref().unwrap_or("Details");
                format!(
                    "{open_tag}\n<summary class=\"title\">{}</summary>\n<div class=\"content\">\n{body}\n</div>\n</details>",
                    encode_text(summary)
                )
            } else {
                let class = if classes.is_empty() {
                    "exampleblock".to_string()
                } else {
                    format!("exampleblock {classes}")
                };
                let title = title
                    .as_deref()
                    .map(|t| format!("<div class=\"title\">{}</div>\n", encode_text(t)))
                    .unwrap_or_default();
                format!("<div class=\"{class}\">\n{title}<div class=\"content\">\n{body}\n</div>\n</div>")
            }
        }
    }
}
