//! Rich-text rendering
//!
//! Each [`BlockKind`] maps to one rendering rule. The default table is an
//! exhaustive `match`, so adding a block kind without a rule does not compile;
//! individual rules can be swapped out with [`RichTextRenderer::with_rule`].

use std::collections::HashMap;

use super::block::{Block, BlockKind, ListKind, Mark, Span};
use super::image::ImageUrlBuilder;
use crate::helpers::{html_escape, safe_href};

/// Signature of a block rendering rule
pub type BlockRule = fn(&Block, &RenderContext<'_>, &mut String);

/// What rules may need beyond the block itself
pub struct RenderContext<'a> {
    pub images: &'a ImageUrlBuilder,
}

/// Renders post bodies to HTML
#[derive(Default)]
pub struct RichTextRenderer {
    overrides: HashMap<BlockKind, BlockRule>,
}

impl RichTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rule for one block kind
    pub fn with_rule(mut self, kind: BlockKind, rule: BlockRule) -> Self {
        self.overrides.insert(kind, rule);
        self
    }

    /// Rule used for `kind`
    pub fn rule_for(&self, kind: BlockKind) -> BlockRule {
        if let Some(rule) = self.overrides.get(&kind) {
            return *rule;
        }
        match kind {
            BlockKind::Paragraph => render_paragraph,
            BlockKind::Heading1 => render_heading_1,
            BlockKind::Heading2 => render_heading_2,
            BlockKind::Heading3
            | BlockKind::Heading4
            | BlockKind::Heading5
            | BlockKind::Heading6 => render_minor_heading,
            BlockKind::Blockquote => render_blockquote,
            BlockKind::ListItem => render_list_item,
            BlockKind::Link => render_link,
            BlockKind::Image => render_image,
            BlockKind::Unknown => render_unknown,
        }
    }

    /// Render a sequence of blocks; consecutive list items share one list element
    pub fn render(&self, blocks: &[Block], ctx: &RenderContext<'_>) -> String {
        let mut out = String::new();
        let mut open_list: Option<ListKind> = None;

        for block in blocks {
            let list = match block {
                Block::ListItem { list, .. } => Some(*list),
                _ => None,
            };
            if open_list != list {
                if let Some(kind) = open_list {
                    out.push_str(list_close(kind));
                }
                if let Some(kind) = list {
                    out.push_str(list_open(kind));
                }
                open_list = list;
            }
            (self.rule_for(block.kind()))(block, ctx, &mut out);
        }
        if let Some(kind) = open_list {
            out.push_str(list_close(kind));
        }

        out
    }
}

fn list_open(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "<ul>",
        ListKind::Number => "<ol>",
    }
}

fn list_close(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "</ul>",
        ListKind::Number => "</ol>",
    }
}

fn render_paragraph(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    out.push_str(r#"<p class="text-justify text-base">"#);
    render_spans(block.children(), out);
    out.push_str("</p>");
}

fn render_heading_1(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    out.push_str(r#"<h1 class="my-5 text-2xl font-bold">"#);
    render_spans(block.children(), out);
    out.push_str("</h1>");
}

fn render_heading_2(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    out.push_str(r#"<h2 class="my-3 text-xl font-bold">"#);
    render_spans(block.children(), out);
    out.push_str("</h2>");
}

fn render_minor_heading(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    let tag = match block {
        Block::Heading { level, .. } => level.tag(),
        _ => "h3",
    };
    out.push_str(&format!(r#"<{} class="my-2 text-lg font-semibold">"#, tag));
    render_spans(block.children(), out);
    out.push_str(&format!("</{}>", tag));
}

fn render_blockquote(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    out.push_str(r#"<blockquote class="my-3 border-l-4 pl-4 italic">"#);
    render_spans(block.children(), out);
    out.push_str("</blockquote>");
}

fn render_list_item(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    let (marker, level) = match block {
        Block::ListItem {
            list: ListKind::Number,
            level,
            ..
        } => ("list-decimal", *level),
        Block::ListItem { level, .. } => ("list-disc", *level),
        _ => ("list-disc", 1),
    };
    out.push_str(&format!(
        r#"<li class="ml-{} {}">"#,
        4 * u32::from(level.max(1)),
        marker
    ));
    render_spans(block.children(), out);
    out.push_str("</li>");
}

fn render_link(block: &Block, _ctx: &RenderContext<'_>, out: &mut String) {
    let Block::Link { href, children } = block else {
        return;
    };
    out.push_str(&format!(
        r#"<a href="{}" class="text-blue-500 hover:underline">"#,
        html_escape(&safe_href(href))
    ));
    render_spans(children, out);
    out.push_str("</a>");
}

fn render_image(block: &Block, ctx: &RenderContext<'_>, out: &mut String) {
    let Block::Image(source) = block else {
        return;
    };
    let src = match ctx.images.image(source) {
        Ok(url) => url.width(1200).auto_format().to_string(),
        Err(e) => {
            tracing::warn!("Skipping body image: {}", e);
            return;
        }
    };
    let alt = source.alt.as_deref().unwrap_or("");
    out.push_str(&format!(
        r#"<img class="my-5 w-full" src="{}" alt="{}" loading="lazy">"#,
        html_escape(&src),
        html_escape(alt)
    ));
}

fn render_unknown(block: &Block, _ctx: &RenderContext<'_>, _out: &mut String) {
    if let Block::Unknown { kind } = block {
        tracing::debug!("No renderer for block type `{}`, skipping", kind);
    }
}

fn render_spans(spans: &[Span], out: &mut String) {
    for span in spans {
        render_span(span, out);
    }
}

fn render_span(span: &Span, out: &mut String) {
    let mut closers: Vec<&str> = Vec::new();
    for mark in &span.marks {
        match mark {
            Mark::Strong => {
                out.push_str("<strong>");
                closers.push("</strong>");
            }
            Mark::Em => {
                out.push_str("<em>");
                closers.push("</em>");
            }
            Mark::Code => {
                out.push_str("<code>");
                closers.push("</code>");
            }
            Mark::Underline => {
                out.push_str("<u>");
                closers.push("</u>");
            }
            Mark::StrikeThrough => {
                out.push_str("<s>");
                closers.push("</s>");
            }
            Mark::Link { href, blank } => {
                let target = if *blank {
                    r#" target="_blank" rel="noopener""#
                } else {
                    ""
                };
                out.push_str(&format!(
                    r#"<a href="{}" class="text-blue-500 hover:underline"{}>"#,
                    html_escape(&safe_href(href)),
                    target
                ));
                closers.push("</a>");
            }
            Mark::Unknown(_) => {}
        }
    }

    let mut lines = span.text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(&html_escape(first));
    }
    for line in lines {
        out.push_str("<br/>");
        out.push_str(&html_escape(line));
    }

    for closer in closers.iter().rev() {
        out.push_str(closer);
    }
}
