//! Rich-text content blocks
//!
//! Post bodies arrive as an array of JSON objects tagged by `_type`. Text
//! blocks (`_type: "block"`) carry a `style`, an optional `listItem`, inline
//! `children` spans and the `markDefs` their link annotations point at.
//! Deserialization never fails on an individual block: anything that cannot
//! be understood becomes [`Block::Unknown`] so one bad block cannot take down
//! a whole article.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::image::ImageSource;

/// One block of a post body
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Span>),
    Heading {
        level: HeadingLevel,
        children: Vec<Span>,
    },
    Blockquote(Vec<Span>),
    ListItem {
        list: ListKind,
        level: u8,
        children: Vec<Span>,
    },
    /// A standalone hyperlink block
    Link {
        href: String,
        children: Vec<Span>,
    },
    Image(ImageSource),
    Unknown {
        kind: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    fn from_style(style: &str) -> Option<Self> {
        match style {
            "h1" => Some(HeadingLevel::H1),
            "h2" => Some(HeadingLevel::H2),
            "h3" => Some(HeadingLevel::H3),
            "h4" => Some(HeadingLevel::H4),
            "h5" => Some(HeadingLevel::H5),
            "h6" => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

/// The dispatch key of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Blockquote,
    ListItem,
    Link,
    Image,
    Unknown,
}

impl BlockKind {
    pub const ALL: [BlockKind; 12] = [
        BlockKind::Paragraph,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::Heading4,
        BlockKind::Heading5,
        BlockKind::Heading6,
        BlockKind::Blockquote,
        BlockKind::ListItem,
        BlockKind::Link,
        BlockKind::Image,
        BlockKind::Unknown,
    ];
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::Heading { level, .. } => match level {
                HeadingLevel::H1 => BlockKind::Heading1,
                HeadingLevel::H2 => BlockKind::Heading2,
                HeadingLevel::H3 => BlockKind::Heading3,
                HeadingLevel::H4 => BlockKind::Heading4,
                HeadingLevel::H5 => BlockKind::Heading5,
                HeadingLevel::H6 => BlockKind::Heading6,
            },
            Block::Blockquote(_) => BlockKind::Blockquote,
            Block::ListItem { .. } => BlockKind::ListItem,
            Block::Link { .. } => BlockKind::Link,
            Block::Image(_) => BlockKind::Image,
            Block::Unknown { .. } => BlockKind::Unknown,
        }
    }

    /// Inline children of text-bearing blocks
    pub fn children(&self) -> &[Span] {
        match self {
            Block::Paragraph(children)
            | Block::Blockquote(children)
            | Block::Heading { children, .. }
            | Block::ListItem { children, .. }
            | Block::Link { children, .. } => children,
            Block::Image(_) | Block::Unknown { .. } => &[],
        }
    }

    /// Concatenated text of the block
    pub fn plain_text(&self) -> String {
        self.children().iter().map(|s| s.text.as_str()).collect()
    }

    /// Interpret one JSON block, falling back to `Unknown`
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            "block" => match serde_json::from_value::<RawTextBlock>(value) {
                Ok(raw) => raw.into_block(),
                Err(e) => {
                    tracing::debug!("Unreadable text block: {}", e);
                    Block::Unknown { kind }
                }
            },
            "link" => match serde_json::from_value::<RawLinkBlock>(value) {
                Ok(raw) => raw.into_block(),
                Err(e) => {
                    tracing::debug!("Unreadable link block: {}", e);
                    Block::Unknown { kind }
                }
            },
            "image" => match serde_json::from_value::<ImageSource>(value) {
                Ok(image) => Block::Image(image),
                Err(e) => {
                    tracing::debug!("Unreadable image block: {}", e);
                    Block::Unknown { kind }
                }
            },
            _ => Block::Unknown { kind },
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Block::from_value(value))
    }
}

/// A run of text with uniform marks
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub marks: Vec<Mark>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    /// The link annotation on this span, if any
    pub fn link(&self) -> Option<&str> {
        self.marks.iter().find_map(|m| match m {
            Mark::Link { href, .. } => Some(href.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Strong,
    Em,
    Code,
    Underline,
    StrikeThrough,
    Link { href: String, blank: bool },
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct RawTextBlock {
    #[serde(default)]
    style: Option<String>,
    #[serde(rename = "listItem", default)]
    list_item: Option<String>,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    children: Vec<RawSpan>,
    #[serde(rename = "markDefs", default)]
    mark_defs: Vec<RawMarkDef>,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    marks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMarkDef {
    #[serde(rename = "_key")]
    key: String,
    #[serde(rename = "_type")]
    kind: String,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    blank: bool,
}

#[derive(Debug, Deserialize)]
struct RawLinkBlock {
    href: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    children: Vec<RawSpan>,
}

impl RawTextBlock {
    fn into_block(self) -> Block {
        let children = resolve_spans(self.children, &self.mark_defs);

        if let Some(list) = self.list_item {
            let list = match list.as_str() {
                "number" => ListKind::Number,
                _ => ListKind::Bullet,
            };
            return Block::ListItem {
                list,
                level: self.level.unwrap_or(1).max(1),
                children,
            };
        }

        let style = self.style.as_deref().unwrap_or("normal");
        if let Some(level) = HeadingLevel::from_style(style) {
            return Block::Heading { level, children };
        }
        match style {
            "blockquote" => Block::Blockquote(children),
            "normal" => Block::Paragraph(children),
            other => {
                // Unknown styles keep their text
                tracing::debug!("Unknown block style `{}`, rendering as paragraph", other);
                Block::Paragraph(children)
            }
        }
    }
}

impl RawLinkBlock {
    fn into_block(self) -> Block {
        let mut children = resolve_spans(self.children, &[]);
        if children.is_empty() {
            children.push(Span::plain(self.text.unwrap_or_else(|| self.href.clone())));
        }
        Block::Link {
            href: self.href,
            children,
        }
    }
}

fn resolve_spans(spans: Vec<RawSpan>, defs: &[RawMarkDef]) -> Vec<Span> {
    spans
        .into_iter()
        .map(|raw| Span {
            text: raw.text.unwrap_or_default(),
            marks: raw.marks.iter().map(|m| resolve_mark(m, defs)).collect(),
        })
        .collect()
}

fn resolve_mark(mark: &str, defs: &[RawMarkDef]) -> Mark {
    match mark {
        "strong" => Mark::Strong,
        "em" => Mark::Em,
        "code" => Mark::Code,
        "underline" => Mark::Underline,
        "strike-through" => Mark::StrikeThrough,
        key => match defs.iter().find(|d| d.key == key) {
            Some(def) if def.kind == "link" => Mark::Link {
                href: def.href.clone().unwrap_or_default(),
                blank: def.blank,
            },
            Some(def) => Mark::Unknown(def.kind.clone()),
            None => Mark::Unknown(key.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Block> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_paragraph_and_headings() {
        let blocks = parse(
            r#"[
                {"_type":"block","style":"normal","children":[{"_type":"span","text":"Hello","marks":[]}],"markDefs":[]},
                {"_type":"block","style":"h1","children":[{"_type":"span","text":"Title"}]},
                {"_type":"block","style":"h2","children":[{"_type":"span","text":"Sub"}]}
            ]"#,
        );
        assert_eq!(blocks[0], Block::Paragraph(vec![Span::plain("Hello")]));
        assert_eq!(blocks[1].kind(), BlockKind::Heading1);
        assert_eq!(blocks[2].kind(), BlockKind::Heading2);
        assert_eq!(blocks[2].plain_text(), "Sub");
    }

    #[test]
    fn test_list_items() {
        let blocks = parse(
            r#"[
                {"_type":"block","style":"normal","listItem":"bullet","level":1,"children":[{"text":"one"}]},
                {"_type":"block","listItem":"number","children":[{"text":"two"}]}
            ]"#,
        );
        assert_eq!(
            blocks[0],
            Block::ListItem {
                list: ListKind::Bullet,
                level: 1,
                children: vec![Span::plain("one")]
            }
        );
        assert!(matches!(
            blocks[1],
            Block::ListItem {
                list: ListKind::Number,
                level: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_link_annotations_resolve_through_mark_defs() {
        let blocks = parse(
            r#"[{
                "_type":"block","style":"normal",
                "children":[
                    {"_type":"span","text":"see ","marks":["strong"]},
                    {"_type":"span","text":"docs","marks":["k1"]}
                ],
                "markDefs":[{"_key":"k1","_type":"link","href":"https://example.com"}]
            }]"#,
        );
        let children = blocks[0].children();
        assert_eq!(children[0].marks, vec![Mark::Strong]);
        assert_eq!(children[1].link(), Some("https://example.com"));
    }

    #[test]
    fn test_top_level_link_block() {
        let blocks = parse(r#"[{"_type":"link","href":"https://example.com","text":"Example"}]"#);
        assert_eq!(
            blocks[0],
            Block::Link {
                href: "https://example.com".to_string(),
                children: vec![Span::plain("Example")]
            }
        );
    }

    #[test]
    fn test_unknown_and_broken_blocks_degrade() {
        let blocks = parse(
            r#"[
                {"_type":"youtube","url":"https://youtu.be/x"},
                {"_type":"block","children":"not a list"},
                {"_type":"link"},
                {"no_type":true},
                {"_type":"block","style":"weird","children":[{"text":"kept"}]}
            ]"#,
        );
        assert_eq!(blocks.len(), 5);
        assert_eq!(
            blocks[0],
            Block::Unknown {
                kind: "youtube".to_string()
            }
        );
        assert_eq!(blocks[1].kind(), BlockKind::Unknown);
        assert_eq!(blocks[2].kind(), BlockKind::Unknown);
        assert_eq!(blocks[3].kind(), BlockKind::Unknown);
        assert_eq!(blocks[4], Block::Paragraph(vec![Span::plain("kept")]));
    }

    #[test]
    fn test_image_block() {
        let blocks = parse(r#"[{"_type":"image","asset":{"_ref":"image-abc-10x20-png"},"alt":"pic"}]"#);
        match &blocks[0] {
            Block::Image(image) => assert_eq!(image.alt.as_deref(), Some("pic")),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_every_kind_listed_once() {
        let kinds: std::collections::HashSet<_> = BlockKind::ALL.iter().collect();
        assert_eq!(kinds.len(), BlockKind::ALL.len());
    }
}
