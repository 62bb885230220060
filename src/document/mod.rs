//! Document tree produced by the parser.
//!
//! A [`Document`] wraps a single root [`Node`]. Each node carries its element
//! kind, attributes, children and the byte span it was parsed from. Spans of
//! siblings are non-overlapping and increase in document order, which keeps
//! diagnostics sorted by position for free.

use std::fmt;

/// Byte range into the source markup, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One `name="value"` pair with the span of its own source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub span: Span,
}

/// The closed set of elements the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Mjml,
    Head,
    Title,
    Preview,
    Body,
    Section,
    Column,
    Text,
    Image,
    Button,
    Divider,
    Spacer,
    Social,
    SocialElement,
    Include,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "mjml" => Self::Mjml,
            "mj-head" => Self::Head,
            "mj-title" => Self::Title,
            "mj-preview" => Self::Preview,
            "mj-body" => Self::Body,
            "mj-section" => Self::Section,
            "mj-column" => Self::Column,
            "mj-text" => Self::Text,
            "mj-image" => Self::Image,
            "mj-button" => Self::Button,
            "mj-divider" => Self::Divider,
            "mj-spacer" => Self::Spacer,
            "mj-social" => Self::Social,
            "mj-social-element" => Self::SocialElement,
            "mj-include" => Self::Include,
            _ => return None,
        })
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Mjml => "mjml",
            Self::Head => "mj-head",
            Self::Title => "mj-title",
            Self::Preview => "mj-preview",
            Self::Body => "mj-body",
            Self::Section => "mj-section",
            Self::Column => "mj-column",
            Self::Text => "mj-text",
            Self::Image => "mj-image",
            Self::Button => "mj-button",
            Self::Divider => "mj-divider",
            Self::Spacer => "mj-spacer",
            Self::Social => "mj-social",
            Self::SocialElement => "mj-social-element",
            Self::Include => "mj-include",
        }
    }

    /// Elements whose inner markup is captured verbatim instead of being
    /// parsed into child elements (raw HTML passthrough).
    pub(crate) fn is_ending(&self) -> bool {
        matches!(self, Self::Title | Self::Preview | Self::Text | Self::Button)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Child slot of a node. The parent exclusively owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(Node),
    Text(String),
    Comment(String),
}

/// One structural unit of the parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: ElementKind,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Child>,
    pub span: Span,
}

impl Node {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            span: Span::default(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Iterate child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|child| match child {
            Child::Element(node) => Some(node),
            _ => None,
        })
    }

    /// Concatenated raw text content of this node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Child::Text(text) = child {
                out.push_str(text);
            }
        }
        out
    }
}

/// Root wrapper for a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Node,
}

impl Document {
    pub(crate) fn head(&self) -> Option<&Node> {
        self.root
            .child_elements()
            .find(|node| node.kind == ElementKind::Head)
    }

    pub(crate) fn body(&self) -> Option<&Node> {
        self.root
            .child_elements()
            .find(|node| node.kind == ElementKind::Body)
    }

    /// Content of the first `<mj-title>` in the head, if any.
    pub fn title(&self) -> Option<String> {
        self.head_text(ElementKind::Title)
    }

    /// Content of the first `<mj-preview>` in the head, if any.
    pub fn preview(&self) -> Option<String> {
        self.head_text(ElementKind::Preview)
    }

    fn head_text(&self, kind: ElementKind) -> Option<String> {
        self.head()
            .and_then(|head| head.child_elements().find(|node| node.kind == kind))
            .map(Node::text_content)
    }
}
