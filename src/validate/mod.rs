//! Semantic validation of a parsed document.
//!
//! One pre-order walk checks attribute names against the recognized set for
//! each element kind and enforces the nesting rules. Unknown attributes only
//! produce warnings, in document order; structural problems (wrong parent,
//! missing required attribute, duplicated singleton) abort compilation.

use std::fmt;

use crate::document::{Document, ElementKind, Node, Span};
use crate::error::{Error, ValidationError};

/// Category of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub enum WarningKind {
    #[cfg_attr(feature = "cli", serde(rename = "unexpected-attribute"))]
    UnexpectedAttribute,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnexpectedAttribute => "unexpected-attribute",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal diagnostic attached to a successful compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Warning {
    pub kind: WarningKind,
    #[cfg_attr(feature = "cli", serde(flatten))]
    pub span: Span,
}

/// Attributes recognized on every element.
const GLOBAL_ATTRIBUTES: &[&str] = &["css-class", "mj-class"];

/// Recognized attribute names per element kind. Checked by name only; value
/// syntax is left to the renderer's tolerant defaults.
fn recognized_attributes(kind: ElementKind) -> &'static [&'static str] {
    match kind {
        ElementKind::Mjml => &["lang", "dir"],
        ElementKind::Head | ElementKind::Title | ElementKind::Preview => &[],
        ElementKind::Body => &["background-color", "width"],
        ElementKind::Section => &[
            "background-color",
            "background-url",
            "background-repeat",
            "background-size",
            "border",
            "border-radius",
            "direction",
            "full-width",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
            "text-align",
        ],
        ElementKind::Column => &[
            "background-color",
            "border",
            "border-radius",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
            "vertical-align",
            "width",
        ],
        ElementKind::Text => &[
            "align",
            "color",
            "container-background-color",
            "font-family",
            "font-size",
            "font-style",
            "font-weight",
            "height",
            "letter-spacing",
            "line-height",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
        ],
        ElementKind::Image => &[
            "align",
            "alt",
            "border",
            "border-radius",
            "container-background-color",
            "height",
            "href",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
            "rel",
            "src",
            "srcset",
            "target",
            "title",
            "width",
        ],
        ElementKind::Button => &[
            "align",
            "background-color",
            "border",
            "border-radius",
            "color",
            "container-background-color",
            "font-family",
            "font-size",
            "font-weight",
            "height",
            "href",
            "inner-padding",
            "line-height",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
            "rel",
            "target",
            "text-align",
            "vertical-align",
            "width",
        ],
        ElementKind::Divider => &[
            "border-color",
            "border-style",
            "border-width",
            "container-background-color",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
            "width",
        ],
        ElementKind::Spacer => &[
            "container-background-color",
            "height",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
        ],
        ElementKind::Social => &[
            "align",
            "border-radius",
            "color",
            "container-background-color",
            "font-family",
            "font-size",
            "icon-size",
            "mode",
            "padding",
            "padding-top",
            "padding-bottom",
            "padding-left",
            "padding-right",
        ],
        ElementKind::SocialElement => &[
            "align",
            "alt",
            "background-color",
            "border-radius",
            "color",
            "font-family",
            "font-size",
            "href",
            "icon-size",
            "name",
            "padding",
            "rel",
            "src",
            "target",
        ],
        ElementKind::Include => &["path", "type"],
    }
}

/// Required attribute names per element kind.
fn required_attributes(kind: ElementKind) -> &'static [&'static str] {
    match kind {
        ElementKind::Image => &["src"],
        ElementKind::SocialElement => &["name"],
        _ => &[],
    }
}

/// Element kinds allowed as children of `parent`.
fn allowed_children(parent: ElementKind) -> &'static [ElementKind] {
    match parent {
        ElementKind::Mjml => &[ElementKind::Head, ElementKind::Body],
        ElementKind::Head => &[ElementKind::Title, ElementKind::Preview],
        ElementKind::Body => &[ElementKind::Section],
        ElementKind::Section => &[ElementKind::Column],
        ElementKind::Column => &[
            ElementKind::Text,
            ElementKind::Image,
            ElementKind::Button,
            ElementKind::Divider,
            ElementKind::Spacer,
            ElementKind::Social,
        ],
        ElementKind::Social => &[ElementKind::SocialElement],
        _ => &[],
    }
}

/// Element kinds of which at most one may appear under a given parent.
fn singleton_children(parent: ElementKind) -> &'static [ElementKind] {
    match parent {
        ElementKind::Mjml => &[ElementKind::Head, ElementKind::Body],
        _ => &[],
    }
}

/// Walk the document once, collecting warnings. Returns a fatal error for
/// structurally invalid documents.
pub fn validate(document: &Document) -> Result<Vec<Warning>, Error> {
    let mut warnings = Vec::new();
    check_node(&document.root, None, &mut warnings)?;
    Ok(warnings)
}

fn check_node(
    node: &Node,
    parent: Option<ElementKind>,
    warnings: &mut Vec<Warning>,
) -> Result<(), ValidationError> {
    if let Some(parent) = parent
        && !allowed_children(parent).contains(&node.kind)
    {
        return Err(ValidationError::IllegalNesting {
            element: node.kind.as_tag(),
            parent: parent.as_tag(),
            span: node.span,
        });
    }

    let recognized = recognized_attributes(node.kind);
    for attr in &node.attributes {
        let name = attr.name.as_str();
        if !recognized.contains(&name) && !GLOBAL_ATTRIBUTES.contains(&name) {
            warnings.push(Warning {
                kind: WarningKind::UnexpectedAttribute,
                span: attr.span,
            });
        }
    }

    for required in required_attributes(node.kind) {
        if node.attribute(required).is_none() {
            return Err(ValidationError::MissingAttribute {
                element: node.kind.as_tag(),
                attribute: required,
                span: node.span,
            });
        }
    }

    for singleton in singleton_children(node.kind) {
        let mut seen = false;
        for child in node.child_elements() {
            if child.kind == *singleton {
                if seen {
                    return Err(ValidationError::DuplicateElement {
                        element: singleton.as_tag(),
                        span: child.span,
                    });
                }
                seen = true;
            }
        }
    }

    for child in node.child_elements() {
        check_node(child, Some(node.kind), warnings)?;
    }
    Ok(())
}
