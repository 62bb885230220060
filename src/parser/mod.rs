//! Markup parser producing a [`Document`] tree with byte spans.
//!
//! Built on a quick-xml event loop with a stack of open elements. The parser
//! is tolerant about attributes (unknown names are kept and surface later as
//! validation warnings) but strict about structure: unclosed or mismatched
//! tags and unknown elements are fatal.
//!
//! `<mj-include>` elements are resolved inline: the configured loader fetches
//! the fragment, the fragment is parsed recursively, and its children are
//! spliced in place of the include node. Nesting is bounded by
//! [`MAX_INCLUDE_DEPTH`] so cyclic includes fail instead of looping.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::document::{Attribute, Child, Document, ElementKind, Node, Span};
use crate::error::{Error, IncludeError, ParseError};
use crate::options::ParserOptions;

/// Maximum nesting depth for transitive includes. A template including
/// itself (directly or through intermediates) hits this bound and fails
/// with [`IncludeError::RecursionLimit`].
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// Parse a full template. The root element must be `<mjml>`.
pub fn parse(markup: &str, options: &ParserOptions) -> Result<Document, Error> {
    let children = parse_fragment(markup, options, 0)?;

    let mut root: Option<Node> = None;
    for child in children {
        if let Child::Element(node) = child {
            if root.is_some() {
                return Err(ParseError::UnexpectedElement {
                    name: node.kind.as_tag().to_string(),
                    span: node.span,
                }
                .into());
            }
            root = Some(node);
        }
        // Comments and whitespace around the root are tolerated and dropped.
    }

    let root = root.ok_or(ParseError::NoRootElement)?;
    if root.kind != ElementKind::Mjml {
        return Err(ParseError::UnexpectedElement {
            name: root.kind.as_tag().to_string(),
            span: root.span,
        }
        .into());
    }
    Ok(Document { root })
}

struct PendingNode {
    kind: ElementKind,
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Child>,
    open_span: Span,
}

/// Parse markup into a list of children. Used for the document root and for
/// include fragments, which may carry several top-level elements.
fn parse_fragment(
    markup: &str,
    options: &ParserOptions,
    depth: usize,
) -> Result<Vec<Child>, Error> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<PendingNode> = Vec::new();
    let mut top_level: Vec<Child> = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(ParseError::Xml)?;
        let end = reader.buffer_position() as usize;
        let span = Span::new(start, end);

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let kind = element_kind(&name, span)?;
                let attributes = scan_attributes(&markup[start..end], start);

                if kind.is_ending() {
                    // Raw passthrough content: capture everything up to the
                    // matching close tag verbatim.
                    let inner = reader.read_text(e.name()).map_err(ParseError::Xml)?;
                    let node_end = reader.buffer_position() as usize;
                    let mut node = Node {
                        kind,
                        attributes,
                        children: Vec::new(),
                        span: Span::new(start, node_end),
                    };
                    if !inner.is_empty() {
                        node.children.push(Child::Text(inner.into_owned()));
                    }
                    append(&mut stack, &mut top_level, Child::Element(node));
                } else if kind == ElementKind::Include {
                    // Consume up to the close tag; include elements carry no
                    // meaningful children of their own.
                    reader.read_text(e.name()).map_err(ParseError::Xml)?;
                    let children = resolve_include(&attributes, span, options, depth)?;
                    for child in children {
                        append(&mut stack, &mut top_level, child);
                    }
                } else {
                    stack.push(PendingNode {
                        kind,
                        name,
                        attributes,
                        children: Vec::new(),
                        open_span: span,
                    });
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let kind = element_kind(&name, span)?;
                let attributes = scan_attributes(&markup[start..end], start);

                if kind == ElementKind::Include {
                    let children = resolve_include(&attributes, span, options, depth)?;
                    for child in children {
                        append(&mut stack, &mut top_level, child);
                    }
                } else {
                    let node = Node {
                        kind,
                        attributes,
                        children: Vec::new(),
                        span,
                    };
                    append(&mut stack, &mut top_level, Child::Element(node));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let Some(pending) = stack.pop() else {
                    return Err(ParseError::UnexpectedCloseTag { name, span }.into());
                };
                if pending.name != name {
                    return Err(ParseError::MismatchedCloseTag {
                        expected: pending.name,
                        found: name,
                        span,
                    }
                    .into());
                }
                let node = Node {
                    kind: pending.kind,
                    attributes: pending.attributes,
                    children: pending.children,
                    span: Span::new(pending.open_span.start, end),
                };
                append(&mut stack, &mut top_level, Child::Element(node));
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if !text.trim().is_empty() {
                    push_text(&mut stack, &mut top_level, &text);
                }
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    push_text(&mut stack, &mut top_level, &resolved);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut stack, &mut top_level, Child::Text(text));
            }
            Event::Comment(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut stack, &mut top_level, Child::Comment(text));
            }
            // XML declarations, doctypes and processing instructions carry no
            // document content.
            Event::Decl(_) | Event::DocType(_) | Event::PI(_) => {}
            Event::Eof => {
                if let Some(pending) = stack.pop() {
                    return Err(ParseError::UnclosedTag {
                        name: pending.name,
                        span: pending.open_span,
                    }
                    .into());
                }
                break;
            }
        }
    }

    Ok(top_level)
}

fn element_kind(name: &str, span: Span) -> Result<ElementKind, ParseError> {
    ElementKind::from_tag(name).ok_or_else(|| ParseError::UnexpectedElement {
        name: name.to_string(),
        span,
    })
}

fn append(stack: &mut Vec<PendingNode>, top_level: &mut Vec<Child>, child: Child) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(child),
        None => top_level.push(child),
    }
}

/// Append text content, merging with a preceding text child so entity
/// references split across events end up in one node.
fn push_text(stack: &mut Vec<PendingNode>, top_level: &mut Vec<Child>, text: &str) {
    let target = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top_level,
    };
    if let Some(Child::Text(existing)) = target.last_mut() {
        existing.push_str(text);
    } else {
        target.push(Child::Text(text.to_string()));
    }
}

fn resolve_include(
    attributes: &[Attribute],
    span: Span,
    options: &ParserOptions,
    depth: usize,
) -> Result<Vec<Child>, Error> {
    let path = attributes
        .iter()
        .find(|attr| attr.name == "path")
        .map(|attr| attr.value.clone())
        .ok_or(ParseError::MissingAttribute { name: "path", span })?;

    if depth >= MAX_INCLUDE_DEPTH {
        return Err(Error::Include {
            path,
            source: IncludeError::RecursionLimit,
        });
    }

    let content = options
        .include_loader
        .resolve(&path)
        .map_err(|source| Error::Include {
            path: path.clone(),
            source,
        })?;

    parse_fragment(&content, options, depth + 1)
}

/// Scan the raw text of a start tag (`<name a="b" …>`) for attributes,
/// recording for each one the exact span of its source text. quick-xml does
/// not expose attribute offsets, so this walks the tag slice directly.
fn scan_attributes(raw: &str, offset: usize) -> Vec<Attribute> {
    let bytes = raw.as_bytes();
    let mut out = Vec::new();
    let mut i = 1; // skip '<'

    // Skip the element name.
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/'
    {
        i += 1;
    }

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b'>' || bytes[i] == b'/' {
            break;
        }

        let name_start = i;
        while i < bytes.len()
            && bytes[i] != b'='
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'>'
            && bytes[i] != b'/'
        {
            i += 1;
        }
        let name_end = i;
        if name_end == name_start {
            // Stray character, skip it to guarantee progress.
            i += 1;
            continue;
        }

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'=' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && (bytes[j] == b'"' || bytes[j] == b'\'') {
                let quote = bytes[j];
                j += 1;
                let value_start = j;
                while j < bytes.len() && bytes[j] != quote {
                    j += 1;
                }
                let value_end = j;
                if j < bytes.len() {
                    j += 1; // past the closing quote
                }
                out.push(Attribute {
                    name: raw[name_start..name_end].to_string(),
                    value: unescape_value(&raw[value_start..value_end]),
                    span: Span::new(offset + name_start, offset + j),
                });
                i = j;
                continue;
            }
        }

        // Bare attribute without a value.
        out.push(Attribute {
            name: raw[name_start..name_end].to_string(),
            value: String::new(),
            span: Span::new(offset + name_start, offset + name_end),
        });
        // j stopped on whatever follows the name; resume past any '=' so a
        // malformed unquoted value cannot stall the scan.
        i = if j < bytes.len() && bytes[j] == b'=' { j + 1 } else { name_end };
    }

    out
}

fn unescape_value(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Resolve the common XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include::MemoryIncludeLoader;

    fn parse_default(markup: &str) -> Result<Document, Error> {
        parse(markup, &ParserOptions::default())
    }

    #[test]
    fn parses_empty_document() {
        let doc = parse_default("<mjml></mjml>").unwrap();
        assert_eq!(doc.root.kind, ElementKind::Mjml);
        assert!(doc.root.children.is_empty());
    }

    #[test]
    fn parses_self_closed_root() {
        let doc = parse_default("<mjml />").unwrap();
        assert_eq!(doc.root.kind, ElementKind::Mjml);
    }

    #[test]
    fn parses_basic_layout() {
        let doc = parse_default(
            "<mjml><mj-body><mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section></mj-body></mjml>",
        )
        .unwrap();
        let body = doc.body().unwrap();
        let section = body.child_elements().next().unwrap();
        assert_eq!(section.kind, ElementKind::Section);
        let column = section.child_elements().next().unwrap();
        let text = column.child_elements().next().unwrap();
        assert_eq!(text.text_content(), "Hello");
    }

    #[test]
    fn text_content_is_raw_html() {
        let doc = parse_default("<mjml><mj-body><mj-section><mj-column><mj-text><p>a <b>b</b></p></mj-text></mj-column></mj-section></mj-body></mjml>")
            .unwrap();
        let body = doc.body().unwrap();
        let text = body.child_elements().next().unwrap().child_elements().next().unwrap().child_elements().next().unwrap();
        assert_eq!(text.text_content(), "<p>a <b>b</b></p>");
    }

    #[test]
    fn spans_increase_in_document_order() {
        let doc = parse_default(
            "<mjml><mj-body><mj-section><mj-column/><mj-column/></mj-section></mj-body></mjml>",
        )
        .unwrap();
        let body = doc.body().unwrap();
        let section = body.child_elements().next().unwrap();
        let columns: Vec<_> = section.child_elements().collect();
        assert_eq!(columns.len(), 2);
        assert!(columns[0].span.end <= columns[1].span.start);
    }

    #[test]
    fn attribute_span_covers_source_text() {
        let markup = r#"<mjml><mj-body width="640px"></mj-body></mjml>"#;
        let doc = parse_default(markup).unwrap();
        let body = doc.body().unwrap();
        let attr = &body.attributes[0];
        assert_eq!(attr.name, "width");
        assert_eq!(attr.value, "640px");
        assert_eq!(&markup[attr.span.start..attr.span.end], r#"width="640px""#);
    }

    #[test]
    fn attribute_values_are_unescaped() {
        let doc = parse_default(r#"<mjml><mj-body background-color="&quot;x&quot;"/></mjml>"#)
            .unwrap();
        assert_eq!(doc.body().unwrap().attribute("background-color"), Some("\"x\""));
    }

    #[test]
    fn unclosed_tag_fails() {
        let err = parse_default("<mjml><mj-body>").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnclosedTag { ref name, .. }) if name == "mj-body"
        ));
    }

    #[test]
    fn mismatched_close_tag_fails() {
        let err = parse_default("<mjml><mj-body></mj-section></mjml>").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::MismatchedCloseTag { .. })
        ));
    }

    #[test]
    fn unknown_element_fails() {
        let err = parse_default("<mjml><mj-body><mj-carousel/></mj-body></mjml>").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedElement { ref name, .. }) if name == "mj-carousel"
        ));
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(
            parse_default("").unwrap_err(),
            Error::Parse(ParseError::NoRootElement)
        ));
    }

    #[test]
    fn comments_are_preserved() {
        let doc = parse_default("<mjml><mj-body><!-- marker --></mj-body></mjml>").unwrap();
        let body = doc.body().unwrap();
        assert_eq!(
            body.children,
            vec![Child::Comment(" marker ".to_string())]
        );
    }

    #[test]
    fn include_splices_fragment() {
        let loader =
            MemoryIncludeLoader::from(vec![("partial.mjml", "<mj-text>From include</mj-text>")]);
        let options = ParserOptions::new(Box::new(loader));
        let doc = parse(
            r#"<mjml><mj-body><mj-section><mj-column><mj-include path="partial.mjml" /></mj-column></mj-section></mj-body></mjml>"#,
            &options,
        )
        .unwrap();
        let body = doc.body().unwrap();
        let column = body
            .child_elements()
            .next()
            .unwrap()
            .child_elements()
            .next()
            .unwrap();
        let text = column.child_elements().next().unwrap();
        assert_eq!(text.kind, ElementKind::Text);
        assert_eq!(text.text_content(), "From include");
    }

    #[test]
    fn include_supports_multiple_top_level_children() {
        let loader = MemoryIncludeLoader::from(vec![(
            "two.mjml",
            "<mj-text>a</mj-text><mj-text>b</mj-text>",
        )]);
        let options = ParserOptions::new(Box::new(loader));
        let doc = parse(
            r#"<mjml><mj-body><mj-section><mj-column><mj-include path="two.mjml" /></mj-column></mj-section></mj-body></mjml>"#,
            &options,
        )
        .unwrap();
        let column = doc
            .body()
            .unwrap()
            .child_elements()
            .next()
            .unwrap()
            .child_elements()
            .next()
            .unwrap();
        assert_eq!(column.child_elements().count(), 2);
    }

    #[test]
    fn transitive_includes_resolve() {
        let loader = MemoryIncludeLoader::from(vec![
            ("outer.mjml", r#"<mj-include path="inner.mjml" />"#),
            ("inner.mjml", "<mj-text>deep</mj-text>"),
        ]);
        let options = ParserOptions::new(Box::new(loader));
        let doc = parse(
            r#"<mjml><mj-body><mj-section><mj-column><mj-include path="outer.mjml" /></mj-column></mj-section></mj-body></mjml>"#,
            &options,
        )
        .unwrap();
        let column = doc
            .body()
            .unwrap()
            .child_elements()
            .next()
            .unwrap()
            .child_elements()
            .next()
            .unwrap();
        assert_eq!(column.child_elements().next().unwrap().text_content(), "deep");
    }

    #[test]
    fn self_include_hits_depth_limit() {
        let loader =
            MemoryIncludeLoader::from(vec![("loop.mjml", r#"<mj-include path="loop.mjml" />"#)]);
        let options = ParserOptions::new(Box::new(loader));
        let err = parse(
            r#"<mjml><mj-body><mj-include path="loop.mjml" /></mj-body></mjml>"#,
            &options,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Include {
                source: IncludeError::RecursionLimit,
                ..
            }
        ));
    }

    #[test]
    fn missing_include_is_reported_with_path() {
        let options = ParserOptions::default();
        let err = parse(
            r#"<mjml><mj-body><mj-include path="nowhere.mjml" /></mj-body></mjml>"#,
            &options,
        )
        .unwrap_err();
        match err {
            Error::Include { path, source } => {
                assert_eq!(path, "nowhere.mjml");
                assert!(matches!(source, IncludeError::NotFound));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn include_without_path_fails() {
        let err = parse(
            "<mjml><mj-body><mj-include /></mj-body></mjml>",
            &ParserOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::MissingAttribute { name: "path", .. })
        ));
    }

    #[test]
    fn scan_attributes_spans() {
        let raw = r#"<mj-image src="a.png" alt='x y'>"#;
        let attrs = scan_attributes(raw, 100);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, "src");
        assert_eq!(attrs[0].value, "a.png");
        assert_eq!(&raw[attrs[0].span.start - 100..attrs[0].span.end - 100], r#"src="a.png""#);
        assert_eq!(attrs[1].name, "alt");
        assert_eq!(attrs[1].value, "x y");
        assert_eq!(&raw[attrs[1].span.start - 100..attrs[1].span.end - 100], "alt='x y'");
    }

    #[test]
    fn resolve_entity_cases() {
        assert_eq!(resolve_entity("amp"), Some("&".to_string()));
        assert_eq!(resolve_entity("#65"), Some("A".to_string()));
        assert_eq!(resolve_entity("#x41"), Some("A".to_string()));
        assert_eq!(resolve_entity("nbsp"), None);
    }
}
