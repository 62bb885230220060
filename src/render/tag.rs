//! Small builder for HTML tags with inline styles.

use std::fmt::Write;

/// Accumulates attributes and inline style declarations for one tag, then
/// writes the markup into an output buffer. Attribute and style order is the
/// insertion order, so output stays byte-deterministic.
pub(crate) struct Tag {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
    styles: String,
}

impl Tag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            styles: String::new(),
        }
    }

    pub fn attr<V: Into<String>>(mut self, name: &'static str, value: V) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn maybe_attr<V: Into<String>>(self, name: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn style(mut self, name: &str, value: &str) -> Self {
        write!(self.styles, "{name}:{value};").unwrap();
        self
    }

    pub fn maybe_style(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.style(name, value),
            None => self,
        }
    }

    fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.name);
        for (name, value) in &self.attributes {
            write!(out, " {name}=\"{}\"", escape_html(value)).unwrap();
        }
        if !self.styles.is_empty() {
            write!(out, " style=\"{}\"", escape_html(&self.styles)).unwrap();
        }
    }

    /// Write `<name …>`.
    pub fn open(&self, out: &mut String) {
        self.write_open(out);
        out.push('>');
    }

    /// Write `<name … />` for childless elements.
    pub fn closed(&self, out: &mut String) {
        self.write_open(out);
        out.push_str(" />");
    }

    /// Write `</name>`.
    pub fn close(&self, out: &mut String) {
        out.push_str("</");
        out.push_str(self.name);
        out.push('>');
    }
}

/// Escape special HTML characters.
pub(crate) fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}
