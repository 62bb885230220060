//! Error types for remail compilation.

use thiserror::Error;

use crate::document::Span;

/// Errors that can occur while compiling a template.
///
/// Every variant is terminal for the compilation call: no partial HTML is
/// ever returned alongside an error. Recoverable issues surface as
/// [`Warning`](crate::Warning)s on the successful output instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("unable to load include {path}: {source}")]
    Include {
        path: String,
        #[source]
        source: IncludeError,
    },

    #[error("invalid document: {0}")]
    Validation(#[from] ValidationError),
}

/// Structural errors raised while reading the markup.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unexpected element <{name}> at {span}")]
    UnexpectedElement { name: String, span: Span },

    #[error("unclosed tag <{name}> at {span}")]
    UnclosedTag { name: String, span: Span },

    #[error("mismatched close tag at {span}: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("close tag </{name}> at {span} without a matching open tag")]
    UnexpectedCloseTag { name: String, span: Span },

    #[error("missing attribute {name} on element at {span}")]
    MissingAttribute { name: &'static str, span: Span },

    #[error("no root element found")]
    NoRootElement,
}

/// Failures reported by an [`IncludeLoader`](crate::include::IncludeLoader).
///
/// The requested path is attached by the caller through
/// [`Error::Include`]; loaders only report what went wrong.
#[derive(Error, Debug)]
pub enum IncludeError {
    #[error("template not found")]
    NotFound,

    #[error("unable to read template: {0}")]
    Io(#[from] std::io::Error),

    #[error("denied by policy: {0}")]
    PolicyDenied(&'static str),

    #[error("network failure: {0}")]
    Network(String),

    #[error("include depth limit exceeded")]
    RecursionLimit,
}

/// Fatal semantic errors found while validating a parsed document.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing required attribute {attribute} on <{element}> at {span}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        span: Span,
    },

    #[error("<{element}> is not allowed inside <{parent}> at {span}")]
    IllegalNesting {
        element: &'static str,
        parent: &'static str,
        span: Span,
    },

    #[error("duplicate <{element}> at {span}")]
    DuplicateElement { element: &'static str, span: Span },
}

pub type Result<T> = std::result::Result<T, Error>;
