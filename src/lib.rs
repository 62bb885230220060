//! remail compiles MJML-style email markup into client-compatible HTML.
//!
//! The pipeline has three stages: a tolerant XML [`parse`](parser::parse)
//! that builds the element tree and resolves `<mj-include>` fragments through
//! a pluggable [`IncludeLoader`](include::IncludeLoader), a
//! [`validate`](validate::validate) pass that reports unknown attributes as
//! non-fatal [`Warning`](validate::Warning)s, and a deterministic renderer
//! that produces the final HTML along with the extracted title and preview
//! text.
//!
//! ```
//! let markup = "<mjml><mj-body><mj-section><mj-column>\
//!               <mj-text>Hello</mj-text>\
//!               </mj-column></mj-section></mj-body></mjml>";
//! let output = remail::compile(
//!     markup,
//!     &remail::ParserOptions::default(),
//!     &remail::RenderOptions::default(),
//! )
//! .unwrap();
//! assert!(output.content.contains("Hello"));
//! assert!(output.warnings.is_empty());
//! ```

pub mod document;
pub mod error;
pub mod include;
pub mod options;
pub mod parser;
pub mod render;
pub mod validate;

pub use document::{Document, Span};
pub use error::{Error, Result};
pub use options::{ParserOptions, RenderOptions};
pub use parser::parse;
pub use validate::{Warning, WarningKind};

/// Result of a full compilation pass.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The rendered HTML document.
    pub content: String,
    /// Non-fatal findings from validation, in document order.
    pub warnings: Vec<Warning>,
    /// Text of `<mj-title>`, if the head carries one.
    pub title: Option<String>,
    /// Text of `<mj-preview>`, if the head carries one.
    pub preview: Option<String>,
}

/// Parse, validate, and render `markup` in one call.
///
/// Errors from parsing, include resolution, or structural validation abort
/// the compilation; attribute-level findings come back as `warnings` on the
/// successful output instead.
pub fn compile(
    markup: &str,
    parser_options: &ParserOptions,
    render_options: &RenderOptions,
) -> Result<CompileOutput> {
    let document = parser::parse(markup, parser_options)?;
    let warnings = validate::validate(&document)?;
    let rendered = render::render_document(&document, render_options);
    Ok(CompileOutput {
        content: rendered.content,
        warnings,
        title: rendered.title,
        preview: rendered.preview,
    })
}
