//! Immutable configuration bundles for parsing and rendering.
//!
//! Both option types are frozen once constructed: they expose no setters, so
//! sharing them by reference across concurrent compilations needs no locking.

use crate::include::{IncludeLoader, NoopIncludeLoader};

/// Parser configuration. The only knob is the include loader.
#[derive(Debug)]
pub struct ParserOptions {
    pub include_loader: Box<dyn IncludeLoader>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            include_loader: Box::new(NoopIncludeLoader),
        }
    }
}

impl ParserOptions {
    pub fn new(include_loader: Box<dyn IncludeLoader>) -> Self {
        Self { include_loader }
    }
}

/// Render configuration, frozen at construction.
///
/// Fields are private and there are no setters: mutating a built value is a
/// compile error, which is how the "mutation must fail" contract is enforced.
/// Use [`RenderOptions::builder`] to construct a non-default value.
#[derive(Debug, Default, Clone)]
pub struct RenderOptions {
    disable_comments: bool,
    social_icon_origin: Option<String>,
}

impl RenderOptions {
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder::default()
    }

    /// When set, comments from the source markup are not copied into the
    /// output. Outlook conditional markup is structural and stays either way.
    pub fn disable_comments(&self) -> bool {
        self.disable_comments
    }

    /// Base origin substituted for the default social icon host.
    pub fn social_icon_origin(&self) -> Option<&str> {
        self.social_icon_origin.as_deref()
    }
}

/// Builder yielding a frozen [`RenderOptions`].
#[derive(Debug, Default)]
pub struct RenderOptionsBuilder {
    disable_comments: bool,
    social_icon_origin: Option<String>,
}

impl RenderOptionsBuilder {
    pub fn disable_comments(mut self, value: bool) -> Self {
        self.disable_comments = value;
        self
    }

    pub fn social_icon_origin<S: ToString>(mut self, origin: S) -> Self {
        self.social_icon_origin = Some(origin.to_string());
        self
    }

    pub fn build(self) -> RenderOptions {
        RenderOptions {
            disable_comments: self.disable_comments,
            social_icon_origin: self.social_icon_origin,
        }
    }
}
