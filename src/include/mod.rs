//! Pluggable resolvers for `<mj-include>` fragments.
//!
//! A loader turns an include path into fragment text. All loaders are
//! configured once at construction, hold no mutable state afterwards, and can
//! be invoked concurrently from any number of compilations.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::IncludeError;

/// Capability that resolves an include path into fragment markup.
///
/// Implementors must be safe to call from multiple threads at once; the
/// parser never locks around resolver calls.
pub trait IncludeLoader: Debug + Send + Sync {
    fn resolve(&self, path: &str) -> Result<String, IncludeError>;
}

/// Loader that refuses every path. Used as the default so templates without
/// includes need no configuration.
#[derive(Debug, Default)]
pub struct NoopIncludeLoader;

impl IncludeLoader for NoopIncludeLoader {
    fn resolve(&self, _path: &str) -> Result<String, IncludeError> {
        Err(IncludeError::NotFound)
    }
}

/// Loader backed by an in-memory map from path to fragment text.
#[derive(Debug, Default)]
pub struct MemoryIncludeLoader(pub HashMap<String, String>);

impl<K: ToString, V: ToString> From<Vec<(K, V)>> for MemoryIncludeLoader {
    fn from(value: Vec<(K, V)>) -> Self {
        let map = value
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        MemoryIncludeLoader(map)
    }
}

impl IncludeLoader for MemoryIncludeLoader {
    fn resolve(&self, path: &str) -> Result<String, IncludeError> {
        self.0.get(path).cloned().ok_or(IncludeError::NotFound)
    }
}

/// Loader that reads fragments from the filesystem below a fixed root.
///
/// Paths resolve against the root directory; a `file://` prefix is accepted
/// and stripped. A resolved path that escapes the root (through `..` segments
/// or symlinks) is rejected, so a template can never read outside the
/// configured directory.
#[derive(Debug, Default)]
pub struct LocalIncludeLoader {
    root: PathBuf,
}

impl LocalIncludeLoader {
    pub fn new(root: PathBuf) -> Self {
        // Canonicalize up front so the containment check below compares
        // resolved paths on both sides.
        let root = root.canonicalize().unwrap_or(root);
        Self { root }
    }

    fn build_path(&self, path: &str) -> Result<PathBuf, IncludeError> {
        let relative = path
            .strip_prefix("file://")
            .unwrap_or(path)
            .trim_start_matches('/');
        let full = self
            .root
            .join(relative)
            .canonicalize()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => IncludeError::NotFound,
                _ => IncludeError::Io(err),
            })?;
        if full.starts_with(&self.root) {
            Ok(full)
        } else {
            Err(IncludeError::PolicyDenied(
                "the path should stay below the loader root",
            ))
        }
    }
}

impl IncludeLoader for LocalIncludeLoader {
    fn resolve(&self, path: &str) -> Result<String, IncludeError> {
        let full = self.build_path(path)?;
        std::fs::read_to_string(full).map_err(IncludeError::Io)
    }
}

/// Origin filtering strategy for [`HttpIncludeLoader`].
///
/// An origin is the scheme+host portion of a URL, e.g. `https://example.com`.
#[derive(Debug)]
pub enum OriginPolicy {
    Allow(HashSet<String>),
    Deny(HashSet<String>),
}

impl Default for OriginPolicy {
    fn default() -> Self {
        // Allow nothing unless told otherwise.
        Self::Allow(HashSet::new())
    }
}

impl OriginPolicy {
    fn permits(&self, origin: &str) -> bool {
        match self {
            Self::Allow(list) => list.contains(origin),
            Self::Deny(list) => !list.contains(origin),
        }
    }
}

/// Transport used by [`HttpIncludeLoader`]. Split out so the policy can be
/// tested without touching the network.
pub trait HttpFetcher: Debug + Send + Sync {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<String, IncludeError>;
}

/// Blocking transport backed by reqwest.
#[cfg(feature = "http")]
#[derive(Debug, Default)]
pub struct ReqwestFetcher(reqwest::blocking::Client);

#[cfg(feature = "http")]
impl HttpFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str, headers: &[(String, String)]) -> Result<String, IncludeError> {
        let req = headers
            .iter()
            .fold(self.0.get(url), |req, (name, value)| {
                req.header(name.as_str(), value.as_str())
            });
        req.send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.text())
            .map_err(|err| IncludeError::Network(err.to_string()))
    }
}

/// Loader that fetches fragments over HTTP, gated by an origin policy.
///
/// The policy is checked before any network call: a denied origin fails with
/// [`IncludeError::PolicyDenied`] without touching the fetcher.
#[derive(Debug, Default)]
pub struct HttpIncludeLoader<F> {
    policy: OriginPolicy,
    headers: Vec<(String, String)>,
    fetcher: F,
}

impl<F: Default> HttpIncludeLoader<F> {
    /// Allow only the given origins.
    pub fn new_allow(origins: HashSet<String>) -> Self {
        Self {
            policy: OriginPolicy::Allow(origins),
            headers: Vec::new(),
            fetcher: F::default(),
        }
    }

    /// Deny the given origins and allow everything else.
    pub fn new_deny(origins: HashSet<String>) -> Self {
        Self {
            policy: OriginPolicy::Deny(origins),
            headers: Vec::new(),
            fetcher: F::default(),
        }
    }

    /// Allow every origin. Be careful: templates can then fetch from
    /// anywhere.
    pub fn allow_all() -> Self {
        Self {
            policy: OriginPolicy::Deny(HashSet::new()),
            headers: Vec::new(),
            fetcher: F::default(),
        }
    }

    /// Add a header sent with every fetch.
    pub fn with_header<K: ToString, V: ToString>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl<F> HttpIncludeLoader<F> {
    fn check_url(&self, path: &str) -> Result<(), IncludeError> {
        let url = url::Url::parse(path)
            .map_err(|_| IncludeError::PolicyDenied("unable to parse the url"))?;
        let origin = url.origin().ascii_serialization();
        if self.policy.permits(&origin) {
            Ok(())
        } else {
            Err(IncludeError::PolicyDenied(
                "the origin is not permitted by the configured policy",
            ))
        }
    }
}

impl<F: HttpFetcher> IncludeLoader for HttpIncludeLoader<F> {
    fn resolve(&self, path: &str) -> Result<String, IncludeError> {
        self.check_url(path)?;
        self.fetcher.fetch(path, &self.headers)
    }
}

#[derive(Debug)]
enum PathFilter {
    Any,
    StartsWith(String),
}

impl PathFilter {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Any => true,
            Self::StartsWith(prefix) => path.starts_with(prefix),
        }
    }
}

#[derive(Debug)]
struct MultiItem {
    filter: PathFilter,
    loader: Box<dyn IncludeLoader>,
}

/// Loader that routes by path prefix to a list of inner loaders.
///
/// This is how the usual classification is composed: `file://` paths to a
/// [`LocalIncludeLoader`], `http(s)://` to an [`HttpIncludeLoader`], bare
/// names to a [`MemoryIncludeLoader`]. The first matching entry resolves the
/// path; with no match the resolution fails with NotFound.
#[derive(Debug, Default)]
pub struct MultiIncludeLoader {
    items: Vec<MultiItem>,
}

impl MultiIncludeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_starts_with<S: ToString>(
        mut self,
        prefix: S,
        loader: Box<dyn IncludeLoader>,
    ) -> Self {
        self.items.push(MultiItem {
            filter: PathFilter::StartsWith(prefix.to_string()),
            loader,
        });
        self
    }

    pub fn with_any(mut self, loader: Box<dyn IncludeLoader>) -> Self {
        self.items.push(MultiItem {
            filter: PathFilter::Any,
            loader,
        });
        self
    }
}

impl IncludeLoader for MultiIncludeLoader {
    fn resolve(&self, path: &str) -> Result<String, IncludeError> {
        self.items
            .iter()
            .find(|item| item.filter.matches(path))
            .map(|item| item.loader.resolve(path))
            .unwrap_or(Err(IncludeError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct PanicFetcher;

    impl HttpFetcher for PanicFetcher {
        fn fetch(&self, _url: &str, _headers: &[(String, String)]) -> Result<String, IncludeError> {
            panic!("fetch should not be reached");
        }
    }

    #[test]
    fn memory_loader_hit_and_miss() {
        let loader = MemoryIncludeLoader::from(vec![("partial.mjml", "<mj-text>Hi</mj-text>")]);
        assert_eq!(
            loader.resolve("partial.mjml").unwrap(),
            "<mj-text>Hi</mj-text>"
        );
        assert!(matches!(
            loader.resolve("missing.mjml"),
            Err(IncludeError::NotFound)
        ));
    }

    #[test]
    fn noop_loader_always_fails() {
        assert!(matches!(
            NoopIncludeLoader.resolve("anything"),
            Err(IncludeError::NotFound)
        ));
    }

    #[test]
    fn origin_policy_permits() {
        assert!(!OriginPolicy::Allow(HashSet::new()).permits("http://localhost"));
        assert!(
            OriginPolicy::Allow(HashSet::from(["http://localhost".to_string()]))
                .permits("http://localhost")
        );
        assert!(
            OriginPolicy::Deny(HashSet::from(["http://somewhere".to_string()]))
                .permits("http://localhost")
        );
        assert!(
            !OriginPolicy::Deny(HashSet::from(["http://somewhere".to_string()]))
                .permits("http://somewhere")
        );
        assert!(OriginPolicy::Deny(HashSet::new()).permits("http://anywhere"));
    }

    #[test]
    fn http_loader_denies_without_fetching() {
        let loader = HttpIncludeLoader::<PanicFetcher>::new_allow(HashSet::new());
        let err = loader.resolve("http://localhost/partial.mjml").unwrap_err();
        assert!(matches!(err, IncludeError::PolicyDenied(_)));
    }

    #[test]
    fn http_loader_denies_listed_origin() {
        let loader = HttpIncludeLoader::<PanicFetcher>::new_deny(HashSet::from([
            "http://somewhere.com".to_string(),
        ]));
        assert!(matches!(
            loader.resolve("http://somewhere.com/partial.mjml"),
            Err(IncludeError::PolicyDenied(_))
        ));
        // A different scheme is a different origin.
        assert!(loader.check_url("https://somewhere.com/partial.mjml").is_ok());
        assert!(loader.check_url("http://localhost/partial.mjml").is_ok());
    }

    #[test]
    fn http_loader_rejects_unparseable_url() {
        let loader = HttpIncludeLoader::<PanicFetcher>::allow_all();
        assert!(matches!(
            loader.resolve("not a url"),
            Err(IncludeError::PolicyDenied(_))
        ));
    }

    #[test]
    fn multi_loader_routes_by_prefix() {
        let loader = MultiIncludeLoader::new()
            .with_starts_with(
                "file://",
                Box::new(MemoryIncludeLoader::from(vec![("file://a.mjml", "A")])),
            )
            .with_any(Box::new(MemoryIncludeLoader::from(vec![("b.mjml", "B")])));
        assert_eq!(loader.resolve("file://a.mjml").unwrap(), "A");
        assert_eq!(loader.resolve("b.mjml").unwrap(), "B");
        assert!(matches!(
            loader.resolve("file://missing.mjml"),
            Err(IncludeError::NotFound)
        ));
    }

    #[test]
    fn multi_loader_empty_is_not_found() {
        assert!(matches!(
            MultiIncludeLoader::new().resolve("anything"),
            Err(IncludeError::NotFound)
        ));
    }

    #[test]
    fn local_loader_reads_below_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.mjml"), "<mj-text>ok</mj-text>").unwrap();
        let loader = LocalIncludeLoader::new(dir.path().to_path_buf());
        assert_eq!(
            loader.resolve("file:///part.mjml").unwrap(),
            "<mj-text>ok</mj-text>"
        );
    }

    #[test]
    fn local_loader_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();
        let loader = LocalIncludeLoader::new(base);
        let err = loader.resolve("file:///../secret.txt").unwrap_err();
        assert!(matches!(err, IncludeError::PolicyDenied(_)));
    }

    #[test]
    fn local_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = LocalIncludeLoader::new(dir.path().to_path_buf());
        assert!(matches!(
            loader.resolve("file:///missing.mjml"),
            Err(IncludeError::NotFound)
        ));
    }

    #[test]
    fn local_loader_accepts_bare_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.mjml"), "<mj-text>ok</mj-text>").unwrap();
        let loader = LocalIncludeLoader::new(dir.path().to_path_buf());
        assert_eq!(
            loader.resolve("part.mjml").unwrap(),
            "<mj-text>ok</mj-text>"
        );
    }
}
