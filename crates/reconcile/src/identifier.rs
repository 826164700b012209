//! Package identifiers
//!
//! A package is identified by `scheme://name`, where the scheme names the
//! backend that owns it. A bare `name` belongs to the default backend.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Separator between scheme and name in canonical form
pub const SCHEME_SEPARATOR: &str = "://";

/// Knows which schemes are registered and which one is the default.
///
/// Implemented by [`BackendRegistry`](crate::BackendRegistry); tests can
/// provide a lightweight implementation without any backend.
pub trait SchemeResolver {
    /// Scheme assumed for bare names
    fn default_scheme(&self) -> &str;

    /// Whether a backend is registered under `scheme`
    fn is_registered(&self, scheme: &str) -> bool;
}

/// Canonical identity of a package, namespaced by backend scheme.
///
/// Equality, hashing and ordering all follow the canonical `scheme://name`
/// text, so a `PackageId` sorts exactly like its persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    scheme: String,
    name: String,
}

impl PackageId {
    /// Build an identifier from already-validated parts.
    ///
    /// Does not check the scheme against a registry; use [`PackageId::parse`]
    /// for user input.
    pub fn new(scheme: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            name: name.into(),
        }
    }

    /// Parse identifier text.
    ///
    /// - `name` uses the resolver's default scheme
    /// - `scheme://name` requires `scheme` to be registered
    ///
    /// Anything else fails: an unregistered scheme with
    /// [`Error::UnknownBackend`], an empty or malformed name with
    /// [`Error::InvalidIdentifier`].
    pub fn parse<R: SchemeResolver + ?Sized>(text: &str, resolver: &R) -> Result<Self> {
        let input = text.trim();

        let (scheme, name) = match input.split_once(SCHEME_SEPARATOR) {
            Some((scheme, name)) => (scheme.to_ascii_lowercase(), name),
            None => (resolver.default_scheme().to_string(), input),
        };

        if scheme.is_empty() {
            return Err(invalid(input, "empty scheme"));
        }
        if !resolver.is_registered(&scheme) {
            return Err(Error::UnknownBackend {
                scheme,
                input: input.to_string(),
            });
        }

        validate_name(input, name)?;
        Ok(Self::new(scheme, name))
    }

    /// Backend scheme owning this package
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Package name as the backend knows it
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render `scheme://name`
    pub fn canonical(&self) -> String {
        canonical(&self.scheme, &self.name)
    }

    /// Whether a canonical entry belongs to `scheme`
    pub fn entry_has_scheme(entry: &str, scheme: &str) -> bool {
        entry
            .strip_prefix(scheme)
            .is_some_and(|rest| rest.starts_with(SCHEME_SEPARATOR))
    }
}

/// Render `scheme://name` without building a [`PackageId`]
pub fn canonical(scheme: &str, name: &str) -> String {
    format!("{scheme}{SCHEME_SEPARATOR}{name}")
}

/// Check that `name` can be stored as a list entry and handed to a backend.
pub(crate) fn validate_name(input: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(input, "empty package name"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid(input, "package name contains whitespace"));
    }
    if name.contains('/') {
        return Err(invalid(input, "package name contains '/'"));
    }
    if name.starts_with('-') {
        return Err(invalid(input, "package name starts with '-'"));
    }
    Ok(())
}

fn invalid(input: &str, reason: &'static str) -> Error {
    Error::InvalidIdentifier {
        input: input.to_string(),
        reason,
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SCHEME_SEPARATOR}{}", self.scheme, self.name)
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
