//! Typed links between resources.

use crate::uri::Uri;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The well-known relation naming a resource's own identity.
pub const SELF_REL: &str = "self";

/// A typed pointer from one resource toward another.
///
/// Links are not yet resolved: holding a `Link` says nothing about
/// whether the target has been fetched. Relation names are not unique
/// within a resource; a resource may expose several links carrying the
/// same relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The relation name (category) of the link.
    pub rel: String,
    /// The target URI.
    pub href: Uri,
}

impl Link {
    /// Creates a new link.
    pub fn new(rel: impl Into<String>, href: impl Into<Uri>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }

    /// Creates a "self" link pointing at the given URI.
    pub fn self_link(href: impl Into<Uri>) -> Self {
        Self::new(SELF_REL, href)
    }

    /// Returns true if this link carries the "self" relation.
    #[must_use]
    pub fn is_self(&self) -> bool {
        self.rel == SELF_REL
    }
}

/// A selector over link relation names.
///
/// A matcher is a single exact name, a pattern, or an ordered list of
/// either. For a list, entries are tried in order against the whole
/// link sequence and the first entry that matches any link wins, so
/// list order is the precedence order. Exact matches are
/// case-sensitive.
#[derive(Debug, Clone)]
pub enum RelationMatcher {
    /// Case-sensitive exact relation name.
    Exact(String),
    /// Regular-expression match over the relation name.
    Pattern(Regex),
    /// Ordered alternatives; the first matching entry wins.
    Any(Vec<RelationMatcher>),
}

impl RelationMatcher {
    /// Returns true if the matcher accepts the given relation name.
    #[must_use]
    pub fn matches(&self, rel: &str) -> bool {
        match self {
            RelationMatcher::Exact(name) => name == rel,
            RelationMatcher::Pattern(pattern) => pattern.is_match(rel),
            RelationMatcher::Any(alternatives) => alternatives.iter().any(|m| m.matches(rel)),
        }
    }

    /// Returns the attribute name this matcher implies, if any.
    ///
    /// Only an exact name (or a list whose first exact entry provides
    /// one) implies a name; patterns do not.
    #[must_use]
    pub fn default_name(&self) -> Option<&str> {
        match self {
            RelationMatcher::Exact(name) => Some(name),
            RelationMatcher::Pattern(_) => None,
            RelationMatcher::Any(alternatives) => {
                alternatives.iter().find_map(|m| m.default_name())
            }
        }
    }

    /// Finds the first link in `links` accepted by this matcher.
    ///
    /// For `Any`, each alternative is tried against the whole sequence
    /// before falling through to the next, preserving the precedence
    /// order of the list.
    #[must_use]
    pub fn find_in<'a>(&self, links: &'a [Link]) -> Option<&'a Link> {
        match self {
            RelationMatcher::Any(alternatives) => alternatives
                .iter()
                .find_map(|matcher| matcher.find_in(links)),
            _ => links.iter().find(|link| self.matches(&link.rel)),
        }
    }
}

impl From<&str> for RelationMatcher {
    fn from(rel: &str) -> Self {
        RelationMatcher::Exact(rel.to_owned())
    }
}

impl From<String> for RelationMatcher {
    fn from(rel: String) -> Self {
        RelationMatcher::Exact(rel)
    }
}

impl From<Regex> for RelationMatcher {
    fn from(pattern: Regex) -> Self {
        RelationMatcher::Pattern(pattern)
    }
}

impl From<Vec<RelationMatcher>> for RelationMatcher {
    fn from(alternatives: Vec<RelationMatcher>) -> Self {
        RelationMatcher::Any(alternatives)
    }
}

impl From<&[&str]> for RelationMatcher {
    fn from(rels: &[&str]) -> Self {
        RelationMatcher::Any(rels.iter().map(|r| RelationMatcher::from(*r)).collect())
    }
}
