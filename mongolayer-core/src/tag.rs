//! Serialization tag grammar for update fields.
//!
//! A tag has the form `primary_name("," modifier)*`. The primary name is the external
//! field name; when it is empty the lower-cased field identifier is used instead. The only
//! recognized modifier is `omitempty`, every other token is accepted and ignored. A tag that
//! is exactly `-` (or empty) excludes the field altogether.
//!
//! ```ignore
//! use mongolayer::tag::FieldTag;
//!
//! let tag = FieldTag::parse("profile.bio,omitempty");
//! assert_eq!(tag.resolve_name("bio"), "profile.bio");
//! assert!(tag.omit_empty());
//! ```

use std::borrow::Cow;

/// Tag value that excludes a field entirely.
pub const EXCLUDE: &str = "-";

/// Modifier that skips a field while it holds its zero value.
pub const OMIT_EMPTY: &str = "omitempty";

/// A parsed serialization tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTag<'a> {
    name: &'a str,
    modifiers: Vec<&'a str>,
}

impl<'a> FieldTag<'a> {
    /// Splits a raw tag into its primary name and modifier list.
    pub fn parse(raw: &'a str) -> Self {
        let mut parts = raw.split(',');

        Self {
            name: parts.next().unwrap_or_default(),
            modifiers: parts.collect(),
        }
    }

    /// Returns `true` if a field carrying this raw tag never takes part in an update.
    ///
    /// Only the empty tag and the exact value `-` exclude a field; `-,omitempty` names a
    /// field literally called `-`.
    pub fn is_excluded(raw: &str) -> bool {
        raw.is_empty() || raw == EXCLUDE
    }

    /// The primary name as written, possibly empty.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// All modifiers after the primary name, in tag order.
    pub fn modifiers(&self) -> &[&'a str] {
        &self.modifiers
    }

    /// Returns `true` if the tag carries the `omitempty` modifier.
    pub fn omit_empty(&self) -> bool {
        self.modifiers.contains(&OMIT_EMPTY)
    }

    /// Resolves the external field name, falling back to the lower-cased identifier.
    pub fn resolve_name<'b>(&self, ident: &'b str) -> Cow<'b, str>
    where
        'a: 'b,
    {
        if self.name.is_empty() {
            Cow::Owned(ident.trim_start_matches("r#").to_lowercase())
        } else {
            Cow::Borrowed(self.name)
        }
    }
}
