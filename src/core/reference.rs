//! core::reference
//!
//! Package references and their canonical string grammar.
//!
//! # Grammar
//!
//! ```text
//! name/semantic_version.sequence_in_branch.revision[@user/channel]
//! ```
//!
//! - `name` is everything before the first `/`
//! - the last two dot-separated groups before the optional `@` suffix are
//!   the sequence (decimal) and the revision (content hash); the remainder
//!   is the semantic version, which may itself contain dots
//! - `user` and `channel` are both present or both absent, at least two
//!   characters each
//!
//! # Example
//!
//! ```
//! use pegboard::core::reference::PackageReference;
//!
//! let reference: PackageReference = "zlib/1.2.13.42.0a1b2c3d@acme/stable".parse().unwrap();
//! assert_eq!(reference.name(), "zlib");
//! assert_eq!(reference.semantic_version(), "1.2.13");
//! assert_eq!(reference.sequence_in_branch(), 42);
//! assert_eq!(reference.revision(), "0a1b2c3d");
//! assert_eq!(reference.to_string(), "zlib/1.2.13.42.0a1b2c3d@acme/stable");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing or constructing a package reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed package reference '{reference}': {reason}")]
pub struct ReferenceError {
    /// The offending input
    pub reference: String,
    /// What was wrong with it
    pub reason: String,
}

impl ReferenceError {
    fn new(reference: &str, reason: impl Into<String>) -> Self {
        Self {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}

/// An immutable, fully qualified package reference.
///
/// Equality is structural over every field, so two references that differ
/// only in revision are different references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageReference {
    name: String,
    semantic_version: String,
    sequence_in_branch: u64,
    revision: String,
    user_channel: Option<(String, String)>,
}

impl PackageReference {
    /// Build a reference from its parts, validating every field.
    pub fn new(
        name: impl Into<String>,
        semantic_version: impl Into<String>,
        sequence_in_branch: u64,
        revision: impl Into<String>,
        user_channel: Option<(String, String)>,
    ) -> Result<Self, ReferenceError> {
        let reference = Self {
            name: name.into(),
            semantic_version: semantic_version.into(),
            sequence_in_branch,
            revision: revision.into(),
            user_channel,
        };
        reference.validate()?;
        Ok(reference)
    }

    fn validate(&self) -> Result<(), ReferenceError> {
        let shown = self.to_string();
        if self.name.is_empty() || self.name.contains(['/', '@']) {
            return Err(ReferenceError::new(&shown, "invalid package name"));
        }
        if self.semantic_version.is_empty()
            || self.semantic_version.contains(['/', '@'])
            || self.semantic_version.starts_with('.')
            || self.semantic_version.ends_with('.')
        {
            return Err(ReferenceError::new(&shown, "invalid semantic version"));
        }
        if self.revision.is_empty() || !self.revision.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ReferenceError::new(&shown, "invalid revision"));
        }
        if let Some((user, channel)) = &self.user_channel {
            if user.len() < 2 || !user.chars().all(is_user_channel_char) {
                return Err(ReferenceError::new(&shown, "invalid user"));
            }
            if channel.len() < 2 || !channel.chars().all(is_user_channel_char) {
                return Err(ReferenceError::new(&shown, "invalid channel"));
            }
        }
        Ok(())
    }

    /// Parse the canonical string form.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let (head, user_channel) = match input.split_once('@') {
            Some((head, suffix)) => {
                let (user, channel) = suffix
                    .split_once('/')
                    .ok_or_else(|| ReferenceError::new(input, "user without channel"))?;
                (head, Some((user.to_string(), channel.to_string())))
            }
            None => (input, None),
        };

        let (name, rest) = head
            .split_once('/')
            .ok_or_else(|| ReferenceError::new(input, "missing '/' after package name"))?;

        let mut groups = rest.rsplitn(3, '.');
        let revision = groups
            .next()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ReferenceError::new(input, "missing revision"))?;
        let sequence = groups
            .next()
            .ok_or_else(|| ReferenceError::new(input, "missing sequence in branch"))?;
        let semantic_version = groups
            .next()
            .ok_or_else(|| ReferenceError::new(input, "missing semantic version"))?;

        if sequence.is_empty() || !sequence.chars().all(|c| c.is_ascii_digit()) {
            return Err(ReferenceError::new(input, "sequence in branch is not a number"));
        }
        // Leading zeros would not survive formatting.
        if sequence.len() > 1 && sequence.starts_with('0') {
            return Err(ReferenceError::new(input, "sequence in branch has leading zeros"));
        }
        let sequence_in_branch = sequence
            .parse::<u64>()
            .map_err(|_| ReferenceError::new(input, "sequence in branch out of range"))?;

        let reference = Self {
            name: name.to_string(),
            semantic_version: semantic_version.to_string(),
            sequence_in_branch,
            revision: revision.to_string(),
            user_channel,
        };
        reference
            .validate()
            .map_err(|e| ReferenceError::new(input, e.reason))?;
        Ok(reference)
    }

    /// Clone this reference with a new `(sequence_in_branch, revision)` pair.
    pub fn with_revision(&self, sequence_in_branch: u64, revision: impl Into<String>) -> Self {
        Self {
            sequence_in_branch,
            revision: revision.into(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semantic_version(&self) -> &str {
        &self.semantic_version
    }

    pub fn sequence_in_branch(&self) -> u64 {
        self.sequence_in_branch
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn user(&self) -> Option<&str> {
        self.user_channel.as_ref().map(|(user, _)| user.as_str())
    }

    pub fn channel(&self) -> Option<&str> {
        self.user_channel.as_ref().map(|(_, channel)| channel.as_str())
    }

    /// The `version.sequence.revision` part that follows `name/`.
    pub fn version_triple(&self) -> String {
        format!(
            "{}.{}.{}",
            self.semantic_version, self.sequence_in_branch, self.revision
        )
    }

    /// Whether `other` names the same package line: same name, semantic
    /// version, user and channel. Sequence and revision are ignored.
    pub fn same_line_as(&self, other: &PackageReference) -> bool {
        self.name == other.name
            && self.semantic_version == other.semantic_version
            && self.user_channel == other.user_channel
    }
}

fn is_user_channel_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version_triple())?;
        if let Some((user, channel)) = &self.user_channel {
            write!(f, "@{}/{}", user, channel)?;
        }
        Ok(())
    }
}

impl FromStr for PackageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageReference {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PackageReference> for String {
    fn from(reference: PackageReference) -> Self {
        reference.to_string()
    }
}
