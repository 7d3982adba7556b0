#![forbid(unsafe_code)]

//! Version policy: conventional-commit classification → semantic bump.
//!
//! Peripheral to the gating core; consumes nothing from the equivalence
//! engine beyond the gate's final Proceed/Halt. Convention: breaking →
//! major, feature → minor, fix → patch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::controller::{GateDecision, GateOutcome};

/// Classification of a conventional commit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    Breaking,
    Feature,
    Fix,
    Other,
}

/// Which semver component to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemverBump {
    Major,
    Minor,
    Patch,
}

/// A semantic version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Apply a bump, zeroing the lower components.
    #[must_use]
    pub const fn bump(self, bump: SemverBump) -> Self {
        match bump {
            SemverBump::Major => Self::new(self.major + 1, 0, 0),
            SemverBump::Minor => Self::new(self.major, self.minor + 1, 0),
            SemverBump::Patch => Self::new(self.major, self.minor, self.patch + 1),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Malformed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParseError {
    pub raw: String,
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is not a MAJOR.MINOR.PATCH version", self.raw)
    }
}

impl std::error::Error for VersionParseError {}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.trim().splitn(3, '.');
        let mut component = || {
            parts
                .next()
                .and_then(|part| part.parse::<u64>().ok())
                .ok_or_else(|| VersionParseError {
                    raw: raw.to_owned(),
                })
        };
        let major = component()?;
        let minor = component()?;
        let patch = component()?;
        Ok(Self::new(major, minor, patch))
    }
}

/// Classify one commit message per the conventional-commit convention.
///
/// Breaking is signaled either by `!` before the colon
/// (`feat(scope)!: ...`) or by a `BREAKING CHANGE:` footer.
#[must_use]
pub fn classify_commit(message: &str) -> CommitKind {
    if message.contains("BREAKING CHANGE:") || message.contains("BREAKING-CHANGE:") {
        return CommitKind::Breaking;
    }

    let Some((prefix, _)) = message.split_once(':') else {
        return CommitKind::Other;
    };
    let prefix = prefix.trim();
    let bang = prefix.ends_with('!');
    let prefix = prefix.trim_end_matches('!');
    let kind = prefix.split_once('(').map_or(prefix, |(head, _)| head);

    match kind {
        _ if bang => CommitKind::Breaking,
        "feat" => CommitKind::Feature,
        "fix" => CommitKind::Fix,
        _ => CommitKind::Other,
    }
}

/// Recommend a bump for a set of commit messages since the last tag.
///
/// The strongest classification wins; `None` when no conventional
/// commit is present (nothing to release).
#[must_use]
pub fn recommend_bump<'a>(messages: impl IntoIterator<Item = &'a str>) -> Option<SemverBump> {
    let mut bump = None;
    for message in messages {
        let candidate = match classify_commit(message) {
            CommitKind::Breaking => Some(SemverBump::Major),
            CommitKind::Feature => Some(SemverBump::Minor),
            CommitKind::Fix => Some(SemverBump::Patch),
            CommitKind::Other => None,
        };
        bump = match (bump, candidate) {
            (None, c) => c,
            (b, None) => b,
            (Some(SemverBump::Major), _) | (_, Some(SemverBump::Major)) => Some(SemverBump::Major),
            (Some(SemverBump::Minor), _) | (_, Some(SemverBump::Minor)) => Some(SemverBump::Minor),
            _ => Some(SemverBump::Patch),
        };
    }
    bump
}

/// Release tag in the pipeline's `<algorithm>/v<version>` convention.
#[must_use]
pub fn release_tag(algorithm: &str, version: &Version) -> String {
    format!("{algorithm}/v{version}")
}

/// The next version for a run, or `None` when the gate halted the
/// pipeline or no conventional commit justifies a release.
#[must_use]
pub fn next_version(
    current: Version,
    messages: impl IntoIterator<Item = impl AsRef<str>>,
    decision: &GateDecision,
) -> Option<Version> {
    if decision.outcome != GateOutcome::Proceed {
        return None;
    }
    let messages: Vec<String> = messages
        .into_iter()
        .map(|m| m.as_ref().to_owned())
        .collect();
    recommend_bump(messages.iter().map(String::as_str)).map(|bump| current.bump(bump))
}
