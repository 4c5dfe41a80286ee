use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease};
use serde::{Serialize, Serializer};

use crate::error::ParseError;

/// Semantic version representation
///
/// Equality and ordering follow semantic-versioning precedence, so build
/// metadata is carried for display but never distinguishes two versions.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

impl Version {
    /// Create a release version without pre-release or build metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }

    /// Parse a version from tag text (e.g., "v1.2.3-rc.1+build.5")
    ///
    /// Accepts an optional leading `v`/`V`, exactly three dot-separated
    /// numeric components, then optional `-pre` and `+build` suffixes.
    /// Leading zeros in the numeric core are accepted and normalised.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let body = text.strip_prefix(&['v', 'V'][..]).unwrap_or(text);
        if body.is_empty() {
            return Err(ParseError::new(text, "empty version"));
        }

        let (rest, build) = match body.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (body, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(ParseError::new(text, "expected MAJOR.MINOR.PATCH"));
        }
        let major = parse_component(text, "major", parts[0])?;
        let minor = parse_component(text, "minor", parts[1])?;
        let patch = parse_component(text, "patch", parts[2])?;

        let pre = match pre {
            Some("") => return Err(ParseError::new(text, "empty pre-release")),
            Some(pre) => Prerelease::new(pre)
                .map_err(|e| ParseError::new(text, format!("invalid pre-release: {}", e)))?,
            None => Prerelease::EMPTY,
        };
        let build = match build {
            Some("") => return Err(ParseError::new(text, "empty build metadata")),
            Some(build) => BuildMetadata::new(build)
                .map_err(|e| ParseError::new(text, format!("invalid build metadata: {}", e)))?,
            None => BuildMetadata::EMPTY,
        };

        Ok(Version {
            major,
            minor,
            patch,
            pre,
            build,
        })
    }

    /// Semantic-versioning precedence between two versions
    ///
    /// The numeric triple decides first. A pre-release sorts below the same
    /// triple without one; pre-release identifiers then compare field by
    /// field. Build metadata is ignored.
    pub fn compare(&self, other: &Version) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| self.pre.cmp(&other.pre))
    }

    /// Bump version according to bump type
    ///
    /// The result never carries pre-release or build metadata.
    pub fn bump(&self, kind: BumpKind) -> Self {
        match kind {
            BumpKind::Major => Version::new(self.major.saturating_add(1), 0, 0),
            BumpKind::Minor => Version::new(self.major, self.minor.saturating_add(1), 0),
            BumpKind::Patch => {
                Version::new(self.major, self.minor, self.patch.saturating_add(1))
            }
        }
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

fn parse_component(text: &str, name: &str, part: &str) -> Result<u64, ParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(
            text,
            format!("invalid {} version '{}'", name, part),
        ));
    }
    part.parse::<u64>()
        .map_err(|_| ParseError::new(text, format!("{} version '{}' is too large", name, part)))
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Version bump type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpKind::Major => f.write_str("major"),
            BumpKind::Minor => f.write_str("minor"),
            BumpKind::Patch => f.write_str("patch"),
        }
    }
}

impl FromStr for BumpKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            _ => Err(ParseError::new(s, "bump must be one of major, minor, patch")),
        }
    }
}
