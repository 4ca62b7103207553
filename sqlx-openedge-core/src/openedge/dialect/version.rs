use crate::openedge::OpenEdgeError;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A `major.minor.patch` engine version.
///
/// Missing components read as zero, and trailing text after the numeric part
/// (`"9.6.3 (Debian)"`, `"11.7.2-beta"`) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatabaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl DatabaseVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for DatabaseVersion {
    type Err = OpenEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let numeric = s
            .trim()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or_default();

        let mut parts = numeric.split('.').filter(|p| !p.is_empty());
        let mut next = |required: bool| -> Result<u32, OpenEdgeError> {
            match parts.next() {
                Some(p) => p.parse().map_err(|_| {
                    OpenEdgeError::Configuration(format!("invalid database version: {s:?}"))
                }),
                None if required => Err(OpenEdgeError::Configuration(format!(
                    "invalid database version: {s:?}"
                ))),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(false)?;
        let patch = next(false)?;
        Ok(Self::new(major, minor, patch))
    }
}

impl Display for DatabaseVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
