//! Dotted version numbers.
//!
//! Used to gate plugins on the version of this library and of the
//! multiplexer. Parsing is lenient about tmux-style decorations such as
//! `tmux 3.3a` or `next-3.4`.

use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` version.
///
/// # Examples
///
/// ```
/// use tmuxload::Version;
///
/// let tmux: Version = "tmux 3.3a".parse().unwrap();
/// assert_eq!(tmux, Version::new(3, 3, 0));
/// assert!(tmux < "3.4".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl Version {
    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version of this library.
    #[must_use]
    pub fn current() -> Self {
        env!("CARGO_PKG_VERSION")
            .parse()
            .unwrap_or(Self::new(0, 0, 0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A version string that contained no number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVersionError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for InvalidVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version: '{}'", self.input)
    }
}

impl std::error::Error for InvalidVersionError {}

impl FromStr for Version {
    type Err = InvalidVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidVersionError {
            input: s.to_string(),
        };

        let start = s.find(|c: char| c.is_ascii_digit()).ok_or_else(err)?;
        let mut parts = [0u32; 3];
        for (slot, piece) in parts.iter_mut().zip(s[start..].split('.')) {
            let digits: String = piece.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            *slot = digits.parse().map_err(|_| err())?;
            if digits.len() != piece.len() {
                break;
            }
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}
