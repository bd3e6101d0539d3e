use std::fmt;
use std::str::FromStr;

use unicode_segmentation::UnicodeSegmentation;

const MIN_LEN: usize = 30;
const MAX_LEN: usize = 2000;

/// The subscriber's free-text description of their job, fed verbatim into
/// the generator prompt. Too short a description produces generic content,
/// so a minimum length is enforced at the boundary.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RoleDescription(String);

impl FromStr for RoleDescription {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        let len = value.graphemes(true).count();
        if len < MIN_LEN {
            return Err("Please describe your role in more detail".into());
        }
        if len > MAX_LEN {
            return Err("Role description too long".into());
        }

        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for RoleDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
