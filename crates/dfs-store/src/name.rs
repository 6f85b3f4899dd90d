//! Logical file name validation.
//!
//! The store has a flat namespace: every name maps to exactly one entry
//! directly under the root directory. Valid names:
//! - Must be non-empty and at most [`MAX_NAME_LEN`] bytes
//! - Must not contain `/`, `\`, `:`, NUL, or any other control character
//! - Must not contain `..`
//! - Must not start with `.` (this also reserves the upload prefix)
//! - Must not end with `.` or a space
//!
//! Names that break a rule are rejected outright, never rewritten into a
//! different valid name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Longest accepted name in bytes. Matches the common filesystem limit.
pub const MAX_NAME_LEN: usize = 255;

/// Prefix of in-flight upload artifacts inside the root directory.
///
/// Valid names can never start with `.`, so temporary files never collide
/// with a stored file and are never listed.
pub(crate) const UPLOAD_PREFIX: &str = ".dfs-upload-";

/// Characters that are forbidden anywhere in a name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '\0'];

/// Validate a logical file name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use dfs_store::name::validate_file_name;
///
/// assert!(validate_file_name("report.pdf").is_ok());
/// assert!(validate_file_name("").is_err());
/// assert!(validate_file_name("../etc/passwd").is_err());
/// ```
pub fn validate_file_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid(name, "name must not be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(StoreError::invalid(
            name,
            format!("name exceeds {MAX_NAME_LEN} bytes"),
        ));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(StoreError::invalid(
                name,
                format!("contains forbidden character: {ch:?}"),
            ));
        }
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(StoreError::invalid(
            name,
            format!("contains control character: {ch:?}"),
        ));
    }

    // Catches encoded traversal like `..%2f..%2fetc` as well.
    if name.contains("..") {
        return Err(StoreError::invalid(name, "must not contain '..'"));
    }

    if name.starts_with('.') {
        return Err(StoreError::invalid(name, "must not start with '.'"));
    }

    if name.ends_with('.') || name.ends_with(' ') {
        return Err(StoreError::invalid(
            name,
            "must not end with '.' or a space",
        ));
    }

    Ok(())
}

/// A validated logical file name.
///
/// Construction always goes through [`validate_file_name`], so holding a
/// `FileName` means the name is safe to join onto the root directory.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileName(String);

impl FileName {
    /// Parse and validate a name.
    pub fn parse(name: &str) -> StoreResult<Self> {
        validate_file_name(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for FileName {
    type Error = StoreError;

    fn try_from(name: String) -> StoreResult<Self> {
        validate_file_name(&name)?;
        Ok(Self(name))
    }
}

impl From<FileName> for String {
    fn from(name: FileName) -> Self {
        name.0
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_simple_names() {
        assert!(validate_file_name("a").is_ok());
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name("archive.tar.gz").is_ok());
        assert!(validate_file_name("my file (1).txt").is_ok());
        assert!(validate_file_name("données-été.csv").is_ok());
        assert!(validate_file_name("100%.txt").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(validate_file_name("").is_err());
    }

    #[test]
    fn reject_traversal() {
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../secret").is_err());
        assert!(validate_file_name("../../etc/passwd").is_err());
        assert!(validate_file_name("..%2f..%2fetc").is_err());
        assert!(validate_file_name("a..b").is_err());
    }

    #[test]
    fn reject_separators_and_absolute_paths() {
        assert!(validate_file_name("/etc/passwd").is_err());
        assert!(validate_file_name("dir/file").is_err());
        assert!(validate_file_name("dir\\file").is_err());
        assert!(validate_file_name("\\\\server\\share").is_err());
    }

    #[test]
    fn reject_drive_prefix() {
        assert!(validate_file_name("C:").is_err());
        assert!(validate_file_name("C:secret").is_err());
        assert!(validate_file_name("file.txt:stream").is_err());
    }

    #[test]
    fn reject_nul_and_control_chars() {
        assert!(validate_file_name("a\0b").is_err());
        assert!(validate_file_name("a\nb").is_err());
        assert!(validate_file_name("a\tb").is_err());
        assert!(validate_file_name("bell\u{7}").is_err());
    }

    #[test]
    fn reject_dot_boundaries() {
        assert!(validate_file_name(".").is_err());
        assert!(validate_file_name(".hidden").is_err());
        assert!(validate_file_name("trailing.").is_err());
        assert!(validate_file_name("trailing ").is_err());
    }

    #[test]
    fn reject_upload_prefix() {
        let temp = format!("{UPLOAD_PREFIX}abc123");
        assert!(validate_file_name(&temp).is_err());
    }

    #[test]
    fn length_limit() {
        assert!(validate_file_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_file_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn file_name_serde_validates() {
        let name = FileName::parse("notes.txt").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"notes.txt\"");

        let back: FileName = serde_json::from_str("\"notes.txt\"").unwrap();
        assert_eq!(back, name);

        assert!(serde_json::from_str::<FileName>("\"../x\"").is_err());
    }

    #[test]
    fn file_name_display() {
        let name = FileName::parse("a.bin").unwrap();
        assert_eq!(format!("{name}"), "a.bin");
        assert_eq!(name.as_str(), "a.bin");
    }

    proptest! {
        #[test]
        fn plain_names_are_accepted(name in "[A-Za-z0-9_-][A-Za-z0-9 _-]{0,40}[A-Za-z0-9_-]") {
            prop_assert!(validate_file_name(&name).is_ok());
        }

        #[test]
        fn names_with_separators_are_rejected(
            head in "[a-z]{0,8}",
            sep in prop::sample::select(vec!['/', '\\', '\0', ':']),
            tail in "[a-z]{0,8}",
        ) {
            let name = format!("{head}{sep}{tail}");
            prop_assert!(validate_file_name(&name).is_err());
        }

        #[test]
        fn accepted_names_stay_a_single_component(name in "\\PC{1,64}") {
            if validate_file_name(&name).is_ok() {
                let path = std::path::Path::new(&name);
                prop_assert_eq!(path.components().count(), 1);
                prop_assert!(matches!(
                    path.components().next(),
                    Some(std::path::Component::Normal(_))
                ));
            }
        }
    }
}
