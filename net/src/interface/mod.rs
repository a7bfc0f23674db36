// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Linux network interface names

use std::fmt::{Display, Formatter};

/// A string which has been checked to be a legal linux network interface name.
///
/// Legal network interface names are composed only of alphanumeric ASCII characters, `.`, `-`, and
/// `_`. The kernel buffer is 16 bytes including the terminating null, so the effective maximum
/// length is 15 bytes.
#[repr(transparent)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct InterfaceName(String);

impl Display for InterfaceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl InterfaceName {
    /// The maximum legal length of a linux network interface name (excluding the trailing NUL)
    pub const MAX_LEN: usize = 15;
}

/// Errors which may occur when mapping a general `String` into an `InterfaceName`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum IllegalInterfaceName {
    /// The empty string was submitted.
    #[error("interface name must be at least one character")]
    Empty,
    /// You can't make an interface named ., ..
    #[error("name must not be . or ..")]
    MustNotIncludeOnlyDots(String),
    /// A string which is longer than 15 characters was submitted.
    #[error("interface name {0} is too long")]
    TooLong(String),
    /// The string contains characters other than alphanumerics and `.`, `-`, `_`.
    #[error("interface name {0} contains illegal characters")]
    IllegalCharacters(String),
}

impl TryFrom<String> for InterfaceName {
    type Error = IllegalInterfaceName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        const LEGAL_PUNCT: [char; 3] = ['.', '-', '_'];
        if value.is_empty() {
            return Err(IllegalInterfaceName::Empty);
        }
        if value == "." || value == ".." {
            return Err(IllegalInterfaceName::MustNotIncludeOnlyDots(value));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LEGAL_PUNCT.contains(&c))
        {
            return Err(IllegalInterfaceName::IllegalCharacters(value));
        }
        if value.len() > InterfaceName::MAX_LEN {
            return Err(IllegalInterfaceName::TooLong(value));
        }
        Ok(InterfaceName(value))
    }
}

impl TryFrom<&str> for InterfaceName {
    type Error = IllegalInterfaceName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<InterfaceName> for String {
    fn from(value: InterfaceName) -> Self {
        value.0
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::InterfaceName;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for InterfaceName {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            const LEGAL_CHARS: &[u8] =
                b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";
            #[allow(clippy::cast_possible_truncation)] // const eval
            let target_length =
                (1 + (driver.produce::<u8>()? % (InterfaceName::MAX_LEN as u8))) as usize;
            let mut name = String::with_capacity(target_length);
            for _ in 0..target_length {
                let idx = driver.produce::<u8>()? as usize % LEGAL_CHARS.len();
                name.push(char::from(LEGAL_CHARS[idx]));
            }
            InterfaceName::try_from(name).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IllegalInterfaceName, InterfaceName};

    #[test]
    fn generated_names_are_legal() {
        bolero::check!().with_type().for_each(|x: &InterfaceName| {
            assert!(!x.as_ref().is_empty());
            assert!(x.as_ref().len() <= InterfaceName::MAX_LEN);
            assert_eq!(InterfaceName::try_from(x.as_ref()).as_ref(), Ok(x));
        });
    }

    #[test]
    fn illegal_names() {
        assert_eq!(InterfaceName::try_from(""), Err(IllegalInterfaceName::Empty));
        assert!(matches!(
            InterfaceName::try_from(".."),
            Err(IllegalInterfaceName::MustNotIncludeOnlyDots(_))
        ));
        assert!(matches!(
            InterfaceName::try_from("a name"),
            Err(IllegalInterfaceName::IllegalCharacters(_))
        ));
        assert!(matches!(
            InterfaceName::try_from("abcdefghijklmnop"),
            Err(IllegalInterfaceName::TooLong(_))
        ));
        assert!(InterfaceName::try_from("veth0.100").is_ok());
    }
}
