use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The address of the receiver of an output.
/// The pool only compares addresses, so the encoding is left to the caller.
#[derive(Debug, Clone, Hash, Serialize, Deserialize, Ord, PartialOrd, Eq, PartialEq)]
pub struct Address(String);

impl Address {
    pub fn new(address: String) -> Self {
        Self(address)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Takes the text as is, so parsing and `Address::new` agree on the same input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(Error::InvalidAddress)
        } else {
            Ok(Self(s.to_string()))
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
