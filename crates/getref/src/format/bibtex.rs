use crate::{Error, ErrorKind};

use biblatex::Bibliography;

/// A type wrapper around [`String`] to represent a `BibTex` format string.
#[derive(Debug)]
pub struct BibTex(String);

impl BibTex {
    /// Construct a new type using a [`String`] input.
    #[must_use]
    pub const fn new(val: String) -> Self {
        Self(val)
    }

    /// Parses the text and returns the cite key of its first entry.
    ///
    /// # Errors
    ///
    /// Will return [`Err`] if the text does not hold at least one `BibTeX` entry.
    pub fn validate(&self) -> Result<String, Error> {
        Bibliography::parse(&self.0)
            .filter(|b| b.len() != 0)
            .and_then(|b| b.into_iter().next())
            .map(|entry| entry.key)
            .ok_or_else(|| Error::new(ErrorKind::Deserialize, "Cannot parse the BibTeX"))
    }

    /// The raw [`String`].
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // can't be const
    pub fn raw(self) -> String {
        self.0
    }
}
