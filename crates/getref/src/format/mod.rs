//! Citation export formats offered by the search service and the [`Record`] returned in one of
//! them.

mod bibtex;

use std::fmt;

use crate::{Error, ErrorKind};
pub use bibtex::BibTex;

use log::trace;

/// A citation export format that a search hit can be rendered in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CiteFormat {
    /// `BibTeX`, validated with `biblatex`.
    #[default]
    BibTex,
    /// `EndNote` tagged format.
    EndNote,
    /// `RefMan` (RIS) tagged format.
    RefMan,
}

impl CiteFormat {
    /// The display name of the format.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BibTex => "BibTeX",
            Self::EndNote => "EndNote",
            Self::RefMan => "RefMan",
        }
    }

    /// The file extension associated with this format.
    #[must_use]
    pub const fn ext(self) -> &'static str {
        match self {
            Self::BibTex => "bib",
            Self::EndNote => "enw",
            Self::RefMan => "ris",
        }
    }

    /// Whether an export link label on the citation page refers to this format.
    #[must_use]
    pub fn matches_label(self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(self.name())
    }

    /// Checks that `text` is a document of this format and wraps it into a [`Record`].
    ///
    /// # Errors
    ///
    /// An [`Err`] of [`ErrorKind::NoValue`] is returned for empty text and
    /// [`ErrorKind::Deserialize`] when the text is not in this format.
    pub fn record(self, text: String) -> Result<Record, Error> {
        if text.trim().is_empty() {
            return Err(Error::new(
                ErrorKind::NoValue,
                format!("{} export is empty", self.name()),
            ));
        }

        let text = match self {
            Self::BibTex => {
                let bibtex = BibTex::new(text);
                let cite = bibtex.validate()?;
                trace!("BibTeX export parsed with cite key '{cite}'");
                bibtex.raw()
            }
            Self::EndNote => expect_tag(self, text, "%0 ")?,
            Self::RefMan => expect_tag(self, text, "TY  -")?,
        };

        Ok(Record { format: self, text })
    }
}

impl fmt::Display for CiteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Tagged formats open every record with a fixed tag.
fn expect_tag(format: CiteFormat, text: String, tag: &str) -> Result<String, Error> {
    if text.trim_start().starts_with(tag) {
        Ok(text)
    } else {
        Err(Error::new(
            ErrorKind::Deserialize,
            format!("Response is not a valid {format} record"),
        ))
    }
}

/// A bibliographic record as text in a known [`CiteFormat`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    format: CiteFormat,
    text: String,
}

impl Record {
    /// The format of this record.
    #[must_use]
    pub const fn format(&self) -> CiteFormat {
        self.format
    }

    /// The record text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the record and return the raw [`String`].
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // can't be const
    pub fn raw(self) -> String {
        self.text
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_case_insensitively() {
        assert!(CiteFormat::BibTex.matches_label("BibTeX"));
        assert!(CiteFormat::BibTex.matches_label(" bibtex "));
        assert!(CiteFormat::RefMan.matches_label("RefMan"));
        assert!(!CiteFormat::EndNote.matches_label("RefWorks"));
    }

    #[test]
    fn empty_text_is_no_value() {
        let err = CiteFormat::EndNote.record("  \n".to_owned()).unwrap_err();
        assert_eq!(ErrorKind::NoValue, err.kind());
    }

    #[test]
    fn endnote_record_requires_type_tag() {
        let text = "%0 Journal Article\n%T Deep learning\n%A LeCun, Yann\n".to_owned();
        let record = CiteFormat::EndNote.record(text.clone()).unwrap();
        assert_eq!(text, record.raw());

        let err = CiteFormat::EndNote.record("<html></html>".to_owned()).unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
    }

    #[test]
    fn refman_record_requires_type_tag() {
        let text = "TY  - JOUR\nT1  - Deep learning\nER  - \n".to_owned();
        let record = CiteFormat::RefMan.record(text).unwrap();
        assert_eq!(CiteFormat::RefMan, record.format());

        assert!(CiteFormat::RefMan.record("%0 Book".to_owned()).is_err());
    }

    #[test]
    fn default_format_is_bibtex() {
        assert_eq!(CiteFormat::BibTex, CiteFormat::default());
        assert_eq!("bib", CiteFormat::default().ext());
    }
}
