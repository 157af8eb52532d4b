//! Reading reference lines and turning them into search queries.

use std::{borrow::Cow, io::BufRead};

use log::trace;

use crate::Error;

/// Strip the leading citation marker, e.g. `[12] `, from a reference line.
///
/// The marker runs from the first `[` up to and including the character after the first `]`.
/// Every occurrence of that marker text is removed. Lines without a `[` or without a `]` are
/// returned unchanged, as are lines where the first `]` comes well before the first `[`.
///
/// ```
/// use getref::reference::normalize;
///
/// assert_eq!(
///     "Deep Learning, Goodfellow et al.",
///     normalize("[1] Deep Learning, Goodfellow et al.")
/// );
/// assert_eq!("No brackets here", normalize("No brackets here"));
/// ```
#[must_use]
pub fn normalize(line: &str) -> Cow<'_, str> {
    let (start, stop) = match (line.find('['), line.find(']')) {
        (Some(start), Some(stop)) => (start, stop),
        _ => return Cow::Borrowed(line),
    };

    // `]` is a single byte so `stop + 1` is always a char boundary.
    let after = stop + 1;
    let end = after + line[after..].chars().next().map_or(0, char::len_utf8);

    if end <= start {
        return Cow::Borrowed(line);
    }

    let marker = &line[start..end];
    trace!("Removing marker '{marker}' from reference");
    Cow::Owned(line.replace(marker, ""))
}

/// Read every line of `reader` as a reference, keeping blank lines so that positions line up
/// with the output.
///
/// # Errors
///
/// An [`Err`] is returned when the reader fails or the content is not valid UTF-8.
pub fn read_references<R: BufRead>(reader: R) -> Result<Vec<String>, Error> {
    reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}
