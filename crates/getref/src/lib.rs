#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

//! # getref
//!
//! getref is a library which resolves free text references, as found at the end of papers, to
//! bibliographic records by searching Google Scholar. A reference line is turned into a query
//! with [`reference::normalize`], and [`Scholar::lookup`] fetches the record of the first match
//! in a [`format::CiteFormat`] such as `BibTeX`.
//!
//! ```no_run
//! use getref::{proxy::ProxyConfig, reference::normalize};
//!
//! let scholar = getref::scholar(&ProxyConfig::Direct)?;
//! let query = normalize("[1] Deep Learning, Goodfellow et al.");
//!
//! match scholar.lookup(&query) {
//!     Ok(record) => println!("{record}"),
//!     Err(err) if err.is_no_value() => println!("Could not find ref for {query}"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # Ok::<(), getref::Error>(())
//! ```

mod api;
mod error;
pub mod format;
pub mod proxy;
pub mod reference;

pub use api::{
    checking_client, http_client,
    scholar::{Hit, Scholar, SCHOLAR_URL},
    Client,
};
pub use error::{Error, ErrorKind};

use log::trace;
use proxy::ProxyConfig;

/// A Google Scholar lookup client whose requests are routed according to `proxy`.
///
/// # Errors
///
/// An [`Err`] is returned when the HTTP client cannot be built.
#[inline]
pub fn scholar(proxy: &ProxyConfig) -> Result<Scholar, Error> {
    trace!("Creating Google Scholar client with {} proxies", proxy.len());
    http_client(proxy).map(Scholar::new)
}
