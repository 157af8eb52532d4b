use log::{info, trace};
use scraper::{ElementRef, Html};
use url::Url;

use crate::{
    api::selector,
    format::{CiteFormat, Record},
    Error, ErrorKind,
};

use super::Client;

/// Default address of the Google Scholar service.
pub const SCHOLAR_URL: &str = "https://scholar.google.com";

// Markers of the page served instead of results once the service suspects a robot.
const CAPTCHA_MARKERS: [&str; 3] = ["gs_captcha_ccl", "g-recaptcha", "id=\"captcha-form\""];

/// A single result of a search page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    cid: String,
    position: usize,
    title: String,
}

impl Hit {
    /// The cluster id the service uses for this result.
    #[must_use]
    pub fn cid(&self) -> &str {
        &self.cid
    }

    /// Position of the result on the search page, starting at zero.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Title of the result as shown on the search page.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Lookup client for Google Scholar.
///
/// A lookup searches for the query, takes the first hit only and fetches its citation in the
/// configured [`CiteFormat`]. Every step reports failures as an [`Error`] whose
/// [`ErrorKind`] tells "nothing found" ([`ErrorKind::NoValue`]) apart from transport
/// ([`ErrorKind::IO`]), refusal ([`ErrorKind::Service`]) and malformed responses
/// ([`ErrorKind::Deserialize`]).
#[derive(Debug)]
pub struct Scholar<C: Client = reqwest::blocking::Client> {
    client: C,
    base: String,
    format: CiteFormat,
}

impl<C: Client> Scholar<C> {
    /// A lookup client sending its requests through `client` to [`SCHOLAR_URL`].
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            base: SCHOLAR_URL.to_owned(),
            format: CiteFormat::default(),
        }
    }

    /// Use another address for the service, e.g. a mirror.
    #[must_use]
    pub fn with_base_url<S: Into<String>>(mut self, base: S) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        self.base = base;
        self
    }

    /// Request records in `format` instead of `BibTeX`.
    #[must_use]
    pub const fn with_format(mut self, format: CiteFormat) -> Self {
        self.format = format;
        self
    }

    /// The format records are requested in.
    #[must_use]
    pub const fn format(&self) -> CiteFormat {
        self.format
    }

    /// Look up the record of the first search hit for `query`.
    ///
    /// # Errors
    ///
    /// An [`Err`] of [`ErrorKind::NoValue`] is returned when the query is blank, nothing
    /// matches or the hit has no export in the requested format. Other kinds are passed on from
    /// [`Scholar::search`] and [`Scholar::record`].
    ///
    /// The query is sent as given, surrounding whitespace included. A query of only whitespace
    /// counts as blank.
    pub fn lookup(&self, query: &str) -> Result<Record, Error> {
        if query.trim().is_empty() {
            return Err(Error::new(ErrorKind::NoValue, "The query is empty"));
        }

        info!("Searching Google Scholar for '{query}'");
        let hit = self.first_hit(query)?;
        trace!("First hit for '{query}' is '{}' ({})", hit.title, hit.cid);
        self.record(&hit)
    }

    /// All hits on the first result page for `query`, in page order.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the page cannot be fetched, is an anti-robot page
    /// ([`ErrorKind::Service`]) or cannot be parsed.
    pub fn search(&self, query: &str) -> Result<Vec<Hit>, Error> {
        let url = self.url(&[("hl", "en"), ("q", query)])?;
        let html = self.client.get_text(url.as_str())?;
        parse_hits(&html)
    }

    /// The first hit for `query`.
    ///
    /// # Errors
    ///
    /// An [`Err`] of [`ErrorKind::NoValue`] is returned when the search has no results.
    pub fn first_hit(&self, query: &str) -> Result<Hit, Error> {
        self.search(query)?.into_iter().next().ok_or_else(|| {
            Error::new(
                ErrorKind::NoValue,
                format!("No results found for '{query}'"),
            )
        })
    }

    /// Fetch the record of `hit` in the configured format.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the citation page or the export cannot be fetched, when the
    /// format is not offered ([`ErrorKind::NoValue`]) or the export is not a valid document of
    /// the format ([`ErrorKind::Deserialize`]).
    pub fn record(&self, hit: &Hit) -> Result<Record, Error> {
        let info = format!("info:{}:scholar.google.com/", hit.cid);
        let position = hit.position.to_string();
        let url = self.url(&[
            ("q", info.as_str()),
            ("output", "cite"),
            ("scirp", position.as_str()),
            ("hl", "en"),
        ])?;

        let html = self.client.get_text(url.as_str())?;
        let href = parse_export_link(&html, self.format)?;
        let export = self.join(&href)?;

        trace!("Fetching {} export of '{}'", self.format, hit.cid);
        let text = self.client.get_text(export.as_str())?;
        self.format.record(text)
    }

    fn url(&self, params: &[(&str, &str)]) -> Result<Url, Error> {
        Url::parse_with_params(&format!("{}/scholar", self.base), params)
            .map_err(|e| Error::wrap(ErrorKind::Deserialize, e))
    }

    // Export links are usually absolute but may be relative to the service.
    fn join(&self, href: &str) -> Result<Url, Error> {
        Url::parse(&self.base)
            .and_then(|base| base.join(href))
            .map_err(|e| Error::wrap(ErrorKind::Deserialize, e))
    }
}

fn check_captcha(html: &str) -> Result<(), Error> {
    if CAPTCHA_MARKERS.iter().any(|marker| html.contains(marker)) {
        Err(Error::new(
            ErrorKind::Service,
            "Google Scholar answered with a captcha, requests are being blocked",
        ))
    } else {
        Ok(())
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_hits(html: &str) -> Result<Vec<Hit>, Error> {
    check_captcha(html)?;

    let document = Html::parse_document(html);
    let results = selector("div.gs_r.gs_or[data-cid]")?;
    let titles = selector("h3.gs_rt")?;

    let hits = document
        .select(&results)
        .enumerate()
        .filter_map(|(index, result)| {
            let element = result.value();
            let cid = element.attr("data-cid")?.to_owned();
            let position = element
                .attr("data-rp")
                .and_then(|rp| rp.parse().ok())
                .unwrap_or(index);
            let title = result
                .select(&titles)
                .next()
                .map(element_text)
                .unwrap_or_default();

            Some(Hit {
                cid,
                position,
                title,
            })
        })
        .collect::<Vec<_>>();

    trace!("Parsed {} hits from the result page", hits.len());
    Ok(hits)
}

fn parse_export_link(html: &str, format: CiteFormat) -> Result<String, Error> {
    check_captcha(html)?;

    let document = Html::parse_document(html);
    let links = selector("a.gs_citi")?;

    document
        .select(&links)
        .find(|link| format.matches_label(&element_text(*link)))
        .and_then(|link| link.value().attr("href"))
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::NoValue,
                format!("No {format} export offered for this result"),
            )
        })
}
