use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use log::trace;
use scraper::Selector;
use url::Url;

pub(crate) mod scholar;

use crate::{proxy::ProxyConfig, Error, ErrorKind};

// Free proxies that take longer than this to answer are not worth rotating through.
const PROXY_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36";

/// The transport used by the lookup client.
///
/// Implemented for [`reqwest::blocking::Client`]; any other implementation can be handed to
/// [`Scholar::new`](crate::Scholar::new).
pub trait Client {
    /// Fetch the body of `url` as text.
    ///
    /// # Errors
    ///
    /// An [`Err`] of [`ErrorKind::IO`] for transport failures, [`ErrorKind::Service`] for a
    /// non-success status and [`ErrorKind::NoValue`] for an empty body.
    fn get_text(&self, url: &str) -> Result<String, Error>;
}

impl Client for reqwest::blocking::Client {
    fn get_text(&self, url: &str) -> Result<String, Error> {
        trace!("GET {url}");
        let resp = self
            .get(url)
            .send()
            .map_err(|e| Error::wrap(ErrorKind::IO, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::new(
                ErrorKind::Service,
                format!("'{url}' answered with status {status}"),
            ));
        }

        let text = resp
            .text()
            .map_err(|e| Error::wrap(ErrorKind::Deserialize, e))?;

        if text.is_empty() {
            Err(Error::new(ErrorKind::NoValue, "Response text is empty"))
        } else {
            Ok(text)
        }
    }
}

/// Build the blocking HTTP client used for lookups, routing requests through `proxy`.
///
/// A rotating pool hands out its proxies round robin, one per request.
///
/// # Errors
///
/// An [`Err`] is returned when the underlying client cannot be built.
pub fn http_client(proxy: &ProxyConfig) -> Result<reqwest::blocking::Client, Error> {
    let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);

    if let ProxyConfig::Rotating(proxies) = proxy {
        trace!("Routing requests through {} rotating proxies", proxies.len());
        builder = builder.proxy(rotating_proxy(proxies.clone()));
    }

    builder.build().map_err(|e| Error::wrap(ErrorKind::IO, e))
}

/// Build a client routing every request through the single `proxy` with a short timeout, used
/// to check that a proxy answers before it joins a rotating pool.
///
/// # Errors
///
/// An [`Err`] is returned when `proxy` is not a usable proxy URL or the client cannot be built.
pub fn checking_client(proxy: &Url) -> Result<reqwest::blocking::Client, Error> {
    let proxy = reqwest::Proxy::all(proxy.clone()).map_err(|e| Error::wrap(ErrorKind::IO, e))?;

    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(PROXY_CHECK_TIMEOUT)
        .proxy(proxy)
        .build()
        .map_err(|e| Error::wrap(ErrorKind::IO, e))
}

pub(crate) fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| {
        Error::new(
            ErrorKind::Deserialize,
            format!("Invalid selector '{css}': {e:?}"),
        )
    })
}

fn rotating_proxy(proxies: Vec<Url>) -> reqwest::Proxy {
    let next = AtomicUsize::new(0);
    reqwest::Proxy::custom(move |_| {
        if proxies.is_empty() {
            return None;
        }
        let index = next.fetch_add(1, Ordering::Relaxed) % proxies.len();
        Some(proxies[index].clone())
    })
}

#[cfg(test)]
pub(crate) use test::{
    assert_url, impl_text_producer, MockClient, NetworkErrorProducer, Producer, URL_SINK,
};
