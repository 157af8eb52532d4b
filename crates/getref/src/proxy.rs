//! Proxy configuration for the lookup client.
//!
//! Search services block clients that send many queries from the same address, so lookups
//! are usually routed through a pool of proxies that is rotated per request. The pool is
//! either given explicitly or scraped from a public free proxy list. Most free proxies are
//! dead, so a scraped pool is [checked](ProxyConfig::checked) once before use.

use log::{debug, info, trace};
use scraper::Html;
use url::Url;

use crate::{
    api::{selector, Client},
    Error, ErrorKind,
};

/// Public list of free HTTPS capable proxies.
pub const FREE_PROXY_LIST_URL: &str = "https://www.sslproxies.org/";

/// At most this many working proxies are kept by [`ProxyConfig::checked`].
pub const MAX_CHECKED_PROXIES: usize = 10;

// Candidates beyond this are not tried, a check of a dead proxy costs a full timeout.
const CHECK_CANDIDATE_LIMIT: usize = 30;

/// How outbound requests are routed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProxyConfig {
    /// Connect directly.
    #[default]
    Direct,
    /// Rotate through the proxies, one per request.
    Rotating(Vec<Url>),
}

impl ProxyConfig {
    /// A rotating pool from proxy URLs, e.g. `http://127.0.0.1:8080`.
    ///
    /// # Errors
    ///
    /// An [`Err`] of [`ErrorKind::Deserialize`] is returned when a proxy is not a valid URL and
    /// of [`ErrorKind::NoValue`] when no proxy is given.
    pub fn rotating<I, S>(proxies: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = proxies
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Url::parse(p).map_err(|e| {
                    Error::new(ErrorKind::Deserialize, format!("Invalid proxy URL '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if proxies.is_empty() {
            Err(Error::new(ErrorKind::NoValue, "No proxies given"))
        } else {
            Ok(Self::Rotating(proxies))
        }
    }

    /// A rotating pool of free proxies fetched from [`FREE_PROXY_LIST_URL`] with `client`.
    ///
    /// # Errors
    ///
    /// An [`Err`] is returned when the list cannot be fetched or holds no usable proxy.
    pub fn free_proxies<C: Client>(client: &C) -> Result<Self, Error> {
        info!("Fetching free proxies from {FREE_PROXY_LIST_URL}");
        let html = client.get_text(FREE_PROXY_LIST_URL)?;
        let proxies = parse_free_proxy_list(&html)?;
        info!("Found {} free proxies", proxies.len());
        Ok(Self::Rotating(proxies))
    }

    /// Keep only the proxies that answer a request to [`FREE_PROXY_LIST_URL`].
    ///
    /// `connect` builds a client routed through one proxy, e.g. [`crate::checking_client`].
    /// Proxies are tried in order until [`MAX_CHECKED_PROXIES`] answered. A direct connection
    /// is returned unchanged.
    ///
    /// # Errors
    ///
    /// An [`Err`] of [`ErrorKind::NoValue`] is returned when no proxy answered.
    pub fn checked<F, C>(self, mut connect: F) -> Result<Self, Error>
    where
        F: FnMut(&Url) -> Result<C, Error>,
        C: Client,
    {
        let proxies = match self {
            Self::Direct => return Ok(Self::Direct),
            Self::Rotating(proxies) => proxies,
        };

        info!("Checking up to {CHECK_CANDIDATE_LIMIT} of {} proxies", proxies.len());
        let working = proxies
            .into_iter()
            .take(CHECK_CANDIDATE_LIMIT)
            .filter(|proxy| {
                match connect(proxy).and_then(|client| client.get_text(FREE_PROXY_LIST_URL)) {
                    Ok(_) => true,
                    Err(err) => {
                        debug!("Dropping proxy {proxy}: {err}");
                        false
                    }
                }
            })
            .take(MAX_CHECKED_PROXIES)
            .collect::<Vec<_>>();

        if working.is_empty() {
            Err(Error::new(ErrorKind::NoValue, "None of the proxies answered"))
        } else {
            info!("{} proxies answered", working.len());
            Ok(Self::Rotating(working))
        }
    }

    /// Number of proxies in the pool, zero for a direct connection.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Direct => 0,
            Self::Rotating(proxies) => proxies.len(),
        }
    }

    /// Whether the pool holds no proxy, which is always the case for a direct connection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// The list is a table with the columns:
// IP Address | Port | Code | Country | Anonymity | Google | Https | Last Checked
fn parse_free_proxy_list(html: &str) -> Result<Vec<Url>, Error> {
    let document = Html::parse_document(html);
    let rows = selector("table tbody tr")?;
    let cells = selector("td")?;

    let proxies = document
        .select(&rows)
        .filter_map(|row| {
            let columns = row
                .select(&cells)
                .map(|td| td.text().collect::<String>().trim().to_owned())
                .collect::<Vec<_>>();

            match columns.as_slice() {
                [ip, port, _, _, _, _, https, ..] if https == "yes" => {
                    Url::parse(&format!("http://{ip}:{port}")).ok()
                }
                _ => None,
            }
        })
        .collect::<Vec<_>>();

    trace!("Parsed {} https proxies from the list", proxies.len());

    if proxies.is_empty() {
        Err(Error::new(
            ErrorKind::NoValue,
            "The free proxy list did not contain any https proxies",
        ))
    } else {
        Ok(proxies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{assert_url, impl_text_producer, MockClient, NetworkErrorProducer};

    const FREE_PROXY_LIST: &str = include_str!("../tests/data/free_proxy_list.html");

    impl_text_producer! {
        ProxyListProducer => |url| Ok(FREE_PROXY_LIST.to_owned()),
        EmptyTableProducer => |url| Ok("<table><tbody></tbody></table>".to_owned()),
    }

    #[test]
    fn only_https_proxies_are_kept() {
        let proxies = parse_free_proxy_list(FREE_PROXY_LIST).unwrap();
        let proxies = proxies.iter().map(Url::as_str).collect::<Vec<_>>();

        assert_eq!(vec!["http://51.158.68.133:8811/", "http://20.111.54.16:8123/"], proxies);
    }

    #[test]
    fn free_proxies_are_fetched_from_the_list_url() {
        let config = ProxyConfig::free_proxies(&MockClient::<ProxyListProducer>::new()).unwrap();

        assert_url!(0, FREE_PROXY_LIST_URL);
        assert_eq!(2, config.len());
    }

    #[test]
    fn list_without_https_proxies_is_no_value() {
        let err = ProxyConfig::free_proxies(&MockClient::<EmptyTableProducer>::new()).unwrap_err();
        assert_eq!(ErrorKind::NoValue, err.kind());
    }

    #[test]
    fn network_error_is_passed_on() {
        let err =
            ProxyConfig::free_proxies(&MockClient::<NetworkErrorProducer>::new()).unwrap_err();
        assert_eq!(ErrorKind::IO, err.kind());
    }

    #[test]
    fn rotating_pool_from_urls() {
        let config = ProxyConfig::rotating(vec!["http://127.0.0.1:8080".to_owned()]).unwrap();
        assert_eq!(1, config.len());
        assert!(!config.is_empty());
    }

    #[test]
    fn invalid_proxy_url_is_rejected() {
        let err = ProxyConfig::rotating(["not a proxy"]).unwrap_err();
        assert_eq!(ErrorKind::Deserialize, err.kind());
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = ProxyConfig::rotating(Vec::<String>::new()).unwrap_err();
        assert_eq!(ErrorKind::NoValue, err.kind());
    }

    #[test]
    fn direct_connection_has_no_proxies() {
        assert_eq!(0, ProxyConfig::Direct.len());
        assert!(ProxyConfig::default().is_empty());
    }

    #[test]
    fn rotating_pool_without_proxies_is_empty() {
        let config = ProxyConfig::Rotating(Vec::new());
        assert_eq!(0, config.len());
        assert!(config.is_empty());
    }

    // Answers only when routed through a proxy on port 8811.
    struct ThroughProxy(Url);

    impl Client for ThroughProxy {
        fn get_text(&self, url: &str) -> Result<String, Error> {
            assert_eq!(FREE_PROXY_LIST_URL, url);
            if self.0.port() == Some(8811) {
                Ok(FREE_PROXY_LIST.to_owned())
            } else {
                Err(Error::new(ErrorKind::IO, "tcp connect error: Connection refused"))
            }
        }
    }

    fn through_proxy(proxy: &Url) -> Result<ThroughProxy, Error> {
        Ok(ThroughProxy(proxy.clone()))
    }

    #[test]
    fn unreachable_proxies_are_dropped() {
        let config = ProxyConfig::rotating([
            "http://127.0.0.1:9",
            "http://51.158.68.133:8811",
            "http://20.111.54.16:8123",
        ])
        .unwrap();

        let config = config.checked(through_proxy).unwrap();

        assert_eq!(
            ProxyConfig::rotating(["http://51.158.68.133:8811"]).unwrap(),
            config
        );
    }

    #[test]
    fn no_answering_proxy_is_no_value() {
        let config = ProxyConfig::rotating(["http://127.0.0.1:9", "http://127.0.0.1:10"]).unwrap();

        let err = config.checked(through_proxy).unwrap_err();
        assert_eq!(ErrorKind::NoValue, err.kind());
    }

    #[test]
    fn proxy_without_client_is_dropped() {
        let config = ProxyConfig::rotating(["http://51.158.68.133:8811", "http://10.0.0.1:8811"])
            .unwrap();

        let config = config
            .checked(|proxy| {
                if proxy.host_str() == Some("10.0.0.1") {
                    Err(Error::new(ErrorKind::IO, "cannot build client"))
                } else {
                    through_proxy(proxy)
                }
            })
            .unwrap();

        assert_eq!(1, config.len());
    }

    #[test]
    fn checking_stops_once_enough_proxies_answered() {
        let proxies = (1..=MAX_CHECKED_PROXIES + 5).map(|i| format!("http://10.0.0.{i}:8811"));
        let config = ProxyConfig::rotating(proxies).unwrap();
        let mut checked = 0;

        let config = config
            .checked(|proxy| {
                checked += 1;
                through_proxy(proxy)
            })
            .unwrap();

        assert_eq!(MAX_CHECKED_PROXIES, config.len());
        assert_eq!(MAX_CHECKED_PROXIES, checked);
    }

    #[test]
    fn direct_connection_is_not_checked() {
        let config = ProxyConfig::Direct
            .checked(|_| -> Result<ThroughProxy, Error> { panic!("nothing to check") })
            .unwrap();

        assert_eq!(ProxyConfig::Direct, config);
    }
}
