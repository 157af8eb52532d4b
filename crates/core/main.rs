#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::{error, path::PathBuf, process};

mod app;
mod file;

use app::Progress;

use getref::{format::CiteFormat, proxy::ProxyConfig};

use clap::{ArgEnum, Parser};
use eyre::Context;
use log::{info, trace, warn};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{:#}", err);
        process::exit(2);
    }
}

fn try_main() -> Result<(), Box<dyn error::Error>> {
    let Cli {
        file,
        output,
        format,
        proxy,
        no_proxy,
        verbosity,
        quiet,
    } = Cli::parse();

    setup_errlog(verbosity as usize, quiet)?;

    let references = file::read_references(&file)?;
    trace!("Read {} references from '{}'", references.len(), file.display());

    let proxy = proxy_config(proxy, no_proxy)?;
    let format = CiteFormat::from(format);
    let scholar = getref::scholar(&proxy)?.with_format(format);

    let progress = Progress::new(references.len(), quiet);
    let records = app::lookup_references(&references, |query| scholar.lookup(query), &progress);
    progress.finish();

    let rendered = app::render(&records);
    match output {
        Some(path) => {
            let path = file::write_records(&path, format, &rendered)?;
            info!("Records written to '{}'", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn setup_errlog(verbosity: usize, quiet: bool) -> Result<(), Box<dyn error::Error>> {
    // if quiet then ignore verbosity but still show errors
    let verbosity = if quiet { 0 } else { verbosity + 1 };

    stderrlog::new().verbosity(verbosity).init()?;
    Ok(())
}

fn proxy_config(proxies: Vec<String>, no_proxy: bool) -> eyre::Result<ProxyConfig> {
    if no_proxy {
        trace!("--no-proxy used - connecting directly");
        return Ok(ProxyConfig::Direct);
    }

    if !proxies.is_empty() {
        trace!("'proxy' option used with {} proxies", proxies.len());
        return ProxyConfig::rotating(proxies).wrap_err("Cannot use the given proxies");
    }

    let direct = getref::http_client(&ProxyConfig::Direct)?;
    match ProxyConfig::free_proxies(&direct).and_then(|free| free.checked(getref::checking_client))
    {
        Ok(config) => {
            info!("Using {} rotating free proxies that answered", config.len());
            Ok(config)
        }
        Err(err) => {
            warn!("No working free proxies available, connecting directly: {err}");
            Ok(ProxyConfig::Direct)
        }
    }
}

#[derive(Parser)]
#[clap(name = "getref")]
#[clap(
    about = "Look up the bibliographic record of every reference in a file using Google Scholar"
)]
#[clap(version, author)]
struct Cli {
    /// The file holding one reference per line
    #[clap(short, long, parse(from_os_str), default_value = "refs.txt")]
    file: PathBuf,

    /// Write the records to this file instead of stdout
    ///
    /// The extension of the format is added when the path has none.
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// The format of the records
    #[clap(long, arg_enum, default_value = "bibtex")]
    format: FormatArg,

    /// A proxy to route requests through, can be used multiple times to rotate between proxies
    ///
    /// When no proxy is given a list of free proxies is fetched.
    #[clap(short, long)]
    proxy: Vec<String>,

    /// Connect to Google Scholar directly without any proxy, overrides --proxy
    #[clap(long)]
    no_proxy: bool,

    /// How chatty the program is when performing lookups
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Hides the progress bar and lookup notices, errors will still be printed to stderr.
    #[clap(short, long)]
    quiet: bool,
}

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Bibtex,
    Endnote,
    Refman,
}

impl From<FormatArg> for CiteFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Bibtex => Self::BibTex,
            FormatArg::Endnote => Self::EndNote,
            FormatArg::Refman => Self::RefMan,
        }
    }
}
