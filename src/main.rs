//! # Latinum
//!
//! Latinum prepares a Latin-English sentence-aligned corpus for
//! translation-model training, from the word-aligned parallel texts of
//! the Perseus Digital Library.
//!
//! Three stages run in order, each reading the previous one's output
//! from disk: download the aligned XML documents, extract the parallel
//! sentences into one file per language, normalize each sentence into a
//! model-ready line.
//!
//! ## Getting started
//!
//! ```sh
//! latinum 0.1.0
//! Latin-English parallel corpus preparation tool.
//!
//! USAGE:
//!     latinum [SUBCOMMAND]
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! SUBCOMMANDS:
//!     download      Download aligned XML documents from the Perseus archive
//!     extract       Extract parallel sentences from the downloaded documents
//!     help          Prints this message or the help of the given subcommand(s)
//!     preprocess    Normalize extracted sentences into model-ready lines
//! ```
//!
//! Without a subcommand, every stage runs in order.

use structopt::StructOpt;

#[macro_use]
extern crate log;

use latinum::cli;
use latinum::download::Downloader;
use latinum::error::Error;
use latinum::extract::Extractor;
use latinum::layout;
use latinum::normalize::Normalizer;
use latinum::pipeline::Pipeline;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Latinum::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt.mode {
        Some(cli::Mode::Download) => download()?,
        Some(cli::Mode::Extract) => extract()?,
        Some(cli::Mode::Preprocess) => preprocess()?,
        None => {
            download()?;
            extract()?;
            preprocess()?;
        }
    };
    Ok(())
}

fn download() -> Result<(), Error> {
    let downloader = Downloader::new(&layout::xml_dir());
    let saved = downloader.run()?;
    info!("saved {} documents", saved);
    Ok(())
}

fn extract() -> Result<(), Error> {
    let extractor = Extractor::new(&layout::xml_dir(), &layout::sentences_dir());
    extractor.run()?;
    Ok(())
}

fn preprocess() -> Result<(), Error> {
    let normalizer = Normalizer::new(&layout::sentences_dir());
    normalizer.run()?;
    Ok(())
}
