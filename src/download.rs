//! Document retrieval from the Perseus Digital Library archive.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};

use crate::error::Error;
use crate::layout;
use crate::pipeline::Pipeline;

const BASE_URL: &str =
    "https://raw.githubusercontent.com/PerseusDL/dynamic-lexicon/master/data/auto-aligned-parallel-txts/latinParallelText/";

/// Number of document indices to probe. Not every index resolves
/// to an existing document.
pub const DOCUMENT_COUNT: usize = 40;

/// Archive URL of the aligned document at `index`.
pub fn document_url(index: usize) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}Perseus-text-1999.02.{:04}.xml",
        BASE_URL, index
    ))
}

/// Holds the destination directory and the
/// http client that will make the requests.
pub struct Downloader {
    dst: PathBuf,
    client: Client,
}

impl Downloader {
    pub fn new(dst: &Path) -> Self {
        Self {
            dst: dst.to_path_buf(),
            client: Client::new(),
        }
    }

    /// Attempt to download `url`, storing the body in `text_<file_number>.xml`.
    ///
    /// Returns `Ok(false)` when the archive answers with anything other
    /// than 200, so that file numbering stays dense over missing indices.
    fn fetch(&self, url: &Url, file_number: usize) -> Result<bool, Error> {
        debug!("downloading {}", url);
        let response = self.client.get(url.clone()).send()?;
        if response.status() != StatusCode::OK {
            debug!("skipping {} (status {})", url, response.status());
            return Ok(false);
        }

        let path = self.dst.join(format!("text_{}.xml", file_number));
        let mut out = File::create(path)?;
        let mut buf = BufReader::new(response);
        std::io::copy(&mut buf, &mut out)?;

        Ok(true)
    }
}

impl Pipeline<usize> for Downloader {
    /// Sequentially fetch every document index into a fresh directory.
    ///
    /// Request failures and missing documents are skipped; write
    /// failures abort the run.
    fn run(&self) -> Result<usize, Error> {
        layout::reset_dir(&self.dst)?;

        let mut saved = 0;
        for index in 0..DOCUMENT_COUNT {
            println!("requesting {}/{}", index + 1, DOCUMENT_COUNT);
            let url = document_url(index)?;
            match self.fetch(&url, saved + 1) {
                Ok(true) => saved += 1,
                Ok(false) => (),
                Err(Error::Request(e)) => warn!("request failed for {}: {}", url, e),
                Err(e) => return Err(e),
            }
        }

        Ok(saved)
    }
}
