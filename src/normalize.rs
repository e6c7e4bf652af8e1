//! Sentence normalization into model-ready lines.
//!
//! Each extracted sentence is cleaned (diacritics stripped, lower-cased,
//! punctuation isolated, everything else collapsed to single spaces) and
//! wrapped in start/end sentinel tokens.
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::Error;
use crate::lang::LANGS;
use crate::pipeline::Pipeline;

/// Token opening every formatted sentence.
pub const SENTENCE_START: &str = "<start>";
/// Token closing every formatted sentence.
pub const SENTENCE_END: &str = "<end>";

lazy_static! {
    /// Punctuation kept in the corpus, isolated with surrounding spaces.
    static ref PUNCTUATION: Regex = Regex::new(r"([?.!,¿])").unwrap();
    static ref SPACES: Regex = Regex::new(r"\s+").unwrap();
    /// Anything that is neither an ASCII letter nor kept punctuation.
    static ref NON_LETTER: Regex = Regex::new(r"[^a-zA-Z?.!,¿]+").unwrap();
}

/// Cleans one raw sentence.
///
/// Decomposition runs before lower-casing and before the ASCII-only
/// filter, so accented Latin letters survive as their base letters
/// instead of being dropped. The result is stable under re-application.
pub fn clean_line(line: &str) -> String {
    let stripped: String = line.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = stripped.to_lowercase();
    let trimmed = lowered.trim();
    let spaced = PUNCTUATION.replace_all(trimmed, " $1 ");
    let collapsed = SPACES.replace_all(&spaced, " ");
    let lettered = NON_LETTER.replace_all(&collapsed, " ");
    lettered.trim().to_string()
}

/// Cleans one raw sentence and wraps it in sentinel tokens.
pub fn normalize_line(line: &str) -> String {
    format!("{} {} {}", SENTENCE_START, clean_line(line), SENTENCE_END)
}

/// Rewrites each extracted sentence file into its formatted counterpart.
pub struct Normalizer {
    sentences: PathBuf,
}

impl Normalizer {
    pub fn new(sentences: &Path) -> Self {
        Self {
            sentences: sentences.to_path_buf(),
        }
    }
}

impl Pipeline<()> for Normalizer {
    /// Streams line by line; the formatted files live next to their
    /// inputs and are overwritten on every run.
    fn run(&self) -> Result<(), Error> {
        for lang in LANGS {
            let src = self.sentences.join(lang.raw_file());
            let dst = self.sentences.join(lang.formatted_file());
            info!("formatting {:?} into {:?}", src, dst);

            let input = BufReader::new(File::open(src)?);
            let mut output = BufWriter::new(File::create(dst)?);
            for line in input.lines() {
                writeln!(output, "{}", normalize_line(&line?))?;
            }
            output.flush()?;
        }
        Ok(())
    }
}
