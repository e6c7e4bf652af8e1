//! Parallel sentence extraction from word-aligned XML documents.
//!
//! Documents follow the Perseus aligned-text schema: `<wds>` elements
//! bundle one sentence's `<w>` word elements, and the `lnum` attribute
//! tells which side of the alignment the sentence belongs to (`L1` is
//! Latin, anything else is the English rendering). A word's token is the
//! text of its first child element, before any nested markup.
//!
//! Parsing is event-based so peak memory stays bounded no matter how
//! large a document is.
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::info;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Error;
use crate::lang::Lang;
use crate::layout;
use crate::pipeline::Pipeline;

/// Element bundling the words of one aligned sentence.
const SENTENCE_GROUP_TAG: &[u8] = b"wds";
/// Word element inside a sentence group.
const WORD_TAG: &[u8] = b"w";
/// Attribute carrying the alignment line marker.
const LINE_ATTRIBUTE: &str = "lnum";
/// Marker value of the Latin line of an alignment pair.
const LATIN_LINE: &str = "L1";

/// Per-language sentence tallies for one extraction run.
///
/// The two tallies are expected to match only when every document
/// pairs each Latin group with exactly one English group. That pairing
/// is an assumption of the source schema and is not enforced here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionCounts {
    pub latin: usize,
    pub english: usize,
}

/// Reads every downloaded document and splits its sentence groups
/// into one file per language.
pub struct Extractor {
    src: PathBuf,
    dst: PathBuf,
}

impl Extractor {
    pub fn new(src: &Path, dst: &Path) -> Self {
        Self {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        }
    }
}

impl Pipeline<ExtractionCounts> for Extractor {
    /// Processes files in directory-listing order. Cross-document
    /// ordering is whatever the filesystem yields; only the order of
    /// sentences within a document is meaningful.
    fn run(&self) -> Result<ExtractionCounts, Error> {
        layout::reset_dir(&self.dst)?;

        let mut latin = BufWriter::new(File::create(self.dst.join(Lang::Latin.raw_file()))?);
        let mut english = BufWriter::new(File::create(self.dst.join(Lang::English.raw_file()))?);

        let mut counts = ExtractionCounts::default();
        for entry in fs::read_dir(&self.src)? {
            let path = entry?.path();
            info!("extracting sentences from {:?}", path);
            let mut reader = Reader::from_file(&path)?;
            extract_from(&mut reader, &mut latin, &mut english, &mut counts)?;
        }

        latin.flush()?;
        english.flush()?;
        info!(
            "extracted {} latin / {} english sentences",
            counts.latin, counts.english
        );
        Ok(counts)
    }
}

/// Where the cursor currently sits, relative to the schema.
///
/// The depth counters let ignorable subtrees (non-word children of a
/// group, trailing children of a word) pass through without state loss.
enum State {
    /// Outside any sentence group.
    Document,
    /// Directly inside a sentence group.
    Group,
    /// Inside an ignorable child of a sentence group.
    GroupChild(usize),
    /// Directly inside a word, between its children.
    Word,
    /// Inside the first child of a word, collecting its text.
    Token(usize),
    /// Inside a later child of a word.
    WordChild(usize),
}

/// Streams one document, appending each sentence group's space-joined
/// tokens to the writer selected by its line marker.
///
/// Structural defects are fatal: a group without a line marker or a
/// word without usable text aborts the run before anything is written
/// for that group.
fn extract_from<R, W>(
    reader: &mut Reader<R>,
    latin: &mut W,
    english: &mut W,
    counts: &mut ExtractionCounts,
) -> Result<(), Error>
where
    R: BufRead,
    W: Write,
{
    let mut buf = Vec::new();
    let mut state = State::Document;

    // accumulators for the group being parsed
    let mut line_marker = String::new();
    let mut words: Vec<String> = Vec::new();

    // accumulators for the word being parsed
    let mut token = String::new();
    let mut saw_text = false;
    let mut token_done = false;
    let mut captured = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match state {
                State::Document => {
                    if e.name().as_ref() == SENTENCE_GROUP_TAG {
                        line_marker = read_line_marker(&e)?;
                        words.clear();
                        state = State::Group;
                    }
                }
                State::Group => {
                    if e.name().as_ref() == WORD_TAG {
                        captured = false;
                        state = State::Word;
                    } else {
                        state = State::GroupChild(1);
                    }
                }
                State::GroupChild(depth) => state = State::GroupChild(depth + 1),
                State::Word => {
                    if captured {
                        state = State::WordChild(1);
                    } else {
                        token.clear();
                        saw_text = false;
                        token_done = false;
                        state = State::Token(1);
                    }
                }
                State::Token(depth) => {
                    token_done = true;
                    state = State::Token(depth + 1);
                }
                State::WordChild(depth) => state = State::WordChild(depth + 1),
            },

            Event::Empty(e) => match state {
                State::Document => {
                    // a childless group still contributes its (empty) line
                    if e.name().as_ref() == SENTENCE_GROUP_TAG {
                        let marker = read_line_marker(&e)?;
                        write_sentence(&marker, &[], latin, english, counts)?;
                    }
                }
                State::Group => {
                    if e.name().as_ref() == WORD_TAG {
                        return Err(Error::MalformedDocument(
                            "word element has no children".to_string(),
                        ));
                    }
                }
                State::Word => {
                    if !captured {
                        return Err(Error::MalformedDocument(
                            "first word child has no text".to_string(),
                        ));
                    }
                }
                State::Token(_) => token_done = true,
                State::GroupChild(_) | State::WordChild(_) => (),
            },

            Event::Text(t) => {
                if let State::Token(1) = state {
                    if !token_done {
                        token.push_str(&t.unescape()?);
                        saw_text = true;
                    }
                }
            }

            Event::CData(t) => {
                if let State::Token(1) = state {
                    if !token_done {
                        token.push_str(&reader.decoder().decode(&t)?);
                        saw_text = true;
                    }
                }
            }

            Event::End(_) => match state {
                State::Document => (),
                State::Group => {
                    // only the group itself can close here
                    write_sentence(&line_marker, &words, latin, english, counts)?;
                    words.clear();
                    state = State::Document;
                }
                State::GroupChild(1) => state = State::Group,
                State::GroupChild(depth) => state = State::GroupChild(depth - 1),
                State::Word => {
                    if !captured {
                        return Err(Error::MalformedDocument(
                            "word element has no children".to_string(),
                        ));
                    }
                    state = State::Group;
                }
                State::Token(1) => {
                    if !saw_text {
                        return Err(Error::MalformedDocument(
                            "first word child has no text".to_string(),
                        ));
                    }
                    words.push(std::mem::take(&mut token));
                    captured = true;
                    state = State::Word;
                }
                State::Token(depth) => state = State::Token(depth - 1),
                State::WordChild(1) => state = State::Word,
                State::WordChild(depth) => state = State::WordChild(depth - 1),
            },

            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    if !matches!(state, State::Document) {
        return Err(Error::MalformedDocument(
            "input ended inside a sentence group".to_string(),
        ));
    }

    Ok(())
}

/// Line marker of a sentence group. Its absence is fatal: without it
/// the sentence cannot be routed to either side of the pair.
fn read_line_marker(e: &quick_xml::events::BytesStart) -> Result<String, Error> {
    Ok(e.try_get_attribute(LINE_ATTRIBUTE)?
        .ok_or_else(|| {
            Error::MalformedDocument(format!(
                "sentence group without `{}` attribute",
                LINE_ATTRIBUTE
            ))
        })?
        .unescape_value()?
        .into_owned())
}

fn write_sentence<W: Write>(
    line_marker: &str,
    words: &[String],
    latin: &mut W,
    english: &mut W,
    counts: &mut ExtractionCounts,
) -> Result<(), Error> {
    let sentence = words.iter().join(" ");
    if line_marker == LATIN_LINE {
        writeln!(latin, "{}", sentence)?;
        counts.latin += 1;
    } else {
        writeln!(english, "{}", sentence)?;
        counts.english += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_str(xml: &str) -> Result<(String, String, ExtractionCounts), Error> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut latin = Vec::new();
        let mut english = Vec::new();
        let mut counts = ExtractionCounts::default();
        extract_from(&mut reader, &mut latin, &mut english, &mut counts)?;
        Ok((
            String::from_utf8(latin).unwrap(),
            String::from_utf8(english).unwrap(),
            counts,
        ))
    }

    #[test]
    fn routes_latin_line_to_latin_file() {
        let xml = r#"<doc><wds lnum="L1"><w><text>Arma</text></w><w><text>virumque</text></w><w><text>cano</text></w></wds></doc>"#;
        let (latin, english, counts) = extract_str(xml).unwrap();

        assert_eq!(latin, "Arma virumque cano\n");
        assert_eq!(english, "");
        assert_eq!(counts, ExtractionCounts { latin: 1, english: 0 });
    }

    #[test]
    fn routes_other_lines_to_english_file() {
        let xml = r#"<doc><wds lnum="L2"><w><text>I</text></w><w><text>sing</text></w></wds></doc>"#;
        let (latin, english, counts) = extract_str(xml).unwrap();

        assert_eq!(latin, "");
        assert_eq!(english, "I sing\n");
        assert_eq!(counts, ExtractionCounts { latin: 0, english: 1 });
    }

    #[test]
    fn one_line_per_group_in_document_order() {
        let xml = r#"<doc>
            <sentence><wds lnum="L1"><w><text>Gallia</text></w></wds>
            <wds lnum="L2"><w><text>Gaul</text></w></wds></sentence>
            <sentence><wds lnum="L1"><w><text>est</text></w></wds>
            <wds lnum="L2"><w><text>is</text></w></wds></sentence>
        </doc>"#;
        let (latin, english, counts) = extract_str(xml).unwrap();

        assert_eq!(latin, "Gallia\nest\n");
        assert_eq!(english, "Gaul\nis\n");
        assert_eq!(counts.latin + counts.english, 4);
    }

    #[test]
    fn token_is_text_before_nested_markup() {
        let xml = r#"<doc><wds lnum="L1"><w><text>Arma<note>gloss</note> tail</text></w></wds></doc>"#;
        let (latin, _, _) = extract_str(xml).unwrap();

        assert_eq!(latin, "Arma\n");
    }

    #[test]
    fn later_word_children_are_ignored() {
        let xml = r#"<doc><wds lnum="L1"><w><text>cano</text><lemma>cano</lemma><n>3</n></w></wds></doc>"#;
        let (latin, _, _) = extract_str(xml).unwrap();

        assert_eq!(latin, "cano\n");
    }

    #[test]
    fn non_word_group_children_are_skipped() {
        let xml = r#"<doc><wds lnum="L1"><milestone unit="verse"/><w><text>cano</text></w><note><w><text>not me</text></w></note></wds></doc>"#;
        let (latin, _, counts) = extract_str(xml).unwrap();

        assert_eq!(latin, "cano\n");
        assert_eq!(counts.latin, 1);
    }

    #[test]
    fn missing_line_marker_is_fatal() {
        let xml = r#"<doc><wds><w><text>Arma</text></w></wds></doc>"#;
        let err = extract_str(xml).unwrap_err();

        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn nothing_is_written_before_the_failure() {
        let xml = r#"<doc>
            <wds lnum="L1"><w><text>Arma</text></w></wds>
            <wds><w><text>orphan</text></w></wds>
        </doc>"#;
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut latin = Vec::new();
        let mut english = Vec::new();
        let mut counts = ExtractionCounts::default();

        let result = extract_from(&mut reader, &mut latin, &mut english, &mut counts);

        assert!(result.is_err());
        assert_eq!(String::from_utf8(latin).unwrap(), "Arma\n");
        assert_eq!(String::from_utf8(english).unwrap(), "");
    }

    #[test]
    fn childless_word_is_fatal() {
        for xml in [
            r#"<doc><wds lnum="L1"><w/></wds></doc>"#,
            r#"<doc><wds lnum="L1"><w></w></wds></doc>"#,
        ] {
            let err = extract_str(xml).unwrap_err();
            assert!(matches!(err, Error::MalformedDocument(_)));
        }
    }

    #[test]
    fn textless_first_child_is_fatal() {
        for xml in [
            r#"<doc><wds lnum="L1"><w><text/></w></wds></doc>"#,
            r#"<doc><wds lnum="L1"><w><text></text></w></wds></doc>"#,
        ] {
            let err = extract_str(xml).unwrap_err();
            assert!(matches!(err, Error::MalformedDocument(_)));
        }
    }

    #[test]
    fn empty_group_contributes_an_empty_line() {
        let xml = r#"<doc><wds lnum="L2"/></doc>"#;
        let (latin, english, counts) = extract_str(xml).unwrap();

        assert_eq!(latin, "");
        assert_eq!(english, "\n");
        assert_eq!(counts.english, 1);
    }

    #[test]
    fn entities_in_tokens_are_unescaped() {
        let xml = r#"<doc><wds lnum="L2"><w><text>bread &amp; circuses</text></w></wds></doc>"#;
        let (_, english, _) = extract_str(xml).unwrap();

        assert_eq!(english, "bread & circuses\n");
    }
}
