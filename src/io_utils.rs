//! CSV reading, encoding, and delimiter plumbing.
//!
//! Delimiters resolve from the file extension (`.tsv` → tab, everything
//! else → comma) unless overridden. Input decoding goes through
//! `encoding_rs`, defaulting to UTF-8; its BOM sniffing makes `utf-8-sig`
//! style exports read cleanly.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Opens a raw-record reader. Header handling is the caller's concern: the
/// loader consumes a configurable number of leading records before the
/// header row, so the `csv` crate's own header logic stays disabled.
pub fn open_csv_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    Ok(builder.from_reader(BufReader::new(file)))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimiter_follows_extension_unless_overridden() {
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("a.tsv"), None),
            b'\t'
        );
        assert_eq!(resolve_input_delimiter(&PathBuf::from("a.csv"), None), b',');
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("a.tsv"), Some(b';')),
            b';'
        );
    }

    #[test]
    fn unknown_encoding_labels_are_rejected() {
        assert!(resolve_encoding(Some("utf-8")).is_ok());
        assert!(resolve_encoding(Some("windows-1252")).is_ok());
        assert!(resolve_encoding(Some("not-a-charset")).is_err());
    }

    #[test]
    fn bom_is_stripped_during_decode() {
        let bytes = b"\xef\xbb\xbfid";
        assert_eq!(decode_bytes(bytes, UTF_8).unwrap(), "id");
    }
}
