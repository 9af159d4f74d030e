//! CSV ingestion and field normalization.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::{AddressLayout, FieldNames};
use crate::error::Error;

/// One input row, keyed by header name. Absent keys read as empty strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecipientName {
    /// Schema with one name column.
    Combined(String),
    /// Schema with separate surname / given-name columns.
    Split { surname: String, given: String },
}

impl RecipientName {
    pub fn is_empty(&self) -> bool {
        match self {
            RecipientName::Combined(name) => name.is_empty(),
            RecipientName::Split { surname, given } => surname.is_empty() && given.is_empty(),
        }
    }
}

/// A normalized label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelRecord {
    pub postal: String,
    pub address: String,
    pub name: RecipientName,
}

impl LabelRecord {
    pub fn from_raw(raw: &RawRecord, fields: &FieldNames, address: &AddressLayout) -> Self {
        let name = if raw.has_key(&fields.surname) || raw.has_key(&fields.given) {
            RecipientName::Split {
                surname: raw.get(&fields.surname).trim().to_string(),
                given: raw.get(&fields.given).trim().to_string(),
            }
        } else {
            RecipientName::Combined(raw.get(&fields.name).trim().to_string())
        };
        Self {
            postal: normalize_postal(raw.get(&fields.postal)),
            address: normalize_address(raw.get(&fields.address), address.dash_to_long_vowel),
            name,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.postal.is_empty() && self.address.is_empty() && self.name.is_empty()
    }
}

fn ascii_digit(ch: char) -> Option<char> {
    match ch {
        '0'..='9' => Some(ch),
        '０'..='９' => char::from_u32(ch as u32 - '０' as u32 + '0' as u32),
        _ => None,
    }
}

/// `"1234567"` → `"123-4567"`. Anything that does not reduce to exactly seven
/// digits comes back trimmed but otherwise untouched.
pub fn normalize_postal(raw: &str) -> String {
    let digits: String = raw.chars().filter_map(ascii_digit).collect();
    if digits.len() == 7 {
        return format!("{}-{}", &digits[..3], &digits[3..]);
    }
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        log::warn!("Postal code {trimmed:?} does not have 7 digits; printing as-is");
    }
    trimmed.to_string()
}

/// Trim, and optionally fold hyphen-like dashes into `ー` so block numbers
/// read as one continuous vertical stroke.
pub fn normalize_address(raw: &str, dash_to_long_vowel: bool) -> String {
    let trimmed = raw.trim();
    if dash_to_long_vowel {
        trimmed
            .chars()
            .map(|ch| match ch {
                '-' | '−' | '―' => 'ー',
                other => other,
            })
            .collect()
    } else {
        trimmed.to_string()
    }
}

fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

/// Parse CSV with a header row. `origin` is only used in error messages.
pub fn read_records<R: Read>(reader: R, origin: &Path) -> Result<Vec<RawRecord>, Error> {
    let csv_err = |source| Error::Csv {
        path: origin.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers().map_err(csv_err)?.iter().map(clean_header).collect();

    let mut records: Vec<RawRecord> = Vec::new();
    for row in rdr.byte_records() {
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(csv_err(e)),
            Err(e) => {
                log::warn!("{}: skipping unreadable row: {e}", origin.display());
                continue;
            }
        };
        if std::str::from_utf8(row.as_slice()).is_err() {
            let line = row.position().map_or(0, |p| p.line());
            log::warn!("{}:{line}: invalid UTF-8, undecodable bytes replaced", origin.display());
        }
        // short rows read as empty trailing fields so the schema stays per-file
        records.push(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let field = row.get(i).map(String::from_utf8_lossy).unwrap_or_default();
                    (h.clone(), field.into_owned())
                })
                .collect(),
        );
    }
    Ok(records)
}

pub fn read_csv(path: &Path) -> Result<Vec<RawRecord>, Error> {
    let file = std::fs::File::open(path).map_err(Error::io_at(path))?;
    let records = read_records(std::io::BufReader::new(file), path)?;
    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Expand files and directories into the CSV files to process. Directory
/// contents are sorted by file name; explicit files keep their given order.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && is_csv(p))
                .collect();
            found.sort();
            if found.is_empty() {
                log::warn!("No CSV files in {}", path.display());
            }
            inputs.extend(found);
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_with_seven_digits_is_hyphenated() {
        assert_eq!(normalize_postal("1234567"), "123-4567");
        assert_eq!(normalize_postal(" 123-4567 "), "123-4567");
        assert_eq!(normalize_postal("〒１５０－０００２"), "150-0002");
    }

    #[test]
    fn malformed_postal_passes_through_trimmed() {
        assert_eq!(normalize_postal("abc12"), "abc12");
        assert_eq!(normalize_postal("  12345678 "), "12345678");
        assert_eq!(normalize_postal(""), "");
    }

    #[test]
    fn address_dashes_fold_into_long_vowel() {
        assert_eq!(normalize_address(" 渋谷区1-2−3―4 ", true), "渋谷区1ー2ー3ー4");
        assert_eq!(normalize_address("渋谷区1-2", false), "渋谷区1-2");
    }

    #[test]
    fn split_schema_is_detected_from_keys() {
        let fields = FieldNames::default();
        let address = AddressLayout::default();
        let raw: RawRecord = [("郵便番号", "1500002"), ("住所", "東京都 渋谷区"), ("氏", "山田 "), ("名", "太郎")]
            .into_iter()
            .collect();
        let record = LabelRecord::from_raw(&raw, &fields, &address);
        assert_eq!(record.postal, "150-0002");
        assert_eq!(
            record.name,
            RecipientName::Split {
                surname: "山田".into(),
                given: "太郎".into()
            }
        );

        let raw: RawRecord = [("住所", "大阪府"), ("氏名", "佐藤花子")].into_iter().collect();
        let record = LabelRecord::from_raw(&raw, &fields, &address);
        assert_eq!(record.name, RecipientName::Combined("佐藤花子".into()));
        assert_eq!(record.postal, "");
    }

    #[test]
    fn blank_row_is_empty() {
        let raw: RawRecord = [("郵便番号", " "), ("住所", ""), ("氏", ""), ("名", "  ")]
            .into_iter()
            .collect();
        let record = LabelRecord::from_raw(&raw, &FieldNames::default(), &AddressLayout::default());
        assert!(record.is_empty());
    }

    #[test]
    fn csv_headers_are_cleaned_and_short_rows_allowed() {
        let data = "\u{feff}郵便番号, 住所 ,氏,名\n1234567,東京都 渋谷区1-2-3,山田,太郎\n7654321,大阪府\n";
        let records = read_records(data.as_bytes(), Path::new("mem.csv")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("郵便番号"), "1234567");
        assert_eq!(records[0].get("住所"), "東京都 渋谷区1-2-3");
        assert_eq!(records[1].get("氏"), "");
        assert!(records[1].has_key("名"));
    }

    #[test]
    fn undecodable_row_does_not_drop_its_neighbours() {
        let mut data = "郵便番号,住所,氏名\n1500001,東京都 渋谷区,宛先0\n".as_bytes().to_vec();
        data.extend_from_slice(b"1500002,\xff\xfe bad,x\n");
        data.extend_from_slice("1500003,大阪府 北区,宛先2\n".as_bytes());

        let records = read_records(data.as_slice(), Path::new("mem.csv")).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("氏名"), "宛先0");
        assert_eq!(records[1].get("郵便番号"), "1500002");
        assert!(records[1].get("住所").ends_with(" bad"));
        assert_eq!(records[2].get("住所"), "大阪府 北区");
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let data = "住所,氏名\n\"東京都千代田区1,2\",鈴木\n";
        let records = read_records(data.as_bytes(), Path::new("mem.csv")).unwrap();
        assert_eq!(records[0].get("住所"), "東京都千代田区1,2");
    }
}
