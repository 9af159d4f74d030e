#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use atena_pdf::FontProgram;

pub const HEADER_COMBINED: &str = "郵便番号,住所,氏名";
pub const HEADER_SPLIT: &str = "郵便番号,住所,氏,名";

/// Write `rows` under `header` as `<dir>/<name>`, UTF-8 with a BOM the way
/// spreadsheet exports usually arrive.
pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[String]) -> PathBuf {
    let mut text = String::from("\u{feff}");
    text.push_str(header);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

pub fn numbered_rows(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("1500001,東京都 渋谷区神宮前1-{i},宛先{i}"))
        .collect()
}

/// A system CJK font, or `None` when the machine has none installed.
pub fn system_font() -> Option<FontProgram> {
    match FontProgram::discover(atena_pdf::config::DEFAULT_FONT_CANDIDATES) {
        Ok(font) => Some(font),
        Err(e) => {
            eprintln!("Skipping: no CJK font available ({e})");
            None
        }
    }
}

/// Page objects in a PDF written by this crate.
pub fn count_pages(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.matches("/Type /Page").count() - text.matches("/Type /Pages").count()
}
