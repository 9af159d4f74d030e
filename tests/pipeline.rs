mod common;

use std::fs;

use atena_pdf::LayoutConfig;
use atena_pdf::Sequencer;
use atena_pdf::metrics::FixedMetrics;
use atena_pdf::record::{LabelRecord, read_csv};
use atena_pdf::surface::MemoryOutput;

use common::{HEADER_COMBINED, HEADER_SPLIT, numbered_rows, write_csv};

fn capped(cap: usize) -> LayoutConfig {
    LayoutConfig {
        page_cap: Some(cap),
        ..LayoutConfig::default()
    }
}

#[test]
fn forty_five_rows_at_cap_twenty() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "list.csv", HEADER_COMBINED, &numbered_rows(45));

    let report = atena_pdf::dry_run(&[csv], &capped(20), &FixedMetrics::full_width()).unwrap();
    let pages: Vec<usize> = report.artifacts.iter().map(|a| a.pages).collect();
    assert_eq!(pages, vec![20, 20, 5]);
    assert_eq!(report.total_pages(), 45);
    assert_eq!(report.skipped_records, 0);
    assert!(report.files.is_empty());
}

#[test]
fn blank_rows_are_skipped_without_breaking_batches() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let mut rows = numbered_rows(4);
    rows.insert(2, ",,".to_string());
    rows.insert(3, " , , ".to_string());
    let csv = write_csv(dir.path(), "gaps.csv", HEADER_COMBINED, &rows);

    let report = atena_pdf::dry_run(&[csv], &capped(3), &FixedMetrics::full_width()).unwrap();
    let pages: Vec<usize> = report.artifacts.iter().map(|a| a.pages).collect();
    assert_eq!(pages, vec![3, 1]);
    assert_eq!(report.skipped_records, 2);
}

#[test]
fn directory_inputs_run_in_name_order_through_one_sequence() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "b.csv", HEADER_COMBINED, &numbered_rows(3));
    write_csv(dir.path(), "a.csv", HEADER_SPLIT, &["1000001,東京都 千代田区,山田,太郎".to_string()]);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let inputs = atena_pdf::record::collect_inputs(&[dir.path().to_path_buf()]).unwrap();
    let names: Vec<_> = inputs
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.csv", "b.csv"]);

    let config = capped(2);
    let metrics = FixedMetrics::full_width();
    let mut seq = Sequencer::new(&config, MemoryOutput::new(), &metrics, "F1");
    for path in &inputs {
        for raw in read_csv(path).unwrap() {
            seq.push(&LabelRecord::from_raw(&raw, &config.fields, &config.address)).unwrap();
        }
    }
    let (summaries, output) = seq.finish().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(output.page_counts(), vec![2, 2]);

    let first: Vec<&str> = output.finalized[0].1.texts().collect();
    assert_eq!(first, vec!["〒100-0001", "〒150-0001"]);
    let glyphs: String = output.finalized[0].1.glyphs().map(|(_, _, ch)| ch).collect();
    assert!(glyphs.starts_with("東京都千代田区山田太郎様"));
}

#[test]
fn unreadable_input_is_reported_and_the_rest_still_render() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let good = write_csv(dir.path(), "good.csv", HEADER_COMBINED, &numbered_rows(2));
    let missing = dir.path().join("missing.csv");

    let report = atena_pdf::dry_run(
        &[missing.clone(), good],
        &LayoutConfig::default(),
        &FixedMetrics::full_width(),
    )
    .unwrap();
    assert_eq!(report.failed_inputs, vec![missing]);
    assert_eq!(report.total_pages(), 2);
}

#[test]
fn address_dashes_become_long_vowel_marks() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "one.csv", HEADER_COMBINED, &numbered_rows(1));
    let config = LayoutConfig::default();
    let metrics = FixedMetrics::full_width();
    let mut seq = Sequencer::new(&config, MemoryOutput::new(), &metrics, "F1");
    for raw in read_csv(&csv).unwrap() {
        seq.push(&LabelRecord::from_raw(&raw, &config.fields, &config.address)).unwrap();
    }
    let (_, output) = seq.finish().unwrap();
    let glyphs: String = output.finalized[0].1.glyphs().map(|(_, _, ch)| ch).collect();
    assert_eq!(glyphs, "東京都渋谷区神宮前1ー0宛先0様");
    assert_eq!(output.finalized[0].1.depth(), 0);
}

#[test]
fn config_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("layout.toml");
    fs::write(
        &toml_path,
        "page_cap = 4\n\n[name]\nhonorific = \"殿\"\n",
    )
    .unwrap();
    let config = LayoutConfig::load(&toml_path).unwrap();
    assert_eq!(config.page_cap, Some(4));

    let csv = write_csv(dir.path(), "list.csv", HEADER_COMBINED, &numbered_rows(9));
    let report = atena_pdf::dry_run(&[csv], &config, &FixedMetrics::full_width()).unwrap();
    let pages: Vec<usize> = report.artifacts.iter().map(|a| a.pages).collect();
    assert_eq!(pages, vec![4, 4, 1]);
}

#[test]
fn one_undecodable_row_keeps_the_rest_of_the_file() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("list.csv");
    let mut data = format!("{HEADER_COMBINED}\n1500001,東京都 渋谷区,宛先0\n").into_bytes();
    data.extend_from_slice(b"1500002,\xff\xfe bad,x\n");
    data.extend_from_slice("1500003,大阪府 北区,宛先2\n".as_bytes());
    fs::write(&csv, data).unwrap();

    let report = atena_pdf::dry_run(&[csv], &LayoutConfig::default(), &FixedMetrics::full_width()).unwrap();
    assert!(report.failed_inputs.is_empty());
    assert_eq!(report.total_pages(), 3);
}
