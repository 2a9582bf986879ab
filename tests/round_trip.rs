//! Integration tests for compressed row reading and writing
//!
//! These tests exercise complete write → read pipelines through both
//! codecs, plus the dispatch errors and the persisted-format
//! compatibility guarantees (plain flate2/zstd decoders must be able to
//! read what zcsv writes).

use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use tempfile::TempDir;
use zcsv::{open, CsvOptions, OpenOptions, RowReader, RowStream, RowWriter, ZcsvError};

fn write_people(path: &std::path::Path, level: Option<i32>) {
    let options = CsvOptions::new().headers(["name", "age"]);
    let mut writer = RowWriter::create(path, level, options).unwrap();
    writer.write_row(["Alice", "30"]).unwrap();
    writer.write_row(["Bob", "25"]).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_write_gzip_file_is_standard_gzip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv.gz");
    write_people(&path, None);

    let mut decoder = MultiGzDecoder::new(File::open(&path).unwrap());
    let mut content = String::new();
    decoder.read_to_string(&mut content).unwrap();
    assert_eq!(content, "name,age\nAlice,30\nBob,25\n");
}

#[test]
fn test_write_zstd_file_is_standard_zstd() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv.zst");
    write_people(&path, None);

    let compressed = std::fs::read(&path).unwrap();
    let content = zstd::decode_all(&compressed[..]).unwrap();
    assert_eq!(content, b"name,age\nAlice,30\nBob,25\n");
}

#[test]
fn test_round_trip_with_header_maps() {
    let dir = TempDir::new().unwrap();
    for name in ["people.csv.gz", "people.csv.zst"] {
        let path = dir.path().join(name);
        write_people(&path, None);

        let reader = RowReader::open(&path, CsvOptions::new().has_headers(true)).unwrap();
        let maps: Vec<HashMap<String, String>> = reader
            .map(|row| row.unwrap().to_map())
            .collect();

        assert_eq!(maps.len(), 2);
        assert_eq!(
            maps[0],
            HashMap::from([
                ("name".to_string(), "Alice".to_string()),
                ("age".to_string(), "30".to_string()),
            ])
        );
        assert_eq!(
            maps[1],
            HashMap::from([
                ("name".to_string(), "Bob".to_string()),
                ("age".to_string(), "25".to_string()),
            ])
        );
    }
}

#[test]
fn test_round_trip_tsv_delimiter() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.tsv.gz");

    let options = CsvOptions::new().delimiter(b'\t').headers(["name", "age"]);
    let mut writer = RowWriter::create(&path, None, options).unwrap();
    writer.write_row(["Alice", "30"]).unwrap();
    writer.close().unwrap();

    let mut decoder = MultiGzDecoder::new(File::open(&path).unwrap());
    let mut content = String::new();
    decoder.read_to_string(&mut content).unwrap();
    assert_eq!(content, "name\tage\nAlice\t30\n");

    let options = CsvOptions::new().delimiter(b'\t').has_headers(true);
    let reader = RowReader::open(&path, options).unwrap();
    let rows: Vec<_> = reader.map(|row| row.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some("Alice"));
    assert_eq!(rows[0].get("age"), Some("30"));
}

#[test]
fn test_quoted_fields_survive_both_codecs() {
    let dir = TempDir::new().unwrap();
    for name in ["quoted.csv.gz", "quoted.csv.zst"] {
        let path = dir.path().join(name);

        let options = CsvOptions::new().headers(["name", "bio"]);
        let mut writer = RowWriter::create(&path, None, options).unwrap();
        writer
            .write_row(["Alice \"The Great\"", "Loves coding, testing, and more"])
            .unwrap();
        writer.write_row(["Bob", "Line one\nLine two"]).unwrap();
        writer.close().unwrap();

        let reader = RowReader::open(&path, CsvOptions::new().has_headers(true)).unwrap();
        let rows: Vec<_> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Alice \"The Great\""));
        assert_eq!(
            rows[0].get("bio"),
            Some("Loves coding, testing, and more")
        );
        assert_eq!(rows[1].get("bio"), Some("Line one\nLine two"));
    }
}

#[test]
fn test_headers_only_file_yields_no_rows() {
    let dir = TempDir::new().unwrap();
    for name in ["empty.csv.gz", "empty.csv.zst"] {
        let path = dir.path().join(name);

        let options = CsvOptions::new().headers(["name", "age"]);
        let writer = RowWriter::create(&path, None, options).unwrap();
        drop(writer); // close via drop, header row still flushed

        let reader = RowReader::open(&path, CsvOptions::new().has_headers(true)).unwrap();
        let rows: Vec<_> = reader.collect::<zcsv::Result<_>>().unwrap();
        assert!(rows.is_empty());
    }
}

#[test]
fn test_large_file_streams_across_chunks() {
    // Enough data that the zstd side crosses several 128 KiB pulls
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large.csv.zst");

    let long_field = "x".repeat(300);
    {
        let options = CsvOptions::new().headers(["id", "payload"]);
        let mut writer = RowWriter::create(&path, None, options).unwrap();
        for i in 0..2000 {
            writer.write_row([i.to_string(), long_field.clone()]).unwrap();
        }
        writer.close().unwrap();
    }

    let reader = RowReader::open(&path, CsvOptions::new().has_headers(true)).unwrap();
    let mut count = 0;
    for (i, row) in reader.enumerate() {
        let row = row.unwrap();
        assert_eq!(row.get("id"), Some(i.to_string().as_str()));
        assert_eq!(row.get("payload"), Some(long_field.as_str()));
        count += 1;
    }
    assert_eq!(count, 2000);
}

#[test]
fn test_compression_level_monotonicity() {
    // Non-strict: higher level never produces a larger file on
    // repetitive input
    let dir = TempDir::new().unwrap();
    let field = "x".repeat(1000);

    let mut sizes = HashMap::new();
    for level in [1, 19] {
        let path = dir.path().join(format!("level{level}.csv.zst"));
        let options = CsvOptions::new().headers(["data"]);
        let mut writer = RowWriter::create(&path, Some(level), options).unwrap();
        for _ in 0..100 {
            writer.write_row([field.as_str()]).unwrap();
        }
        writer.close().unwrap();
        sizes.insert(level, std::fs::metadata(&path).unwrap().len());
    }

    assert!(sizes[&19] <= sizes[&1]);
}

#[test]
fn test_gzip_with_explicit_level() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("level.csv.gz");
    write_people(&path, Some(9));

    let mut decoder = MultiGzDecoder::new(File::open(&path).unwrap());
    let mut content = String::new();
    decoder.read_to_string(&mut content).unwrap();
    assert_eq!(content, "name,age\nAlice,30\nBob,25\n");
}

#[test]
fn test_open_entry_point_dispatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv.zst");

    let options = OpenOptions::new().csv(CsvOptions::new().headers(["name", "age"]));
    match open(&path, "write", options).unwrap() {
        RowStream::Writer(mut writer) => {
            writer.write_row(["Alice", "30"]).unwrap();
            writer.close().unwrap();
        }
        RowStream::Reader(_) => panic!("write mode must yield a writer"),
    }

    let options = OpenOptions::new().csv(CsvOptions::new().has_headers(true));
    match open(&path, "read", options).unwrap() {
        RowStream::Reader(reader) => {
            let rows: Vec<_> = reader.map(|row| row.unwrap()).collect();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].get("name"), Some("Alice"));
        }
        RowStream::Writer(_) => panic!("read mode must yield a reader"),
    }
}

#[test]
fn test_open_rejects_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.csv");

    let err = open(&path, "write", OpenOptions::new()).unwrap_err();
    assert!(matches!(err, ZcsvError::UnsupportedExtension { .. }));
    assert!(err.to_string().contains("unsupported file extension"));
    assert!(err.to_string().contains(".csv"));
    // Validation precedes I/O: nothing was created
    assert!(!path.exists());

    let err = open(dir.path().join("data.csv.bz2"), "write", OpenOptions::new()).unwrap_err();
    assert!(err.to_string().contains(".bz2"));
}

#[test]
fn test_open_rejects_unsupported_mode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv.zst");

    let err = open(&path, "flibber", OpenOptions::new()).unwrap_err();
    assert!(matches!(err, ZcsvError::UnsupportedMode { ref mode } if mode == "flibber"));
    assert!(err.to_string().contains("unsupported mode"));
    assert!(err.to_string().contains("flibber"));
}

#[test]
fn test_for_each_visits_every_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv.gz");
    write_people(&path, None);

    let mut names = Vec::new();
    zcsv::for_each(&path, CsvOptions::new().has_headers(true), |row| {
        names.push(row.get("name").unwrap().to_string());
    })
    .unwrap();
    assert_eq!(names, ["Alice", "Bob"]);
}

#[test]
fn test_rows_returns_lazy_restartable_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv.zst");
    write_people(&path, None);

    let options = CsvOptions::new().has_headers(true);
    let first_pass = zcsv::rows(&path, options.clone()).unwrap().count();
    let second_pass = zcsv::rows(&path, options).unwrap().count();
    assert_eq!(first_pass, 2);
    assert_eq!(second_pass, 2);
}

#[test]
fn test_double_close_never_corrupts_output() {
    let dir = TempDir::new().unwrap();
    for name in ["t.csv.gz", "t.csv.zst"] {
        let path = dir.path().join(name);
        let mut writer = RowWriter::create(&path, None, CsvOptions::new()).unwrap();
        writer.write_row(["a", "b"]).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        drop(writer);

        let reader = RowReader::open(&path, CsvOptions::new()).unwrap();
        let rows: Vec<_> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_index(0), Some("a"));
    }
}

#[test]
fn test_reading_without_headers_is_positional() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.csv.gz");
    {
        let mut writer = RowWriter::create(&path, None, CsvOptions::new()).unwrap();
        writer.write_row(["1", "one"]).unwrap();
        writer.write_row(["2", "two"]).unwrap();
        writer.close().unwrap();
    }

    let reader = RowReader::open(&path, CsvOptions::new()).unwrap();
    let rows: Vec<_> = reader.map(|row| row.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_index(1), Some("one"));
    assert_eq!(rows[1].get_index(0), Some("2"));
    assert!(rows[0].to_map().is_empty());
}

#[test]
fn test_numbers_come_back_as_strings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scores.csv.zst");
    {
        let options = CsvOptions::new().headers(["id", "name", "score"]);
        let mut writer = RowWriter::create(&path, None, options).unwrap();
        writer.write_row(["1", "Alice", "95"]).unwrap();
        writer.write_row(["2", "Bob", "87"]).unwrap();
        writer.close().unwrap();
    }

    let reader = RowReader::open(&path, CsvOptions::new().has_headers(true)).unwrap();
    let maps: Vec<_> = reader.map(|row| row.unwrap().to_map()).collect();
    assert_eq!(
        maps[0],
        HashMap::from([
            ("id".to_string(), "1".to_string()),
            ("name".to_string(), "Alice".to_string()),
            ("score".to_string(), "95".to_string()),
        ])
    );
    assert_eq!(maps[1].get("score").map(String::as_str), Some("87"));
}
