//! Tests for layout recognition
//!
//! Builds a segmented page on disk (`2_cells/line_NN/cell_NN.pbm` and
//! `3_words/word_NN/char_NN.pbm`) and checks the text files written for it.

use letter_cnn::architecture::ArchitectureConfig;
use letter_cnn::config::TrainingConfig;
use letter_cnn::image::Image;
use letter_cnn::recognition::{recognize_layout, LayoutSummary, UNKNOWN_LETTER};
use letter_cnn::utils::SimpleRng;
use letter_cnn::{LetterClassifier, Network};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn glyph(seed: usize) -> Image {
    let mut image = Image::filled(50, 50, 0.0);
    for i in 5..45 {
        image.set(i, 5 + (seed * 7) % 40, 1.0);
        image.set(5 + (seed * 11) % 40, i, 1.0);
    }
    image
}

fn write_group(root: &Path, group: &str, item: &str, index: usize, len: usize) {
    let dir = root.join(format!("{}_{:02}", group, index));
    fs::create_dir_all(&dir).unwrap();
    for i in 0..len {
        glyph(index * 10 + i)
            .save_pbm(dir.join(format!("{}_{:02}.pbm", item, i)))
            .unwrap();
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_grid_and_words_are_written() {
    let base = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let cells = base.path().join("2_cells");
    let words = base.path().join("3_words");
    for row in 0..3 {
        write_group(&cells, "line", "cell", row, 4);
    }
    write_group(&words, "word", "char", 0, 5);
    write_group(&words, "word", "char", 1, 2);

    let classifier = LetterClassifier::new(TrainingConfig::default());
    let summary = recognize_layout(&classifier, base.path(), out.path()).unwrap();

    assert_eq!(
        summary,
        LayoutSummary {
            grid_rows: 3,
            words: 2,
            unreadable: 0
        }
    );

    let grid = read_lines(&out.path().join("grid.txt"));
    assert_eq!(grid.len(), 3);
    assert!(grid.iter().all(|line| line.len() == 4));
    assert!(grid.iter().flat_map(|l| l.chars()).all(|c| c.is_ascii_uppercase()));

    let expected = classifier.recognize(&glyph(12)).unwrap();
    assert_eq!(grid[1].chars().nth(2), Some(expected));

    let word_lines = read_lines(&out.path().join("word.txt"));
    assert_eq!(word_lines.iter().map(String::len).collect::<Vec<_>>(), vec![5, 2]);
}

#[test]
fn test_unreadable_cell_becomes_placeholder() {
    let base = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let cells = base.path().join("2_cells");
    write_group(&cells, "line", "cell", 0, 3);
    fs::write(cells.join("line_00").join("cell_01.pbm"), "not an image").unwrap();
    fs::write(
        cells.join("line_00").join("cell_02.pbm"),
        "P4 18446744073709551615 1\n\0",
    )
    .unwrap();

    let classifier = LetterClassifier::new(TrainingConfig::default());
    let summary = recognize_layout(&classifier, base.path(), out.path()).unwrap();

    assert_eq!(summary.unreadable, 2);
    let grid = read_lines(&out.path().join("grid.txt"));
    assert_eq!(grid[0].len(), 3);
    assert_eq!(grid[0].chars().next(), classifier.recognize(&glyph(0)).ok());
    assert_eq!(grid[0].chars().nth(1), Some(UNKNOWN_LETTER));
    assert_eq!(grid[0].chars().nth(2), Some(UNKNOWN_LETTER));
}

#[test]
fn test_reading_stops_at_first_gap() {
    let base = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let cells = base.path().join("2_cells");
    write_group(&cells, "line", "cell", 0, 2);
    // line_01 is missing, so line_02 is never read
    write_group(&cells, "line", "cell", 2, 2);
    // cell_01 is missing, so cell_02 is never read
    let line = cells.join("line_00");
    fs::remove_file(line.join("cell_01.pbm")).unwrap();
    glyph(2).save_pbm(line.join("cell_02.pbm")).unwrap();

    let classifier = LetterClassifier::new(TrainingConfig::default());
    let summary = recognize_layout(&classifier, base.path(), out.path()).unwrap();

    assert_eq!(summary.grid_rows, 1);
    let grid = read_lines(&out.path().join("grid.txt"));
    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0].len(), 1);
}

#[test]
fn test_empty_page_writes_empty_files() {
    let base = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let target = out.path().join("nested").join("output");

    let classifier = LetterClassifier::new(TrainingConfig::default());
    let summary = recognize_layout(&classifier, base.path(), &target).unwrap();

    assert_eq!(summary, LayoutSummary::default());
    assert_eq!(fs::read_to_string(target.join("grid.txt")).unwrap(), "");
    assert_eq!(fs::read_to_string(target.join("word.txt")).unwrap(), "");
}

#[test]
fn test_cells_are_read_at_network_input_size() {
    let base = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let line = base.path().join("2_cells").join("line_00");
    fs::create_dir_all(&line).unwrap();
    Image::filled(12, 12, 1.0).save_pbm(line.join("cell_00.pbm")).unwrap();
    // A 50x50 cell does not fit the smaller network
    glyph(0).save_pbm(line.join("cell_01.pbm")).unwrap();

    let arch = ArchitectureConfig {
        input_height: 12,
        input_width: 12,
        ..ArchitectureConfig::default()
    };
    let mut rng = SimpleRng::new(1);
    let network = Network::new(&arch, &mut rng).unwrap();
    let classifier = LetterClassifier::with_network(network, TrainingConfig::default()).unwrap();
    let summary = recognize_layout(&classifier, base.path(), out.path()).unwrap();

    assert_eq!(summary.unreadable, 1);
    let grid = read_lines(&out.path().join("grid.txt"));
    let expected = classifier.recognize(&Image::filled(12, 12, 1.0)).unwrap();
    assert_eq!(grid, vec![format!("{}{}", expected, UNKNOWN_LETTER)]);
}
