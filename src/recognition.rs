//! Turning network outputs into letters.
//!
//! Besides the class ↔ letter mapping this module reads the segmented page
//! produced by the detection stage:
//!
//! ```text
//! base/2_cells/line_00/cell_00.pbm   grid, one folder per row
//! base/3_words/word_00/char_00.pbm   word list, one folder per word
//! ```
//!
//! and writes the recognized grid and words as plain text for the solver.

use crate::classifier::LetterClassifier;
use crate::error::{OcrError, Result};
use crate::image::Image;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of letter classes, `A` to `Z`.
pub const NUM_LETTERS: usize = 26;

/// Written in place of a cell that could not be decoded.
pub const UNKNOWN_LETTER: char = '?';

/// `0 → 'A'` .. `25 → 'Z'`; anything else is [`UNKNOWN_LETTER`].
pub fn class_to_letter(class: usize) -> char {
    if class < NUM_LETTERS {
        (b'A' + class as u8) as char
    } else {
        UNKNOWN_LETTER
    }
}

/// The `k` largest probabilities with their class indices, best first.
///
/// Equal probabilities keep the lower class index first.
pub fn top_k(probabilities: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    // Stable sort keeps index order among ties
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

/// Counts of what [`recognize_layout`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutSummary {
    pub grid_rows: usize,
    pub words: usize,
    /// Cells or characters written as [`UNKNOWN_LETTER`]
    pub unreadable: usize,
}

/// Recognize the grid and the word list under `base`, writing
/// `out_dir/grid.txt` and `out_dir/word.txt`.
///
/// Each file gets one line per grid row or word. Rows and words are read in
/// order until the first one whose `*_00.pbm` is missing; inside a row or word,
/// reading stops at the first missing index.
pub fn recognize_layout(
    classifier: &LetterClassifier,
    base: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<LayoutSummary> {
    let base = base.as_ref();
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(|e| OcrError::io(out_dir, e))?;

    let mut summary = LayoutSummary::default();

    let (grid, rows) = read_groups(
        classifier,
        &base.join("2_cells"),
        "line",
        "cell",
        &mut summary.unreadable,
    );
    write_text(&out_dir.join("grid.txt"), &grid)?;
    summary.grid_rows = rows;
    info!("Recognized {} grid rows", rows);

    let (words, count) = read_groups(
        classifier,
        &base.join("3_words"),
        "word",
        "char",
        &mut summary.unreadable,
    );
    write_text(&out_dir.join("word.txt"), &words)?;
    summary.words = count;
    info!("Recognized {} words", count);

    Ok(summary)
}

fn group_dir(root: &Path, group: &str, index: usize) -> PathBuf {
    root.join(format!("{}_{:02}", group, index))
}

fn item_path(dir: &Path, item: &str, index: usize) -> PathBuf {
    dir.join(format!("{}_{:02}.pbm", item, index))
}

/// Read `root/<group>_NN/<item>_MM.pbm` into one text line per group.
fn read_groups(
    classifier: &LetterClassifier,
    root: &Path,
    group: &str,
    item: &str,
    unreadable: &mut usize,
) -> (String, usize) {
    let mut text = String::new();
    let mut groups = 0;

    loop {
        let dir = group_dir(root, group, groups);
        if !item_path(&dir, item, 0).exists() {
            break;
        }

        let mut index = 0;
        loop {
            let path = item_path(&dir, item, index);
            if !path.exists() {
                break;
            }
            text.push(recognize_file(classifier, &path, unreadable));
            index += 1;
        }
        text.push('\n');
        groups += 1;
    }

    (text, groups)
}

fn recognize_file(classifier: &LetterClassifier, path: &Path, unreadable: &mut usize) -> char {
    let shape = classifier.network().input_shape();
    let result = Image::load_with_size(path, shape.rows, shape.cols)
        .and_then(|image| classifier.recognize(&image));
    match result {
        Ok(letter) => letter,
        Err(err) => {
            warn!("Cannot recognize {}: {}", path.display(), err);
            *unreadable += 1;
            UNKNOWN_LETTER
        }
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| OcrError::io(path, e))
}
