//! Netpbm image loading.
//!
//! Letter samples arrive as PBM (P1/P4) or PGM (P2/P5) files. Pixels are turned
//! into network activations in `[0, 1]`:
//!
//! - PBM uses the segmentation convention where a `0` bit is ink, so `0 → 1.0`
//!   and `1 → 0.0`.
//! - PGM samples are scaled by the header maxval.
//!
//! Wrong dimensions are reported, never resized.

use crate::error::{ImageFormatError, OcrError, Result};
use crate::tensor::{Shape, Tensor};
use std::fs;
use std::path::Path;

/// Side of the square letter images the network consumes.
pub const IMAGE_SIZE: usize = 50;

/// A single-channel image with activations in `[0, 1]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    height: usize,
    width: usize,
    pixels: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    PbmAscii,
    PgmAscii,
    PbmBinary,
    PgmBinary,
}

impl Format {
    fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            b"P1" => Some(Format::PbmAscii),
            b"P2" => Some(Format::PgmAscii),
            b"P4" => Some(Format::PbmBinary),
            b"P5" => Some(Format::PgmBinary),
            _ => None,
        }
    }

    fn is_graymap(self) -> bool {
        matches!(self, Format::PgmAscii | Format::PgmBinary)
    }
}

/// Byte cursor over a Netpbm file.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Skip whitespace and `#` comments running to end of line.
    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.bytes.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Next whitespace-delimited token, or `None` at end of input.
    fn token(&mut self) -> Option<&'a [u8]> {
        self.skip_separators();
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b'#' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(&self.bytes[start..self.pos])
        }
    }

    fn header_number(
        &mut self,
        missing: &'static str,
    ) -> std::result::Result<usize, ImageFormatError> {
        let token = self.token().ok_or(ImageFormatError::BadHeader(missing))?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or(ImageFormatError::BadHeader(missing))
    }
}

/// Magic number, size and maxval of a Netpbm file.
#[derive(Debug, Clone, Copy)]
struct Header {
    format: Format,
    width: usize,
    height: usize,
    maxval: usize,
}

impl Header {
    fn parse(bytes: &[u8]) -> std::result::Result<(Self, Reader<'_>), ImageFormatError> {
        let magic = bytes.get(..2).unwrap_or(bytes);
        let format = Format::from_magic(magic).ok_or_else(|| {
            ImageFormatError::UnsupportedMagic(String::from_utf8_lossy(magic).into_owned())
        })?;

        let mut reader = Reader::new(bytes);
        reader.pos = 2;
        if !reader.remaining().first().map_or(false, |b| b.is_ascii_whitespace() || *b == b'#') {
            return Err(ImageFormatError::UnsupportedMagic(
                String::from_utf8_lossy(bytes.get(..3).unwrap_or(bytes)).into_owned(),
            ));
        }

        let width = reader.header_number("missing or invalid width")?;
        let height = reader.header_number("missing or invalid height")?;
        if width == 0 || height == 0 {
            return Err(ImageFormatError::BadHeader("dimensions must be positive"));
        }
        let maxval = if format.is_graymap() {
            let maxval = reader.header_number("missing or invalid maxval")?;
            if maxval == 0 || maxval > 65535 {
                return Err(ImageFormatError::BadHeader("maxval must be in 1..=65535"));
            }
            maxval
        } else {
            1
        };

        let header = Self {
            format,
            width,
            height,
            maxval,
        };
        Ok((header, reader))
    }

    fn decode_raster(
        &self,
        reader: &mut Reader<'_>,
    ) -> std::result::Result<Image, ImageFormatError> {
        let count = self
            .width
            .checked_mul(self.height)
            .ok_or(ImageFormatError::BadHeader("image dimensions overflow"))?;
        let pixels = match self.format {
            Format::PbmAscii => decode_pbm_ascii(reader, count)?,
            Format::PgmAscii => decode_pgm_ascii(reader, count, self.maxval)?,
            Format::PbmBinary | Format::PgmBinary => {
                // Exactly one whitespace byte separates the header from the raster
                match reader.remaining().first() {
                    Some(b) if b.is_ascii_whitespace() => reader.pos += 1,
                    _ => {
                        return Err(ImageFormatError::BadHeader(
                            "expected whitespace before raster data",
                        ))
                    }
                }
                if self.format == Format::PbmBinary {
                    decode_pbm_binary(reader.remaining(), self.width, count)?
                } else {
                    decode_pgm_binary(reader.remaining(), count, self.maxval)?
                }
            }
        };

        Ok(Image {
            height: self.height,
            width: self.width,
            pixels,
        })
    }
}

impl Image {
    /// Image with every pixel set to `value`.
    pub fn filled(height: usize, width: usize, value: f32) -> Self {
        Self {
            height,
            width,
            pixels: vec![value; height * width],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(
            row < self.height && col < self.width,
            "pixel ({}, {}) out of bounds for {}x{} image",
            row,
            col,
            self.width,
            self.height
        );
        self.pixels[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(
            row < self.height && col < self.width,
            "pixel ({}, {}) out of bounds for {}x{} image",
            row,
            col,
            self.width,
            self.height
        );
        self.pixels[row * self.width + col] = value;
    }

    /// Network input tensor (`height × width × 1`).
    pub fn to_tensor(&self) -> Tensor {
        Tensor::from_vec(Shape::new(self.height, self.width, 1), self.pixels.clone())
    }

    /// Decode a P1, P2, P4 or P5 file held in memory.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, ImageFormatError> {
        let (header, mut reader) = Header::parse(bytes)?;
        header.decode_raster(&mut reader)
    }

    /// Decode an image that must be exactly `height × width`.
    ///
    /// The size is checked against the header before any pixel is read.
    pub fn decode_with_size(
        bytes: &[u8],
        height: usize,
        width: usize,
    ) -> std::result::Result<Self, ImageFormatError> {
        let (header, mut reader) = Header::parse(bytes)?;
        if header.height != height || header.width != width {
            return Err(ImageFormatError::Dimensions {
                expected_width: width,
                expected_height: height,
                width: header.width,
                height: header.height,
            });
        }
        header.decode_raster(&mut reader)
    }

    /// Read a 50×50 letter image.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_size(path, IMAGE_SIZE, IMAGE_SIZE)
    }

    /// Read an image that must be exactly `height × width`.
    pub fn load_with_size(path: impl AsRef<Path>, height: usize, width: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| OcrError::io(path, e))?;
        Ok(Self::decode_with_size(&bytes, height, width)?)
    }

    /// Encode as ASCII PBM (P1). Pixels at or above 0.5 are ink and written as `0`.
    pub fn to_pbm(&self) -> String {
        let mut out = format!("P1\n{} {}\n", self.width, self.height);
        for row in self.pixels.chunks(self.width) {
            for &p in row {
                out.push(if p >= 0.5 { '0' } else { '1' });
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }

    pub fn save_pbm(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_pbm()).map_err(|e| OcrError::io(path, e))
    }
}

fn pbm_value(bit: u8) -> f32 {
    if bit == 0 {
        1.0
    } else {
        0.0
    }
}

fn decode_pbm_ascii(
    reader: &mut Reader<'_>,
    count: usize,
) -> std::result::Result<Vec<f32>, ImageFormatError> {
    // Every sample takes at least one byte
    let mut pixels = Vec::with_capacity(count.min(reader.remaining().len()));
    while pixels.len() < count {
        reader.skip_separators();
        match reader.remaining().first() {
            Some(b'0') => pixels.push(pbm_value(0)),
            Some(b'1') => pixels.push(pbm_value(1)),
            Some(&other) => {
                return Err(ImageFormatError::InvalidPixel {
                    index: pixels.len(),
                    value: (other as char).to_string(),
                })
            }
            None => {
                return Err(ImageFormatError::Truncated {
                    expected: count,
                    found: pixels.len(),
                })
            }
        }
        reader.pos += 1;
    }
    Ok(pixels)
}

fn decode_pgm_ascii(
    reader: &mut Reader<'_>,
    count: usize,
    maxval: usize,
) -> std::result::Result<Vec<f32>, ImageFormatError> {
    let mut pixels = Vec::with_capacity(count.min(reader.remaining().len()));
    while pixels.len() < count {
        let token = reader.token().ok_or(ImageFormatError::Truncated {
            expected: count,
            found: pixels.len(),
        })?;
        let index = pixels.len();
        let invalid = || ImageFormatError::InvalidPixel {
            index,
            value: String::from_utf8_lossy(token).into_owned(),
        };
        let sample = std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(invalid)?;
        if sample > maxval {
            return Err(invalid());
        }
        pixels.push(sample as f32 / maxval as f32);
    }
    Ok(pixels)
}

fn decode_pbm_binary(
    raster: &[u8],
    width: usize,
    count: usize,
) -> std::result::Result<Vec<f32>, ImageFormatError> {
    let height = count / width;
    let bytes_per_row = width.div_ceil(8);
    let needed = bytes_per_row.checked_mul(height);
    if needed.map_or(true, |needed| raster.len() < needed) {
        return Err(ImageFormatError::Truncated {
            expected: count,
            found: (raster.len() / bytes_per_row) * width,
        });
    }

    let mut pixels = Vec::with_capacity(count);
    for row in raster.chunks(bytes_per_row).take(height) {
        for col in 0..width {
            let bit = (row[col / 8] >> (7 - col % 8)) & 1;
            pixels.push(pbm_value(bit));
        }
    }
    Ok(pixels)
}

fn decode_pgm_binary(
    raster: &[u8],
    count: usize,
    maxval: usize,
) -> std::result::Result<Vec<f32>, ImageFormatError> {
    let bytes_per_sample = if maxval < 256 { 1 } else { 2 };
    let needed = count.checked_mul(bytes_per_sample);
    if needed.map_or(true, |needed| raster.len() < needed) {
        return Err(ImageFormatError::Truncated {
            expected: count,
            found: raster.len() / bytes_per_sample,
        });
    }

    let mut pixels = Vec::with_capacity(count);
    for (index, chunk) in raster.chunks(bytes_per_sample).take(count).enumerate() {
        let sample = if bytes_per_sample == 1 {
            chunk[0] as usize
        } else {
            ((chunk[0] as usize) << 8) | chunk[1] as usize
        };
        if sample > maxval {
            return Err(ImageFormatError::InvalidPixel {
                index,
                value: sample.to_string(),
            });
        }
        pixels.push(sample as f32 / maxval as f32);
    }
    Ok(pixels)
}
