//! Model files.
//!
//! Both formats store the parameters in [`Network::parameters`] order: each
//! conv1 filter (channel, row, column) then its bias, the same for conv2, each
//! fc1 output row then its bias, the same for fc2.
//!
//! - Text: the tag `CNN_MODEL_V1` followed by one value per line. Values are
//!   written in shortest round-trip form, so a save/load cycle is exact.
//! - Binary: the 8-byte tag `CNNBIN01`, a little-endian `u32` value count, then
//!   that many little-endian `f32` values.
//!
//! Loading detects the format from the tag and only replaces the network's
//! parameters once the whole file has been parsed.

use crate::config::ModelFormat;
use crate::error::{ModelFileError, OcrError, Result};
use crate::network::Network;
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const TEXT_TAG: &str = "CNN_MODEL_V1";
pub const BINARY_TAG: &[u8; 8] = b"CNNBIN01";

/// Longest tag text echoed back in a [`ModelFileError::WrongTag`].
const TAG_ECHO_LIMIT: usize = 32;

pub fn encode_text(parameters: &[f32]) -> String {
    let mut out = String::with_capacity(TEXT_TAG.len() + 1 + parameters.len() * 14);
    out.push_str(TEXT_TAG);
    out.push('\n');
    for value in parameters {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", value);
    }
    out
}

pub fn encode_binary(parameters: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(BINARY_TAG.len() + 4 + parameters.len() * 4);
    out.extend_from_slice(BINARY_TAG);
    out.extend_from_slice(&(parameters.len() as u32).to_le_bytes());
    for value in parameters {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Parse a model file image, expecting exactly `expected` parameters.
pub fn decode(
    bytes: &[u8],
    expected: usize,
) -> std::result::Result<(Vec<f32>, ModelFormat), ModelFileError> {
    if bytes.starts_with(BINARY_TAG) {
        decode_binary(&bytes[BINARY_TAG.len()..], expected).map(|v| (v, ModelFormat::Binary))
    } else {
        decode_text(&String::from_utf8_lossy(bytes), expected).map(|v| (v, ModelFormat::Text))
    }
}

fn decode_text(text: &str, expected: usize) -> std::result::Result<Vec<f32>, ModelFileError> {
    let mut tokens = text.split_ascii_whitespace();
    match tokens.next() {
        None => return Err(ModelFileError::MissingTag),
        Some(TEXT_TAG) => {}
        Some(other) => {
            return Err(ModelFileError::WrongTag(
                other.chars().take(TAG_ECHO_LIMIT).collect(),
            ))
        }
    }

    let mut values = Vec::with_capacity(expected);
    for (index, token) in tokens.enumerate() {
        if index == expected {
            return Err(ModelFileError::TrailingData { expected });
        }
        match token.parse::<f32>() {
            Ok(value) if value.is_finite() => values.push(value),
            _ => {
                return Err(ModelFileError::InvalidToken {
                    index,
                    token: token.to_string(),
                })
            }
        }
    }

    if values.len() < expected {
        return Err(ModelFileError::Truncated {
            expected,
            found: values.len(),
        });
    }
    Ok(values)
}

fn decode_binary(body: &[u8], expected: usize) -> std::result::Result<Vec<f32>, ModelFileError> {
    let count = match body.get(..4) {
        Some(header) => u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize,
        None => return Err(ModelFileError::Truncated { expected, found: 0 }),
    };
    if count != expected {
        return Err(ModelFileError::CountMismatch {
            expected,
            found: count,
        });
    }

    let data = &body[4..];
    if data.len() < expected * 4 {
        return Err(ModelFileError::Truncated {
            expected,
            found: data.len() / 4,
        });
    }
    if data.len() > expected * 4 {
        return Err(ModelFileError::TrailingData { expected });
    }

    let mut values = Vec::with_capacity(expected);
    for (index, chunk) in data.chunks_exact(4).enumerate() {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !value.is_finite() {
            return Err(ModelFileError::InvalidToken {
                index,
                token: value.to_string(),
            });
        }
        values.push(value);
    }
    Ok(values)
}

/// Write every parameter of `network` to `path`.
pub fn save(network: &Network, path: impl AsRef<Path>, format: ModelFormat) -> Result<()> {
    let path = path.as_ref();
    let parameters = network.parameters();
    let bytes = match format {
        ModelFormat::Text => encode_text(&parameters).into_bytes(),
        ModelFormat::Binary => encode_binary(&parameters),
    };
    fs::write(path, bytes).map_err(|e| OcrError::io(path, e))?;
    info!(
        "Saved {} parameters to {} ({:?})",
        parameters.len(),
        path.display(),
        format
    );
    Ok(())
}

pub fn save_text(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    save(network, path, ModelFormat::Text)
}

pub fn save_binary(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    save(network, path, ModelFormat::Binary)
}

/// Load parameters from `path` into `network`, returning the detected format.
///
/// On any error `network` keeps its previous parameters.
pub fn load(path: impl AsRef<Path>, network: &mut Network) -> Result<ModelFormat> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| OcrError::io(path, e))?;
    let (values, format) = decode(&bytes, network.parameter_count())?;
    network.set_parameters(&values)?;
    info!(
        "Loaded {} parameters from {} ({:?})",
        values.len(),
        path.display(),
        format
    );
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_layout() {
        let text = encode_text(&[0.5, -1.0, 1e-7]);
        assert_eq!(text, "CNN_MODEL_V1\n0.5\n-1\n0.0000001\n");
    }

    #[test]
    fn test_text_accepts_fixed_precision_values() {
        let (values, format) = decode(b"CNN_MODEL_V1\n0.12345678\n-0.00000010\n", 2).unwrap();
        assert_eq!(format, ModelFormat::Text);
        assert_eq!(values, vec![0.123_456_78, -0.000_000_1]);
    }

    #[test]
    fn test_text_shortest_form_is_exact() {
        let original = [0.1f32, 1.0 / 3.0, -2.5e-6, f32::MIN_POSITIVE, 123_456.79];
        let (values, _) = decode(encode_text(&original).as_bytes(), original.len()).unwrap();
        assert_eq!(values, original);
    }

    #[test]
    fn test_binary_layout() {
        let bytes = encode_binary(&[1.0]);
        assert_eq!(&bytes[..8], b"CNNBIN01");
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert_eq!(&bytes[12..], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_text_errors() {
        assert_eq!(decode(b"", 1), Err(ModelFileError::MissingTag));
        assert_eq!(decode(b"  \n", 1), Err(ModelFileError::MissingTag));
        assert_eq!(
            decode(b"MODEL_V0\n1\n", 1),
            Err(ModelFileError::WrongTag("MODEL_V0".into()))
        );
        assert_eq!(
            decode(b"CNN_MODEL_V1\n1\n", 2),
            Err(ModelFileError::Truncated {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            decode(b"CNN_MODEL_V1\n1\nabc\n", 2),
            Err(ModelFileError::InvalidToken {
                index: 1,
                token: "abc".into()
            })
        );
        assert_eq!(
            decode(b"CNN_MODEL_V1\nnan\n", 1),
            Err(ModelFileError::InvalidToken {
                index: 0,
                token: "nan".into()
            })
        );
        assert_eq!(
            decode(b"CNN_MODEL_V1\n1\n2\n", 1),
            Err(ModelFileError::TrailingData { expected: 1 })
        );
    }

    #[test]
    fn test_binary_errors() {
        assert_eq!(
            decode(b"CNNBIN01\x01\x00", 1),
            Err(ModelFileError::Truncated {
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            decode(&encode_binary(&[1.0, 2.0]), 3),
            Err(ModelFileError::CountMismatch {
                expected: 3,
                found: 2
            })
        );

        let mut short = encode_binary(&[1.0, 2.0]);
        short.truncate(short.len() - 1);
        assert_eq!(
            decode(&short, 2),
            Err(ModelFileError::Truncated {
                expected: 2,
                found: 1
            })
        );

        let mut long = encode_binary(&[1.0]);
        long.push(0);
        assert_eq!(
            decode(&long, 1),
            Err(ModelFileError::TrailingData { expected: 1 })
        );
    }
}
