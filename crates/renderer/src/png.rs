//! PNG encoding for RGBA rasters.
//!
//! Two layouts are produced:
//! - **Indexed (colour type 3)** when the image has at most 256 distinct
//!   RGBA values: legends and masked frames with large transparent areas
//!   usually qualify.
//! - **Truecolour with alpha (colour type 6)** otherwise.
//!
//! Each scanline picks the filter (None, Sub, Up or Paeth) with the smallest
//! sum of absolute residuals, which suits smooth interpolated fields well.

use field_common::{FieldError, FieldResult};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::Write;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const MAX_PALETTE_SIZE: usize = 256;

/// Encode straight-alpha RGBA, choosing indexed output when possible.
pub fn encode_auto(pixels: &[u8], width: usize, height: usize) -> FieldResult<Vec<u8>> {
    check_len(pixels, width, height, 4)?;
    match extract_palette(pixels) {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(pixels, width, height),
    }
}

/// Encode straight-alpha RGBA as colour type 6.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> FieldResult<Vec<u8>> {
    check_len(pixels, width, height, 4)?;
    let mut png = Vec::with_capacity(pixels.len() / 4 + 64);
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &header(width, height, 6));

    let filtered = filter_scanlines(pixels, width * 4, 4);
    write_chunk(&mut png, b"IDAT", &compress(&filtered)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode palette indices as colour type 3.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> FieldResult<Vec<u8>> {
    check_len(indices, width, height, 1)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(FieldError::encoding(format!(
            "palette must hold 1..=256 colours, got {}",
            palette.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &header(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    // Sub/Up residuals are meaningless on palette indices
    let mut raw = Vec::with_capacity(height * (width + 1));
    for row in indices.chunks_exact(width) {
        raw.push(0);
        raw.extend_from_slice(row);
    }
    write_chunk(&mut png, b"IDAT", &compress(&raw)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_len(data: &[u8], width: usize, height: usize, bpp: usize) -> FieldResult<()> {
    if width == 0 || height == 0 {
        return Err(FieldError::encoding(format!(
            "cannot encode empty {}x{} image",
            width, height
        )));
    }
    if data.len() != width * height * bpp {
        return Err(FieldError::encoding(format!(
            "{}x{} image needs {} bytes, got {}",
            width,
            height,
            width * height * bpp,
            data.len()
        )));
    }
    Ok(())
}

fn header(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    ihdr[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = color_type;
    // compression, filter and interlace methods stay 0
    ihdr
}

/// Distinct colours and per-pixel indices, or `None` above 256 colours.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&color) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, i);
                i
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Prefix each scanline with its best filter type and apply it.
fn filter_scanlines(data: &[u8], stride: usize, bpp: usize) -> Vec<u8> {
    let rows = data.len() / stride;
    let mut out = Vec::with_capacity(rows * (stride + 1));
    let zero = vec![0u8; stride];
    let mut candidate = vec![0u8; stride];
    let mut best = vec![0u8; stride];

    for r in 0..rows {
        let line = &data[r * stride..(r + 1) * stride];
        let prior = if r == 0 {
            &zero[..]
        } else {
            &data[(r - 1) * stride..r * stride]
        };

        let mut best_type = 0u8;
        let mut best_score = u64::MAX;
        for filter in 0..=4u8 {
            if filter == 2 && r == 0 {
                continue;
            }
            apply_filter(filter, line, prior, bpp, &mut candidate);
            let score: u64 = candidate
                .iter()
                .map(|&b| (b as i8).unsigned_abs() as u64)
                .sum();
            if score < best_score {
                best_score = score;
                best_type = filter;
                best.copy_from_slice(&candidate);
            }
        }

        out.push(best_type);
        out.extend_from_slice(&best);
    }
    out
}

fn apply_filter(filter: u8, line: &[u8], prior: &[u8], bpp: usize, out: &mut [u8]) {
    for i in 0..line.len() {
        let a = if i >= bpp { line[i - bpp] } else { 0 };
        let b = prior[i];
        let c = if i >= bpp { prior[i - bpp] } else { 0 };
        let predictor = match filter {
            0 => 0,
            1 => a,
            2 => b,
            3 => ((a as u16 + b as u16) / 2) as u8,
            _ => paeth(a, b, c),
        };
        out[i] = line[i].wrapping_sub(predictor);
    }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn compress(raw: &[u8]) -> FieldResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| FieldError::encoding(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| FieldError::encoding(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
