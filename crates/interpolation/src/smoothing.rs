//! Separable Gaussian smoothing with reflecting edges.

use rayon::prelude::*;

/// Kernel half-width in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Smooth a row-major `width × height` buffer with an isotropic Gaussian of
/// standard deviation `sigma` cells.
///
/// Edges reflect about the outer cell boundary (`d c b a | a b c d | d c b a`),
/// so a constant field stays constant. `sigma <= 0` returns the input
/// unchanged.
pub fn gaussian_filter(values: &[f64], width: usize, height: usize, sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || width == 0 || height == 0 {
        return values.to_vec();
    }

    let weights = kernel_weights(sigma);

    // Rows
    let mut horizontal = vec![0.0; values.len()];
    horizontal
        .par_chunks_mut(width)
        .zip(values.par_chunks(width))
        .for_each(|(out, row)| convolve_line(row, out, &weights));

    // Columns, gathered into a transposed buffer so each column is contiguous
    let mut columns = vec![0.0; values.len()];
    columns
        .par_chunks_mut(height)
        .enumerate()
        .for_each(|(col, out)| {
            let line: Vec<f64> = (0..height).map(|row| horizontal[row * width + col]).collect();
            convolve_line(&line, out, &weights);
        });

    let mut result = vec![0.0; values.len()];
    for col in 0..width {
        for row in 0..height {
            result[row * width + col] = columns[col * height + row];
        }
    }
    result
}

fn kernel_weights(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as i64;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
    weights
}

fn convolve_line(input: &[f64], output: &mut [f64], weights: &[f64]) {
    let n = input.len() as i64;
    let radius = (weights.len() / 2) as i64;

    for (i, out) in output.iter_mut().enumerate() {
        *out = weights
            .iter()
            .enumerate()
            .map(|(k, w)| w * input[reflect(i as i64 + k as i64 - radius, n)])
            .sum();
    }
}

/// Map an out-of-range index back into `0..n` by half-sample reflection.
fn reflect(index: i64, n: i64) -> usize {
    let period = 2 * n;
    let mut i = index.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}
