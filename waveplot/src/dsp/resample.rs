//! Fixed-width waveform downsampling

/// Reduce `values` to exactly `width` columns scaled by `height`
///
/// Column `i` averages the source span `[i·n/width, (i+1)·n/width)`. When the
/// source is shorter than `width` the span can be empty, in which case the
/// column repeats the sample at `i·n/width`. An empty source yields zeros.
///
/// The result is a pure function of its inputs, so repeated calls produce
/// bit-identical output.
pub fn resample(values: &[f32], width: usize, height: usize) -> Vec<f32> {
    let n = values.len();
    let scale = height as f32;

    if n == 0 {
        return vec![0.0; width];
    }

    (0..width)
        .map(|i| {
            let start = i * n / width;
            let end = (i + 1) * n / width;

            let level = if end > start {
                let span = &values[start..end];
                span.iter().sum::<f32>() / span.len() as f32
            } else {
                values[start.min(n - 1)]
            };

            level * scale
        })
        .collect()
}

/// Truncate resampled columns to bytes
pub fn to_bytes(columns: &[f32]) -> Vec<u8> {
    columns.iter().map(|&c| c as u8).collect()
}
