//! Batch output decoding
//!
//! The engine returns one flat buffer for the whole batch. Reconstruction
//! back into per-sample feature lists relies on the invariant that sample i
//! occupies the half-open range `[i * label_count, (i + 1) * label_count)`,
//! with batch order fixed by the input concatenation order.

use modelbay_core::error::{Error, Result};
use modelbay_core::features::{Feature, FeatureList};

/// Decode a flat engine output buffer into per-sample ranked features.
///
/// Entries within one sample follow label-table order; ranking and
/// thresholding are caller concerns. A buffer whose length is not exactly
/// `batch_size * labels.len()` is rejected as a prediction error rather
/// than silently truncated.
pub fn decode_batch(flat: &[f32], batch_size: usize, labels: &[String]) -> Result<Vec<FeatureList>> {
    if batch_size == 0 {
        return Err(Error::prediction("batch size must be at least 1"));
    }

    let label_count = labels.len();
    if flat.len() != batch_size * label_count {
        return Err(Error::prediction(format!(
            "engine returned {} values, expected {} ({} samples x {} labels)",
            flat.len(),
            batch_size * label_count,
            batch_size,
            label_count
        )));
    }

    let mut output = Vec::with_capacity(batch_size);
    for i in 0..batch_size {
        let mut features = Vec::with_capacity(label_count);
        for (j, name) in labels.iter().enumerate() {
            features.push(Feature::new(
                j as i64,
                name.clone(),
                flat[i * label_count + j],
            ));
        }
        output.push(features);
    }
    Ok(output)
}
