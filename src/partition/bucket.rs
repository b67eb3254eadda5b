//! Value-to-bucket routing.

/// Bucket for `value` when the value range is cut into `partitions` buckets
/// of width `divider`.
///
/// Bucket `i` covers `(i·d, (i+1)·d]`, with everything at or below `d`
/// (including `0` and negatives) in bucket 0 and everything above the top
/// bound in the last bucket. A non-positive or non-finite divider and NaN
/// values route to bucket 0.
#[inline]
pub fn bucket_index(value: f32, divider: f32, partitions: usize) -> usize {
    if partitions <= 1 || !(divider > 0.0) || !divider.is_finite() {
        return 0;
    }
    let last = partitions as i64 - 1;
    // `as` saturates, and NaN becomes 0.
    ((value / divider).ceil() as i64 - 1).clamp(0, last) as usize
}

/// Nominal `[lower, upper)` bounds of bucket `index`.
#[inline]
pub fn bucket_bounds(index: usize, divider: f32) -> (f32, f32) {
    (index as f32 * divider, (index + 1) as f32 * divider)
}
