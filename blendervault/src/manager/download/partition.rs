//! Byte-range partitioning for chunked downloads.

/// An inclusive byte range within a remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range (inclusive, per the HTTP `Range` convention).
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by this range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether the range covers no bytes. Never true for ranges produced by
    /// [`partition`].
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Value for the HTTP `Range` header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Partition `[0, total_size)` into contiguous ranges for `worker_count`
/// workers.
///
/// Ranges cover the span exactly, with no overlap and no gap. Sizes differ
/// by at most one byte (the leading ranges take the remainder), so each is
/// at most `ceil(total_size / worker_count)` bytes. Workers that would
/// receive an empty range are dropped: the result holds
/// `min(worker_count, total_size)` ranges when `total_size > 0`, and none
/// otherwise.
pub fn partition(total_size: u64, worker_count: usize) -> Vec<ByteRange> {
    if total_size == 0 || worker_count == 0 {
        return Vec::new();
    }

    let workers = (worker_count as u64).min(total_size);
    let base = total_size / workers;
    let remainder = total_size % workers;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 0u64;
    for index in 0..workers {
        let size = if index < remainder { base + 1 } else { base };
        ranges.push(ByteRange {
            start,
            end: start + size - 1,
        });
        start += size;
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partition_zero_size_is_empty() {
        assert!(partition(0, 4).is_empty());
    }

    #[test]
    fn test_partition_single_worker_spans_file() {
        let ranges = partition(1000, 1);
        assert_eq!(ranges, vec![ByteRange { start: 0, end: 999 }]);
    }

    #[test]
    fn test_partition_even_split() {
        let ranges = partition(100, 4);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0], ByteRange { start: 0, end: 24 });
        assert_eq!(ranges[3], ByteRange { start: 75, end: 99 });
    }

    #[test]
    fn test_partition_remainder_spread_over_leading_ranges() {
        let ranges = partition(10, 3);
        let sizes: Vec<u64> = ranges.iter().map(ByteRange::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_partition_more_workers_than_bytes() {
        let ranges = partition(3, 10);
        assert_eq!(ranges.len(), 3);
        for (i, range) in ranges.iter().enumerate() {
            assert_eq!(range.start, i as u64);
            assert_eq!(range.len(), 1);
        }
    }

    #[test]
    fn test_header_value_format() {
        let range = ByteRange { start: 25, end: 49 };
        assert_eq!(range.header_value(), "bytes=25-49");
    }

    proptest! {
        #[test]
        fn prop_partition_covers_span_exactly(
            total in 0u64..=(1 << 32),
            workers in 1usize..=10,
        ) {
            let ranges = partition(total, workers);

            if total == 0 {
                prop_assert!(ranges.is_empty());
                return Ok(());
            }

            // Count of non-empty ranges.
            prop_assert_eq!(ranges.len() as u64, (workers as u64).min(total));

            // Union is exactly [0, total) with no overlap and no gap.
            prop_assert_eq!(ranges[0].start, 0);
            prop_assert_eq!(ranges[ranges.len() - 1].end, total - 1);
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].end + 1);
            }

            // Sizes never exceed the ceiling chunk size.
            let ceiling = total.div_ceil(workers as u64);
            for range in &ranges {
                prop_assert!(!range.is_empty());
                prop_assert!(range.len() <= ceiling);
            }

            let covered: u64 = ranges.iter().map(ByteRange::len).sum();
            prop_assert_eq!(covered, total);
        }
    }
}
