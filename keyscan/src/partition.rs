use std::num::NonZeroUsize;
use std::ops::Range;

/// Splits `total` items into `workers` contiguous, half-open index ranges.
///
/// Every worker but the last gets `total / workers` items; the last one also
/// takes the remainder. The ranges are disjoint, in order, and cover exactly
/// `0..total`. When `total < workers` the leading ranges are empty, which is
/// allowed: every worker still gets a (possibly empty) slice.
pub fn partition(total: usize, workers: NonZeroUsize) -> Vec<Range<usize>> {
    let workers = workers.get();
    let base = total / workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let end = if i == workers - 1 {
            total
        } else {
            ((i + 1) * base).min(total)
        };
        // end >= start for every range
        let end = end.max(start);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Borrows the slice of `items` that each range selects
pub fn split_slices<'a, T>(items: &'a [T], ranges: &[Range<usize>]) -> Vec<&'a [T]> {
    ranges.iter().map(|r| &items[r.clone()]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).unwrap()
    }

    #[test]
    fn test_even_split() {
        assert_eq!(partition(8, n(4)), vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn test_last_worker_takes_remainder() {
        assert_eq!(partition(10, n(4)), vec![0..2, 2..4, 4..6, 6..10]);
    }

    #[test]
    fn test_fewer_files_than_workers() {
        assert_eq!(partition(2, n(4)), vec![0..0, 0..0, 0..0, 0..2]);
    }

    #[test]
    fn test_no_files() {
        let ranges = partition(0, n(4));
        assert_eq!(ranges.len(), 4);
        assert!(ranges.iter().all(|r| r.is_empty()));
    }

    #[test]
    fn test_single_worker() {
        assert_eq!(partition(5, n(1)), vec![0..5]);
    }

    #[test]
    fn test_ranges_cover_exactly_once() {
        for workers in 1..=9 {
            for total in 0..=64 {
                let ranges = partition(total, n(workers));
                assert_eq!(ranges.len(), workers);

                let mut expected_start = 0;
                for r in &ranges {
                    assert_eq!(r.start, expected_start, "gap or overlap at {:?}", r);
                    assert!(r.start <= r.end);
                    expected_start = r.end;
                }
                assert_eq!(expected_start, total);

                let mut seen = vec![0u8; total];
                for r in &ranges {
                    for i in r.clone() {
                        seen[i] += 1;
                    }
                }
                assert!(seen.iter().all(|&c| c == 1));
            }
        }
    }

    #[test]
    fn test_split_slices() {
        let items = ["a", "b", "c", "d", "e"];
        let slices = split_slices(&items, &partition(items.len(), n(2)));
        assert_eq!(slices, vec![&items[0..2], &items[2..5]]);
    }
}
