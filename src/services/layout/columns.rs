/// Greedy interval packing over intervals already sorted by `(start, end)`.
///
/// Each interval takes the first column whose last end is at or before its
/// start, or opens a new column. Earlier assignments are never revisited.
pub fn assign_columns(sorted: &[(f64, f64)]) -> Vec<usize> {
    let mut column_ends: Vec<f64> = Vec::new();
    let mut columns = Vec::with_capacity(sorted.len());

    for &(start, end) in sorted {
        let column = match column_ends.iter().position(|&column_end| column_end <= start) {
            Some(free) => free,
            None => {
                column_ends.push(end);
                column_ends.len() - 1
            }
        };
        column_ends[column] = end;
        columns.push(column);
    }

    columns
}

/// Highest number of intervals covering any instant inside each interval.
///
/// Coverage is counted per elementary sub-interval between consecutive
/// distinct boundary points. A zero-length interval spans none of them and
/// reports 1.
pub fn peak_concurrency(intervals: &[(f64, f64)]) -> Vec<usize> {
    let mut points: Vec<f64> = intervals
        .iter()
        .flat_map(|&(start, end)| [start, end])
        .collect();
    points.sort_by(f64::total_cmp);
    points.dedup();

    let index_of = |value: f64| {
        points
            .binary_search_by(|probe| probe.total_cmp(&value))
            .unwrap_or_else(|insert_at| insert_at)
    };
    let spans: Vec<(usize, usize)> = intervals
        .iter()
        .map(|&(start, end)| (index_of(start), index_of(end)))
        .collect();

    // coverage[i] counts intervals covering [points[i], points[i + 1]).
    let segments = points.len().saturating_sub(1);
    let mut delta = vec![0_i64; segments + 1];
    for &(first, last) in &spans {
        if first < last {
            delta[first] += 1;
            delta[last] -= 1;
        }
    }
    let mut coverage = Vec::with_capacity(segments);
    let mut running = 0_i64;
    for step in delta.iter().take(segments) {
        running += step;
        coverage.push(running.max(0) as usize);
    }

    spans
        .iter()
        .map(|&(first, last)| {
            coverage
                .get(first..last)
                .and_then(|segment| segment.iter().copied().max())
                .unwrap_or(0)
                .max(1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_columns_reuses_freed_column() {
        let intervals = [(0.0, 60.0), (30.0, 90.0), (60.0, 120.0), (90.0, 100.0)];
        assert_eq!(assign_columns(&intervals), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_assign_columns_touching_intervals_share_column() {
        let intervals = [(0.0, 60.0), (60.0, 120.0)];
        assert_eq!(assign_columns(&intervals), vec![0, 0]);
    }

    #[test]
    fn test_peak_concurrency_nested_entry() {
        // A long entry with two short ones nested at different times; the
        // middle one overlaps both the long one and the first short one.
        let intervals = [(0.0, 240.0), (30.0, 90.0), (60.0, 120.0), (180.0, 200.0)];
        assert_eq!(peak_concurrency(&intervals), vec![3, 3, 3, 2]);
    }

    #[test]
    fn test_peak_concurrency_disjoint() {
        let intervals = [(0.0, 10.0), (10.0, 20.0)];
        assert_eq!(peak_concurrency(&intervals), vec![1, 1]);
    }

    #[test]
    fn test_peak_concurrency_zero_length() {
        let intervals = [(10.0, 10.0), (0.0, 30.0)];
        assert_eq!(peak_concurrency(&intervals), vec![1, 1]);
    }

    #[test]
    fn test_empty_input() {
        assert!(assign_columns(&[]).is_empty());
        assert!(peak_concurrency(&[]).is_empty());
    }
}
