/// Indices of local maxima at or above `height`, at least `distance` apart.
///
/// Flat tops count once, at their midpoint (rounded down). The edges are
/// never peaks. When two peaks are closer than `distance`, the higher one
/// wins; equal heights keep the later one.
///
/// # Examples
/// ```
/// use fireshark_core::analysis::anomaly::peaks::find_peaks;
///
/// let values = [0.0, 3.0, 0.0, 1.0, 0.0, 2.0, 2.0, 0.0];
/// assert_eq!(find_peaks(&values, 1.5, 1), vec![1, 5]);
/// ```
pub fn find_peaks(values: &[f64], height: f64, distance: usize) -> Vec<usize> {
    let peaks: Vec<usize> = local_maxima(values)
        .into_iter()
        .filter(|&i| values[i] >= height)
        .collect();
    select_by_distance(values, &peaks, distance)
}

fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }
    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(values: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| values[peaks[a]].total_cmp(&values[peaks[b]]));

    for &current in order.iter().rev() {
        if !keep[current] {
            continue;
        }
        let position = peaks[current];
        for k in (0..current).rev() {
            if position - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in current + 1..peaks.len() {
            if peaks[k] - position >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::find_peaks;

    #[test]
    fn plateau_reports_midpoint() {
        let values = [0.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&values, 0.0, 1), vec![2]);
        let values = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&values, 0.0, 1), vec![1]);
    }

    #[test]
    fn edges_and_rising_plateaus_are_not_peaks() {
        assert!(find_peaks(&[5.0, 1.0, 0.0], 0.0, 1).is_empty());
        assert!(find_peaks(&[0.0, 1.0, 1.0], 0.0, 1).is_empty());
        assert!(find_peaks(&[0.0, 1.0, 1.0, 2.0, 0.0], 0.0, 1) == vec![3]);
        assert!(find_peaks(&[1.0, 2.0], 0.0, 1).is_empty());
    }

    #[test]
    fn height_is_inclusive() {
        let values = [0.0, 2.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&values, 2.0, 1), vec![1]);
        assert_eq!(find_peaks(&values, 1.0, 1), vec![1, 3]);
    }

    #[test]
    fn distance_keeps_highest_peak() {
        //             0    1    2    3    4    5    6    7    8    9
        let values = [0.0, 2.0, 0.0, 5.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 4.0, 0.0];
        assert_eq!(find_peaks(&values, 0.0, 3), vec![3, 10]);
        assert_eq!(find_peaks(&values, 0.0, 2), vec![1, 3, 5, 10]);
    }

    #[test]
    fn distance_tie_keeps_later_peak() {
        let values = [0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&values, 0.0, 3), vec![3]);
    }
}
