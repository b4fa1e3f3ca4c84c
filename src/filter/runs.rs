/// A maximal stretch of `true` positions in a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub length: usize,
}

impl Run {
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Find every maximal run of `true` values, left to right.
///
/// The mask is treated as if padded with a `false` on both sides: a run
/// starts where the signal rises and ends where it falls.
pub fn find_runs(mask: &[bool]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut prev = false;
    let mut start = 0;

    for (i, &cur) in mask.iter().chain(std::iter::once(&false)).enumerate() {
        match (prev, cur) {
            (false, true) => start = i,
            (true, false) => runs.push(Run {
                start,
                length: i - start,
            }),
            _ => {}
        }
        prev = cur;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(bits: &[u8]) -> Vec<bool> {
        bits.iter().map(|&b| b != 0).collect()
    }

    fn pairs(runs: &[Run]) -> Vec<(usize, usize)> {
        runs.iter().map(|r| (r.start, r.length)).collect()
    }

    #[test]
    fn empty_and_all_false() {
        assert!(find_runs(&[]).is_empty());
        assert!(find_runs(&mask(&[0, 0, 0, 0, 0, 0])).is_empty());
    }

    #[test]
    fn alternating() {
        let runs = find_runs(&mask(&[1, 0, 1, 0, 1, 0]));
        assert_eq!(pairs(&runs), vec![(0, 1), (2, 1), (4, 1)]);
    }

    #[test]
    fn single_inner_run() {
        let runs = find_runs(&mask(&[0, 1, 1, 1, 0, 0]));
        assert_eq!(pairs(&runs), vec![(1, 3)]);
    }

    #[test]
    fn all_true() {
        let runs = find_runs(&mask(&[1, 1, 1, 1, 1, 1]));
        assert_eq!(pairs(&runs), vec![(0, 6)]);
    }

    #[test]
    fn run_touching_the_end() {
        let runs = find_runs(&mask(&[0, 0, 0, 0, 0, 1]));
        assert_eq!(pairs(&runs), vec![(5, 1)]);
        assert_eq!(runs[0].end(), 6);
    }

    #[test]
    fn runs_cover_exactly_the_true_positions() {
        // every 12-bit mask
        for bits in 0u32..(1 << 12) {
            let m: Vec<bool> = (0..12).map(|i| bits & (1 << i) != 0).collect();
            let runs = find_runs(&m);

            let mut covered = vec![false; m.len()];
            let mut last_end = None;
            for r in &runs {
                assert!(r.length > 0);
                if let Some(end) = last_end {
                    // ordered, disjoint and maximal (a gap separates runs)
                    assert!(r.start > end);
                }
                for c in &mut covered[r.start..r.end()] {
                    *c = true;
                }
                last_end = Some(r.end());
            }
            assert_eq!(covered, m, "mask {:012b}", bits);
        }
    }
}
