use crate::core::models::pairing::Pairing;

/// A maximal run of stacked pairs `(start + k, end - k)` for `k < len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stem {
    pub start: usize,
    pub end: usize,
    pub len: usize,
}

impl Stem {
    pub fn outer_pair(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// The innermost pair, which closes the loop region of this stem.
    pub fn inner_pair(&self) -> (usize, usize) {
        (self.start + self.len - 1, self.end + 1 - self.len)
    }

    pub fn layer(&self, k: usize) -> (usize, usize) {
        debug_assert!(k < self.len);
        (self.start + k, self.end - k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRegion {
    /// No inner stems. `len` is the number of enclosed bases.
    Hairpin { closing: (usize, usize), len: usize },
    /// Exactly one inner stem, with unpaired flanks on either side.
    Internal {
        closing: (usize, usize),
        inner: (usize, usize),
        left_len: usize,
        right_len: usize,
    },
    /// Two or more inner stems meeting at one enclosing pair.
    Multibranch {
        closing: (usize, usize),
        branches: usize,
        unpaired: usize,
    },
}

impl LoopRegion {
    pub fn closing(&self) -> (usize, usize) {
        match *self {
            LoopRegion::Hairpin { closing, .. }
            | LoopRegion::Internal { closing, .. }
            | LoopRegion::Multibranch { closing, .. } => closing,
        }
    }
}

/// Splits a pairing into maximal stems, ordered by their 5' start.
pub fn decompose_stems(pairing: &Pairing) -> Vec<Stem> {
    let n = pairing.len();
    let mut stems = Vec::new();
    let mut i = 0;
    while i < n {
        match pairing.partner(i) {
            Some(j) if j > i => {
                let mut len = 1;
                while i + len < j - len && pairing.partner(i + len) == Some(j - len) {
                    len += 1;
                }
                stems.push(Stem { start: i, end: j, len });
                i += len;
            }
            _ => i += 1,
        }
    }
    stems
}

/// Classifies the region enclosed by each stem's innermost pair.
///
/// A closing pair with no enclosed bases at all produces no region; only
/// closures that leave at least one position between the partners are loops.
pub fn classify_loops(pairing: &Pairing, stems: &[Stem]) -> Vec<LoopRegion> {
    stems
        .iter()
        .filter_map(|stem| classify_enclosed(pairing, stem.inner_pair()))
        .collect()
}

fn classify_enclosed(pairing: &Pairing, closing: (usize, usize)) -> Option<LoopRegion> {
    let (p, q) = closing;
    if q <= p + 1 {
        return None;
    }

    let mut branches: Vec<(usize, usize)> = Vec::new();
    let mut unpaired = 0;
    let mut k = p + 1;
    while k < q {
        match pairing.partner(k) {
            Some(m) if m > k => {
                branches.push((k, m));
                k = m + 1;
            }
            _ => {
                unpaired += 1;
                k += 1;
            }
        }
    }

    let region = match branches.as_slice() {
        [] => LoopRegion::Hairpin {
            closing,
            len: q - p - 1,
        },
        [inner] => LoopRegion::Internal {
            closing,
            inner: *inner,
            left_len: inner.0 - p - 1,
            right_len: q - inner.1 - 1,
        },
        _ => LoopRegion::Multibranch {
            closing,
            branches: branches.len(),
            unpaired,
        },
    };
    Some(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairing(text: &str) -> Pairing {
        Pairing::from_bracket(text).unwrap()
    }

    #[test]
    fn decompose_stems_finds_single_stacked_helix() {
        let stems = decompose_stems(&pairing("(((...)))"));
        assert_eq!(
            stems,
            vec![Stem {
                start: 0,
                end: 8,
                len: 3
            }]
        );
        assert_eq!(stems[0].inner_pair(), (2, 6));
        assert_eq!(stems[0].layer(1), (1, 7));
    }

    #[test]
    fn decompose_stems_splits_at_bulge() {
        let stems = decompose_stems(&pairing("((.((...))))"));
        assert_eq!(stems.len(), 2);
        assert_eq!(stems[0].outer_pair(), (0, 11));
        assert_eq!(stems[0].len, 2);
        assert_eq!(stems[1].outer_pair(), (3, 9));
        assert_eq!(stems[1].len, 2);
    }

    #[test]
    fn decompose_stems_reports_isolated_pairs_with_length_one() {
        let stems = decompose_stems(&pairing(".(...).(...)"));
        assert_eq!(stems.len(), 2);
        assert!(stems.iter().all(|s| s.len == 1));
    }

    #[test]
    fn decompose_stems_is_empty_for_unpaired_structure() {
        assert!(decompose_stems(&Pairing::unpaired(10)).is_empty());
    }

    #[test]
    fn classify_loops_detects_hairpin_length() {
        let p = pairing("((....))");
        let loops = classify_loops(&p, &decompose_stems(&p));
        assert_eq!(
            loops,
            vec![LoopRegion::Hairpin {
                closing: (1, 6),
                len: 4
            }]
        );
    }

    #[test]
    fn classify_loops_skips_closure_without_enclosed_bases() {
        let p = pairing("(())");
        assert!(classify_loops(&p, &decompose_stems(&p)).is_empty());
    }

    #[test]
    fn classify_loops_measures_internal_loop_flanks() {
        let p = pairing("(..((...)).)");
        let loops = classify_loops(&p, &decompose_stems(&p));
        assert_eq!(
            loops[0],
            LoopRegion::Internal {
                closing: (0, 11),
                inner: (3, 9),
                left_len: 2,
                right_len: 1
            }
        );
        assert!(matches!(loops[1], LoopRegion::Hairpin { len: 3, .. }));
    }

    #[test]
    fn classify_loops_counts_multibranch_branches_and_unpaired() {
        let p = pairing("(.(...).(...)..)");
        let loops = classify_loops(&p, &decompose_stems(&p));
        assert_eq!(
            loops[0],
            LoopRegion::Multibranch {
                closing: (0, 15),
                branches: 2,
                unpaired: 4
            }
        );
        assert_eq!(loops.len(), 3);
        assert_eq!(loops[0].closing(), (0, 15));
    }
}
