use crate::core::structure;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PairingError {
    #[error("Pairing length {actual} does not match sequence length {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Position {position} points to partner {partner}, outside a pairing of length {len}")]
    OutOfBounds {
        position: usize,
        partner: usize,
        len: usize,
    },
    #[error("Position {0} is paired with itself")]
    SelfPair(usize),
    #[error("Position {position} points to {partner}, but {partner} does not point back")]
    Asymmetric { position: usize, partner: usize },
    #[error("Pair ({}, {}) crosses pair ({}, {})", first.0, first.1, second.0, second.1)]
    Crossing {
        first: (usize, usize),
        second: (usize, usize),
    },
    #[error("Unbalanced bracket at position {0}")]
    UnbalancedBracket(usize),
    #[error("Invalid bracket symbol '{symbol}' at position {position}")]
    InvalidSymbol { position: usize, symbol: char },
}

/// Partner-index array describing a (possibly partial) secondary structure.
///
/// `partner(k) == None` means position `k` is unpaired. Every constructor
/// enforces symmetry and the non-crossing invariant, so code holding a
/// `Pairing` never has to re-check them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Pairing {
    partners: Vec<Option<usize>>,
}

impl Pairing {
    pub fn unpaired(len: usize) -> Self {
        Self {
            partners: vec![None; len],
        }
    }

    /// Builds a pairing from raw partner slots, validating bounds, symmetry and
    /// the absence of crossing pairs.
    pub fn from_partners(partners: Vec<Option<usize>>) -> Result<Self, PairingError> {
        let len = partners.len();
        for (position, slot) in partners.iter().enumerate() {
            let Some(partner) = *slot else { continue };
            if partner >= len {
                return Err(PairingError::OutOfBounds {
                    position,
                    partner,
                    len,
                });
            }
            if partner == position {
                return Err(PairingError::SelfPair(position));
            }
            if partners[partner] != Some(position) {
                return Err(PairingError::Asymmetric { position, partner });
            }
        }

        let pairing = Self { partners };
        if let Some((first, second)) = pairing.first_crossing() {
            return Err(PairingError::Crossing { first, second });
        }
        Ok(pairing)
    }

    pub fn from_bracket(text: &str) -> Result<Self, PairingError> {
        structure::parse_bracket_notation(text)
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    #[inline]
    pub fn partner(&self, position: usize) -> Option<usize> {
        self.partners.get(position).copied().flatten()
    }

    #[inline]
    pub fn is_paired(&self, position: usize) -> bool {
        self.partner(position).is_some()
    }

    pub fn partners(&self) -> &[Option<usize>] {
        &self.partners
    }

    /// Iterates over pairs `(i, j)` with `i < j`, ordered by `i`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.partners
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.filter(|&j| j > i).map(|j| (i, j)))
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs().count()
    }

    pub fn unpaired_count(&self) -> usize {
        self.partners.iter().filter(|slot| slot.is_none()).count()
    }

    /// True iff the candidate pair `(i, j)` would cross any existing pair.
    pub fn crosses_any(&self, i: usize, j: usize) -> bool {
        self.pairs().any(|(k, l)| structure::crosses(i, j, k, l))
    }

    pub fn is_non_crossing(&self) -> bool {
        self.first_crossing().is_none()
    }

    pub fn to_bracket(&self) -> String {
        structure::to_bracket_notation(self)
    }

    fn first_crossing(&self) -> Option<((usize, usize), (usize, usize))> {
        let pairs: Vec<_> = self.pairs().collect();
        for (idx, &(i, j)) in pairs.iter().enumerate() {
            for &(k, l) in &pairs[idx + 1..] {
                if structure::crosses(i, j, k, l) {
                    return Some(((i, j), (k, l)));
                }
            }
        }
        None
    }

    /// Commits `(i, j)` without validation. Callers must have checked that both
    /// positions are free and the pair crosses nothing.
    pub(crate) fn set_pair(&mut self, i: usize, j: usize) {
        debug_assert!(self.partners[i].is_none() && self.partners[j].is_none());
        debug_assert!(!self.crosses_any(i, j));
        self.partners[i] = Some(j);
        self.partners[j] = Some(i);
    }
}
