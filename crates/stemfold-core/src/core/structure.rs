use super::models::pairing::{Pairing, PairingError};
use super::models::sequence::Base;

/// Smallest number of unpaired bases a hairpin loop may enclose.
pub const MIN_HAIRPIN_LOOP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairKind {
    WatsonCrick, // G-C, C-G, A-U, U-A
    Wobble,      // G-U, U-G
}

pub fn pair_kind(a: Base, b: Base) -> Option<PairKind> {
    match (a, b) {
        (Base::G, Base::C) | (Base::C, Base::G) | (Base::A, Base::U) | (Base::U, Base::A) => {
            Some(PairKind::WatsonCrick)
        }
        (Base::G, Base::U) | (Base::U, Base::G) => Some(PairKind::Wobble),
        _ => None,
    }
}

#[inline]
pub fn is_valid_pair(a: Base, b: Base) -> bool {
    pair_kind(a, b).is_some()
}

#[inline]
pub fn min_loop_ok(i: usize, j: usize, min_loop: usize) -> bool {
    j > i && j - i - 1 >= min_loop
}

/// True iff exactly one of `k`, `l` lies strictly inside `(i, j)`.
#[inline]
pub fn crosses(i: usize, j: usize, k: usize, l: usize) -> bool {
    (i < k && k < j && j < l) || (k < i && i < l && l < j)
}

pub fn to_bracket_notation(pairing: &Pairing) -> String {
    pairing
        .partners()
        .iter()
        .enumerate()
        .map(|(i, slot)| match *slot {
            Some(j) if j > i => '(',
            Some(_) => ')',
            None => '.',
        })
        .collect()
}

pub fn parse_bracket_notation(text: &str) -> Result<Pairing, PairingError> {
    let mut partners = vec![None; text.chars().count()];
    let mut open = Vec::new();

    for (position, symbol) in text.chars().enumerate() {
        match symbol {
            '(' => open.push(position),
            ')' => {
                let start = open
                    .pop()
                    .ok_or(PairingError::UnbalancedBracket(position))?;
                partners[start] = Some(position);
                partners[position] = Some(start);
            }
            '.' => {}
            other => {
                return Err(PairingError::InvalidSymbol {
                    position,
                    symbol: other,
                });
            }
        }
    }

    if let Some(&unclosed) = open.last() {
        return Err(PairingError::UnbalancedBracket(unclosed));
    }
    Pairing::from_partners(partners)
}
