use super::params::{EnergyParams, StackMotif};
use crate::core::models::sequence::Base;

#[inline]
pub fn stack_layer(params: &EnergyParams, motif: &StackMotif) -> f64 {
    params.stack_energy(motif)
}

/// `core` is the enclosed loop sequence; only 4-base cores can earn a
/// tetraloop bonus, and only the first matching family counts.
pub fn hairpin(params: &EnergyParams, core: &[Base]) -> f64 {
    let hp = &params.hairpin;
    let len = core.len();
    if len < hp.min_loop {
        return hp.tiny_loop_penalty;
    }
    let base = hp.a + hp.b * (len as f64).ln();
    let bonus = hp
        .tetraloops
        .iter()
        .find(|t| t.matches(core))
        .map_or(0.0, |t| t.bonus);
    base + bonus
}

pub fn internal_loop(params: &EnergyParams, left_len: usize, right_len: usize) -> f64 {
    let il = &params.internal;
    let total = left_len + right_len;
    let mut energy = il.c
        + il.d * (total.max(1) as f64).ln()
        + il.asymmetry * left_len.abs_diff(right_len) as f64;
    if total == 1 {
        energy += il.single_bulge_bonus;
    }
    energy
}

pub fn multibranch(params: &EnergyParams, branches: usize, unpaired: usize) -> f64 {
    let mb = &params.multibranch;
    mb.a + mb.per_branch * branches as f64 + mb.per_unpaired * unpaired as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn bases(s: &str) -> Vec<Base> {
        s.chars().map(|c| Base::try_from(c).unwrap()).collect()
    }

    #[test]
    fn hairpin_below_minimum_loop_returns_fixed_penalty_for_any_content() {
        let params = EnergyParams::default();
        for core in ["", "A", "GC", "UU"] {
            assert_eq!(hairpin(&params, &bases(core)), params.hairpin.tiny_loop_penalty);
        }
    }

    #[test]
    fn hairpin_uses_log_length_model() {
        let params = EnergyParams::default();
        let expected = params.hairpin.a + params.hairpin.b * 5f64.ln();
        assert!(f64_approx_equal(hairpin(&params, &bases("AAAAA")), expected));
    }

    #[test]
    fn hairpin_applies_tetraloop_bonus_to_matching_core() {
        let params = EnergyParams::default();
        let plain = hairpin(&params, &bases("AAAA"));
        assert!(f64_approx_equal(hairpin(&params, &bases("GAAA")), plain - 0.8));
        assert!(f64_approx_equal(hairpin(&params, &bases("UUCG")), plain - 1.3));
        assert!(f64_approx_equal(hairpin(&params, &bases("CUUG")), plain - 1.0));
    }

    #[test]
    fn internal_loop_penalizes_asymmetry() {
        let params = EnergyParams::default();
        let symmetric = internal_loop(&params, 2, 2);
        let asymmetric = internal_loop(&params, 4, 0);
        assert!(f64_approx_equal(
            asymmetric - symmetric,
            4.0 * params.internal.asymmetry
        ));
    }

    #[test]
    fn internal_loop_single_base_bulge_receives_bonus() {
        let params = EnergyParams::default();
        let expected = params.internal.c
            + params.internal.asymmetry
            + params.internal.single_bulge_bonus;
        assert!(f64_approx_equal(internal_loop(&params, 1, 0), expected));
    }

    #[test]
    fn multibranch_is_linear_in_branches_and_unpaired() {
        let params = EnergyParams::default();
        let mb = &params.multibranch;
        assert!(f64_approx_equal(
            multibranch(&params, 3, 5),
            mb.a + 3.0 * mb.per_branch + 5.0 * mb.per_unpaired
        ));
    }

    #[test]
    fn stack_layer_uses_table_value() {
        let params = EnergyParams::default();
        let motif = [Base::G, Base::C, Base::G, Base::C];
        assert_eq!(stack_layer(&params, &motif), -2.3);
    }
}
