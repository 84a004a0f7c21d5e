use super::config::{ActionSpace, EnvConfig, PairRule};
use super::error::EngineError;
use crate::core::energy::scoring::EnergyModel;
use crate::core::models::pairing::{Pairing, PairingError};
use crate::core::models::sequence::Sequence;
use crate::core::structure;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A move at the current cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Pair the cursor with the given later position.
    Pair(usize),
    /// Leave the cursor unpaired.
    Skip,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pair(j) => write!(f, "pair({})", j),
            Action::Skip => write!(f, "skip"),
        }
    }
}

/// Snapshot of the environment's decision state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct State {
    pub cursor: usize,
    pub pairing: Pairing,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        self.cursor >= self.pairing.len()
    }

    pub fn structure(&self) -> String {
        self.pairing.to_bracket()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    pub structure: String,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub state: State,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Sequential folding environment over `(cursor, pairing)`.
///
/// The cursor only moves forward and always rests on an unpaired position
/// (or on `len`, which is terminal). Cloning is cheap apart from the pairing
/// itself: the sequence and the energy model are shared.
#[derive(Debug, Clone)]
pub struct FoldingEnv {
    sequence: Arc<Sequence>,
    model: Arc<EnergyModel>,
    config: EnvConfig,
    pairing: Pairing,
    cursor: usize,
    energy: f64,
}

impl FoldingEnv {
    pub fn new(
        sequence: Arc<Sequence>,
        model: Arc<EnergyModel>,
        config: EnvConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let pairing = Pairing::unpaired(sequence.len());
        let energy = model.score(&sequence, &pairing);
        Ok(Self {
            sequence,
            model,
            config,
            pairing,
            cursor: 0,
            energy,
        })
    }

    /// Resumes from an existing partial structure. The cursor is moved past
    /// any paired positions it lands on.
    pub fn with_state(mut self, pairing: Pairing, cursor: usize) -> Result<Self, EngineError> {
        let len = self.sequence.len();
        if pairing.len() != len {
            return Err(PairingError::LengthMismatch {
                expected: len,
                actual: pairing.len(),
            }
            .into());
        }
        if cursor > len {
            return Err(EngineError::CursorOutOfRange { cursor, len });
        }
        self.pairing = pairing;
        self.cursor = cursor;
        self.skip_paired();
        self.energy = self.model.score(&self.sequence, &self.pairing);
        Ok(self)
    }

    pub fn reset(&mut self) -> State {
        self.pairing = Pairing::unpaired(self.sequence.len());
        self.cursor = 0;
        self.energy = self.model.score(&self.sequence, &self.pairing);
        self.state()
    }

    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    pub fn model(&self) -> &Arc<EnergyModel> {
        &self.model
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Energy of the current pairing.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn is_terminal(&self) -> bool {
        self.cursor >= self.sequence.len()
    }

    pub fn state(&self) -> State {
        State {
            cursor: self.cursor,
            pairing: self.pairing.clone(),
        }
    }

    /// Actions offered at the cursor: `Skip` first (when the action space has
    /// it), then legal pairs by ascending partner. Empty once terminal.
    pub fn valid_actions(&self) -> Vec<Action> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.config.action_space == ActionSpace::ExplicitSkip {
            actions.push(Action::Skip);
        }
        actions.extend(
            (self.cursor + 1..self.sequence.len())
                .filter(|&j| self.check_pair(j).is_ok())
                .map(Action::Pair),
        );
        actions
    }

    pub fn step(&mut self, action: Action) -> Result<StepResult, EngineError> {
        if self.is_terminal() {
            return Err(EngineError::EpisodeFinished);
        }
        let committed = self.resolve(action)?;
        let old_energy = self.energy;

        if let Action::Pair(j) = committed {
            self.pairing.set_pair(self.cursor, j);
            self.energy = self.model.score(&self.sequence, &self.pairing);
        }
        self.cursor += 1;
        self.skip_paired();

        let done = self.is_terminal();
        let mut reward = old_energy - self.energy;
        if done {
            reward -= self.energy;
        }

        trace!(
            action = %committed,
            cursor = self.cursor,
            energy = self.energy,
            reward,
            done,
            "Step applied"
        );

        Ok(StepResult {
            state: self.state(),
            reward,
            done,
            info: StepInfo {
                structure: self.pairing.to_bracket(),
                energy: self.energy,
            },
        })
    }

    /// Energy change `new - current` that `action` would cause, without
    /// touching the environment.
    pub fn preview(&self, action: Action) -> Result<f64, EngineError> {
        if self.is_terminal() {
            return Err(EngineError::EpisodeFinished);
        }
        match self.resolve(action)? {
            Action::Skip => Ok(0.0),
            Action::Pair(j) => {
                let mut pairing = self.pairing.clone();
                pairing.set_pair(self.cursor, j);
                Ok(self.model.score(&self.sequence, &pairing) - self.energy)
            }
        }
    }

    /// Maps a requested action to the one actually committed, or explains
    /// why it is not offered.
    fn resolve(&self, action: Action) -> Result<Action, EngineError> {
        let invalid = |reason| EngineError::InvalidAction {
            action,
            cursor: self.cursor,
            reason,
        };
        match (self.config.action_space, action) {
            (ActionSpace::ExplicitSkip, Action::Skip) => Ok(Action::Skip),
            (ActionSpace::PairsOnly, _) if !self.has_legal_pair() => Ok(Action::Skip),
            (ActionSpace::PairsOnly, Action::Skip) => {
                Err(invalid("skip is not offered while a legal pair exists"))
            }
            (_, Action::Pair(j)) => {
                self.check_pair(j).map_err(invalid)?;
                Ok(Action::Pair(j))
            }
        }
    }

    fn has_legal_pair(&self) -> bool {
        (self.cursor + 1..self.sequence.len()).any(|j| self.check_pair(j).is_ok())
    }

    fn check_pair(&self, j: usize) -> Result<(), &'static str> {
        let i = self.cursor;
        if j <= i {
            return Err("partner must lie after the cursor");
        }
        if j >= self.sequence.len() {
            return Err("partner is out of range");
        }
        if self.pairing.is_paired(j) {
            return Err("partner is already paired");
        }
        if !structure::is_valid_pair(self.sequence[i], self.sequence[j]) {
            return Err("bases cannot pair");
        }
        if self.pairing.crosses_any(i, j) {
            return Err("pair would cross an existing pair");
        }
        match self.config.pair_rule {
            PairRule::MinSeparation { min_separation } if j - i < min_separation => {
                Err("partners are closer than the minimum separation")
            }
            PairRule::HairpinClosure { min_loop } if self.closes_short_hairpin(i, j, min_loop) => {
                Err("pair would close a hairpin below the minimum loop size")
            }
            _ => Ok(()),
        }
    }

    fn closes_short_hairpin(&self, i: usize, j: usize, min_loop: usize) -> bool {
        if self.pairing.partner(i + 1) == Some(j - 1) {
            return false;
        }
        let encloses_pair = (i + 1..j).any(|k| self.pairing.is_paired(k));
        !encloses_pair && !structure::min_loop_ok(i, j, min_loop)
    }

    fn skip_paired(&mut self) {
        while self.cursor < self.sequence.len() && self.pairing.is_paired(self.cursor) {
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{env_for, env_with};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn min_sep(s: usize) -> EnvConfig {
        EnvConfig {
            action_space: ActionSpace::ExplicitSkip,
            pair_rule: PairRule::MinSeparation { min_separation: s },
        }
    }

    #[test]
    fn new_environment_starts_unpaired_at_cursor_zero() {
        let env = env_for("GGGAAACCC");
        assert_eq!(env.cursor(), 0);
        assert_eq!(env.pairing().num_pairs(), 0);
        assert!(!env.is_terminal());
        assert!(env.energy() > 0.0);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let seq = Arc::new("GGGAAACCC".parse::<Sequence>().unwrap());
        let result = FoldingEnv::new(seq, Arc::new(EnergyModel::default()), min_sep(0));
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn valid_actions_lists_skip_first_then_complementary_partners() {
        let env = env_with("GAAAACAAAA", min_sep(4));
        assert_eq!(env.valid_actions(), vec![Action::Skip, Action::Pair(5)]);
    }

    #[test]
    fn pairs_only_space_omits_skip() {
        let config = EnvConfig {
            action_space: ActionSpace::PairsOnly,
            ..min_sep(4)
        };
        let env = env_with("GAAAACAAAA", config);
        assert_eq!(env.valid_actions(), vec![Action::Pair(5)]);
    }

    #[test]
    fn min_separation_filters_close_partners() {
        let env = env_with("GCAAC", min_sep(4));
        assert_eq!(env.valid_actions(), vec![Action::Skip, Action::Pair(4)]);
        let env = env_with("GCAAC", min_sep(1));
        assert_eq!(
            env.valid_actions(),
            vec![Action::Skip, Action::Pair(1), Action::Pair(4)]
        );
    }

    #[test]
    fn hairpin_rule_allows_stack_extension_but_rejects_bare_short_closure() {
        let config = EnvConfig {
            action_space: ActionSpace::ExplicitSkip,
            pair_rule: PairRule::HairpinClosure { min_loop: 3 },
        };
        let env = env_with("GAC", config);
        assert_eq!(env.valid_actions(), vec![Action::Skip]);
        let env = env_with("GAAAC", config);
        assert_eq!(env.valid_actions(), vec![Action::Skip, Action::Pair(4)]);

        let pairing = Pairing::from_bracket(".().").unwrap();
        let resumed = env_with("GGCC", config).with_state(pairing, 0).unwrap();
        assert_eq!(resumed.valid_actions(), vec![Action::Skip, Action::Pair(3)]);
    }

    #[test]
    fn hairpin_rule_exempts_pairs_enclosing_an_unstacked_inner_pair() {
        let config = EnvConfig {
            action_space: ActionSpace::ExplicitSkip,
            pair_rule: PairRule::HairpinClosure { min_loop: 5 },
        };
        let bare = env_with("GAGACC", config);
        assert_eq!(bare.valid_actions(), vec![Action::Skip]);
        assert!(matches!(
            bare.clone().step(Action::Pair(5)),
            Err(EngineError::InvalidAction { .. })
        ));

        let pairing = Pairing::from_bracket("..(.).").unwrap();
        let mut resumed = env_with("GAGACC", config).with_state(pairing, 0).unwrap();
        assert_eq!(resumed.valid_actions(), vec![Action::Skip, Action::Pair(5)]);
        let result = resumed.step(Action::Pair(5)).unwrap();
        assert_eq!(result.info.structure, "(.(.))");
    }

    #[test]
    fn step_pair_commits_both_slots_and_skips_paired_positions() {
        let mut env = env_with("GCGC", min_sep(1));
        let result = env.step(Action::Pair(3)).unwrap();
        assert_eq!(env.pairing().partner(0), Some(3));
        assert_eq!(env.pairing().partner(3), Some(0));
        assert_eq!(env.cursor(), 1);
        assert!(!result.done);
        assert_eq!(result.info.structure, "(..)");

        env.step(Action::Pair(2)).unwrap();
        assert_eq!(env.cursor(), 4);
        assert!(env.is_terminal());
    }

    #[test]
    fn gcgc_episode_reaches_stacked_structure_with_negative_energy() {
        let mut env = env_with("GCGC", min_sep(1));
        env.step(Action::Pair(3)).unwrap();
        let result = env.step(Action::Pair(2)).unwrap();
        assert!(result.done);
        assert_eq!(result.info.structure, "(())");
        assert!(result.info.energy < 0.0);
    }

    #[test]
    fn reward_is_energy_drop_plus_terminal_bonus() {
        let mut env = env_with("GCGC", min_sep(1));
        let e0 = env.energy();
        let first = env.step(Action::Pair(3)).unwrap();
        let e1 = env.energy();
        assert!(f64_approx_equal(first.reward, e0 - e1));

        let second = env.step(Action::Pair(2)).unwrap();
        let e2 = env.energy();
        assert!(f64_approx_equal(second.reward, (e1 - e2) - e2));
    }

    #[test]
    fn step_rejects_crossing_pair_and_leaves_state_unchanged() {
        let env = env_with("GGCC", min_sep(1));
        let pairing = Pairing::from_bracket(".(.)").unwrap();
        let mut env = env.with_state(pairing, 0).unwrap();
        let before = env.state();
        let energy = env.energy();

        let result = env.step(Action::Pair(2));
        assert!(matches!(result, Err(EngineError::InvalidAction { .. })));
        assert_eq!(env.state(), before);
        assert_eq!(env.energy(), energy);
    }

    #[test]
    fn step_rejects_non_complementary_partner() {
        let mut env = env_with("GAAAAA", min_sep(1));
        let err = env.step(Action::Pair(5)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidAction {
                reason: "bases cannot pair",
                cursor: 0,
                ..
            }
        ));
        assert_eq!(env.cursor(), 0);
    }

    #[test]
    fn step_after_terminal_is_an_error() {
        let mut env = env_with("GC", min_sep(1));
        env.step(Action::Skip).unwrap();
        env.step(Action::Skip).unwrap();
        assert!(env.is_terminal());
        assert!(matches!(
            env.step(Action::Skip),
            Err(EngineError::EpisodeFinished)
        ));
        assert!(env.valid_actions().is_empty());
    }

    #[test]
    fn pairs_only_step_skips_implicitly_when_no_pair_is_legal() {
        let config = EnvConfig {
            action_space: ActionSpace::PairsOnly,
            ..min_sep(1)
        };
        let mut env = env_with("AAG", config);
        assert!(env.valid_actions().is_empty());
        let result = env.step(Action::Pair(2)).unwrap();
        assert_eq!(env.cursor(), 1);
        assert_eq!(result.info.structure, "...");
    }

    #[test]
    fn pairs_only_rejects_skip_while_a_pair_is_legal() {
        let config = EnvConfig {
            action_space: ActionSpace::PairsOnly,
            ..min_sep(1)
        };
        let mut env = env_with("GC", config);
        assert!(matches!(
            env.step(Action::Skip),
            Err(EngineError::InvalidAction { .. })
        ));
    }

    #[test]
    fn preview_reports_energy_change_without_mutation() {
        let env = env_with("GCGC", min_sep(1));
        let before = env.state();
        let delta = env.preview(Action::Pair(3)).unwrap();

        let mut stepped = env.clone();
        stepped.step(Action::Pair(3)).unwrap();
        assert!(f64_approx_equal(delta, stepped.energy() - env.energy()));
        assert_eq!(env.state(), before);
        assert_eq!(env.preview(Action::Skip).unwrap(), 0.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut env = env_with("GCGC", min_sep(1));
        let initial = env.state();
        let e0 = env.energy();
        env.step(Action::Pair(3)).unwrap();
        assert_eq!(env.reset(), initial);
        assert_eq!(env.energy(), e0);
    }

    #[test]
    fn with_state_validates_length_and_cursor() {
        let env = env_for("GGGAAACCC");
        assert!(matches!(
            env.clone().with_state(Pairing::unpaired(4), 0),
            Err(EngineError::Pairing { .. })
        ));
        assert!(matches!(
            env.with_state(Pairing::unpaired(9), 10),
            Err(EngineError::CursorOutOfRange { cursor: 10, len: 9 })
        ));
    }

    #[test]
    fn with_state_moves_cursor_past_paired_positions() {
        let env = env_with("GGGAAACCC", min_sep(1));
        let pairing = Pairing::from_bracket("((.....))").unwrap();
        let env = env.with_state(pairing, 0).unwrap();
        assert_eq!(env.cursor(), 2);
    }

    #[test]
    fn random_play_never_produces_crossing_pairs_and_terminates_within_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for seq in ["GGGAAACCCAGGGAAACCC", "GCAUGCAUGCAUGCAU", "AUGGCUACGUAGCCAU"] {
            for _ in 0..20 {
                let mut env = env_with(seq, min_sep(1));
                let mut steps = 0;
                let mut last_cursor = env.cursor();
                while !env.is_terminal() {
                    let actions = env.valid_actions();
                    let action = *actions.choose(&mut rng).unwrap();
                    env.step(action).unwrap();
                    steps += 1;

                    assert!(env.cursor() > last_cursor);
                    last_cursor = env.cursor();
                    assert!(env.pairing().is_non_crossing());
                    let snapshot = Pairing::from_partners(env.pairing().partners().to_vec());
                    assert!(snapshot.is_ok());
                }
                assert!(steps <= seq.len());
            }
        }
    }

    #[test]
    fn every_offered_pair_is_complementary_and_non_crossing() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut env = env_with("GGGAGCGAAAGCAUCCCAAAGGG", min_sep(1));
        while !env.is_terminal() {
            let actions = env.valid_actions();
            for action in &actions {
                if let Action::Pair(j) = *action {
                    let i = env.cursor();
                    assert!(structure::is_valid_pair(env.sequence()[i], env.sequence()[j]));
                    assert!(!env.pairing().crosses_any(i, j));
                    assert!(!env.pairing().is_paired(j));
                }
            }
            env.step(*actions.choose(&mut rng).unwrap()).unwrap();
        }
    }
}
