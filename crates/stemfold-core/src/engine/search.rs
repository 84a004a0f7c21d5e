use super::config::{ConfigError, SearchConfig};
use super::env::{Action, FoldingEnv};
use super::error::EngineError;
use super::evaluator::{StateEvaluator, resolve_evaluation};
use super::tree::{NodeId, SearchTree};
use super::utils::sampling::{SamplingError, argmax_first, sample_visits};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Visit-count distribution over the root's legal actions.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub actions: Vec<Action>,
    pub policy: Vec<f64>,
    pub visits: Vec<u32>,
    /// Mean of the leaf values backed up through the root. The evaluator's
    /// estimate for the root itself is not included, so this is `0.0` after
    /// zero simulations. A terminal result carries `-energy` instead.
    pub root_value: f64,
    /// True when the root offered no action to search over.
    pub terminal: bool,
}

impl SearchResult {
    fn terminal(root_value: f64) -> Self {
        Self {
            actions: Vec::new(),
            policy: Vec::new(),
            visits: Vec::new(),
            root_value,
            terminal: true,
        }
    }

    /// Most visited action; ties go to the earliest action in the list.
    pub fn best_action(&self) -> Option<Action> {
        argmax_first(&self.visits).map(|idx| self.actions[idx])
    }

    /// Draws an action from visit counts raised to `1 / temperature`.
    /// `temperature == 0` is greedy. `Ok(None)` for a terminal result.
    pub fn sample(
        &self,
        rng: &mut impl Rng,
        temperature: f64,
    ) -> Result<Option<Action>, SamplingError> {
        if self.actions.is_empty() {
            return Ok(None);
        }
        let idx = sample_visits(&self.visits, temperature, rng)?;
        Ok(Some(self.actions[idx]))
    }
}

/// PUCT tree search over copies of a folding environment.
///
/// Each call builds a fresh tree, so one `Puct` can serve many searches and,
/// being `Sync`, many threads.
#[derive(Clone)]
pub struct Puct {
    config: SearchConfig,
    evaluator: Option<Arc<dyn StateEvaluator>>,
}

impl Puct {
    /// A search without an evaluator uses uniform priors and zero values.
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            evaluator: None,
        })
    }

    pub fn with_evaluator(
        config: SearchConfig,
        evaluator: Arc<dyn StateEvaluator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            evaluator: Some(evaluator),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn search(&self, root_env: &FoldingEnv) -> Result<SearchResult, EngineError> {
        self.search_with_tree(root_env).map(|(result, _)| result)
    }

    /// Runs the configured number of simulations and also returns the tree
    /// for inspection.
    #[instrument(skip_all, name = "puct_search", fields(cursor = root_env.cursor(), simulations = self.config.num_simulations))]
    pub fn search_with_tree(
        &self,
        root_env: &FoldingEnv,
    ) -> Result<(SearchResult, SearchTree), EngineError> {
        let mut tree = SearchTree::new();
        let root = tree.root();
        let root_actions = root_env.valid_actions();

        if root_actions.is_empty() {
            tree.node_mut(root).mark_terminal();
            debug!("Root has no legal action, returning terminal result");
            return Ok((SearchResult::terminal(-root_env.energy()), tree));
        }

        self.expand(&mut tree, root, root_env, &root_actions);
        for _ in 0..self.config.num_simulations {
            self.simulate(&mut tree, root_env)?;
        }

        let root_node = tree.root_node();
        let visits: Vec<u32> = root_actions
            .iter()
            .map(|&a| {
                root_node
                    .child(a)
                    .and_then(|id| tree.node(id))
                    .map_or(0, |n| n.visits())
            })
            .collect();
        let total: u32 = visits.iter().sum();
        let policy = if total == 0 {
            vec![1.0 / root_actions.len() as f64; root_actions.len()]
        } else {
            visits.iter().map(|&v| v as f64 / total as f64).collect()
        };

        debug!(
            total_visits = total,
            nodes = tree.len(),
            root_value = root_node.mean_value(),
            "Search finished"
        );

        let result = SearchResult {
            actions: root_actions,
            policy,
            visits,
            root_value: root_node.mean_value(),
            terminal: false,
        };
        Ok((result, tree))
    }

    /// One selection / expansion / backup pass on a private copy of the root
    /// environment.
    fn simulate(&self, tree: &mut SearchTree, root_env: &FoldingEnv) -> Result<(), EngineError> {
        let mut env = root_env.clone();
        let mut node_id = tree.root();
        let mut path = vec![node_id];

        let value = loop {
            let actions = env.valid_actions();
            if actions.is_empty() {
                tree.node_mut(node_id).mark_terminal();
                break -env.energy();
            }
            let expanded = tree.node(node_id).is_some_and(|n| n.is_expanded());
            if !expanded {
                break self.expand(tree, node_id, &env, &actions);
            }

            let action = self.select(tree, node_id, &actions);
            env.step(action)?;
            node_id = tree.child_or_insert(node_id, action);
            path.push(node_id);
        };

        tree.backup(&path, value);
        Ok(())
    }

    /// Queries the evaluator once, stores the priors and returns the value.
    fn expand(
        &self,
        tree: &mut SearchTree,
        node_id: NodeId,
        env: &FoldingEnv,
        actions: &[Action],
    ) -> f64 {
        let (priors, value) = resolve_evaluation(self.evaluator.as_deref(), env, actions);
        tree.node_mut(node_id).expand(actions, priors);
        value
    }

    /// `argmax Q(a) + c * P(a) * sqrt(N) / (1 + N(a))`, first-seen on ties.
    fn select(&self, tree: &SearchTree, node_id: NodeId, actions: &[Action]) -> Action {
        let Some(node) = tree.node(node_id) else {
            return actions[0];
        };
        let sqrt_parent = (node.visits() as f64).sqrt();

        let mut best = actions[0];
        let mut best_score = f64::NEG_INFINITY;
        for &action in actions {
            let (q, n) = node
                .child(action)
                .and_then(|id| tree.node(id))
                .map_or((0.0, 0), |c| (c.mean_value(), c.visits()));
            let u = self.config.c_puct * node.prior(action) * sqrt_parent / (1.0 + n as f64);
            let score = q + u;
            if score > best_score {
                best_score = score;
                best = action;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ActionSpace, EnvConfig, PairRule, SearchConfigBuilder};
    use crate::engine::evaluator::{Evaluation, EvaluatorError, UniformEvaluator};
    use crate::test_util::{CountingEvaluator, FailingEvaluator, FixedEvaluator, env_with};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn sep(s: usize) -> EnvConfig {
        EnvConfig {
            action_space: ActionSpace::ExplicitSkip,
            pair_rule: PairRule::MinSeparation { min_separation: s },
        }
    }

    fn puct(n: usize) -> Puct {
        Puct::new(SearchConfigBuilder::new().num_simulations(n).build().unwrap()).unwrap()
    }

    #[test]
    fn policy_covers_root_actions_and_sums_to_one() {
        let env = env_with("GGGAAACCCAGGGAAACCC", sep(4));
        let result = puct(64).search(&env).unwrap();
        assert_eq!(result.actions, env.valid_actions());
        assert_eq!(result.policy.len(), result.actions.len());
        assert!(f64_approx_equal(result.policy.iter().sum::<f64>(), 1.0));
        assert_eq!(result.visits.iter().sum::<u32>(), 64);
        assert!(!result.terminal);
    }

    #[test]
    fn zero_simulations_yield_uniform_policy() {
        let env = env_with("GGGAAACCC", sep(4));
        let result = puct(0).search(&env).unwrap();
        let uniform = 1.0 / result.actions.len() as f64;
        assert!(result.policy.iter().all(|&p| f64_approx_equal(p, uniform)));
    }

    struct ConstantValue(f64);

    impl StateEvaluator for ConstantValue {
        fn evaluate(
            &self,
            _env: &FoldingEnv,
            actions: &[Action],
        ) -> Result<Evaluation, EvaluatorError> {
            Ok(Evaluation {
                value: self.0,
                ..Evaluation::uniform(actions)
            })
        }
    }

    #[test]
    fn root_value_averages_backed_up_leaves_only() {
        let env = env_with("GGGAAACCC", sep(4));
        let search = |n| {
            Puct::with_evaluator(
                SearchConfigBuilder::new().num_simulations(n).build().unwrap(),
                Arc::new(ConstantValue(0.7)),
            )
            .unwrap()
        };

        let (result, tree) = search(0).search_with_tree(&env).unwrap();
        assert_eq!(result.root_value, 0.0);
        assert_eq!(tree.root_node().visits(), 0);

        let (result, tree) = search(1).search_with_tree(&env).unwrap();
        assert!(f64_approx_equal(result.root_value, 0.7));
        assert_eq!(tree.root_node().visits(), 1);
    }

    #[test]
    fn search_does_not_mutate_caller_environment() {
        let env = env_with("GGGAAACCCAGGGAAACCC", sep(4));
        let before = env.state();
        let energy = env.energy();
        puct(50).search(&env).unwrap();
        assert_eq!(env.state(), before);
        assert_eq!(env.energy(), energy);
    }

    #[test]
    fn terminal_root_returns_terminal_result_instead_of_error() {
        let mut env = env_with("GC", sep(1));
        env.step(Action::Skip).unwrap();
        env.step(Action::Skip).unwrap();
        let result = puct(10).search(&env).unwrap();
        assert!(result.terminal);
        assert!(result.actions.is_empty());
        assert_eq!(result.best_action(), None);
    }

    #[test]
    fn pairs_only_root_without_legal_pair_is_terminal() {
        let config = EnvConfig {
            action_space: ActionSpace::PairsOnly,
            ..sep(1)
        };
        let env = env_with("AAAA", config);
        let (result, tree) = puct(10).search_with_tree(&env).unwrap();
        assert!(result.terminal);
        assert!(tree.root_node().is_terminal());
    }

    #[test]
    fn each_node_is_evaluated_exactly_once() {
        let env = env_with("GGGAAACCCAGGGAAACCC", sep(4));
        let evaluator = Arc::new(CountingEvaluator::default());
        let search = Puct::with_evaluator(SearchConfig::default(), evaluator.clone()).unwrap();
        let (_, tree) = search.search_with_tree(&env).unwrap();

        assert_eq!(evaluator.calls(), count_expanded(&tree));
        assert!(evaluator.calls() > 1);
    }

    fn count_expanded(tree: &SearchTree) -> usize {
        let mut stack = vec![tree.root()];
        let mut count = 0;
        while let Some(id) = stack.pop() {
            let node = tree.node(id).unwrap();
            if node.is_expanded() {
                count += 1;
            }
            for (action, _) in node.priors() {
                if let Some(child) = node.child(*action) {
                    stack.push(child);
                }
            }
        }
        count
    }

    #[test]
    fn gcgc_search_with_min_separation_one_folds_into_stacked_hairpin() {
        let mut env = env_with("GCGC", sep(1));
        let search = puct(200);
        while !env.is_terminal() {
            let result = search.search(&env).unwrap();
            let action = result.best_action().unwrap();
            env.step(action).unwrap();
        }
        assert!(env.energy() < 0.0);
        assert_eq!(env.pairing().to_bracket(), "(())");
    }

    #[test]
    fn failing_evaluator_does_not_abort_search() {
        let env = env_with("GGGAAACCC", sep(4));
        let search =
            Puct::with_evaluator(SearchConfig::default(), Arc::new(FailingEvaluator)).unwrap();
        let result = search.search(&env).unwrap();
        assert!(f64_approx_equal(result.policy.iter().sum::<f64>(), 1.0));
    }

    #[test]
    fn search_follows_strong_priors_at_the_root() {
        let env = env_with("GGGAAACCC", sep(4));
        let actions = env.valid_actions();
        let favoured = *actions.last().unwrap();

        let mut priors: HashMap<Action, f64> = actions.iter().map(|&a| (a, 0.0)).collect();
        priors.insert(favoured, 1.0);
        let evaluator = FixedEvaluator {
            evaluation: Evaluation {
                priors,
                value: 0.0,
            },
        };
        let search = Puct::with_evaluator(
            SearchConfigBuilder::new().num_simulations(5).build().unwrap(),
            Arc::new(evaluator),
        )
        .unwrap();
        let result = search.search(&env).unwrap();
        assert_eq!(result.visits, vec![1, 0, 0, 4]);
        assert_eq!(result.best_action(), Some(favoured));
    }

    #[test]
    fn ties_are_broken_by_first_seen_action() {
        let env = env_with("GGGAAACCC", sep(4));
        let search = Puct::with_evaluator(
            SearchConfigBuilder::new().num_simulations(1).build().unwrap(),
            Arc::new(UniformEvaluator),
        )
        .unwrap();
        let result = search.search(&env).unwrap();
        assert_eq!(result.visits[0], 1);
        assert_eq!(result.best_action(), Some(Action::Skip));
    }

    #[test]
    fn search_is_deterministic() {
        let env = env_with("GGGAGCGAAAGCAUCCCAAAGGG", sep(4));
        let a = puct(80).search(&env).unwrap();
        let b = puct(80).search(&env).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sample_respects_temperature_and_seed() {
        let env = env_with("GGGAAACCCAGGGAAACCC", sep(4));
        let result = puct(64).search(&env).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(result.sample(&mut rng, 0.0).unwrap(), result.best_action());

        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| result.sample(&mut rng, 1.0).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(9), draw(9));
    }
}
