//! Pattern-tree evaluation.
//!
//! A walk starts at [`START_STATE`] with the full (lowercased) response text.
//! Each visited state's handler selects a successor; after every selection
//! the text is truncated to what follows the matched pattern, so later
//! states only see the rest of the response. The walk ends at the first
//! name that is not a state, which is returned as the label.

use std::fmt;

use series_types::{Handler, PatternTree, START_STATE};

/// Why a walk did not reach a terminal label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// No branch of a choice handler matched.
    DeadEnd {
        /// State where the walk stopped.
        state: String,
    },
    /// More than one branch of a choice handler matched.
    Ambiguous {
        /// State where the walk stopped.
        state: String,
        /// Successors of all matching branches, in branch order.
        candidates: Vec<String>,
    },
    /// The walk kept revisiting states without consuming text.
    Cycle {
        /// State where the walk was stopped.
        state: String,
    },
}

impl Anomaly {
    /// State where the walk stopped.
    pub fn state(&self) -> &str {
        match self {
            Self::DeadEnd { state } | Self::Ambiguous { state, .. } | Self::Cycle { state } => state,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadEnd { state } => write!(f, "no branch matched in state '{}'", state),
            Self::Ambiguous { state, candidates } => write!(
                f,
                "state '{}' matched {} branches: {}",
                state,
                candidates.len(),
                candidates.join(", ")
            ),
            Self::Cycle { state } => write!(f, "walk does not terminate, stopped in state '{}'", state),
        }
    }
}

/// Result of walking a pattern tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOutcome {
    /// The walk reached a terminal label.
    Label(String),
    /// The walk stopped early.
    Anomaly(Anomaly),
}

/// Returns the byte offset just past the first pattern (in list order) that
/// occurs in `text`.
///
/// Precedence follows the list, not the position in the text: with
/// patterns `["a", "b"]` and text `"b a"` the match is `"a"`.
pub fn seek_pattern<S: AsRef<str>>(text: &str, patterns: &[S]) -> Option<usize> {
    patterns.iter().find_map(|pattern| {
        let pattern = pattern.as_ref();
        text.find(pattern).map(|index| index + pattern.len())
    })
}

/// Walks `tree` over `text`.
///
/// # Examples
///
/// ```
/// use series_classifier::tree::{walk, TreeOutcome};
/// use series_types::{Branch, Handler, PatternTree, START_STATE, UNKNOWN};
///
/// let tree = PatternTree::new().with_state(
///     START_STATE,
///     Handler::Choice(vec![
///         Branch::on(&["axial", "transverse"], "axial"),
///         Branch::on(&["coronal"], "coronal"),
///         Branch::otherwise(UNKNOWN),
///     ]),
/// );
///
/// assert_eq!(walk("a transverse slice", &tree), TreeOutcome::Label("axial".into()));
/// assert_eq!(walk("no idea", &tree), TreeOutcome::Label(UNKNOWN.into()));
/// ```
pub fn walk(text: &str, tree: &PatternTree) -> TreeOutcome {
    let mut state = START_STATE;
    let mut rest = text;
    // A walk that is not cycling visits each state at most once per
    // remaining byte of text, plus once at the end.
    let step_limit = tree.len().saturating_mul(text.len() + 1);
    let mut steps = 0usize;

    while let Some(handler) = tree.handler(state) {
        steps += 1;
        if steps > step_limit {
            return TreeOutcome::Anomaly(Anomaly::Cycle {
                state: state.to_string(),
            });
        }

        let candidates = candidates(handler, rest);
        match candidates.as_slice() {
            [] => {
                return TreeOutcome::Anomaly(Anomaly::DeadEnd {
                    state: state.to_string(),
                })
            }
            [(next, consumed)] => {
                state = *next;
                rest = &rest[*consumed..];
            }
            many => {
                return TreeOutcome::Anomaly(Anomaly::Ambiguous {
                    state: state.to_string(),
                    candidates: many.iter().map(|(next, _)| next.to_string()).collect(),
                })
            }
        }
    }

    TreeOutcome::Label(state.to_string())
}

/// Walks `tree`, calling `on_anomaly` when the walk stops early.
pub fn evaluate_with<F>(text: &str, tree: &PatternTree, on_anomaly: F) -> Option<String>
where
    F: FnOnce(&Anomaly),
{
    match walk(text, tree) {
        TreeOutcome::Label(label) => Some(label),
        TreeOutcome::Anomaly(anomaly) => {
            on_anomaly(&anomaly);
            None
        }
    }
}

/// Successor states selected by `handler`, each with the number of bytes
/// of `text` consumed.
fn candidates<'t>(handler: &'t Handler, text: &str) -> Vec<(&'t str, usize)> {
    match handler {
        Handler::IfElse { branch, fallback } => {
            let taken = match &branch.patterns {
                Some(patterns) => seek_pattern(text, patterns),
                None => Some(0),
            };
            match taken {
                Some(consumed) => vec![(branch.next.as_str(), consumed)],
                None => vec![(fallback.as_str(), 0)],
            }
        }
        Handler::Choice(branches) => {
            let mut selected: Vec<(&str, usize)> = Vec::new();
            for branch in branches {
                let found = match &branch.patterns {
                    // A catch-all only applies when nothing before it matched.
                    None if selected.is_empty() => Some(0),
                    None => None,
                    Some(patterns) => seek_pattern(text, patterns),
                };
                if let Some(consumed) = found {
                    selected.push((branch.next.as_str(), consumed));
                }
            }
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use series_types::{Branch, UNKNOWN};

    fn make_phase_tree() -> PatternTree {
        PatternTree::new()
            .with_state(
                START_STATE,
                Handler::IfElse {
                    branch: Branch::on(&["represents both"], "in-out"),
                    fallback: "single".to_string(),
                },
            )
            .with_state(
                "single",
                Handler::Choice(vec![
                    Branch::on(&["in-phase"], "in"),
                    Branch::on(&["out-of-phase"], "out"),
                    Branch::otherwise(UNKNOWN),
                ]),
            )
    }

    #[test]
    fn test_seek_pattern_list_precedence() {
        assert_eq!(seek_pattern("b a", &["a", "b"]), Some(3));
        assert_eq!(seek_pattern("b a", &["b", "a"]), Some(1));
        assert_eq!(seek_pattern("c", &["a", "b"]), None);
        assert_eq!(seek_pattern::<&str>("c", &[]), None);
    }

    #[test]
    fn test_if_else() {
        let tree = make_phase_tree();
        assert_eq!(walk("it represents both phases", &tree), TreeOutcome::Label("in-out".into()));
        assert_eq!(walk("this is in-phase", &tree), TreeOutcome::Label("in".into()));
        assert_eq!(walk("out-of-phase", &tree), TreeOutcome::Label("out".into()));
        assert_eq!(walk("unclear", &tree), TreeOutcome::Label(UNKNOWN.into()));
    }

    #[test]
    fn test_ambiguous() {
        let tree = make_phase_tree();
        let outcome = walk("in-phase and out-of-phase", &tree);
        assert_eq!(
            outcome,
            TreeOutcome::Anomaly(Anomaly::Ambiguous {
                state: "single".into(),
                candidates: vec!["in".into(), "out".into()],
            })
        );
    }

    #[test]
    fn test_dead_end() {
        let tree = PatternTree::new().with_state(
            START_STATE,
            Handler::Choice(vec![Branch::on(&["yes"], "+"), Branch::on(&["no"], ".")]),
        );
        let outcome = walk("maybe", &tree);
        assert!(matches!(outcome, TreeOutcome::Anomaly(Anomaly::DeadEnd { ref state }) if state == START_STATE));
    }

    #[test]
    fn test_text_is_truncated_after_match() {
        let tree = PatternTree::new()
            .with_state(
                START_STATE,
                Handler::Choice(vec![Branch::on(&["contrast:"], "timing"), Branch::otherwise(UNKNOWN)]),
            )
            .with_state(
                "timing",
                Handler::Choice(vec![Branch::on(&["portal"], "portal"), Branch::otherwise(UNKNOWN)]),
            );
        assert_eq!(walk("contrast: portal", &tree), TreeOutcome::Label("portal".into()));
        // "portal" occurs only before the consumed prefix
        assert_eq!(walk("portal? contrast: none", &tree), TreeOutcome::Label(UNKNOWN.into()));
    }

    #[test]
    fn test_cycle_is_stopped() {
        let tree = PatternTree::new()
            .with_state(START_STATE, Handler::Choice(vec![Branch::otherwise("loop")]))
            .with_state("loop", Handler::Choice(vec![Branch::otherwise(START_STATE)]));
        let outcome = walk("text", &tree);
        assert!(matches!(outcome, TreeOutcome::Anomaly(Anomaly::Cycle { .. })));
    }

    #[test]
    fn test_evaluate_with_reports_anomaly() {
        let tree = make_phase_tree();
        let mut reported = None;
        let label = evaluate_with("in-phase out-of-phase", &tree, |a| reported = Some(a.state().to_string()));
        assert_eq!(label, None);
        assert_eq!(reported.as_deref(), Some("single"));
    }

    #[test]
    fn test_empty_tree_returns_start() {
        assert_eq!(walk("x", &PatternTree::new()), TreeOutcome::Label(START_STATE.into()));
    }
}
