//! Pattern-tree data model.
//!
//! A pattern tree is a small state machine over free text. Each state owns a
//! handler that searches the remaining text for keyword patterns and picks the
//! next state; any state name that is not a key of the tree is a terminal
//! label. Walking always starts from [`START_STATE`].
//!
//! # Examples
//!
//! ```
//! use series_types::{Branch, Handler, PatternTree, UNKNOWN};
//!
//! let tree = PatternTree::new().with_state(
//!     PatternTree::START,
//!     Handler::Choice(vec![
//!         Branch::on(&["axial", "transverse"], "axial"),
//!         Branch::on(&["coronal"], "coronal"),
//!         Branch::otherwise(UNKNOWN),
//!     ]),
//! );
//!
//! assert!(tree.has_start());
//! assert!(tree.is_terminal("axial"));
//! ```

use std::collections::BTreeMap;

/// Name of the state every walk starts from.
pub const START_STATE: &str = "__init__";

/// One outgoing edge of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Branch {
    /// Ordered candidate substrings; `None` is a catch-all.
    pub patterns: Option<Vec<String>>,
    /// State (or terminal label) taken when the branch is selected.
    pub next: String,
}

impl Branch {
    /// A branch selected when any of `patterns` occurs in the text.
    pub fn on(patterns: &[&str], next: impl Into<String>) -> Self {
        Self {
            patterns: Some(patterns.iter().map(|p| p.to_string()).collect()),
            next: next.into(),
        }
    }

    /// A catch-all branch, usable only when no earlier branch matched.
    pub fn otherwise(next: impl Into<String>) -> Self {
        Self {
            patterns: None,
            next: next.into(),
        }
    }

    /// Returns true if this branch has no patterns.
    pub fn is_catch_all(&self) -> bool {
        self.patterns.is_none()
    }
}

/// How a state chooses its successor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Handler {
    /// Every matching branch is a candidate; exactly one must match.
    Choice(Vec<Branch>),
    /// Take `branch` if its patterns occur, otherwise go to `fallback`.
    IfElse {
        /// Conditional branch.
        branch: Branch,
        /// Unconditional fallback state.
        fallback: String,
    },
}

impl Handler {
    /// Short name of the handler kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Choice(_) => "choice",
            Self::IfElse { .. } => "if-else",
        }
    }
}

/// A mapping from state name to handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PatternTree {
    states: BTreeMap<String, Handler>,
}

impl PatternTree {
    /// Alias for [`START_STATE`].
    pub const START: &'static str = START_STATE;

    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a state, builder style.
    pub fn with_state(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.states.insert(name.into(), handler);
        self
    }

    /// Returns the handler of a state, or `None` for a terminal label.
    pub fn handler(&self, state: &str) -> Option<&Handler> {
        self.states.get(state)
    }

    /// Returns true if `state` is not defined in the tree.
    pub fn is_terminal(&self, state: &str) -> bool {
        !self.states.contains_key(state)
    }

    /// Returns true if the start state is defined.
    pub fn has_start(&self) -> bool {
        self.states.contains_key(START_STATE)
    }

    /// Number of defined states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no state is defined.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over `(state, handler)` pairs.
    pub fn states(&self) -> impl Iterator<Item = (&str, &Handler)> {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a copy where the `choice` handler of `state` gets `branches`
    /// inserted before its trailing catch-all (or appended if it has none).
    ///
    /// Returns `None` if `state` is missing or is not a `choice` handler.
    pub fn extend_choice_before_catchall<I>(&self, state: &str, branches: I) -> Option<Self>
    where
        I: IntoIterator<Item = Branch>,
    {
        let Some(Handler::Choice(existing)) = self.states.get(state) else {
            return None;
        };

        let mut out = existing.clone();
        let tail = match out.last() {
            Some(last) if last.is_catch_all() => out.pop(),
            _ => None,
        };
        out.extend(branches);
        out.extend(tail);

        let mut tree = self.clone();
        tree.states.insert(state.to_string(), Handler::Choice(out));
        Some(tree)
    }
}
