//! Rule-chain evaluation.
//!
//! Rules are tested in order and the first rule whose predicate holds
//! supplies the label. A chain without a catch-all may leave an input
//! unresolved; the caller decides what to do with that.

use series_types::{Case, MatchInput, Predicate, RuleChain};

use crate::tokenizer::tokenize;

/// Result of evaluating a rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome<'r> {
    /// A rule fired with this label.
    Label(&'r str),
    /// No rule fired.
    Unterminated,
}

impl<'r> ChainOutcome<'r> {
    /// Returns the label, if any.
    pub fn label(self) -> Option<&'r str> {
        match self {
            Self::Label(label) => Some(label),
            Self::Unterminated => None,
        }
    }
}

/// Something that can be tested against a [`MatchInput`].
pub trait Test {
    /// Returns true if the test holds for `input`.
    fn holds(&self, input: &MatchInput<'_>) -> bool;
}

impl Test for Predicate {
    fn holds(&self, input: &MatchInput<'_>) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::TextContainsAny(keywords) => input
                .text()
                .map_or(false, |text| keywords.iter().any(|k| text.contains(k.as_str()))),
            Predicate::FieldLacksAll { field, needles } => match input.field(field) {
                None => true,
                Some(value) => needles.iter().all(|n| !value.contains(n.as_str())),
            },
            Predicate::FieldContains { field, needle, case } => {
                input.field(field).map_or(false, |value| match case {
                    Case::Sensitive => value.contains(needle.as_str()),
                    Case::Insensitive => value.to_lowercase().contains(needle.as_str()),
                })
            }
            Predicate::FieldHasToken { field, token } => input
                .field(field)
                .map_or(false, |value| tokenize(&value.to_lowercase()).iter().any(|t| t == token)),
            Predicate::FieldStartsWith { field, prefix } => input
                .field(field)
                .map_or(false, |value| value.starts_with(prefix.as_str())),
            Predicate::FieldEndsWith { field, suffix } => input
                .field(field)
                .map_or(false, |value| value.ends_with(suffix.as_str())),
            Predicate::FieldEquals { field, value: expected } => input
                .field(field)
                .map_or(false, |value| value.to_lowercase() == *expected),
            Predicate::FieldNonEmptyExcept { field, except } => {
                input.field(field).map_or(false, |value| {
                    let lowered = value.to_lowercase();
                    !value.is_empty() && !except.iter().any(|e| *e == lowered)
                })
            }
            Predicate::ChainYields { chain, labels } => evaluate(input, chain)
                .label()
                .map_or(false, |label| labels.iter().any(|l| l == label)),
            Predicate::All(predicates) => predicates.iter().all(|p| p.holds(input)),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.holds(input)),
            Predicate::Not(predicate) => !predicate.holds(input),
        }
    }
}

/// Evaluates `chain` against `input`, first match wins.
///
/// # Examples
///
/// ```
/// use series_classifier::chain::{evaluate, ChainOutcome};
/// use series_types::{MatchInput, Predicate, Rule, RuleChain};
///
/// let chain = RuleChain::new(vec![
///     Rule::new(Predicate::text_any(&["yes"]), "+"),
///     Rule::new(Predicate::text_any(&["no"]), "."),
/// ]);
///
/// assert_eq!(evaluate(&MatchInput::Text("yes, it is"), &chain), ChainOutcome::Label("+"));
/// assert_eq!(evaluate(&MatchInput::Text("maybe"), &chain), ChainOutcome::Unterminated);
/// ```
pub fn evaluate<'r>(input: &MatchInput<'_>, chain: &'r RuleChain) -> ChainOutcome<'r> {
    chain
        .rules()
        .iter()
        .find(|rule| rule.when.holds(input))
        .map_or(ChainOutcome::Unterminated, |rule| ChainOutcome::Label(&rule.label))
}

/// Evaluates `chain`, calling `on_unterminated` when no rule fires.
pub fn evaluate_with<'r, F>(input: &MatchInput<'_>, chain: &'r RuleChain, on_unterminated: F) -> Option<&'r str>
where
    F: FnOnce(&MatchInput<'_>, &RuleChain),
{
    match evaluate(input, chain) {
        ChainOutcome::Label(label) => Some(label),
        ChainOutcome::Unterminated => {
            on_unterminated(input, chain);
            None
        }
    }
}
