//! Rule-chain data model.
//!
//! A [`RuleChain`] is an ordered list of `(predicate, label)` pairs evaluated
//! first-match-wins. Predicates are plain data (a tagged sum type), so chains
//! can be printed, compared and serialized instead of being opaque closures.
//!
//! # Composition
//!
//! Later ontology versions reuse an earlier chain and splice new rules into
//! it. [`RuleChain::extend_before_catchall`] keeps a trailing catch-all rule
//! as the final fallback and never reorders the retained rules.
//!
//! ```
//! use series_types::{Predicate, Rule, RuleChain, UNKNOWN};
//!
//! let base = RuleChain::new(vec![
//!     Rule::new(Predicate::text_any(&["t1"]), "t1"),
//!     Rule::catch_all(UNKNOWN),
//! ]);
//! let extended = base.extend_before_catchall([Rule::new(Predicate::text_any(&["dwi"]), "DWI")]);
//!
//! let labels: Vec<&str> = extended.rules().iter().map(|r| r.label.as_str()).collect();
//! assert_eq!(labels, vec!["t1", "DWI", UNKNOWN]);
//! ```

use crate::record::Metadata;

/// The record a predicate is tested against.
///
/// Language-model responses are matched as lowercased text; manual rules read
/// named metadata fields.
#[derive(Debug, Clone, Copy)]
pub enum MatchInput<'a> {
    /// Free text, already lowercased by the caller.
    Text(&'a str),
    /// Per-series metadata fields.
    Fields(&'a Metadata),
}

impl<'a> MatchInput<'a> {
    /// Returns the text for [`MatchInput::Text`], `None` otherwise.
    pub fn text(&self) -> Option<&'a str> {
        match *self {
            Self::Text(text) => Some(text),
            Self::Fields(_) => None,
        }
    }

    /// Returns a field value for [`MatchInput::Fields`], `None` otherwise or
    /// when the field is absent.
    pub fn field(&self, name: &str) -> Option<&'a str> {
        match *self {
            Self::Text(_) => None,
            Self::Fields(fields) => fields.get(name).map(String::as_str),
        }
    }
}

/// Case handling for substring predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Case {
    /// Compare as written.
    Sensitive,
    /// Lowercase the field value before comparing (needles are lowercase).
    Insensitive,
}

/// A side-effect-free test over a [`MatchInput`].
///
/// Field predicates are false on a text input and on an absent field, except
/// [`Predicate::FieldLacksAll`], for which an absent field lacks everything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Predicate {
    /// Always true. A rule with this predicate is a catch-all.
    Always,
    /// Text contains any of the keywords.
    TextContainsAny(Vec<String>),
    /// Field value contains none of the needles.
    FieldLacksAll {
        /// Field name.
        field: String,
        /// Substrings that must all be absent.
        needles: Vec<String>,
    },
    /// Field value contains a substring.
    FieldContains {
        /// Field name.
        field: String,
        /// Substring to look for.
        needle: String,
        /// Case handling.
        case: Case,
    },
    /// Lowercased field value, split into terms, contains the token.
    FieldHasToken {
        /// Field name.
        field: String,
        /// Exact token.
        token: String,
    },
    /// Field value starts with a prefix (case-sensitive).
    FieldStartsWith {
        /// Field name.
        field: String,
        /// Prefix.
        prefix: String,
    },
    /// Field value ends with a suffix (case-sensitive).
    FieldEndsWith {
        /// Field name.
        field: String,
        /// Suffix.
        suffix: String,
    },
    /// Lowercased field value equals the (lowercase) value.
    FieldEquals {
        /// Field name.
        field: String,
        /// Expected lowercase value.
        value: String,
    },
    /// Field is non-empty and its lowercased value is none of `except`.
    FieldNonEmptyExcept {
        /// Field name.
        field: String,
        /// Lowercase values treated as empty.
        except: Vec<String>,
    },
    /// Evaluating the nested chain yields one of the labels.
    ChainYields {
        /// Chain evaluated on the same input.
        chain: Box<RuleChain>,
        /// Accepted labels.
        labels: Vec<String>,
    },
    /// Every predicate holds.
    All(Vec<Predicate>),
    /// At least one predicate holds.
    Any(Vec<Predicate>),
    /// The predicate does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Text contains any of `keywords`.
    pub fn text_any(keywords: &[&str]) -> Self {
        Self::TextContainsAny(keywords.iter().map(|k| k.to_string()).collect())
    }

    /// Field contains none of `needles` (absent counts as lacking).
    pub fn lacks(field: &str, needles: &[&str]) -> Self {
        Self::FieldLacksAll {
            field: field.to_string(),
            needles: needles.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Case-insensitive substring test.
    pub fn contains(field: &str, needle: &str) -> Self {
        Self::FieldContains {
            field: field.to_string(),
            needle: needle.to_lowercase(),
            case: Case::Insensitive,
        }
    }

    /// Case-sensitive substring test.
    pub fn contains_exact(field: &str, needle: &str) -> Self {
        Self::FieldContains {
            field: field.to_string(),
            needle: needle.to_string(),
            case: Case::Sensitive,
        }
    }

    /// Token membership over the lowercased field value.
    pub fn token(field: &str, token: &str) -> Self {
        Self::FieldHasToken {
            field: field.to_string(),
            token: token.to_lowercase(),
        }
    }

    /// Case-sensitive prefix test.
    pub fn starts_with(field: &str, prefix: &str) -> Self {
        Self::FieldStartsWith {
            field: field.to_string(),
            prefix: prefix.to_string(),
        }
    }

    /// Case-sensitive suffix test.
    pub fn ends_with(field: &str, suffix: &str) -> Self {
        Self::FieldEndsWith {
            field: field.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// Case-insensitive equality.
    pub fn equals(field: &str, value: &str) -> Self {
        Self::FieldEquals {
            field: field.to_string(),
            value: value.to_lowercase(),
        }
    }

    /// Non-empty and not one of `except` (case-insensitive).
    pub fn non_empty_except(field: &str, except: &[&str]) -> Self {
        Self::FieldNonEmptyExcept {
            field: field.to_string(),
            except: except.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// The nested chain yields one of `labels`.
    pub fn yields(chain: RuleChain, labels: &[&str]) -> Self {
        Self::ChainYields {
            chain: Box::new(chain),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Self::Not(Box::new(predicate))
    }

    /// Returns true for [`Predicate::Always`].
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// A `(predicate, label)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    /// Condition under which the rule commits.
    pub when: Predicate,
    /// Label produced when the rule commits.
    pub label: String,
}

impl Rule {
    /// Creates a rule.
    pub fn new(when: Predicate, label: impl Into<String>) -> Self {
        Self {
            when,
            label: label.into(),
        }
    }

    /// Creates a rule that always commits.
    pub fn catch_all(label: impl Into<String>) -> Self {
        Self::new(Predicate::Always, label)
    }
}

/// An ordered, first-match-wins list of rules.
///
/// A chain usually ends with a catch-all, but this is not enforced: a chain
/// without one may leave a record unterminated, and the evaluator reports
/// that explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    /// Creates a chain from rules in evaluation order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the chain has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if the last rule always commits.
    pub fn has_catch_all(&self) -> bool {
        self.rules
            .last()
            .map(|r| r.when.is_catch_all())
            .unwrap_or(false)
    }

    /// Returns a copy with `rules` inserted just before the trailing
    /// catch-all, or appended if there is none.
    pub fn extend_before_catchall<I>(&self, rules: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut out = self.rules.clone();
        let tail = if self.has_catch_all() { out.pop() } else { None };
        out.extend(rules);
        out.extend(tail);
        Self { rules: out }
    }

    /// Returns a copy with `rules` placed before every existing rule.
    pub fn prepend<I>(&self, rules: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut out: Vec<Rule> = rules.into_iter().collect();
        out.extend(self.rules.iter().cloned());
        Self { rules: out }
    }

    /// Returns a copy whose trailing catch-all, if any, yields `label`
    /// instead; appends one if the chain has none.
    pub fn with_catch_all(&self, label: impl Into<String>) -> Self {
        let mut out = self.rules.clone();
        if self.has_catch_all() {
            out.pop();
        }
        out.push(Rule::catch_all(label));
        Self { rules: out }
    }
}

impl FromIterator<Rule> for RuleChain {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNKNOWN;

    fn labels(chain: &RuleChain) -> Vec<&str> {
        chain.rules().iter().map(|r| r.label.as_str()).collect()
    }

    fn rule(keyword: &str) -> Rule {
        Rule::new(Predicate::text_any(&[keyword]), keyword)
    }

    #[test]
    fn test_extend_before_catchall_keeps_fallback_last() {
        let base = RuleChain::new(vec![rule("a"), rule("b"), Rule::catch_all(UNKNOWN)]);
        let extended = base.extend_before_catchall([rule("c"), rule("d")]);

        assert_eq!(labels(&extended), vec!["a", "b", "c", "d", UNKNOWN]);
        assert!(extended.has_catch_all());
        // The base chain is untouched.
        assert_eq!(labels(&base), vec!["a", "b", UNKNOWN]);
    }

    #[test]
    fn test_extend_without_catchall_appends() {
        let base = RuleChain::new(vec![rule("yes"), rule("no")]);
        let extended = base.extend_before_catchall([rule("maybe")]);

        assert_eq!(labels(&extended), vec!["yes", "no", "maybe"]);
        assert!(!extended.has_catch_all());
    }

    #[test]
    fn test_prepend_and_with_catch_all() {
        let base = RuleChain::new(vec![rule("a"), Rule::catch_all(".")]);

        assert_eq!(labels(&base.prepend([rule("z")])), vec!["z", "a", "."]);
        assert_eq!(labels(&base.with_catch_all(UNKNOWN)), vec!["a", UNKNOWN]);
        assert_eq!(
            labels(&RuleChain::new(vec![rule("a")]).with_catch_all(UNKNOWN)),
            vec!["a", UNKNOWN]
        );
    }

    #[test]
    fn test_match_input_accessors() {
        let mut meta = Metadata::new();
        meta.insert("Modality".to_string(), "MR".to_string());

        let fields = MatchInput::Fields(&meta);
        assert_eq!(fields.field("Modality"), Some("MR"));
        assert_eq!(fields.text(), None);

        let text = MatchInput::Text("axial");
        assert_eq!(text.text(), Some("axial"));
        assert_eq!(text.field("Modality"), None);
    }

    #[test]
    fn test_constructors_lowercase_needles() {
        assert_eq!(
            Predicate::contains("Series-Description", "Fat Sat"),
            Predicate::FieldContains {
                field: "Series-Description".to_string(),
                needle: "fat sat".to_string(),
                case: Case::Insensitive,
            }
        );
        assert!(Predicate::Always.is_catch_all());
        assert!(!Predicate::not(Predicate::Always).is_catch_all());
    }
}
