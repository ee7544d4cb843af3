//! Ontology v20: binary DWI/ADC concepts and phase/timing categories.

use series_types::well_known::{self as wk, fields};
use series_types::{
    Branch, CategoryRule, Concept, Condition, Handler, LabelSet, Matcher, OntologyVersion, PatternTree,
    Predicate, Rule, RuleChain, START_STATE, UNKNOWN,
};

use super::Ontology;
use crate::types::ClassifyResult;

// =============================================================================
// Concept keys
// =============================================================================

pub(super) const WEIGHT_IS_DWI: &str = "weight_is_dwi";
pub(super) const WEIGHT_IS_ADC: &str = "weight_is_adc";
pub(super) const IS_CONTRAST_AGENT: &str = "is_contrast_agent";
pub(super) const CONTRAST_TIME: &str = "contrast_time";
pub(super) const AQUISITION_ECHO: &str = "aquisition_echo";
pub(super) const PLANE_TYPE: &str = "plane_type";
pub(super) const WEIGHT_T: &str = "weight_t";
pub(super) const IS_FS: &str = "is_fs";
pub(super) const PHASE_TYPE: &str = "phase_type";

const HEADER: &[&str] = &[
    WEIGHT_IS_ADC,
    WEIGHT_IS_DWI,
    WEIGHT_T,
    IS_FS,
    IS_CONTRAST_AGENT,
    CONTRAST_TIME,
    AQUISITION_ECHO,
    PLANE_TYPE,
    PHASE_TYPE,
];

pub(super) fn ontology() -> ClassifyResult<Ontology> {
    Ontology::new(
        OntologyVersion::V20.name(),
        vec![
            weight_is_dwi()?,
            weight_is_adc()?,
            is_contrast_agent()?,
            contrast_time()?,
            aquisition_echo()?,
            plane_type()?,
            weight_t()?,
            is_fs()?,
            phase_type()?,
        ],
        categories(),
        HEADER.iter().map(|h| h.to_string()).collect(),
    )
}

// =============================================================================
// Rule helpers
// =============================================================================

pub(super) fn token(token: &str) -> Predicate {
    Predicate::token(fields::SERIES_DESCRIPTION, token)
}

pub(super) fn mentions(needle: &str) -> Predicate {
    Predicate::contains(fields::SERIES_DESCRIPTION, needle)
}

fn exact(needle: &str) -> Predicate {
    Predicate::contains_exact(fields::SERIES_DESCRIPTION, needle)
}

pub(super) fn not_mr() -> Rule {
    Rule::new(Predicate::lacks(fields::MODALITY, &["MR"]), UNKNOWN)
}

pub(super) fn not_mr_ct() -> Rule {
    Rule::new(Predicate::lacks(fields::MODALITY, &["MR", "CT"]), UNKNOWN)
}

pub(super) fn labels(labels: &[&str]) -> ClassifyResult<LabelSet> {
    Ok(LabelSet::new(labels.iter().copied())?)
}

/// A language-model chain answering a yes/no question. There is no
/// catch-all: any other answer leaves the chain unterminated.
fn yes_no(yes: &str, no: &str) -> Matcher {
    Matcher::RuleChain(RuleChain::new(vec![
        Rule::new(Predicate::text_any(&["yes"]), yes),
        Rule::new(Predicate::text_any(&["no"]), no),
    ]))
}

pub(super) fn choice(branches: Vec<Branch>) -> PatternTree {
    PatternTree::new().with_state(START_STATE, Handler::Choice(branches))
}

// =============================================================================
// Concepts
// =============================================================================

/// Manual rules recognising a diffusion-weighted series.
pub(super) fn dwi_rules(label: &str) -> Vec<Rule> {
    vec![
        Rule::new(token("dwi"), label),
        Rule::new(Predicate::All(vec![token("b50"), Predicate::not(mentions("adc"))]), label),
        Rule::new(token("edwi"), label),
        Rule::new(
            Predicate::All(vec![
                mentions("diffusion"),
                Predicate::not(mentions("apparent")),
                Predicate::not(mentions("coefficient")),
            ]),
            label,
        ),
    ]
}

/// Manual rules recognising an apparent diffusion coefficient map.
pub(super) fn adc_rules(label: &str) -> Vec<Rule> {
    vec![
        Rule::new(token("adc"), label),
        Rule::new(Predicate::ends_with(fields::SERIES_DESCRIPTION, "ADC"), label),
        Rule::new(
            Predicate::All(vec![mentions("apparent"), mentions("diffusion"), mentions("coefficient")]),
            label,
        ),
    ]
}

fn with_gate(gate: Rule, rules: Vec<Rule>, fallback: &str) -> RuleChain {
    RuleChain::new(rules).prepend([gate]).with_catch_all(fallback)
}

fn weight_is_dwi() -> ClassifyResult<Concept> {
    Ok(Concept::new(WEIGHT_IS_DWI, Some(labels(&[wk::DWI_YES, wk::DWI_NO, UNKNOWN])?))
        .with_manual(Matcher::RuleChain(with_gate(not_mr(), dwi_rules(wk::DWI_YES), wk::DWI_NO)))
        .with_llm(yes_no(wk::DWI_YES, wk::DWI_NO)))
}

fn weight_is_adc() -> ClassifyResult<Concept> {
    Ok(Concept::new(WEIGHT_IS_ADC, Some(labels(&[wk::ADC_YES, wk::ADC_NO, UNKNOWN])?))
        .with_manual(Matcher::RuleChain(with_gate(not_mr(), adc_rules(wk::ADC_YES), wk::ADC_NO)))
        .with_llm(yes_no(wk::ADC_YES, wk::ADC_NO)))
}

pub(super) fn contrast_time_chain() -> RuleChain {
    let rules = vec![
        Rule::new(token("pre"), wk::CONTRAST_TIMING_PRE),
        Rule::new(token("arterial"), wk::CONTRAST_TIMING_ARTERIAL),
        Rule::new(token("art"), wk::CONTRAST_TIMING_ARTERIAL),
        Rule::new(mentions("late art."), wk::CONTRAST_TIMING_ARTERIAL),
        Rule::new(token("portal"), wk::CONTRAST_TIMING_PORTAL),
        Rule::new(token("porotal"), wk::CONTRAST_TIMING_PORTAL),
        Rule::new(token("venous"), wk::CONTRAST_TIMING_PORTAL),
        Rule::new(token("p.venous"), wk::CONTRAST_TIMING_PORTAL),
        Rule::new(mentions("15 min"), wk::CONTRAST_TIMING_DELAYED),
        Rule::new(token("20min"), wk::CONTRAST_TIMING_DELAYED),
        Rule::new(mentions("20 min"), wk::CONTRAST_TIMING_DELAYED),
        Rule::new(mentions("delay"), wk::CONTRAST_TIMING_DELAYED),
    ];
    with_gate(not_mr_ct(), rules, UNKNOWN)
}

pub(super) fn contrast_time() -> ClassifyResult<Concept> {
    Ok(Concept::new(
        CONTRAST_TIME,
        Some(labels(&[
            wk::CONTRAST_TIMING_PRE,
            wk::CONTRAST_TIMING_ARTERIAL,
            wk::CONTRAST_TIMING_PORTAL,
            wk::CONTRAST_TIMING_DELAYED,
            UNKNOWN,
        ])?),
    )
    .with_manual(Matcher::RuleChain(contrast_time_chain()))
    .with_llm(Matcher::PatternTree(choice(vec![
        Branch::on(&["pre-contrast"], wk::CONTRAST_TIMING_PRE),
        Branch::on(&["arterial"], wk::CONTRAST_TIMING_ARTERIAL),
        Branch::on(&["portal"], wk::CONTRAST_TIMING_PORTAL),
        Branch::on(&["delayed"], wk::CONTRAST_TIMING_DELAYED),
        Branch::otherwise(UNKNOWN),
    ]))))
}

pub(super) fn is_contrast_agent() -> ClassifyResult<Concept> {
    let manual = with_gate(
        not_mr_ct(),
        vec![
            Rule::new(mentions("non-contrast"), wk::CONTRAST_NO),
            Rule::new(mentions("non contrast"), wk::CONTRAST_NO),
            Rule::new(mentions("no contrast"), wk::CONTRAST_NO),
            Rule::new(mentions("contrast routine"), wk::CONTRAST_YES),
            Rule::new(
                Predicate::yields(
                    contrast_time_chain(),
                    &[wk::CONTRAST_TIMING_PORTAL, wk::CONTRAST_TIMING_ARTERIAL],
                ),
                wk::CONTRAST_YES,
            ),
        ],
        UNKNOWN,
    );
    let metadata = RuleChain::new(vec![
        Rule::new(Predicate::equals(fields::CONTRAST_AGENT, "yes"), wk::CONTRAST_YES),
        Rule::new(Predicate::equals(fields::CONTRAST_AGENT, "applied"), wk::CONTRAST_YES),
        Rule::new(Predicate::non_empty_except(fields::CONTRAST_AGENT, &["none"]), wk::CONTRAST_YES),
        Rule::catch_all(UNKNOWN),
    ]);

    Ok(Concept::new(
        IS_CONTRAST_AGENT,
        Some(labels(&[wk::CONTRAST_YES, wk::CONTRAST_NO, UNKNOWN])?),
    )
    .with_manual(Matcher::RuleChain(manual))
    .with_llm(yes_no(wk::CONTRAST_YES, wk::CONTRAST_NO))
    .with_metadata(Matcher::RuleChain(metadata)))
}

pub(super) fn aquisition_echo() -> ClassifyResult<Concept> {
    let manual = with_gate(
        not_mr(),
        vec![
            Rule::new(token("ssfse"), wk::ECHO_SPIN),
            Rule::new(token("frfse"), wk::ECHO_SPIN),
            Rule::new(token("fse"), wk::ECHO_SPIN),
            Rule::new(token("fgre"), wk::ECHO_GRADIENT),
            Rule::new(token("vibe"), wk::ECHO_GRADIENT),
            Rule::new(token("haste"), wk::ECHO_SPIN),
            Rule::new(token("blade"), wk::ECHO_SPIN),
        ],
        UNKNOWN,
    );

    Ok(Concept::new(
        AQUISITION_ECHO,
        Some(labels(&[wk::ECHO_SPIN, wk::ECHO_GRADIENT, UNKNOWN])?),
    )
    .with_manual(Matcher::RuleChain(manual))
    .with_llm(Matcher::PatternTree(choice(vec![
        Branch::on(&["spin echo", "spin-echo"], wk::ECHO_SPIN),
        Branch::on(&["gradient"], wk::ECHO_GRADIENT),
        Branch::otherwise(UNKNOWN),
    ]))))
}

pub(super) fn plane_type() -> ClassifyResult<Concept> {
    let manual = with_gate(
        not_mr_ct(),
        vec![
            Rule::new(token("axial"), wk::PLANE_TYPE_AXIAL),
            Rule::new(token("ax"), wk::PLANE_TYPE_AXIAL),
            Rule::new(token("sagittal"), wk::PLANE_TYPE_SAGITTAL),
            Rule::new(token("sag"), wk::PLANE_TYPE_SAGITTAL),
            Rule::new(token("cor"), wk::PLANE_TYPE_CORONAL),
            Rule::new(token("coronal"), wk::PLANE_TYPE_CORONAL),
        ],
        UNKNOWN,
    );

    Ok(Concept::new(
        PLANE_TYPE,
        Some(labels(&[
            wk::PLANE_TYPE_AXIAL,
            wk::PLANE_TYPE_SAGITTAL,
            wk::PLANE_TYPE_CORONAL,
            UNKNOWN,
        ])?),
    )
    .with_manual(Matcher::RuleChain(manual))
    .with_llm(Matcher::PatternTree(choice(vec![
        Branch::on(&["axial", "transverse"], wk::PLANE_TYPE_AXIAL),
        Branch::on(&["sagittal"], wk::PLANE_TYPE_SAGITTAL),
        Branch::on(&["coronal"], wk::PLANE_TYPE_CORONAL),
        Branch::otherwise(UNKNOWN),
    ]))))
}

pub(super) fn weight_t_chain() -> RuleChain {
    with_gate(
        not_mr(),
        vec![
            Rule::new(token("t1"), wk::WEIGHTING_T1),
            Rule::new(token("t-1"), wk::WEIGHTING_T1),
            Rule::new(token("t2"), wk::WEIGHTING_T2),
            Rule::new(token("t-2"), wk::WEIGHTING_T2),
            Rule::new(token("post-t2"), wk::WEIGHTING_T2),
            Rule::new(token("vibe"), wk::WEIGHTING_T1),
            Rule::new(token("haste"), wk::WEIGHTING_T2),
        ],
        UNKNOWN,
    )
}

pub(super) fn weight_t_tree() -> PatternTree {
    choice(vec![
        Branch::on(&["**t1**", "t1"], wk::WEIGHTING_T1),
        Branch::on(&["**t2**", "t2"], wk::WEIGHTING_T2),
        Branch::otherwise(UNKNOWN),
    ])
}

fn weight_t() -> ClassifyResult<Concept> {
    Ok(Concept::new(WEIGHT_T, Some(labels(&[wk::WEIGHTING_T1, wk::WEIGHTING_T2, UNKNOWN])?))
        .with_manual(Matcher::RuleChain(weight_t_chain()))
        .with_llm(Matcher::PatternTree(weight_t_tree())))
}

pub(super) fn is_fs() -> ClassifyResult<Concept> {
    let manual = with_gate(
        not_mr(),
        vec![
            Rule::new(exact("SPAIR"), wk::FS_YES),
            Rule::new(exact("SPIR"), wk::FS_YES),
            Rule::new(exact("STIR"), wk::FS_YES),
            Rule::new(
                Predicate::Any(vec![
                    exact(" FS "),
                    Predicate::starts_with(fields::SERIES_DESCRIPTION, "FS "),
                    Predicate::ends_with(fields::SERIES_DESCRIPTION, " FS"),
                ]),
                wk::FS_YES,
            ),
            Rule::new(
                Predicate::Any(vec![
                    exact(" fs "),
                    Predicate::starts_with(fields::SERIES_DESCRIPTION, "fs "),
                    Predicate::ends_with(fields::SERIES_DESCRIPTION, " fs"),
                ]),
                wk::FS_YES,
            ),
            Rule::new(mentions("fatsat"), wk::FS_YES),
            Rule::new(mentions("fat sat"), wk::FS_YES),
        ],
        UNKNOWN,
    );

    Ok(Concept::new(IS_FS, Some(labels(&[wk::FS_YES, UNKNOWN])?))
        .with_manual(Matcher::RuleChain(manual))
        .with_llm(Matcher::RuleChain(RuleChain::new(vec![
            Rule::new(Predicate::text_any(&["yes"]), wk::FS_YES),
            Rule::new(Predicate::text_any(&["no"]), UNKNOWN),
        ]))))
}

pub(super) fn phase_type() -> ClassifyResult<Concept> {
    let manual = with_gate(
        not_mr(),
        vec![
            Rule::new(token("inphase"), wk::PHASE_IN),
            Rule::new(Predicate::All(vec![token("in"), token("phase")]), wk::PHASE_IN),
            Rule::new(token("outphase"), wk::PHASE_OUT),
            Rule::new(Predicate::All(vec![token("out"), token("phase")]), wk::PHASE_OUT),
        ],
        UNKNOWN,
    );
    let llm = PatternTree::new()
        .with_state(
            START_STATE,
            Handler::IfElse {
                branch: Branch::on(&["represents both"], wk::PHASE_IN_OUT),
                fallback: "single".to_string(),
            },
        )
        .with_state(
            "single",
            Handler::Choice(vec![
                Branch::on(&["in-phase"], wk::PHASE_IN),
                Branch::on(&["out-of-phase"], wk::PHASE_OUT),
                Branch::otherwise(UNKNOWN),
            ]),
        );

    Ok(Concept::new(PHASE_TYPE, Some(labels(&[wk::PHASE_IN, wk::PHASE_OUT, UNKNOWN])?))
        .with_manual(Matcher::RuleChain(manual))
        .with_llm(Matcher::PatternTree(llm)))
}

// =============================================================================
// Patient categories
// =============================================================================

fn axial() -> Condition {
    Condition::is(PLANE_TYPE, wk::PLANE_TYPE_AXIAL)
}

fn categories() -> Vec<CategoryRule> {
    let mut rules = Vec::new();

    for (suffix, label) in [
        ("in", wk::PHASE_IN),
        ("out", wk::PHASE_OUT),
        ("in-out", wk::PHASE_IN_OUT),
        ("none", wk::CONTRAST_NO),
    ] {
        rules.push(CategoryRule::new(
            format!("axial-phased-{}", suffix),
            vec![axial(), Condition::is(PHASE_TYPE, label)],
        ));
    }

    for (suffix, label) in [
        ("pre", wk::CONTRAST_TIMING_PRE),
        ("portal", wk::CONTRAST_TIMING_PORTAL),
        ("del", wk::CONTRAST_TIMING_DELAYED),
        ("none", wk::CONTRAST_NO),
    ] {
        rules.push(CategoryRule::new(
            format!("axial-time-{}", suffix),
            vec![axial(), Condition::is(CONTRAST_TIME, label)],
        ));
    }

    rules.push(CategoryRule::new(
        "axial-adc",
        vec![Condition::is(WEIGHT_IS_ADC, wk::ADC_YES), axial()],
    ));
    rules.push(CategoryRule::new(
        "axial-dwi",
        vec![Condition::is(WEIGHT_IS_DWI, wk::DWI_YES), axial()],
    ));

    for weighting in [wk::WEIGHTING_T1, wk::WEIGHTING_T2] {
        let weighted = || Condition::is(WEIGHT_T, weighting);
        rules.push(CategoryRule::new(
            format!("{}-cont-fs", weighting),
            vec![
                weighted(),
                Condition::is(IS_FS, wk::FS_YES),
                Condition::is(IS_CONTRAST_AGENT, wk::CONTRAST_YES),
                axial(),
            ],
        ));
        rules.push(CategoryRule::new(
            format!("{}-cont", weighting),
            vec![
                weighted(),
                Condition::is_not(IS_FS, wk::FS_YES),
                Condition::is(IS_CONTRAST_AGENT, wk::CONTRAST_YES),
                axial(),
            ],
        ));
        rules.push(CategoryRule::new(
            format!("{}-fs", weighting),
            vec![
                weighted(),
                Condition::is(IS_FS, wk::FS_YES),
                Condition::is(IS_CONTRAST_AGENT, wk::CONTRAST_NO),
                axial(),
            ],
        ));
        rules.push(CategoryRule::new(
            weighting,
            vec![weighted(), Condition::is(IS_CONTRAST_AGENT, wk::CONTRAST_NO), axial()],
        ));
    }

    rules.push(CategoryRule::new(
        "coronal",
        vec![Condition::is(PLANE_TYPE, wk::PLANE_TYPE_CORONAL)],
    ));
    rules.push(CategoryRule::new(
        "sagittal",
        vec![Condition::is(PLANE_TYPE, wk::PLANE_TYPE_SAGITTAL)],
    ));

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::evaluate;
    use series_types::{MatchInput, Metadata, ParserType, SeriesRecord};

    fn make_row(modality: &str, description: &str) -> Metadata {
        [(fields::MODALITY, modality), (fields::SERIES_DESCRIPTION, description)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn manual_label(concept: &Concept, row: &Metadata) -> Option<String> {
        match concept.matcher(ParserType::Manual) {
            Some(Matcher::RuleChain(chain)) => evaluate(&MatchInput::Fields(row), chain).label().map(str::to_string),
            _ => None,
        }
    }

    #[test]
    fn test_concept_order_and_header() {
        let ontology = ontology().unwrap();
        let keys: Vec<&str> = ontology.concept_keys().collect();
        assert_eq!(
            keys,
            vec![
                WEIGHT_IS_DWI,
                WEIGHT_IS_ADC,
                IS_CONTRAST_AGENT,
                CONTRAST_TIME,
                AQUISITION_ECHO,
                PLANE_TYPE,
                WEIGHT_T,
                IS_FS,
                PHASE_TYPE
            ]
        );
        assert_eq!(ontology.full_header().len(), 9);
        assert_eq!(ontology.full_header()[0], WEIGHT_IS_ADC);
    }

    #[test]
    fn test_mapping_header() {
        let ontology = ontology().unwrap();
        assert_eq!(
            ontology.mapping_header(),
            vec![
                "axial-phased-in",
                "axial-phased-out",
                "axial-phased-in-out",
                "axial-phased-none",
                "axial-time-pre",
                "axial-time-portal",
                "axial-time-del",
                "axial-time-none",
                "axial-adc",
                "axial-dwi",
                "t1-cont-fs",
                "t1-cont",
                "t1-fs",
                "t1",
                "t2-cont-fs",
                "t2-cont",
                "t2-fs",
                "t2",
                "coronal",
                "sagittal",
            ]
        );
    }

    fn make_series(phase: &str, timing: &str) -> SeriesRecord {
        let mut series = SeriesRecord::new();
        series.insert(PLANE_TYPE, wk::PLANE_TYPE_AXIAL);
        series.insert(PHASE_TYPE, phase);
        series.insert(CONTRAST_TIME, timing);
        series
    }

    #[test]
    fn test_none_categories_count_negatives_only() {
        let rules = categories();
        let find = |name: &str| rules.iter().find(|r| r.name == name).unwrap();
        let series = vec![
            make_series(UNKNOWN, UNKNOWN),
            make_series(".", "."),
            make_series(wk::PHASE_IN, wk::CONTRAST_TIMING_PRE),
        ];
        assert_eq!(find("axial-phased-none").count(&series), 1);
        assert_eq!(find("axial-time-none").count(&series), 1);
        assert_eq!(find("axial-phased-in").count(&series), 1);
        assert_eq!(find("axial-phased-none").count(&series[..1]), 0);
    }

    #[test]
    fn test_manual_plane() {
        let concept = plane_type().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "AX T1")).as_deref(), Some("axial"));
        assert_eq!(manual_label(&concept, &make_row("CT", "COR")).as_deref(), Some("coronal"));
        assert_eq!(manual_label(&concept, &make_row("PT", "AX")).as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_manual_dwi_excludes_adc() {
        let concept = weight_is_dwi().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "b50 dwi")).as_deref(), Some("+"));
        assert_eq!(manual_label(&concept, &make_row("MR", "b50 ADC")).as_deref(), Some("."));
        assert_eq!(manual_label(&concept, &make_row("MR", "Diffusion")).as_deref(), Some("+"));
    }

    #[test]
    fn test_manual_diffusion_negatives() {
        let dwi = weight_is_dwi().unwrap();
        let adc = weight_is_adc().unwrap();
        for description in ["AX T1", "T2 HASTE", "(cor t2)"] {
            assert_eq!(manual_label(&dwi, &make_row("MR", description)).as_deref(), Some("."));
            assert_eq!(manual_label(&adc, &make_row("MR", description)).as_deref(), Some("."));
        }
        assert_eq!(manual_label(&adc, &make_row("MR", "AX ADC")).as_deref(), Some("+"));
        assert_eq!(manual_label(&dwi, &make_row("CT", "AX T1")).as_deref(), Some(UNKNOWN));
        assert_eq!(manual_label(&adc, &make_row("CT", "AX ADC")).as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_manual_contrast_from_timing() {
        let concept = is_contrast_agent().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 PORTAL")).as_deref(), Some("+"));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 non-contrast")).as_deref(), Some("."));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 PRE")).as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_manual_delayed_ten_minutes() {
        let concept = contrast_time().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 10 min")).as_deref(), Some(UNKNOWN));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 15 min")).as_deref(), Some("delayed"));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 20min")).as_deref(), Some("delayed"));
    }

    #[test]
    fn test_manual_timing_with_inner_brackets() {
        let concept = contrast_time().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 FS_POST(ART)")).as_deref(), Some(UNKNOWN));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 FS_POST ART")).as_deref(), Some("arterial"));
        assert_eq!(manual_label(&concept, &make_row("MR", "(T1 PORTAL)")).as_deref(), Some("portal"));
    }

    #[test]
    fn test_manual_fat_saturation() {
        let concept = is_fs().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "T2 SPAIR")).as_deref(), Some("+"));
        assert_eq!(manual_label(&concept, &make_row("MR", "FS T1")).as_deref(), Some("+"));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 FatSat")).as_deref(), Some("+"));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1")).as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_manual_phase() {
        let concept = phase_type().unwrap();
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 in phase")).as_deref(), Some("in"));
        assert_eq!(manual_label(&concept, &make_row("MR", "T1 OUTPHASE")).as_deref(), Some("out"));
    }

    #[test]
    fn test_contrast_metadata_rules() {
        let concept = is_contrast_agent().unwrap();
        let Some(Matcher::RuleChain(chain)) = concept.matcher(ParserType::Metadata) else {
            panic!("metadata rules missing");
        };
        let mut row = Metadata::new();
        row.insert(fields::CONTRAST_AGENT.to_string(), "Gadovist".to_string());
        assert_eq!(evaluate(&MatchInput::Fields(&row), chain).label(), Some("+"));
        row.insert(fields::CONTRAST_AGENT.to_string(), "None".to_string());
        assert_eq!(evaluate(&MatchInput::Fields(&row), chain).label(), Some(UNKNOWN));
    }
}
