//! Ontology v21: DWI and ADC folded into `weight_t`, contrast timing per
//! weighting and fat saturation.

use series_types::well_known as wk;
use series_types::{
    Branch, CategoryRule, Concept, Condition, Matcher, OntologyVersion, PatternTree, START_STATE, UNKNOWN,
};

use super::v20::{self, AQUISITION_ECHO, CONTRAST_TIME, IS_CONTRAST_AGENT, IS_FS, PHASE_TYPE, PLANE_TYPE, WEIGHT_T};
use super::Ontology;
use crate::types::{ClassifyError, ClassifyResult};

const HEADER: &[&str] = &[
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
        OntologyVersion::V21.name(),
        vec![
            weight_t()?,
            contrast_time()?,
            v20::is_contrast_agent()?,
            v20::is_fs()?,
            v20::aquisition_echo()?,
            v20::plane_type()?,
            v20::phase_type()?,
        ],
        categories(),
        HEADER.iter().map(|h| h.to_string()).collect(),
    )
}

fn extend_start(tree: &PatternTree, branches: Vec<Branch>, key: &str) -> ClassifyResult<PatternTree> {
    tree.extend_choice_before_catchall(START_STATE, branches)
        .ok_or_else(|| ClassifyError::Schema(format!("'{}' start state is not a choice", key)))
}

fn weight_t() -> ClassifyResult<Concept> {
    let manual = v20::weight_t_chain()
        .extend_before_catchall(v20::dwi_rules(wk::WEIGHTING_DWI).into_iter().chain(v20::adc_rules(wk::WEIGHTING_ADC)));
    let llm = extend_start(
        &v20::weight_t_tree(),
        vec![
            Branch::on(&["dwi"], wk::WEIGHTING_DWI),
            Branch::on(&["adc"], wk::WEIGHTING_ADC),
        ],
        WEIGHT_T,
    )?;
    let labels = v20::labels(&[wk::WEIGHTING_T1, wk::WEIGHTING_T2, UNKNOWN])?
        .extend_before_unknown(&[wk::WEIGHTING_DWI, wk::WEIGHTING_ADC])?;

    Ok(Concept::new(WEIGHT_T, Some(labels))
        .with_manual(Matcher::RuleChain(manual))
        .with_llm(Matcher::PatternTree(llm)))
}

fn contrast_time() -> ClassifyResult<Concept> {
    let mut concept = v20::contrast_time()?;
    if let Some(Matcher::PatternTree(tree)) = &concept.llm {
        let extended = extend_start(
            tree,
            vec![
                Branch::on(&["not applicable"], UNKNOWN),
                Branch::on(&["not-applicable"], UNKNOWN),
            ],
            CONTRAST_TIME,
        )?;
        concept.llm = Some(Matcher::PatternTree(extended));
    }
    Ok(concept)
}

// =============================================================================
// Patient categories
// =============================================================================

fn axial() -> Condition {
    Condition::is(PLANE_TYPE, wk::PLANE_TYPE_AXIAL)
}

fn categories() -> Vec<CategoryRule> {
    let mut rules = vec![
        CategoryRule::new("ax-adc", vec![Condition::is(WEIGHT_T, wk::WEIGHTING_ADC), axial()]),
        CategoryRule::new("ax-dwi", vec![Condition::is(WEIGHT_T, wk::WEIGHTING_DWI), axial()]),
    ];

    for weighting in [wk::WEIGHTING_T1, wk::WEIGHTING_T2] {
        let fat_saturated = || {
            vec![
                axial(),
                Condition::is(WEIGHT_T, weighting),
                Condition::is(IS_FS, wk::FS_YES),
            ]
        };
        for (suffix, timing) in [
            ("pre", wk::CONTRAST_TIMING_PRE),
            ("art", wk::CONTRAST_TIMING_ARTERIAL),
            ("port", wk::CONTRAST_TIMING_PORTAL),
            ("del", wk::CONTRAST_TIMING_DELAYED),
        ] {
            let mut conditions = fat_saturated();
            conditions.push(Condition::is(CONTRAST_TIME, timing));
            rules.push(CategoryRule::new(format!("ax-{}-fs-{}", weighting, suffix), conditions));
        }

        let mut conditions = fat_saturated();
        conditions.push(Condition::is(IS_CONTRAST_AGENT, wk::CONTRAST_NO));
        rules.push(CategoryRule::new(format!("ax-{}-fs", weighting), conditions));

        rules.push(CategoryRule::new(
            format!("ax-{}", weighting),
            vec![
                axial(),
                Condition::is(WEIGHT_T, weighting),
                Condition::is_not(IS_FS, wk::FS_YES),
                Condition::is(IS_CONTRAST_AGENT, wk::CONTRAST_NO),
            ],
        ));
    }

    rules.push(CategoryRule::new("cor", vec![Condition::is(PLANE_TYPE, wk::PLANE_TYPE_CORONAL)]));
    rules.push(CategoryRule::new("sag", vec![Condition::is(PLANE_TYPE, wk::PLANE_TYPE_SAGITTAL)]));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::evaluate;
    use crate::tree::{walk, TreeOutcome};
    use series_types::well_known::fields;
    use series_types::{Handler, MatchInput, Metadata, ParserType, SeriesRecord};

    fn weight_tree() -> PatternTree {
        match weight_t().unwrap().llm {
            Some(Matcher::PatternTree(tree)) => tree,
            other => panic!("unexpected matcher {:?}", other),
        }
    }

    #[test]
    fn test_concept_order() {
        let ontology = ontology().unwrap();
        let keys: Vec<&str> = ontology.concept_keys().collect();
        assert_eq!(
            keys,
            vec![WEIGHT_T, CONTRAST_TIME, IS_CONTRAST_AGENT, IS_FS, AQUISITION_ECHO, PLANE_TYPE, PHASE_TYPE]
        );
        assert_eq!(ontology.full_header(), HEADER);
    }

    #[test]
    fn test_weight_tree_keeps_catch_all_last() {
        let tree = weight_tree();
        let Some(Handler::Choice(branches)) = tree.handler(START_STATE) else {
            panic!("start state is not a choice");
        };
        let targets: Vec<&str> = branches.iter().map(|b| b.next.as_str()).collect();
        assert_eq!(targets, vec!["t1", "t2", "DWI", "ADC", UNKNOWN]);
        assert!(branches.last().unwrap().is_catch_all());
    }

    #[test]
    fn test_weight_tree_labels_dwi() {
        assert_eq!(walk("this is a dwi series", &weight_tree()), TreeOutcome::Label("DWI".into()));
    }

    #[test]
    fn test_weight_manual_adds_diffusion() {
        let concept = weight_t().unwrap();
        let Some(Matcher::RuleChain(chain)) = concept.matcher(ParserType::Manual) else {
            panic!("manual rules missing");
        };
        assert!(chain.has_catch_all());
        let row: Metadata = [(fields::MODALITY, "MR"), (fields::SERIES_DESCRIPTION, "AX ADC")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(evaluate(&MatchInput::Fields(&row), chain).label(), Some("ADC"));
    }

    #[test]
    fn test_contrast_time_not_applicable() {
        let concept = contrast_time().unwrap();
        let Some(Matcher::PatternTree(tree)) = concept.llm else {
            panic!("llm rules missing");
        };
        assert_eq!(walk("not applicable", &tree), TreeOutcome::Label(UNKNOWN.into()));
    }

    #[test]
    fn test_mapping_header_names() {
        let ontology = ontology().unwrap();
        assert_eq!(
            ontology.mapping_header(),
            vec![
                "ax-adc",
                "ax-dwi",
                "ax-t1-fs-pre",
                "ax-t1-fs-art",
                "ax-t1-fs-port",
                "ax-t1-fs-del",
                "ax-t1-fs",
                "ax-t1",
                "ax-t2-fs-pre",
                "ax-t2-fs-art",
                "ax-t2-fs-port",
                "ax-t2-fs-del",
                "ax-t2-fs",
                "ax-t2",
                "cor",
                "sag",
            ]
        );
    }

    #[test]
    fn test_timed_category() {
        let ontology = ontology().unwrap();
        let series: SeriesRecord = [
            (PLANE_TYPE, "axial"),
            (WEIGHT_T, "t1"),
            (IS_FS, "+"),
            (CONTRAST_TIME, "arterial"),
        ]
        .into_iter()
        .collect();
        let matched: Vec<&str> = ontology
            .series_to_patient_mapping()
            .iter()
            .filter(|c| c.matches(&series))
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(matched, vec!["ax-t1-fs-art"]);
    }
}
