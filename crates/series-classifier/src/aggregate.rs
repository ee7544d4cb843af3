//! Series-to-patient aggregation.
//!
//! Series records are grouped by a key column (normally the patient id) and
//! each group is reduced to one [`PatientRecord`] holding, for every
//! category of the ontology, the number of series that satisfy it.

use std::collections::HashMap;

use series_types::well_known::fields;
use series_types::{CategoryRule, PatientRecord, SeriesRecord};
use tracing::warn;

use crate::ontology::Ontology;

/// Series sharing a key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Key value shared by the series.
    pub key: String,
    /// Series in input order.
    pub series: Vec<SeriesRecord>,
}

/// Groups records by the value of `key_field`.
///
/// Groups appear in order of first occurrence and keep their series in
/// input order. Records without the key are skipped.
pub fn group_by<I>(records: I, key_field: &str) -> Vec<Group>
where
    I: IntoIterator<Item = SeriesRecord>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(key) = record.get(key_field).map(str::to_string) else {
            skipped += 1;
            continue;
        };
        match index.get(&key) {
            Some(&position) => groups[position].series.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    series: vec![record],
                });
            }
        }
    }

    if skipped > 0 {
        warn!(field = key_field, skipped, "records without group key skipped");
    }
    groups
}

/// Reduces a group of series to one patient row.
///
/// Every category gets a count, zero included. Passthrough columns are
/// copied from the first series; an empty group has none.
pub fn reduce_to_patient(series: &[SeriesRecord], categories: &[CategoryRule], passthrough: &[&str]) -> PatientRecord {
    let counts = categories
        .iter()
        .map(|category| (category.name.clone(), category.count(series)))
        .collect();

    let passthrough = series
        .first()
        .map(|first| {
            passthrough
                .iter()
                .filter_map(|column| first.get(column).map(|v| (column.to_string(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    PatientRecord { counts, passthrough }
}

/// Metadata columns copied into patient rows.
pub fn patient_passthrough() -> Vec<&'static str> {
    fields::DEFAULT_PARAMS
        .iter()
        .copied()
        .filter(|c| *c != fields::SERIES_ID && *c != fields::MODALITY && *c != fields::PATIENT_ID)
        .collect()
}

/// Column order of a patient output table.
pub fn patient_header(ontology: &Ontology) -> Vec<String> {
    let mut header = vec![fields::PATIENT_ID.to_string()];
    header.extend(ontology.mapping_header().into_iter().map(str::to_string));
    header.extend(patient_passthrough().into_iter().map(str::to_string));
    header
}

/// Groups series by patient and reduces each patient with the ontology's
/// categories. The patient id is kept as a passthrough column.
pub fn patients<I>(records: I, ontology: &Ontology) -> Vec<PatientRecord>
where
    I: IntoIterator<Item = SeriesRecord>,
{
    let mut passthrough = vec![fields::PATIENT_ID];
    passthrough.extend(patient_passthrough());

    group_by(records, fields::PATIENT_ID)
        .iter()
        .map(|group| reduce_to_patient(&group.series, ontology.series_to_patient_mapping(), &passthrough))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use series_types::{Condition, OntologyVersion};

    fn make_series(patient: &str, plane: &str) -> SeriesRecord {
        [("Patient_ID", patient), ("plane_type", plane), ("Patient_Sex", "F")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_group_by_first_occurrence() {
        let groups = group_by(
            vec![
                make_series("p2", "axial"),
                make_series("p1", "coronal"),
                make_series("p2", "sagittal"),
            ],
            "Patient_ID",
        );
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["p2", "p1"]);
        assert_eq!(groups[0].series[1].get("plane_type"), Some("sagittal"));
    }

    #[test]
    fn test_group_by_skips_missing_key() {
        let record: SeriesRecord = [("plane_type", "axial")].into_iter().collect();
        assert!(group_by(vec![record], "Patient_ID").is_empty());
    }

    #[test]
    fn test_reduce_counts_every_category() {
        let categories = vec![
            CategoryRule::new("cor", vec![Condition::is("plane_type", "coronal")]),
            CategoryRule::new("sag", vec![Condition::is("plane_type", "sagittal")]),
        ];
        let series = vec![make_series("p1", "coronal"), make_series("p1", "coronal")];
        let patient = reduce_to_patient(&series, &categories, &["Patient_ID"]);
        assert_eq!(patient.counts["cor"], 2);
        assert_eq!(patient.counts["sag"], 0);
        assert_eq!(patient.cell("Patient_ID").as_deref(), Some("p1"));
    }

    #[test]
    fn test_reduce_empty_group() {
        let categories = vec![CategoryRule::new("cor", vec![Condition::is("plane_type", "coronal")])];
        let patient = reduce_to_patient(&[], &categories, &["Patient_ID"]);
        assert_eq!(patient.counts["cor"], 0);
        assert!(patient.passthrough.is_empty());
    }

    #[test]
    fn test_patients_with_ontology() {
        let ontology = Ontology::builtin(OntologyVersion::V21).unwrap();
        let records = vec![
            make_series("p1", "coronal"),
            make_series("p2", "sagittal"),
            make_series("p1", "coronal"),
        ];
        let rows = patients(records, &ontology);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell("cor").as_deref(), Some("2"));
        assert_eq!(rows[0].cell("Patient_Sex").as_deref(), Some("F"));
        assert_eq!(rows[1].cell("sag").as_deref(), Some("1"));
    }

    #[test]
    fn test_patient_header() {
        let ontology = Ontology::builtin(OntologyVersion::V21).unwrap();
        let header = patient_header(&ontology);
        assert_eq!(header[0], "Patient_ID");
        assert_eq!(header[1], "ax-adc");
        assert!(!header.iter().any(|h| h == "Modality" || h == "ID-Series"));
        assert_eq!(header.last().map(String::as_str), Some("Patient_Sex"));
    }
}
