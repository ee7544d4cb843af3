//! Per-series and per-patient records.
//!
//! Both record kinds are flat string-keyed mappings: column order is never
//! stored in the record, it comes from the ontology headers at write time.

use std::collections::BTreeMap;

/// A flat mapping of named attributes for one series.
///
/// This is the shape of both input table rows and extracted DICOM metadata.
pub type Metadata = BTreeMap<String, String>;

/// A classified series: concept key to label, plus passthrough fields.
///
/// # Examples
///
/// ```
/// use series_types::SeriesRecord;
///
/// let mut record = SeriesRecord::new();
/// record.insert("plane_type", "axial");
/// record.insert("Patient_ID", "P-01");
///
/// assert_eq!(record.get("plane_type"), Some("axial"));
/// assert!(record.get("weight_t").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SeriesRecord {
    fields: Metadata,
}

impl SeriesRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Copies every metadata field into the record. Metadata wins on conflicts.
    pub fn merge_metadata(&mut self, metadata: &Metadata) {
        for (k, v) in metadata {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consumes the record, returning the underlying mapping.
    pub fn into_fields(self) -> Metadata {
        self.fields
    }
}

impl From<Metadata> for SeriesRecord {
    fn from(fields: Metadata) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SeriesRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One row per patient: category counts plus passthrough columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatientRecord {
    /// Number of matching series per named category.
    pub counts: BTreeMap<String, usize>,
    /// Columns copied from the first series of the patient.
    pub passthrough: BTreeMap<String, String>,
}

impl PatientRecord {
    /// Returns the textual value of a column: a count if the column is a
    /// category, otherwise the passthrough value.
    pub fn cell(&self, column: &str) -> Option<String> {
        self.counts
            .get(column)
            .map(|c| c.to_string())
            .or_else(|| self.passthrough.get(column).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_metadata_overrides() {
        let mut record: SeriesRecord = [("Modality", "CT"), ("plane_type", "axial")]
            .into_iter()
            .collect();

        let mut meta = Metadata::new();
        meta.insert("Modality".to_string(), "MR".to_string());
        meta.insert("Patient_ID".to_string(), "P-7".to_string());
        record.merge_metadata(&meta);

        assert_eq!(record.get("Modality"), Some("MR"));
        assert_eq!(record.get("Patient_ID"), Some("P-7"));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_patient_cell_prefers_counts() {
        let mut patient = PatientRecord::default();
        patient.counts.insert("cor".to_string(), 2);
        patient
            .passthrough
            .insert("Patient_Sex".to_string(), "F".to_string());

        assert_eq!(patient.cell("cor").as_deref(), Some("2"));
        assert_eq!(patient.cell("Patient_Sex").as_deref(), Some("F"));
        assert_eq!(patient.cell("sag"), None);
    }
}
