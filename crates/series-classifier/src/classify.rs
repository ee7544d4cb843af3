//! Classification driver.
//!
//! Applies one rule set of every concept of an [`Ontology`] to each input
//! row and produces one [`SeriesRecord`] per row. Rows are independent, so a
//! pass is a plain map; with the `parallel` feature the map runs on rayon
//! and the output order still follows the input.

use std::collections::HashMap;
use std::path::Path;

use series_types::well_known::fields;
use series_types::{MatchInput, Matcher, Metadata, ParserType, SeriesRecord, UNKNOWN};
use tracing::{debug, info, warn};

use crate::chain;
use crate::ontology::{Ontology, SERIES_CONCEPT_COLUMNS};
use crate::reader::RowReader;
use crate::stats::ClassificationStats;
use crate::tree;
use crate::types::{ClassifyOptions, ClassifyResult};

/// Column that keys a pre-extracted metadata table by default.
pub const DEFAULT_METADATA_KEY: &str = fields::FILE_LOCATION;

/// Collection name used for rows without a `Collection` column.
pub const DEFAULT_COLLECTION: &str = "default";

// =============================================================================
// Metadata sources
// =============================================================================

/// Supplies the series metadata for an input row.
pub trait MetadataSource {
    /// Returns the metadata of the series described by `row`, if known.
    fn lookup(&self, row: &Metadata) -> Option<Metadata>;
}

/// Takes the DICOM parameter columns of the input row as metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMetadata;

impl MetadataSource for RowMetadata {
    fn lookup(&self, row: &Metadata) -> Option<Metadata> {
        Some(
            fields::DEFAULT_PARAMS
                .iter()
                .chain(fields::RELEVANT_PARAMS)
                .filter_map(|column| row.get_key_value(*column))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Supplies no metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn lookup(&self, _row: &Metadata) -> Option<Metadata> {
        None
    }
}

/// Metadata loaded from a table and keyed by one of its columns.
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    key_column: String,
    rows: HashMap<String, Metadata>,
}

impl MetadataTable {
    /// Builds a table from rows, keyed by `key_column`. Rows without the
    /// key are dropped; a repeated key keeps the first row.
    pub fn from_rows<I>(key_column: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = Metadata>,
    {
        let mut table = HashMap::new();
        for row in rows {
            match row.get(key_column) {
                Some(key) => {
                    table.entry(key.clone()).or_insert(row);
                }
                None => warn!(column = key_column, "metadata row without key column skipped"),
            }
        }
        Self {
            key_column: key_column.to_string(),
            rows: table,
        }
    }

    /// Loads a metadata table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P, key_column: &str) -> ClassifyResult<Self> {
        let reader = RowReader::from_path(path)?;
        reader.require_columns(&[key_column])?;
        Ok(Self::from_rows(key_column, reader.read_all()?))
    }

    /// Number of series in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MetadataSource for MetadataTable {
    fn lookup(&self, row: &Metadata) -> Option<Metadata> {
        row.get(&self.key_column).and_then(|key| self.rows.get(key)).cloned()
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Output of a classification pass.
#[derive(Debug, Clone, Default)]
pub struct ClassificationPass {
    /// One record per input row, in input order.
    pub records: Vec<SeriesRecord>,
    /// Label counters of the pass.
    pub stats: ClassificationStats,
}

/// Applies an ontology to input rows.
#[derive(Debug, Clone)]
pub struct Classifier<'o> {
    ontology: &'o Ontology,
    options: ClassifyOptions,
}

impl<'o> Classifier<'o> {
    /// Creates a classifier.
    pub fn new(ontology: &'o Ontology, options: ClassifyOptions) -> Self {
        Self { ontology, options }
    }

    /// Returns the ontology.
    pub fn ontology(&self) -> &Ontology {
        self.ontology
    }

    /// Returns the options.
    pub fn options(&self) -> &ClassifyOptions {
        &self.options
    }

    /// Classifies one row.
    ///
    /// Language-model concepts read the row column named after the concept
    /// and are skipped when it is absent. Manual and metadata concepts read
    /// the series metadata; a row without metadata is classified against an
    /// empty field map, which resolves to unknown.
    pub fn classify_row<S: MetadataSource + ?Sized>(&self, row: &Metadata, source: &S) -> (SeriesRecord, ClassificationStats) {
        let collection = row
            .get(fields::COLLECTION)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLLECTION);
        let metadata = source.lookup(row);
        let empty = Metadata::new();
        let parser = self.options.parser;

        if metadata.is_none() && parser != ParserType::Llm {
            warn!(series = row.get(fields::SERIES_ID).map(String::as_str), "no metadata for row");
        }

        let mut record = SeriesRecord::new();
        let mut stats = ClassificationStats::new();

        for (source_column, target_column) in &self.options.passthrough {
            if let Some(value) = row.get(source_column) {
                record.insert(target_column.clone(), value.clone());
            }
        }

        for (key, matcher) in self.ontology.parsers_for(parser) {
            let lowered;
            let input = match parser {
                ParserType::Llm => {
                    let Some(text) = row.get(key) else {
                        continue;
                    };
                    lowered = text.to_lowercase();
                    MatchInput::Text(&lowered)
                }
                ParserType::Manual | ParserType::Metadata => MatchInput::Fields(metadata.as_ref().unwrap_or(&empty)),
            };

            let label = self.resolve(key, matcher, &input).unwrap_or_else(|| UNKNOWN.to_string());
            stats.observe(collection, key, &label);
            record.insert(key, label);
        }

        if self.options.register_metadata {
            if let Some(metadata) = &metadata {
                record.merge_metadata(metadata);
            }
        }

        stats.count_row();
        (record, stats)
    }

    /// Classifies every row in order.
    pub fn classify_rows<I, S>(&self, rows: I, source: &S) -> ClassificationPass
    where
        I: IntoIterator<Item = Metadata>,
        S: MetadataSource + ?Sized,
    {
        let mut pass = ClassificationPass::default();
        for row in rows {
            let (record, stats) = self.classify_row(&row, source);
            pass.records.push(record);
            pass.stats = std::mem::take(&mut pass.stats).merge(stats);
        }
        info!(
            parser = %self.options.parser,
            ontology = self.ontology.name(),
            rows = pass.records.len(),
            "classification pass finished"
        );
        pass
    }

    /// Classifies rows on the rayon thread pool. Output order follows the
    /// input.
    #[cfg(feature = "parallel")]
    pub fn classify_rows_parallel<S>(&self, rows: &[Metadata], source: &S) -> ClassificationPass
    where
        S: MetadataSource + Sync + ?Sized,
    {
        use rayon::prelude::*;

        let results: Vec<(SeriesRecord, ClassificationStats)> =
            rows.par_iter().map(|row| self.classify_row(row, source)).collect();

        let mut pass = ClassificationPass::default();
        for (record, stats) in results {
            pass.records.push(record);
            pass.stats = std::mem::take(&mut pass.stats).merge(stats);
        }
        info!(
            parser = %self.options.parser,
            ontology = self.ontology.name(),
            rows = pass.records.len(),
            "parallel classification pass finished"
        );
        pass
    }

    fn resolve(&self, key: &str, matcher: &Matcher, input: &MatchInput<'_>) -> Option<String> {
        match matcher {
            Matcher::RuleChain(rules) => chain::evaluate_with(input, rules, |input, rules| {
                self.diagnose(key, input, &format!("no rule fired ({} rules)", rules.len()));
            })
            .map(str::to_string),
            Matcher::PatternTree(states) => {
                let text = input.text().unwrap_or("");
                tree::evaluate_with(text, states, |anomaly| {
                    self.diagnose(key, input, &anomaly.to_string());
                })
            }
        }
    }

    fn diagnose(&self, key: &str, input: &MatchInput<'_>, message: &str) {
        let text = match input {
            MatchInput::Text(text) => *text,
            MatchInput::Fields(values) => values.get(fields::SERIES_DESCRIPTION).map_or("", String::as_str),
        };
        if self.options.is_traced(key) {
            info!(concept = key, text, "{}", message);
        } else {
            debug!(concept = key, text, "{}", message);
        }
    }
}

/// Column order of a series output table: series and patient id, the fixed
/// concept columns, any further ontology columns, then the metadata columns.
pub fn series_header(ontology: &Ontology) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    let columns = [fields::SERIES_ID, fields::PATIENT_ID]
        .into_iter()
        .chain(SERIES_CONCEPT_COLUMNS.iter().copied())
        .chain(ontology.full_header().iter().map(String::as_str))
        .chain(fields::DEFAULT_PARAMS.iter().copied())
        .chain(fields::RELEVANT_PARAMS.iter().copied());
    for column in columns {
        if !header.iter().any(|h| h == column) {
            header.push(column.to_string());
        }
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use series_types::OntologyVersion;

    fn make_row(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn v21() -> Ontology {
        Ontology::builtin(OntologyVersion::V21).unwrap()
    }

    #[test]
    fn test_llm_row() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::llm().without_metadata());
        let row = make_row(&[
            ("plane_type", "The plane is AXIAL."),
            ("weight_t", "It is a T2 weighted image"),
            ("phase_type", "in-phase and out-of-phase"),
        ]);

        let (record, stats) = classifier.classify_row(&row, &NoMetadata);
        assert_eq!(record.get("plane_type"), Some("axial"));
        assert_eq!(record.get("weight_t"), Some("t2"));
        assert_eq!(record.get("phase_type"), Some(UNKNOWN));
        // absent columns are skipped entirely
        assert!(!record.contains("is_fs"));
        assert_eq!(stats.overall().total("plane_type"), 1);
    }

    #[test]
    fn test_llm_unterminated_chain_is_unknown() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::llm());
        let row = make_row(&[("is_fs", "cannot tell")]);
        let (record, _) = classifier.classify_row(&row, &NoMetadata);
        assert_eq!(record.get("is_fs"), Some(UNKNOWN));
    }

    #[test]
    fn test_manual_from_row_metadata() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::manual());
        let row = make_row(&[
            ("ID-Series", "1.2.3"),
            ("Modality", "MR"),
            ("Series-Description", "AX T1 FS PORTAL"),
        ]);

        let (record, _) = classifier.classify_row(&row, &RowMetadata);
        assert_eq!(record.get("plane_type"), Some("axial"));
        assert_eq!(record.get("weight_t"), Some("t1"));
        assert_eq!(record.get("is_fs"), Some("+"));
        assert_eq!(record.get("contrast_time"), Some("portal"));
        assert_eq!(record.get("is_contrast_agent"), Some("+"));
        // metadata registered
        assert_eq!(record.get("ID-Series"), Some("1.2.3"));
    }

    #[test]
    fn test_manual_without_metadata_is_unknown() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::manual());
        let (record, _) = classifier.classify_row(&make_row(&[]), &NoMetadata);
        for key in ontology.concept_keys() {
            assert_eq!(record.get(key), Some(UNKNOWN), "concept {}", key);
        }
    }

    #[test]
    fn test_metadata_parser() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::for_parser(ParserType::Metadata).without_metadata());
        let row = make_row(&[("Contrast-Agent", "Gadovist")]);
        let (record, _) = classifier.classify_row(&row, &RowMetadata);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("is_contrast_agent"), Some("+"));
    }

    #[test]
    fn test_row_metadata_keeps_dicom_columns() {
        let row = make_row(&[("Modality", "MR"), ("plane_type", "raw response"), ("Patient_ID", "p1")]);
        let metadata = RowMetadata.lookup(&row).unwrap();
        assert_eq!(metadata.len(), 2);
        assert!(!metadata.contains_key("plane_type"));
    }

    #[test]
    fn test_metadata_table_lookup() {
        let table = MetadataTable::from_rows(
            "ID-Series",
            vec![
                make_row(&[("ID-Series", "s1"), ("Modality", "MR"), ("Series-Description", "COR T2")]),
                make_row(&[("Modality", "CT")]),
            ],
        );
        assert_eq!(table.len(), 1);

        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::manual().without_metadata());
        let (record, _) = classifier.classify_row(&make_row(&[("ID-Series", "s1")]), &table);
        assert_eq!(record.get("plane_type"), Some("coronal"));
        assert!(!record.contains("Modality"));
    }

    #[test]
    fn test_passthrough() {
        let ontology = v21();
        let options = ClassifyOptions::llm()
            .without_metadata()
            .with_prefixed_passthrough(["plane_type"], "_");
        let classifier = Classifier::new(&ontology, options);
        let (record, _) = classifier.classify_row(&make_row(&[("plane_type", "sagittal")]), &NoMetadata);
        assert_eq!(record.get("_plane_type"), Some("sagittal"));
        assert_eq!(record.get("plane_type"), Some("sagittal"));
    }

    #[test]
    fn test_classify_rows_keeps_order_and_collections() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::llm().without_metadata());
        let rows = vec![
            make_row(&[("Collection", "liver"), ("plane_type", "axial")]),
            make_row(&[("Collection", "kidney"), ("plane_type", "coronal")]),
            make_row(&[("plane_type", "none")]),
        ];

        let pass = classifier.classify_rows(rows, &NoMetadata);
        let planes: Vec<_> = pass.records.iter().map(|r| r.get("plane_type")).collect();
        assert_eq!(planes, vec![Some("axial"), Some("coronal"), Some(UNKNOWN)]);
        assert_eq!(pass.stats.rows(), 3);
        let collections: Vec<&str> = pass.stats.collections().map(|(c, _)| c).collect();
        assert_eq!(collections, vec![DEFAULT_COLLECTION, "kidney", "liver"]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let ontology = v21();
        let classifier = Classifier::new(&ontology, ClassifyOptions::llm().without_metadata());
        let rows: Vec<Metadata> = (0..64)
            .map(|i| make_row(&[("plane_type", if i % 2 == 0 { "axial" } else { "coronal" })]))
            .collect();

        let sequential = classifier.classify_rows(rows.clone(), &NoMetadata);
        let parallel = classifier.classify_rows_parallel(&rows, &NoMetadata);
        assert_eq!(sequential.records, parallel.records);
        assert_eq!(sequential.stats, parallel.stats);
    }

    #[test]
    fn test_series_header() {
        let header = series_header(&v21());
        assert_eq!(&header[..2], &["ID-Series", "Patient_ID"]);
        assert_eq!(
            &header[2..12],
            &[
                "weight_is_dwi",
                "weight_is_adc",
                "weight_t",
                "is_fs",
                "contrast_time",
                "is_contrast_agent",
                "aquisition_echo",
                "plane_type",
                "phase_type",
                "Modality",
            ]
        );
        assert_eq!(&header[12..15], &["Patient_Age", "Patient_Weight", "Patient_Sex"]);
        let unique: std::collections::HashSet<_> = header.iter().collect();
        assert_eq!(unique.len(), header.len());
        assert!(header.iter().any(|h| h == "Series-Description"));
    }

    #[test]
    fn test_series_header_is_version_independent() {
        let v20 = Ontology::builtin(OntologyVersion::V20).unwrap();
        assert_eq!(series_header(&v20), series_header(&v21()));
    }
}
