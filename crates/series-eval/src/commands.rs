//! Subcommand implementations.

use std::path::{Path, PathBuf};

use series_classifier::aggregate::{self, patient_header};
use series_classifier::classify::DEFAULT_METADATA_KEY;
use series_classifier::metrics;
use series_classifier::reader::RowReader;
use series_classifier::registry::{find_model, ModelRun};
use series_classifier::render::{write_heatmap, HeatmapStyle};
use series_classifier::writer::{write_lines, write_patients, write_series};
use series_classifier::{
    series_header, ClassificationPass, ClassificationStats, Classifier, ClassifyOptions, ClassifyResult, EvalOptions,
    EvaluationAccumulator, EvaluationReport, MetaColumns, MetadataSource, MetadataTable, Ontology, RandomBaseline,
    RowMetadata, RunConfig,
};
use series_types::{Metadata, ParserType};
use tracing::{info, warn};

use crate::cli::Cli;

/// Gold-side columns shown in error listings.
pub const ERROR_META_COLUMNS: [&str; 2] = ["Study Description", "Series Description"];

/// Everything a subcommand needs: locations, the model run, its ontology and
/// the metadata source.
pub struct Context {
    /// Input and output locations.
    pub config: RunConfig,
    /// Selected model run.
    pub run: &'static ModelRun,
    /// Ontology applied to every pass.
    pub ontology: Ontology,
    traced: Vec<String>,
    metadata: Box<dyn MetadataSource + Sync>,
}

impl Context {
    /// Builds the context from parsed arguments.
    ///
    /// # Errors
    /// Returns an error for an unknown model, an unreadable ontology file or
    /// an unreadable metadata table.
    pub fn from_cli(cli: &Cli) -> ClassifyResult<Self> {
        let config = RunConfig::resolve(cli.data_dir.clone(), cli.collection.clone(), cli.metadata.clone());
        let run = find_model(&cli.model)?;

        let ontology = match &cli.ontology_file {
            Some(path) => Ontology::from_json_file(path)?,
            None => Ontology::builtin(run.ontology)?,
        };

        let metadata: Box<dyn MetadataSource + Sync> = match config.existing_metadata() {
            Some(path) => {
                let table = MetadataTable::from_path(path, DEFAULT_METADATA_KEY)?;
                info!("Loaded metadata for {} series from {}", table.len(), path.display());
                Box::new(table)
            }
            None => {
                if let Some(path) = &config.metadata {
                    warn!("Metadata table {} not found, reading metadata from rows", path.display());
                }
                Box::new(RowMetadata)
            }
        };

        Ok(Self {
            config,
            run,
            ontology,
            traced: cli.traced.clone(),
            metadata,
        })
    }

    fn read_rows(&self, path: &Path) -> ClassifyResult<Vec<Metadata>> {
        info!("Reading {}", path.display());
        RowReader::from_path(path)?.read_all()
    }

    fn input_path(&self, parser: ParserType) -> PathBuf {
        match parser {
            ParserType::Llm => self.config.predictions_path(self.run),
            ParserType::Manual | ParserType::Metadata => self.config.collection.clone(),
        }
    }

    fn pass(&self, options: ClassifyOptions) -> ClassifyResult<ClassificationPass> {
        let rows = self.read_rows(&self.input_path(options.parser))?;
        let options = ClassifyOptions {
            traced_concepts: self.traced.clone(),
            ..options
        };
        let classifier = Classifier::new(&self.ontology, options);

        #[cfg(feature = "parallel")]
        let pass = classifier.classify_rows_parallel(&rows, &*self.metadata);
        #[cfg(not(feature = "parallel"))]
        let pass = classifier.classify_rows(rows, &*self.metadata);

        Ok(pass)
    }

    /// Gold pass: manual rules over the collection.
    fn gold(&self, options: ClassifyOptions) -> ClassifyResult<ClassificationPass> {
        self.pass(ClassifyOptions {
            parser: ParserType::Manual,
            ..options
        })
    }

    /// Model pass: language-model responses without copied metadata.
    fn predictions(&self, options: ClassifyOptions) -> ClassifyResult<ClassificationPass> {
        self.pass(ClassifyOptions {
            parser: ParserType::Llm,
            register_metadata: false,
            ..options
        })
    }
}

/// Classifies the input with one rule set and writes the series table.
pub fn classify(ctx: &Context, parser: ParserType) -> ClassifyResult<()> {
    let pass = ctx.pass(ClassifyOptions::for_parser(parser))?;
    let name = ctx.ontology.name();
    let path = match parser {
        ParserType::Llm => ctx.config.llm_series_path(name, ctx.run.name),
        ParserType::Manual => ctx.config.manual_series_path(name),
        ParserType::Metadata => ctx.config.metadata_series_path(name),
    };

    let written = write_series(&path, &series_header(&ctx.ontology), &pass.records)?;
    info!("Wrote {} series to {}", written, path.display());

    for line in stats_summary(&pass.stats) {
        println!("{}", line);
    }
    Ok(())
}

/// Classifies the model responses and writes the patient table.
pub fn patients(ctx: &Context) -> ClassifyResult<()> {
    let pass = ctx.pass(ClassifyOptions::llm())?;
    let patients = aggregate::patients(pass.records, &ctx.ontology);

    let path = ctx.config.patient_path(ctx.ontology.name(), ctx.run.name);
    let written = write_patients(&path, &patient_header(&ctx.ontology), &patients)?;
    info!("Wrote {} patients to {}", written, path.display());
    Ok(())
}

/// Scores the model against the gold annotation.
pub fn evaluate(ctx: &Context, options: &EvalOptions) -> ClassifyResult<EvaluationReport> {
    let gold = ctx.gold(ClassifyOptions::manual())?;
    let predicted = ctx.predictions(ClassifyOptions::llm())?;

    let mut acc = EvaluationAccumulator::new();
    acc.observe_streams(&ctx.ontology, gold.records, predicted.records)?;

    let report = acc.evaluate(&ctx.ontology);
    print_report(ctx, &report, options);

    if options.heatmaps {
        write_heatmaps(ctx, &acc)?;
    }
    Ok(report)
}

/// Scores seeded random predictions against the gold annotation.
pub fn baseline(ctx: &Context, seed: u64) -> ClassifyResult<EvaluationReport> {
    let gold = ctx.gold(ClassifyOptions::manual())?;
    let acc = RandomBaseline::new(seed).evaluate(&ctx.ontology, &gold.records);

    let report = acc.evaluate(&ctx.ontology);
    print_report(ctx, &report, &EvalOptions::default());
    Ok(report)
}

/// Writes one listing of mismatched series per concept.
pub fn errors(ctx: &Context) -> ClassifyResult<usize> {
    let gold = ctx.gold(ClassifyOptions::manual().with_prefixed_passthrough(ERROR_META_COLUMNS, "_"))?;
    let predicted =
        ctx.predictions(ClassifyOptions::llm().with_prefixed_passthrough(ctx.ontology.full_header(), "_"))?;

    let mut acc = EvaluationAccumulator::with_meta(MetaColumns::passthrough(&ERROR_META_COLUMNS));
    acc.observe_streams(&ctx.ontology, gold.records, predicted.records)?;

    let mut files = 0;
    for key in ctx.ontology.concept_keys() {
        let lines = acc.error_listing(&ctx.ontology, key);
        if lines.is_empty() {
            continue;
        }
        let path = ctx.config.analysis_path(ctx.ontology.name(), ctx.run.name, key);
        write_lines(&path, &lines)?;
        info!("Wrote {} mismatches of {} to {}", lines.len() / 2, key, path.display());
        files += 1;
    }
    Ok(files)
}

/// Serializes a built-in ontology as JSON.
pub fn ontology_json(version: &str) -> ClassifyResult<String> {
    Ontology::by_name(version)?.to_json()
}

fn print_report(ctx: &Context, report: &EvaluationReport, options: &EvalOptions) {
    println!("{} on {}", ctx.run.name, ctx.ontology.name());
    println!("{}", report);
    for line in report.spreadsheet_lines(options.show_amount, options.show_amount_share) {
        println!("{}", line);
    }
}

fn write_heatmaps(ctx: &Context, acc: &EvaluationAccumulator) -> ClassifyResult<()> {
    for key in ctx.ontology.concept_keys() {
        let (Some(matrix), Some(labels)) = (acc.confusion(&ctx.ontology, key), ctx.ontology.labels_for(key, false))
        else {
            continue;
        };
        if matrix.skipped() > 0 {
            warn!(concept = key, skipped = matrix.skipped(), "pairs outside the label set");
        }

        let visible = metrics::actual_labels(&labels, acc.gold(key), acc.predicted(key));
        let view = matrix.restrict(&visible, true);
        let path = ctx.config.heatmap_path(ctx.ontology.name(), ctx.run.name, key);
        write_heatmap(&path, &view, &HeatmapStyle::for_concept(key))?;
        info!("Wrote heatmap of {} to {}", key, path.display());
    }
    Ok(())
}

/// Per-collection recognition counts followed by the concepts with the most
/// unknown labels.
pub fn stats_summary(stats: &ClassificationStats) -> Vec<String> {
    let mut lines = Vec::new();
    for (collection, counters) in stats.collections() {
        lines.push(format!("{}:", collection));
        for concept in counters.concepts() {
            let rate = counters.known_rate(concept).unwrap_or(0.0);
            lines.push(format!(
                "\t{}: {}/{} ({:.2}%)",
                concept,
                counters.known(concept),
                counters.total(concept),
                rate
            ));
        }
    }

    lines.push(format!("Unknown labels over {} rows:", stats.rows()));
    for (concept, unknown, total) in stats.error_summary() {
        lines.push(format!("\t{}: {}/{}", concept, unknown, total));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use clap::Parser;
    use series_classifier::reader::read_records;
    use tempfile::TempDir;

    const PREDICTIONS: &str = "collection-gpt-4-turbo-2024-04-09_medical-v2.1.csv";

    fn make_data_dir() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let collection = dir.path().join("collection.csv");
        fs::write(
            &collection,
            "ID-Series,Patient_ID,Modality,Series-Description,Collection,Study Description,Series Description\n\
             s1,p1,MR,AX T1 POST,c1,ABD,AX T1 POST\n\
             s2,p1,MR,COR T2,c1,ABD,COR T2\n\
             s3,p2,MR,SAG T2 FS,c2,PELVIS,SAG T2 FS\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(PREDICTIONS),
            "ID-Series,Patient_ID,Modality,weight_t,plane_type,is_fs\n\
             s1,p1,MR,This is T1 weighted,axial,no\n\
             s2,p1,MR,t2,coronal,no\n\
             s3,p2,MR,t2,the plane is sagittal,yes\n",
        )
        .unwrap();
        (dir, collection)
    }

    fn make_context(dir: &Path, collection: &Path, extra: &[&str]) -> Context {
        let mut args = vec![
            "series-eval".to_string(),
            "--data-dir".to_string(),
            dir.display().to_string(),
            "--collection".to_string(),
            collection.display().to_string(),
        ];
        args.extend(extra.iter().map(|a| a.to_string()));
        args.push("evaluate".to_string());
        Context::from_cli(&Cli::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn test_context_uses_model_ontology() {
        let (dir, collection) = make_data_dir();
        let ctx = make_context(dir.path(), &collection, &[]);
        assert_eq!(ctx.ontology.name(), "ontology-v21");
        assert_eq!(ctx.run.name, "chat-gpt-4-v21");
    }

    #[test]
    fn test_unknown_model_fails() {
        let cli = Cli::try_parse_from(["series-eval", "--model", "gpt-9", "patients"]).unwrap();
        assert!(Context::from_cli(&cli).is_err());
    }

    #[test]
    fn test_classify_manual_writes_series_table() {
        let (dir, collection) = make_data_dir();
        let ctx = make_context(dir.path(), &collection, &[]);

        classify(&ctx, ParserType::Manual).unwrap();

        let records = read_records(ctx.config.manual_series_path("ontology-v21")).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("ID-Series"), Some("s1"));
        assert!(records.iter().all(|r| r.get("plane_type").is_some()));
    }

    #[test]
    fn test_patients_one_row_per_patient() {
        let (dir, collection) = make_data_dir();
        let ctx = make_context(dir.path(), &collection, &[]);

        patients(&ctx).unwrap();

        let text = fs::read_to_string(ctx.config.patient_path("ontology-v21", "chat-gpt-4-v21")).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().starts_with("Patient_ID"));
    }

    #[test]
    fn test_evaluate_scores_and_heatmaps() {
        let (dir, collection) = make_data_dir();
        let ctx = make_context(dir.path(), &collection, &[]);

        let report = evaluate(&ctx, &EvalOptions::model_comparison()).unwrap();

        assert_eq!(report.entries_total, 3);
        assert!(report.score("plane_type").is_some());
        assert!(ctx
            .config
            .heatmap_path("ontology-v21", "chat-gpt-4-v21", "plane_type")
            .exists());
    }

    #[test]
    fn test_evaluate_rejects_misaligned_tables() {
        let (dir, collection) = make_data_dir();
        fs::write(
            dir.path().join(PREDICTIONS),
            "ID-Series,Patient_ID,plane_type\ns1,p1,axial\n",
        )
        .unwrap();
        let ctx = make_context(dir.path(), &collection, &[]);

        let result = evaluate(&ctx, &EvalOptions::default());
        assert!(matches!(
            result,
            Err(series_classifier::ClassifyError::MisalignedStreams { gold: 3, predicted: 1 })
        ));
    }

    #[test]
    fn test_baseline_is_seeded() {
        let (dir, collection) = make_data_dir();
        let ctx = make_context(dir.path(), &collection, &[]);

        let first = baseline(&ctx, 7).unwrap();
        let second = baseline(&ctx, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_errors_writes_one_file_per_mismatched_concept() {
        let (dir, collection) = make_data_dir();
        let ctx = make_context(dir.path(), &collection, &[]);

        let files = errors(&ctx).unwrap();

        let written = ctx
            .ontology
            .concept_keys()
            .filter(|key| ctx.config.analysis_path("ontology-v21", "chat-gpt-4-v21", key).exists())
            .count();
        assert_eq!(files, written);
    }

    #[test]
    fn test_ontology_json_parses_back() {
        let json = ontology_json("v20").unwrap();
        let ontology = Ontology::from_json_str(&json).unwrap();
        assert_eq!(ontology.name(), "ontology-v20");
        assert!(ontology_json("v99").is_err());
    }

    #[test]
    fn test_stats_summary_lists_collections() {
        let mut stats = ClassificationStats::new();
        stats.observe("c1", "plane_type", "axial");
        stats.observe("c1", "plane_type", "?");
        stats.count_row();

        let lines = stats_summary(&stats);
        assert_eq!(lines[0], "c1:");
        assert_eq!(lines[1], "\tplane_type: 1/2 (50.00%)");
        assert_eq!(lines.last().unwrap(), "\tplane_type: 1/2");
    }
}
