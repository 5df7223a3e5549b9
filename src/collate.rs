use log::{debug, info, warn};

use collation::jobs::{CollationJobs, JobError};
use collation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::collate::config_reader::*;
use crate::collate::summary::{build_cleared_js, build_summary_js, RejectedApproval};

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod summary;

#[derive(Debug, Snafu)]
pub enum CollateError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The election file {path} has no parent directory"))]
    MissingParentDir { path: String },

    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The spreadsheet {path} has no worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Unexpected cell at row {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} has too few columns"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: not an identifier: {content:?}"))]
    InvalidIdCell { lineno: usize, content: String },
    #[snafu(display("Invalid count for {what}"))]
    InvalidCount {
        source: CollationError,
        what: String,
    },
    #[snafu(display("Not a candidate identifier: {key:?}"))]
    InvalidCandidateKey { key: String },
    #[snafu(display(
        "{path}: line {lineno} disagrees with line {first_lineno} on the invalid votes, the scan or the agent"
    ))]
    InconsistentTally {
        path: String,
        lineno: usize,
        first_lineno: usize,
    },
    #[snafu(display("Unknown tally provider {provider}"))]
    UnknownProvider { provider: String },

    #[snafu(display("Unknown zone level {level}"))]
    UnknownLevel { level: String },
    #[snafu(display("Unknown office {office}"))]
    UnknownOffice { office: String },
    #[snafu(display("A zone is required at {level} level"))]
    MissingZone { level: String },
    #[snafu(display("An EC total at {level} level needs exactly one of party or candidate"))]
    AmbiguousEntity { level: String },
    #[snafu(display("Invalid reference data"))]
    Registry { source: CollationError },
    #[snafu(display("Invalid EC total"))]
    EcTotal { source: CollationError },
    #[snafu(display("Tally for station {station}, position {position} refused: {errors}"))]
    Submission {
        station: u32,
        position: u32,
        errors: ValidationErrors,
    },
    #[snafu(display("No result sheet for station {station}, position {position}"))]
    UnknownResultSheet { station: u32, position: u32 },
    #[snafu(display("Collation run failed"))]
    Collation { source: JobError },

    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
}

pub type CollateResult<T> = Result<T, CollateError>;

fn read_tally_source(root: &Path, cfs: &FileSource) -> CollateResult<Vec<TallySubmission>> {
    let p: PathBuf = root.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read tally file {:?}", p2);
    let lines = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_tallies(&p2)?,
        "xlsx" | "excel" => io_excel::read_excel_tallies(&p2, cfs.excel_worksheet_name.as_deref())?,
        x => {
            return UnknownProviderSnafu { provider: x }.fail();
        }
    };
    io_common::group_tallies(&p2, lines)
}

fn tally_sources(args: &Args, config: &ElectionConfig) -> Vec<FileSource> {
    match &args.input {
        Some(input) if !input.is_empty() => vec![FileSource {
            provider: args.input_type.clone().unwrap_or_else(|| "csv".to_string()),
            file_path: input.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }],
        _ => config.tally_sources.clone(),
    }
}

fn record_tallies(
    engine: &mut CollationEngine,
    subs: Vec<TallySubmission>,
) -> CollateResult<usize> {
    let n = subs.len();
    for sub in subs {
        let (station, position) = (sub.station.0, sub.position.0);
        engine
            .submit_tally(sub)
            .map_err(|errors| CollateError::Submission {
                station,
                position,
                errors,
            })?;
    }
    Ok(n)
}

fn record_approvals(
    engine: &mut CollationEngine,
    approvals: &[ConfigApproval],
) -> CollateResult<Vec<RejectedApproval>> {
    let mut rejected: Vec<RejectedApproval> = Vec::new();
    for a in approvals {
        let sheet = engine
            .result_sheet_for(StationId(a.station), PositionId(a.position))
            .map(|s| s.id)
            .context(UnknownResultSheetSnafu {
                station: a.station,
                position: a.position,
            })?;
        let ec = a.ec_summary_total()?;
        if let Err(e) = engine.record_approval(sheet, AgentId(a.agent), ec) {
            warn!(
                "Approval of station {} position {} by agent {} refused: {}",
                a.station, a.position, a.agent, e
            );
            rejected.push(RejectedApproval {
                station: a.station,
                position: a.position,
                agent: a.agent,
                reasons: e.messages,
            });
        }
    }
    Ok(rejected)
}

fn record_ec_totals(engine: &mut CollationEngine, totals: &[ConfigEcTotal]) -> CollateResult<()> {
    for t in totals {
        engine
            .record_ec_total(t.office_type()?, t.entity()?, t.collation_zone()?, t.total()?)
            .context(EcTotalSnafu {})?;
    }
    Ok(())
}

fn read_summary(path: &str) -> CollateResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

fn output_path(args: &Args, config: &ElectionConfig, root: &Path) -> Option<String> {
    match &args.out {
        Some(out) if out == "stdout" => None,
        Some(out) if !out.is_empty() => Some(out.clone()),
        _ => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|d| root.join(d).join("summary.json").display().to_string()),
    }
}

pub fn run_election(args: &Args) -> CollateResult<()> {
    let config_path = args.config.as_str();
    let config_str = fs::read_to_string(config_path).context(OpeningJsonSnafu { path: config_path })?;
    let config: ElectionConfig =
        serde_json::from_str(&config_str).context(ParsingJsonSnafu { path: config_path })?;
    debug!("config: {:?}", config);
    let root_p = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;

    let mut engine = CollationEngine::new(config.registry()?);

    let mut subs: Vec<TallySubmission> = Vec::new();
    for cfs in tally_sources(args, &config) {
        subs.append(&mut read_tally_source(root_p, &cfs)?);
    }
    for s in config.submissions.iter() {
        subs.push(s.submission()?);
    }
    let n = record_tallies(&mut engine, subs)?;
    info!("{} tallies recorded", n);

    let rejected = record_approvals(&mut engine, &config.approvals)?;
    record_ec_totals(&mut engine, &config.ec_totals)?;

    let jobs = CollationJobs::new(engine);
    let report = jobs.run().context(CollationSnafu {})?;
    info!(
        "{} collation records, {} parliamentary summary sheets",
        report.collation_records, report.summary_sheets
    );

    let result_js = if args.clear {
        let cleared = jobs.clear().context(CollationSnafu {})?;
        build_cleared_js(&config.output_settings.election_name, cleared)
    } else {
        let engine = jobs.engine();
        let engine = engine.lock().map_err(|_| CollateError::Collation {
            source: JobError::Poisoned,
        })?;
        build_summary_js(&config.output_settings.election_name, &engine, &rejected)
    };

    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu {})?;
    match output_path(args, &config, root_p) {
        Some(out_path) => {
            info!("Writing summary to {}", out_path);
            if let Some(parent) = Path::new(&out_path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingOutputSnafu { path: &out_path })?;
                }
            }
            fs::write(&out_path, &pretty_js_stats).context(WritingOutputSnafu { path: &out_path })?;
        }
        None => println!("{}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
    }

    Ok(())
}
