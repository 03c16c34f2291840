//! flowsheet CLI
//!
//! Reads a raw record bundle from a JSON file, serves it through an
//! in-process `ClinicalSource`, and prints the render-ready series bundle
//! for one requested axis. A debugging shell for the pipeline, not a UI.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use flowsheet_ingest::raw::RawBundle;
use flowsheet_ingest::{
    parse_diagnostic_report, parse_medication_administration, parse_medication_order,
    parse_observations,
};
use flowsheet_models::{
    ChartStyle, CodedConcept, DiagnosticReport, MedicationAdministration, MedicationOrder,
    Observation, LAB_SYSTEM, MEDICATION_SYSTEM, MICROBIO_SYSTEM,
};
use flowsheet_series::{resolve_axis_data, AxisRequest, DateRange};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod source;

use source::BundleSource;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Style {
    Line,
    Step,
}

impl From<Style> for ChartStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Line => ChartStyle::Line,
            Style::Step => ChartStyle::Step,
        }
    }
}

#[derive(Parser)]
#[command(name = "flowsheet", about = "Build chartable series from a clinical record bundle")]
struct Cli {
    /// Path to a raw record bundle (JSON).
    bundle: PathBuf,

    /// Axis display label.
    #[arg(long, default_value = "Axis")]
    label: String,

    /// Codes forming the axis group, as system:code
    /// (e.g. lab:718-7, med:11124, micro:409822003). Repeatable.
    #[arg(long = "code", required = true)]
    codes: Vec<String>,

    /// Requested chart style.
    #[arg(long, value_enum, default_value_t = Style::Line)]
    style: Style,

    /// Start of the date window (RFC 3339). Defaults to the open past.
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// End of the date window (RFC 3339). Defaults to the open future.
    #[arg(long)]
    end: Option<DateTime<Utc>>,
}

fn parse_concept(spec: &str) -> Result<CodedConcept> {
    let Some((prefix, code)) = spec.split_once(':') else {
        bail!("code '{spec}' must be written as system:code");
    };
    let system = match prefix {
        "lab" => LAB_SYSTEM,
        "med" => MEDICATION_SYSTEM,
        "micro" => MICROBIO_SYSTEM,
        other => bail!("unknown code system prefix '{other}' (expected lab, med, or micro)"),
    };
    Ok(CodedConcept::new(code, code, system))
}

/// Parse the bundle's records, isolating per-record failures.
fn load_bundle(raw: &RawBundle) -> BundleSource {
    let observations: Vec<Observation> = parse_observations(&raw.observations)
        .into_iter()
        .filter_map(|parsed| parsed.ok())
        .collect();

    let orders: Vec<MedicationOrder> = raw
        .medication_orders
        .iter()
        .filter_map(|record| match parse_medication_order(record) {
            Ok(order) => Some(order),
            Err(err) => {
                warn!(%err, "skipping unusable medication order");
                None
            }
        })
        .collect();

    let mut administrations: HashMap<String, Vec<MedicationAdministration>> = HashMap::new();
    for record in &raw.medication_administrations {
        let Some(order_id) = record.request.as_deref() else {
            warn!("skipping administration without an order reference");
            continue;
        };
        match parse_medication_administration(record) {
            Ok(administration) => administrations
                .entry(order_id.to_string())
                .or_default()
                .push(administration),
            Err(err) => warn!(%err, "skipping unusable administration"),
        }
    }

    let reports: Vec<DiagnosticReport> = raw
        .diagnostic_reports
        .iter()
        .filter_map(|record| match parse_diagnostic_report(record) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(%err, "skipping unusable diagnostic report");
                None
            }
        })
        .collect();

    BundleSource::new(observations, orders, administrations, reports)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.bundle)
        .with_context(|| format!("reading bundle {}", cli.bundle.display()))?;
    let raw: RawBundle = serde_json::from_str(&text).context("decoding bundle JSON")?;
    let source = load_bundle(&raw);

    let concepts = cli
        .codes
        .iter()
        .map(|spec| parse_concept(spec))
        .collect::<Result<Vec<_>>>()?;
    let request = AxisRequest {
        concepts,
        label: cli.label,
        style: cli.style.into(),
        range: DateRange::new(
            cli.start.unwrap_or(DateTime::<Utc>::MIN_UTC),
            cli.end.unwrap_or(DateTime::<Utc>::MAX_UTC),
        ),
        encounters: Vec::new(),
    };

    let bundle = resolve_axis_data(&source, &request).await?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
