use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{AnalysisReport, ReportOrigin};

pub const REPORT_JSON_FILE: &str = "analisis_reforma_imagenes.json";
pub const FALLBACK_JSON_FILE: &str = "analisis_reforma_manual.json";
pub const ROOMS_CSV_FILE: &str = "analisis_reforma_habitaciones_imagenes.csv";
pub const COSTS_CSV_FILE: &str = "estimacion_costes_reforma_imagenes.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub rooms_csv: Option<PathBuf>,
    pub costs_csv: Option<PathBuf>,
}

impl ExportPaths {
    pub fn all(&self) -> Vec<&Path> {
        let mut paths = vec![self.json.as_path()];
        paths.extend(self.rooms_csv.as_deref());
        paths.extend(self.costs_csv.as_deref());
        paths
    }
}

/// Writes the report into `dir`.
///
/// Image-based reports get the JSON document plus both tables; area-only reports get
/// only the JSON document, under a separate name.
pub fn export_report(dir: &Path, report: &AnalysisReport) -> anyhow::Result<ExportPaths> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    if report.origin() == ReportOrigin::AreaHeuristic {
        let json = dir.join(FALLBACK_JSON_FILE);
        write_report_json(&json, report)?;
        return Ok(ExportPaths {
            json,
            rooms_csv: None,
            costs_csv: None,
        });
    }

    let json = dir.join(REPORT_JSON_FILE);
    let rooms_csv = dir.join(ROOMS_CSV_FILE);
    let costs_csv = dir.join(COSTS_CSV_FILE);
    write_report_json(&json, report)?;
    write_rooms_csv(&rooms_csv, report)?;
    write_costs_csv(&costs_csv, report)?;
    Ok(ExportPaths {
        json,
        rooms_csv: Some(rooms_csv),
        costs_csv: Some(costs_csv),
    })
}

pub fn write_report_json(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let body = report.to_json_pretty()?;
    write_text(path, &body)
}

/// One row per surfaced room: verdict, justification and items.
pub fn rooms_table(report: &AnalysisReport) -> Vec<[String; 4]> {
    report
        .rooms()
        .iter()
        .map(|(category, verdict)| {
            [
                category.display_name(),
                verdict.needs_renovation.as_str().to_string(),
                verdict.justification.clone(),
                verdict.items_to_renovate.clone(),
            ]
        })
        .collect()
}

/// Total row first, then one row per surfaced room.
pub fn costs_table(report: &AnalysisReport) -> Vec<[String; 2]> {
    let mut rows = vec![["Total".to_string(), report.total().to_string()]];
    rows.extend(
        report
            .rooms()
            .iter()
            .map(|(category, verdict)| [category.display_name(), verdict.estimated_cost.clone()]),
    );
    rows
}

pub fn write_rooms_csv(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let header = [
        "Habitación",
        "Necesita reforma",
        "Justificación",
        "Elementos a reformar",
    ];
    let mut out = csv_line(&header);
    for row in rooms_table(report) {
        out.push_str(&csv_line(&row));
    }
    write_text(path, &out)
}

pub fn write_costs_csv(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let mut out = csv_line(&["Concepto", "Estimación"]);
    for row in costs_table(report) {
        out.push_str(&csv_line(&row));
    }
    write_text(path, &out)
}

fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|field| escape_csv(field.as_ref()))
        .collect::<Vec<String>>()
        .join(",");
    line.push('\n');
    line
}

fn escape_csv(value: &str) -> String {
    if !value.contains([',', '"', '\n', '\r']) {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn write_text(path: &Path, body: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}
