//! `pdf4mectl operations`: the catalog

use pdf4me_core::{Category, InputKind, Operation, OutputKind};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result as CliResult;
use crate::output;

#[derive(Debug, Serialize)]
struct OperationRow {
    name: &'static str,
    category: String,
    inputs: &'static str,
    output: String,
    endpoint: &'static str,
    summary: &'static str,
}

impl From<Operation> for OperationRow {
    fn from(op: Operation) -> Self {
        let spec = op.spec();
        Self {
            name: spec.name,
            category: spec.category.to_string(),
            inputs: describe_inputs(spec.input),
            output: describe_output(spec.output),
            endpoint: spec.endpoint,
            summary: spec.summary,
        }
    }
}

fn describe_inputs(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Document => "1 file",
        InputKind::Documents => "2+ files",
        InputKind::Overlay => "2 files (base, layer)",
        InputKind::Template => "1 template",
        InputKind::None => "none",
    }
}

fn describe_output(kind: OutputKind) -> String {
    match kind {
        OutputKind::File(ext) => ext.to_string(),
        OutputKind::SameAsInput => "same as input".to_string(),
        OutputKind::Json => "json".to_string(),
        OutputKind::Envelope => "documents".to_string(),
    }
}

pub async fn handle_operations(
    category: Option<Category>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let rows: Vec<OperationRow> = match category {
        Some(category) => Operation::in_category(category).map(OperationRow::from).collect(),
        None => Operation::all().iter().copied().map(OperationRow::from).collect(),
    };

    let fmt =
        output::OutputFormat::structured(output_format).unwrap_or(output::OutputFormat::Table);
    output::print_output(&rows, fmt)?;
    Ok(())
}
