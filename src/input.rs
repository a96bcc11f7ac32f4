//! Loaders for the CLI's input files.
//!
//! Row-level problems are logged and skipped; only I/O failures and a
//! draft that is not JSON at all are returned as errors.

use crate::commissions::CommissionBook;
use crate::engine::Edit;
use crate::errors::Result;
use crate::models::{CommissionCategory, CommissionRule, DealDraft};
use crate::numeric::parse_decimal;
use anyhow::Context;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::{BufRead, Read};
use tracing::{error, info};

/// One CSV row as written. Amounts stay text until [`parse_decimal`]
/// sees them, so no digit passes through `f64`.
#[derive(Debug, Deserialize)]
struct CommissionRow {
    id: u32,
    route_type: CommissionCategory,
    #[serde(default)]
    commission_percent: Option<String>,
    #[serde(default)]
    commission_fixed: Option<String>,
    #[serde(default)]
    is_fixed_currency: bool,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default = "active_by_default")]
    is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl From<CommissionRow> for CommissionRule {
    fn from(row: CommissionRow) -> Self {
        CommissionRule {
            id: row.id,
            category: row.route_type,
            commission_percent: row.commission_percent.as_deref().and_then(parse_decimal),
            commission_fixed: row.commission_fixed.as_deref().and_then(parse_decimal),
            is_fixed_currency: row.is_fixed_currency,
            currency: row.currency.filter(|c| !c.is_empty()),
            is_active: row.is_active,
        }
    }
}

/// Read commission rules from CSV with the header
/// `id,route_type,commission_percent,commission_fixed,is_fixed_currency,currency,is_active`.
pub fn read_commissions<R: Read>(reader: R) -> Result<CommissionBook> {
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rules = Vec::new();
    for (idx, row) in rdr.deserialize::<CommissionRow>().enumerate() {
        match row {
            Ok(row) => rules.push(CommissionRule::from(row)),
            Err(e) if e.is_io_error() => return Err(e).context("reading commission rules"),
            Err(e) => error!(row = idx + 1, %e, "commission-deserialize"),
        }
    }
    info!("Loaded {} commission rules", rules.len());
    Ok(CommissionBook::new(rules))
}

/// Read a deal draft from JSON.
pub fn read_draft<R: Read>(reader: R) -> Result<DealDraft> {
    let draft: DealDraft = serde_json::from_reader(reader).context("parsing deal draft")?;
    info!(
        groups = draft.transactions.len(),
        routes = draft.transactions.iter().map(|g| g.routes.len()).sum::<usize>(),
        "Loaded deal draft"
    );
    Ok(draft)
}

/// Read an edit stream: one JSON object per line, blank lines skipped.
pub fn read_edits<R: BufRead>(reader: R) -> Result<Vec<Edit>> {
    let mut edits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("reading edit stream")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Edit>(&line) {
            Ok(edit) => edits.push(edit),
            Err(e) => error!(line = idx + 1, %e, "edit-deserialize"),
        }
    }
    Ok(edits)
}
