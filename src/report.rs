//! Output side of the CLI: per-route CSV report or the recomputed draft
//! as JSON.

use crate::engine::Engine;
use crate::errors::Result;
use crate::models::{DealDraft, DealSummary, Route, TransactionGroup};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 6] = [
    "transaction",
    "route",
    "route_type",
    "exchange_amount",
    "amount_to_partner",
    "final_income",
];

/// One CSV line: a route, or the `total` line closing a group.
#[derive(Debug, Serialize, PartialEq)]
pub struct ReportRow {
    pub transaction: usize,
    pub route: String,
    pub route_type: String,
    pub exchange_amount: String,
    pub amount_to_partner: String,
    pub final_income: String,
}

// Round to 4 dp; undefined stays an empty cell.
fn fmt(value: Option<Decimal>) -> String {
    value
        .map(|d| format!("{:.4}", d.round_dp(4)))
        .unwrap_or_default()
}

impl From<(usize, usize, &Route)> for ReportRow {
    fn from((transaction, idx, route): (usize, usize, &Route)) -> Self {
        Self {
            transaction,
            route: idx.to_string(),
            route_type: route
                .route_type
                .map(|t| t.as_str().to_owned())
                .unwrap_or_default(),
            exchange_amount: fmt(route.exchange_amount),
            amount_to_partner: fmt(route.amount_to_partner),
            final_income: fmt(route.final_income),
        }
    }
}

impl From<(usize, &TransactionGroup)> for ReportRow {
    fn from((transaction, group): (usize, &TransactionGroup)) -> Self {
        Self {
            transaction,
            route: "total".to_owned(),
            route_type: String::new(),
            exchange_amount: String::new(),
            amount_to_partner: String::new(),
            final_income: fmt(group.final_income),
        }
    }
}

/// Flatten the engine state into report rows, groups in order, each
/// followed by its total.
pub fn rows(engine: &Engine) -> Vec<ReportRow> {
    let mut out = Vec::new();
    for (t, group) in engine.groups().iter().enumerate() {
        out.extend(
            group
                .routes
                .iter()
                .enumerate()
                .map(|(r, route)| ReportRow::from((t, r, route))),
        );
        out.push(ReportRow::from((t, group)));
    }
    out
}

/// Write the CSV report. The header line is always present, even for a
/// draft without groups.
pub fn write_csv<W: Write>(sink: W, engine: &Engine) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(sink);
    wtr.write_record(HEADER)?;
    for row in rows(engine) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport {
    #[serde(flatten)]
    draft: DealDraft,
    summary: DealSummary,
}

/// Write the recomputed draft plus its summary as pretty JSON.
pub fn write_json<W: Write>(mut sink: W, engine: &Engine) -> Result<()> {
    let report = JsonReport {
        draft: engine.draft(),
        summary: engine.summary(),
    };
    serde_json::to_writer_pretty(&mut sink, &report)?;
    writeln!(sink)?;
    Ok(())
}
