//! Machine-readable JSON rendering, mirroring the teacher's `JsonReporter`:
//! a single-result serialization, a many-results wrapper, and an optional
//! summary. `SandwichResult` already derives `Serialize` with
//! `camelCase` renaming, so this module is mostly envelope and pretty-print
//! plumbing rather than field-by-field translation.

use crate::gate::GateVerdict;
use crate::SandwichResult;
use serde::Serialize;

pub struct JsonReporter {
    pretty: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: &'a [SandwichResult],
    summary: JsonSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    files_analyzed: usize,
    average_bread: f64,
    average_cheese: f64,
    average_ham: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GateOutput<'a> {
    result: &'a SandwichResult,
    gate: &'a GateVerdict,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn to_string<T: Serialize>(&self, value: &T) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
        }
    }

    pub fn report(&self, result: &SandwichResult) -> String {
        self.to_string(result)
    }

    pub fn report_with_gate(&self, result: &SandwichResult, gate: &GateVerdict) -> String {
        self.to_string(&GateOutput { result, gate })
    }

    pub fn report_many(&self, results: &[SandwichResult]) -> String {
        self.to_string(results)
    }

    pub fn report_with_summary(&self, results: &[SandwichResult]) -> String {
        let summary = summarize(results);
        self.to_string(&JsonOutput { results, summary })
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(results: &[SandwichResult]) -> JsonSummary {
    let n = results.len().max(1) as f64;
    JsonSummary {
        files_analyzed: results.len(),
        average_bread: results.iter().map(|r| r.raw.bread).sum::<f64>() / n,
        average_cheese: results.iter().map(|r| r.raw.cheese).sum::<f64>() / n,
        average_ham: results.iter().map(|r| r.raw.ham).sum::<f64>() / n,
    }
}
