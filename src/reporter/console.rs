//! Human-facing console rendering of a [`SandwichResult`]/[`GateVerdict`]
//! pair. Mirrors the teacher's `ConsoleReporter` shape: a header, a score
//! breakdown, violations grouped by axis, and recommendations -- just over
//! the sandwich triple instead of a single weighted score.

use crate::gate::GateVerdict;
use crate::reporter::archetype_label;
use crate::simplex::DominantLabel;
use crate::{Recommendation, SandwichResult};
use colored::Colorize;

pub struct ConsoleReporter {
    use_colors: bool,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { use_colors: true, verbose: false }
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false, verbose: false }
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn report(&self, result: &SandwichResult) {
        self.print_header(result);
        self.print_triple(result);
        self.print_label(result);
        if self.verbose {
            self.print_recommendations(&result.recommendations);
        }
    }

    pub fn report_with_gate(&self, result: &SandwichResult, verdict: &GateVerdict) {
        self.print_header(result);
        self.print_triple(result);
        self.print_label(result);
        self.print_gate(verdict);
        if self.verbose || !verdict.passed {
            self.print_recommendations(&result.recommendations);
        }
    }

    pub fn report_quiet(&self, result: &SandwichResult) {
        println!(
            "{}: {} (b={:.1} c={:.1} h={:.1})",
            result.file_path.display(),
            self.label_text(result.label),
            result.raw.bread,
            result.raw.cheese,
            result.raw.ham
        );
    }

    pub fn report_many(&self, results: &[SandwichResult]) {
        for result in results {
            self.report_quiet(result);
        }
        self.print_aggregate_summary(results);
    }

    fn print_header(&self, result: &SandwichResult) {
        let title = format!("Sandwich analysis: {}", result.file_path.display());
        if self.use_colors {
            println!("\n{}", title.bold());
        } else {
            println!("\n{title}");
        }
        println!("archetype: {}", archetype_label(result.archetype));
    }

    fn print_triple(&self, result: &SandwichResult) {
        println!(
            "  bread  {}  (share {:.2}, canonical {:+.2})",
            self.create_bar(result.raw.bread),
            result.simplex.bread,
            result.deviation.bread
        );
        println!(
            "  cheese {}  (share {:.2}, canonical {:+.2})",
            self.create_bar(result.raw.cheese),
            result.simplex.cheese,
            result.deviation.cheese
        );
        println!(
            "  ham    {}  (share {:.2}, canonical {:+.2})",
            self.create_bar(result.raw.ham),
            result.simplex.ham,
            result.deviation.ham
        );
        println!("  deviation distance: {:.3}", result.deviation.distance);
    }

    fn print_label(&self, result: &SandwichResult) {
        let eq = if result.equilibrium { "at equilibrium" } else { "off equilibrium" };
        println!(
            "label: {} (confidence {:.2}, {})",
            self.colorize_label(result.label),
            result.confidence,
            eq
        );
    }

    fn print_gate(&self, verdict: &GateVerdict) {
        let verb = match (self.use_colors, verdict.passed) {
            (true, true) => "PASSED".green().bold().to_string(),
            (true, false) => "FAILED".red().bold().to_string(),
            (false, true) => "PASSED".to_string(),
            (false, false) => "FAILED".to_string(),
        };
        println!("gate [{:?}]: {}", verdict.stage, verb);
        if !verdict.violations.is_empty() {
            println!("  violations:");
            for v in &verdict.violations {
                println!("    - {v}");
            }
        }
        if verdict.waiver_applied {
            if let Some(ref w) = verdict.waiver_ref {
                println!("  waived under {} ({})", w.adr, w.approver);
            }
        }
        if !verdict.advisories.is_empty() {
            println!("  advisories:");
            for a in &verdict.advisories {
                println!("    - {a}");
            }
        }
    }

    fn print_recommendations(&self, recommendations: &[Recommendation]) {
        if recommendations.is_empty() {
            return;
        }
        println!("recommendations:");
        for rec in recommendations {
            println!(
                "  [{}] {} -- {}",
                rec.priority, rec.action, rec.reason
            );
        }
    }

    fn print_aggregate_summary(&self, results: &[SandwichResult]) {
        let n = results.len() as f64;
        if n == 0.0 {
            return;
        }
        let avg_bread = results.iter().map(|r| r.raw.bread).sum::<f64>() / n;
        let avg_cheese = results.iter().map(|r| r.raw.cheese).sum::<f64>() / n;
        let avg_ham = results.iter().map(|r| r.raw.ham).sum::<f64>() / n;
        println!(
            "\n{} files: avg bread={:.1} cheese={:.1} ham={:.1}",
            results.len(),
            avg_bread,
            avg_cheese,
            avg_ham
        );
    }

    fn label_text(&self, label: DominantLabel) -> &'static str {
        match label {
            DominantLabel::Bread => "bread",
            DominantLabel::Cheese => "cheese",
            DominantLabel::Ham => "ham",
            DominantLabel::Balanced => "balanced",
        }
    }

    fn colorize_label(&self, label: DominantLabel) -> String {
        let text = self.label_text(label);
        if !self.use_colors {
            return text.to_string();
        }
        match label {
            DominantLabel::Bread => text.yellow().to_string(),
            DominantLabel::Cheese => text.cyan().to_string(),
            DominantLabel::Ham => text.magenta().to_string(),
            DominantLabel::Balanced => text.green().to_string(),
        }
    }

    /// A ten-tick bar (each tick = 2 raw-score points, capped).
    fn create_bar(&self, value: f64) -> String {
        let ticks = ((value / 2.0).round() as usize).min(10);
        let filled = "#".repeat(ticks);
        let empty = "-".repeat(10 - ticks);
        format!("[{filled}{empty}] {value:>5.1}")
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
