//! Plain-text rendering of analysis runs.

use std::fmt;

use feature_sim::AnalysisReport;

use crate::frontend::{Run, SourceKind};

const RULE_WIDTH: usize = 80;
const NAME_WIDTH: usize = 24;

/// Displays a whole run as a sectioned text report.
pub struct RunView<'a>(pub &'a Run);

impl fmt::Display for RunView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.0;
        let report = &run.report;

        write_feature_summary(f, report)?;
        if run.kind != SourceKind::Images {
            write_item_stats(f, run)?;
        }
        write_matrix(f, report)?;
        write_nearest(f, report)?;
        write_groups(f, report)?;
        write_extreme_pair(f, report)?;
        write_summary(f, run)
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))
}

/// Shorten to `width` characters so table columns stay aligned.
fn fit(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(width - 1).collect();
        short.push('~');
        short
    }
}

/// `id (label)` when the label adds something.
fn describe(report: &AnalysisReport, id: &str) -> String {
    let label = report
        .items
        .iter()
        .find(|item| item.id == id)
        .and_then(|item| item.label.as_deref());
    match label {
        Some(label) if label != id => format!("{id} ({label})"),
        _ => id.to_string(),
    }
}

fn write_feature_summary(f: &mut fmt::Formatter<'_>, report: &AnalysisReport) -> fmt::Result {
    let stats = &report.feature_stats;
    heading(f, "Feature summary")?;
    writeln!(f, "  Feature matrix shape: ({}, {})", stats.rows, stats.dimension)?;
    writeln!(f, "  Mean:    {:.4}", stats.mean)?;
    writeln!(f, "  Std:     {:.4}", stats.std)?;
    writeln!(f, "  Min:     {:.4}", stats.min)?;
    writeln!(f, "  Max:     {:.4}", stats.max)
}

fn write_item_stats(f: &mut fmt::Formatter<'_>, run: &Run) -> fmt::Result {
    heading(f, "Per-item features")?;
    for (i, item) in run.report.items.iter().enumerate() {
        writeln!(f, "  [{}/{}] {}", i + 1, run.report.num_items, item.id)?;
        if let Some((w, h)) = run.image_sizes.get(&item.id) {
            writeln!(f, "    Image size:  {w} x {h}")?;
        }
        writeln!(f, "    Dimension:   {}", run.report.dimension)?;
        writeln!(f, "    Mean:        {:.4}", item.stats.mean)?;
        writeln!(f, "    Std:         {:.4}", item.stats.std)?;
        writeln!(f, "    Norm:        {:.4}", item.stats.norm)?;
        if let Some(label) = &item.label {
            writeln!(f, "    Category:    {label}")?;
        }
    }
    Ok(())
}

fn write_matrix(f: &mut fmt::Formatter<'_>, report: &AnalysisReport) -> fmt::Result {
    let w = NAME_WIDTH;
    heading(f, "Similarity matrix (-1 to 1, higher is more similar)")?;
    write!(f, "{:<w$} |", "item")?;
    for i in 0..report.num_items {
        write!(f, " {:>6}", i + 1)?;
    }
    writeln!(f)?;
    rule(f)?;

    let m = &report.similarity_matrix;
    for (i, id) in report.item_ids.iter().enumerate() {
        write!(f, "{:<w$} |", fit(id, NAME_WIDTH))?;
        for j in 0..m.len() {
            if i == j {
                write!(f, " {:>6}", "---")?;
            } else {
                write!(f, " {:>6.3}", m.get(i, j))?;
            }
        }
        writeln!(f)?;
    }
    rule(f)
}

fn write_nearest(f: &mut fmt::Formatter<'_>, report: &AnalysisReport) -> fmt::Result {
    let w = NAME_WIDTH;
    heading(f, "Most similar match per item")?;
    writeln!(
        f,
        "{:<w$} {:<w$} {:>10}",
        "query", "most similar", "similarity"
    )?;
    rule(f)?;
    for id in &report.item_ids {
        if let Some(best) = report.nearest(id) {
            writeln!(
                f,
                "{:<w$} {:<w$} {:>10.4}",
                fit(id, NAME_WIDTH),
                fit(&best.id, NAME_WIDTH),
                best.score
            )?;
        }
    }
    Ok(())
}

fn write_groups(f: &mut fmt::Formatter<'_>, report: &AnalysisReport) -> fmt::Result {
    heading(
        f,
        &format!("Similar groups (similarity > {})", report.threshold),
    )?;
    if report.clusters.is_empty() {
        writeln!(
            f,
            "  No pair exceeds {}; the items differ substantially.",
            report.threshold
        )?;
        return Ok(());
    }
    for (idx, cluster) in report.clusters.iter().enumerate() {
        writeln!(f, "  Group {}:", idx + 1)?;
        for id in &cluster.members {
            writeln!(f, "    - {}", describe(report, id))?;
        }
    }
    Ok(())
}

fn write_extreme_pair(f: &mut fmt::Formatter<'_>, report: &AnalysisReport) -> fmt::Result {
    let pair = &report.most_dissimilar_pair;
    heading(f, "Most dissimilar pair")?;
    writeln!(f, "  {}", describe(report, &pair.first))?;
    writeln!(f, "  vs")?;
    writeln!(f, "  {}", describe(report, &pair.second))?;
    writeln!(f, "  Similarity: {:.4}", pair.score)
}

fn write_summary(f: &mut fmt::Formatter<'_>, run: &Run) -> fmt::Result {
    let report = &run.report;
    let stats = &report.aggregate_stats;
    heading(f, "Summary")?;
    writeln!(f, "  Source:             {} ({})", run.source, run.kind.as_str())?;
    writeln!(f, "  Items analyzed:     {}", report.num_items)?;
    if !run.failures.is_empty() {
        writeln!(f, "  Items skipped:      {}", run.failures.len())?;
        for failure in &run.failures {
            writeln!(f, "    - {}: {}", failure.id, failure.reason)?;
        }
    }

    let secs = run.extraction_time.as_secs_f64();
    if secs > 0.0 {
        let n = report.num_items as f64;
        writeln!(f, "  Extraction time:    {secs:.2}s")?;
        writeln!(f, "  Per item:           {:.2}ms", secs / n * 1000.0)?;
        writeln!(f, "  Throughput:         {:.2} items/s", n / secs)?;
    }

    writeln!(f, "  Mean similarity:    {:.4}", stats.mean)?;
    writeln!(f, "  Std similarity:     {:.4}", stats.std)?;
    writeln!(f, "  Highest similarity: {:.4}", stats.max)?;
    writeln!(f, "  Lowest similarity:  {:.4}", stats.min)?;
    writeln!(f)?;
    writeln!(f, "  Conclusion: {}", report.cohesion.describe())
}
