//! Markdown Report - Summary → Markdown 문서

use lens_core::{ExplainedFile, Mention, Summary};
use lens_foundation::{ExplanationResult, FlaggedFile, LineStats};
use std::fmt::Write;

/// Render the full report
pub fn render(summary: &Summary) -> String {
    let mut out = String::new();
    // String에 대한 write!는 실패하지 않음
    let _ = write_report(&mut out, summary);
    out
}

fn write_report(out: &mut String, s: &Summary) -> std::fmt::Result {
    let meta = &s.metadata;
    let title = meta.repository.as_deref().unwrap_or("Repository");

    writeln!(out, "# {} Analysis", title)?;
    writeln!(out)?;
    writeln!(
        out,
        "Run `{}` · {} · {} discovered, {} analyzed, {} explained ({} requests)",
        meta.run_id,
        meta.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        meta.discovered_files,
        meta.analyzed_files,
        meta.explained_files,
        meta.explanation_requests
    )?;
    writeln!(out)?;

    // ========================================================================
    // Overview
    // ========================================================================
    writeln!(out, "## Overview")?;
    writeln!(out)?;
    writeln!(out, "- **Project type**: {}", s.profile.project_type)?;
    writeln!(
        out,
        "- **Files**: {} ({} bytes, max depth {})",
        s.structure.total_files, s.structure.total_bytes, s.structure.max_depth
    )?;
    writeln!(
        out,
        "- **Lines**: {} total, {} code, {} comment, {} blank",
        s.metrics.totals.total_lines,
        s.metrics.totals.code_lines,
        s.metrics.totals.comment_lines,
        s.metrics.totals.blank_lines
    )?;
    let tech = &s.profile.technologies;
    for (label, items) in [
        ("Frontend", &tech.frontend),
        ("Backend", &tech.backend),
        ("Database", &tech.database),
        ("Cloud", &tech.cloud),
        ("Mobile", &tech.mobile),
    ] {
        if !items.is_empty() {
            let joined: Vec<&str> = items.iter().map(String::as_str).collect();
            writeln!(out, "- **{}**: {}", label, joined.join(", "))?;
        }
    }
    writeln!(out)?;

    // ========================================================================
    // Languages
    // ========================================================================
    if !s.metrics.languages.is_empty() {
        writeln!(out, "## Languages")?;
        writeln!(out)?;
        writeln!(out, "| Language | Files | Lines | Code | Comment | Blank |")?;
        writeln!(out, "|---|---:|---:|---:|---:|---:|")?;
        let mut langs: Vec<(&String, &LineStats)> = s.metrics.languages.iter().collect();
        langs.sort_by(|a, b| b.1.total_lines.cmp(&a.1.total_lines).then_with(|| a.0.cmp(b.0)));
        for (name, st) in langs {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                name, st.files, st.total_lines, st.code_lines, st.comment_lines, st.blank_lines
            )?;
        }
        writeln!(out)?;
    }

    write_flagged(out, "Largest files", "lines", &s.metrics.largest_files)?;
    write_flagged(out, "Large files", "lines", &s.metrics.large_files)?;
    write_flagged(out, "Deeply nested files", "depth", &s.metrics.deeply_nested_files)?;

    // ========================================================================
    // Patterns / Dependencies
    // ========================================================================
    if !s.patterns.is_empty() {
        writeln!(out, "## Patterns")?;
        writeln!(out)?;
        for finding in &s.patterns {
            let evidence: Vec<&str> = finding.evidence.iter().take(5).map(String::as_str).collect();
            let more = finding.evidence.len().saturating_sub(evidence.len());
            let suffix = if more > 0 {
                format!(" (+{} more)", more)
            } else {
                String::new()
            };
            writeln!(out, "- **{}**: {}{}", finding.kind, evidence.join(", "), suffix)?;
        }
        writeln!(out)?;
    }

    let deps = &s.dependencies;
    if !deps.package_managers.is_empty() {
        writeln!(out, "## Dependencies")?;
        writeln!(out)?;
        writeln!(out, "{} declared dependencies.", deps.total())?;
        writeln!(out)?;
        for (manager, names) in &deps.dependencies {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            writeln!(out, "- **{}**: {}", manager.as_str(), names.join(", "))?;
        }
        for (label, set) in [
            ("Frameworks", &deps.frameworks),
            ("Testing", &deps.testing_frameworks),
            ("Build tools", &deps.build_tools),
        ] {
            if !set.is_empty() {
                let names: Vec<&str> = set.iter().map(String::as_str).collect();
                writeln!(out, "- **{}**: {}", label, names.join(", "))?;
            }
        }
        writeln!(out)?;
    }

    // ========================================================================
    // Explanations
    // ========================================================================
    if !s.explanations.is_empty() {
        let c = &s.coverage;
        writeln!(out, "## File Explanations")?;
        writeln!(out)?;
        writeln!(
            out,
            "{} selected: {} succeeded, {} degraded, {} failed.",
            c.selected, c.succeeded, c.degraded, c.failed
        )?;
        writeln!(out)?;
        for explained in &s.explanations {
            write_explained(out, explained)?;
        }
    }

    let insights = &s.insights;
    if !insights.is_empty() {
        writeln!(out, "## Insights")?;
        writeln!(out)?;
        if !insights.complexity_distribution.is_empty() {
            let parts: Vec<String> = insights
                .complexity_distribution
                .iter()
                .map(|(k, v)| format!("{} {}", k, v))
                .collect();
            writeln!(out, "- **Complexity**: {}", parts.join(", "))?;
        }
        write_mentions(out, "Common patterns", &insights.common_patterns)?;
        write_mentions(out, "Common dependencies", &insights.common_dependencies)?;
        if !insights.improvement_themes.is_empty() {
            let parts: Vec<String> = insights
                .improvement_themes
                .iter()
                .map(|(k, v)| format!("{} ({})", k, v))
                .collect();
            writeln!(out, "- **Improvement themes**: {}", parts.join(", "))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_flagged(
    out: &mut String,
    title: &str,
    unit: &str,
    files: &[FlaggedFile],
) -> std::fmt::Result {
    if files.is_empty() {
        return Ok(());
    }
    writeln!(out, "## {}", title)?;
    writeln!(out)?;
    for f in files {
        writeln!(out, "- `{}` ({} {})", f.path, f.value, unit)?;
    }
    writeln!(out)
}

fn write_mentions(out: &mut String, label: &str, mentions: &[Mention]) -> std::fmt::Result {
    if mentions.is_empty() {
        return Ok(());
    }
    let parts: Vec<String> = mentions
        .iter()
        .map(|m| format!("{} ({})", m.name, m.count))
        .collect();
    writeln!(out, "- **{}**: {}", label, parts.join(", "))
}

fn write_explained(out: &mut String, explained: &ExplainedFile) -> std::fmt::Result {
    let file = &explained.file;
    writeln!(out, "### {}. `{}`", file.rank, file.path())?;
    writeln!(out)?;
    if let Some(t) = explained.record.truncation {
        writeln!(
            out,
            "_Explained from the first {} of {} characters._",
            t.submitted_chars, t.original_chars
        )?;
        writeln!(out)?;
    }

    match &explained.record.result {
        ExplanationResult::Success(e) => {
            writeln!(out, "{}", e.summary)?;
            writeln!(out)?;
            writeln!(out, "- **Functionality**: {}", e.functionality)?;
            writeln!(out, "- **Complexity**: {}", e.complexity)?;
            for (label, items) in [
                ("Key components", &e.key_components),
                ("Dependencies", &e.dependencies),
                ("Patterns", &e.design_patterns),
                ("Suggestions", &e.suggestions),
            ] {
                if !items.is_empty() {
                    writeln!(out, "- **{}**: {}", label, items.join("; "))?;
                }
            }
        }
        ExplanationResult::Degraded { reason, partial } => {
            writeln!(out, "_Partial explanation ({})._", reason)?;
            writeln!(out)?;
            if let Some(summary) = &partial.summary {
                writeln!(out, "{}", summary)?;
            }
        }
        ExplanationResult::Failed { kind, attempts } => {
            writeln!(out, "_Not explained: {} after {} attempt(s)._", kind, attempts)?;
        }
    }
    writeln!(out)
}
