//! Terminal rendering for leads: a grouped vertical card, a one-line-per-lead
//! table, and the pipeline summary.

use std::fmt::{self, Write};

use leadboard_core::{Lead, PipelineFlag, PipelineSummary, TagKind};

const MAX_TAGS: usize = 10;
const CUSTOMER_WIDTH: usize = 28;

// ── Card ──

/// Print a single lead as a vertical card grouped by section.
pub fn print_lead_card(lead: &Lead) -> anyhow::Result<()> {
    print!("{}", render_card(lead)?);
    Ok(())
}

pub fn render_card(lead: &Lead) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "=== {} ===", lead.customer)?;
    writeln!(out, "lead {}  ·  {}% complete", lead.id, lead.progress)?;
    writeln!(out)?;

    section(
        &mut out,
        "Identity",
        &[
            ("contact", Some(lead.contact.clone())),
            ("origin", non_empty(&lead.origin)),
            ("type", lead.lead_type.label().map(str::to_string)),
        ],
    )?;
    section(
        &mut out,
        "Ownership",
        &[
            ("manager", Some(lead.manager.clone())),
            ("strategic_owner", Some(lead.strategic_owner.clone())),
            ("delivery_lead", lead.delivery_lead.clone()),
        ],
    )?;

    let mut pipeline = vec![
        ("score", Some(lead.score.to_string())),
        ("intro_meeting", Some(yes_no(lead.intro_meeting))),
        ("weekly_calls", Some(yes_no(lead.weekly_calls))),
    ];
    pipeline.extend(
        PipelineFlag::ALL
            .iter()
            .map(|f| (f.label(), Some(yes_no(lead.pipeline.get(*f))))),
    );
    section(&mut out, "Pipeline", &pipeline)?;
    if !lead.score_is_current() {
        writeln!(
            out,
            "  (stored score is stale: flags give {})\n",
            lead.computed_score()
        )?;
    }

    section(
        &mut out,
        "Links",
        &[
            ("logo", lead.logo_url.clone()),
            ("linkedin", lead.linkedin_url.clone()),
            ("slides", lead.slides_url.clone()),
        ],
    )?;

    writeln!(out, "Notes")?;
    writeln!(out, "  {}", lead.notes)?;
    writeln!(out)?;

    if !lead.tags.is_empty() {
        let shown: Vec<String> = lead
            .tags
            .iter()
            .take(MAX_TAGS)
            .map(|t| match t.kind {
                TagKind::History => format!("({})", t.text),
                _ => t.text.clone(),
            })
            .collect();
        writeln!(out, "Tags")?;
        writeln!(out, "  {}", shown.join(", "))?;
        if lead.tags.len() > MAX_TAGS {
            writeln!(out, "    ... and {} more", lead.tags.len() - MAX_TAGS)?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "  {:<26} {}",
        "last_modified",
        lead.last_modified.format("%Y-%m-%d %H:%M UTC")
    )?;
    Ok(out)
}

/// Write a section, skipping it entirely when no row has a value.
fn section(out: &mut String, header: &str, rows: &[(&str, Option<String>)]) -> fmt::Result {
    if rows.iter().all(|(_, v)| v.is_none()) {
        return Ok(());
    }
    writeln!(out, "{header}")?;
    for (name, value) in rows {
        if let Some(value) = value {
            writeln!(out, "  {:<26} {}", name, value)?;
        }
    }
    writeln!(out)
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ── Table ──

/// Print the view as one line per lead.
pub fn print_lead_table(leads: &[&Lead]) -> anyhow::Result<()> {
    print!("{}", render_table(leads)?);
    Ok(())
}

pub fn render_table(leads: &[&Lead]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>4}  {:<w$}  {:<16}  {:<16}  {:<8}  {:>5}",
        "id",
        "customer",
        "origin",
        "manager",
        "type",
        "prog",
        w = CUSTOMER_WIDTH
    )?;
    for lead in leads {
        writeln!(
            out,
            "{:>4}  {:<w$}  {:<16}  {:<16}  {:<8}  {:>4}%",
            lead.id.to_string(),
            truncate(&lead.customer, CUSTOMER_WIDTH),
            truncate(&lead.origin, 16),
            truncate(&lead.manager, 16),
            lead.lead_type.label().unwrap_or("-"),
            lead.progress,
            w = CUSTOMER_WIDTH
        )?;
    }
    writeln!(out, "{} lead(s)", leads.len())?;
    Ok(out)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

// ── Summary ──

pub fn print_summary(summary: &PipelineSummary) {
    println!("Pipeline ({} leads)", summary.total);
    println!("  {:<26} {}", "Intro Meeting", summary.intro_meeting);
    println!("  {:<26} {}", "Weekly Calls", summary.weekly_calls);
    for (flag, count) in &summary.milestones {
        println!("  {:<26} {}", flag.label(), count);
    }
    println!("  {:<26} {:.1}%", "Mean progress", summary.mean_progress);
}
