use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use colored::Colorize;
use govl_sdk::{
    DecisionDraft, EntryPayload, FairnessSnapshot, GateStatus, Governance, GovernanceConfig,
    LedgerEntry, Outcome, VerificationResult,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cli::*;

/// Ledger file used when neither `--ledger` nor the configuration names one.
const DEFAULT_LEDGER: &str = "governance.ledger";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.ledger.clone())?;
    let format = cli.format;
    debug!(
        ledger = ?config.ledger.path,
        sync = ?config.ledger.sync,
        threshold = config.fairness.disparate_impact_threshold,
        "configuration resolved"
    );
    let gov = Governance::from_config(config).context("failed to open the governance ledger")?;

    match cli.command {
        Command::Record(args) => cmd_record(&gov, args, format),
        Command::Log(args) => cmd_log(&gov, args, format),
        Command::Show(args) => cmd_show(&gov, args, format),
        Command::Verify(args) => cmd_verify(&gov, args, format),
        Command::Pause(args) => cmd_pause(&gov, args, format),
        Command::Resume(args) => cmd_resume(&gov, args, format),
        Command::Status => cmd_status(&gov, format),
        Command::Fairness(args) => cmd_fairness(&gov, args, format),
        Command::Summary => cmd_summary(&gov, format),
    }
}

fn resolve_config(
    path: Option<&std::path::Path>,
    ledger: Option<PathBuf>,
) -> anyhow::Result<GovernanceConfig> {
    let mut config = match path {
        Some(path) => GovernanceConfig::load(path)?,
        None => GovernanceConfig::default(),
    };
    if let Some(ledger) = ledger {
        config.ledger.path = Some(ledger);
    }
    config
        .ledger
        .path
        .get_or_insert_with(|| PathBuf::from(DEFAULT_LEDGER));
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---- Recording ----

fn cmd_record(gov: &Governance, args: RecordArgs, format: OutputFormat) -> anyhow::Result<()> {
    let outcome = match args.outcome {
        OutcomeArg::Approve => Outcome::Approve,
        OutcomeArg::Deny => Outcome::Deny,
    };

    let mut draft = DecisionDraft::new(args.model_version, outcome, args.probability);
    if let Some(inputs) = &args.inputs {
        let object: Map<String, Value> =
            serde_json::from_str(inputs).context("--inputs must be a JSON object")?;
        draft.inputs.extend(object);
    }
    for pair in &args.input {
        let (key, value) = parse_input(pair)?;
        draft.inputs.insert(key, value);
    }

    let entry = gov.record_decision(draft)?;
    if format == OutputFormat::Json {
        return print_json(&entry);
    }
    println!(
        "{} Decision recorded at {}",
        "✓".green().bold(),
        format!("#{}", entry.sequence).yellow()
    );
    println!("  Hash: {}", entry.entry_hash.to_hex().dimmed());
    Ok(())
}

fn parse_input(pair: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("expected KEY=VALUE, got {pair:?}");
    };
    if key.is_empty() {
        bail!("input name must not be empty in {pair:?}");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

// ---- Reading ----

fn cmd_log(gov: &Governance, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entries = gov.recent(args.limit)?;
    if format == OutputFormat::Json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("Ledger is empty.");
        return Ok(());
    }
    for entry in &entries {
        if args.oneline {
            println!(
                "{} {} {}",
                format!("#{}", entry.sequence).yellow(),
                entry.entry_hash.short_hex().dimmed(),
                headline(entry)
            );
        } else {
            println!(
                "{}  {}  {}",
                format!("#{}", entry.sequence).yellow().bold(),
                entry.entry_hash.short_hex().dimmed(),
                display_time(entry).dimmed()
            );
            println!("  {}\n", headline(entry));
        }
    }
    Ok(())
}

fn cmd_show(gov: &Governance, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let Some(entry) = gov.entry(args.sequence) else {
        bail!(
            "no entry #{} (ledger length is {})",
            args.sequence,
            gov.length()
        );
    };
    if format == OutputFormat::Json {
        return print_json(&entry);
    }

    println!("Entry {} ({})", format!("#{}", entry.sequence).yellow().bold(), entry.kind);
    println!("  Time:     {} ({})", display_time(&entry), entry.timestamp);
    println!("  Previous: {}", entry.previous_hash.to_hex().dimmed());
    println!("  Hash:     {}", entry.entry_hash.to_hex());
    match &entry.payload {
        EntryPayload::Decision(decision) => {
            println!("  Model:    {}", decision.model_version.cyan());
            println!("  Outcome:  {}", colored_outcome(decision.outcome));
            println!("  Probability: {}", decision.probability);
            for (name, value) in &decision.inputs {
                println!("    {name} = {value}");
            }
        }
        EntryPayload::Gate { reason } => println!("  Reason:   {reason}"),
    }
    Ok(())
}

// ---- Verification ----

fn cmd_verify(gov: &Governance, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let to = args.to.unwrap_or_else(|| gov.length());
    let result = gov.verify(args.from, to)?;
    if format == OutputFormat::Json {
        print_json(&result)?;
    } else {
        print_verification(&result, args.from, to);
    }
    if !result.ok {
        warn!(
            first_bad = ?result.first_bad_sequence,
            checked = result.checked,
            "hash chain verification failed"
        );
        bail!("ledger verification failed");
    }
    Ok(())
}

fn print_verification(result: &VerificationResult, from: u64, to: u64) {
    if result.ok {
        println!(
            "{} Hash chain intact over [{from}, {to}] ({} entries)",
            "✓".green().bold(),
            result.checked
        );
        return;
    }
    println!(
        "{} Hash chain broken at {}",
        "✗".red().bold(),
        result
            .first_bad_sequence
            .map(|s| format!("#{s}"))
            .unwrap_or_default()
            .red()
            .bold()
    );
    if let Some(reason) = &result.reason {
        println!("  Reason: {reason}");
    }
    println!("  Entries verified before the break: {}", result.checked);
}

// ---- Model gate ----

fn cmd_pause(gov: &Governance, args: PauseArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entry = gov.pause(args.reason)?;
    if format == OutputFormat::Json {
        return print_json(&entry);
    }
    println!(
        "{} Live predictions {} (entry {})",
        "⏸".yellow().bold(),
        "paused".yellow().bold(),
        format!("#{}", entry.sequence).yellow()
    );
    Ok(())
}

fn cmd_resume(gov: &Governance, args: ResumeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entry = match args.reason {
        Some(reason) => gov.resume_with_reason(reason)?,
        None => gov.resume()?,
    };
    if format == OutputFormat::Json {
        return print_json(&entry);
    }
    println!(
        "{} Live predictions {} (entry {})",
        "▶".green().bold(),
        "resumed".green().bold(),
        format!("#{}", entry.sequence).yellow()
    );
    Ok(())
}

fn cmd_status(gov: &Governance, format: OutputFormat) -> anyhow::Result<()> {
    let state = gov.gate_state();
    let length = gov.length();
    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "model_active": state.status == GateStatus::Active,
            "gate": state,
            "length": length,
        }));
    }

    let status = match state.status {
        GateStatus::Active => "ACTIVE".green().bold(),
        GateStatus::Paused => "PAUSED".red().bold(),
    };
    println!("Model gate: {status}");
    if let Some(sequence) = state.last_transition_sequence {
        println!("  Last transition: #{sequence}");
    }
    println!("Ledger: {} entries", length.to_string().bold());
    Ok(())
}

// ---- Fairness ----

fn cmd_fairness(gov: &Governance, args: FairnessArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = match args.threshold {
        Some(threshold) => gov.compute_fairness(&args.group_key, threshold)?,
        None => gov.fairness(&args.group_key)?,
    };
    if format == OutputFormat::Json {
        return print_json(&report);
    }
    print_fairness(&report);
    Ok(())
}

fn print_fairness(report: &FairnessSnapshot) {
    println!(
        "Fairness by {} over {} entries",
        report.group_key.cyan().bold(),
        report.snapshot_length
    );
    if report.groups.is_empty() {
        println!("  No decisions carry {:?}.", report.group_key);
    }
    for group in &report.groups {
        println!(
            "  {:<16} {:>6.1}%  ({}/{})",
            group.group,
            group.approval_rate * 100.0,
            group.approvals,
            group.total
        );
    }
    if report.unattributed > 0 {
        println!("  {} decisions without {:?}", report.unattributed, report.group_key);
    }

    match report.disparate_impact_ratio {
        Some(ratio) => println!("Disparate impact ratio: {ratio:.3}"),
        None => println!("Disparate impact ratio: {}", "undefined".dimmed()),
    }
    if let Some(spread) = report.statistical_parity_difference {
        println!("Statistical parity difference: {spread:.3}");
    }

    if report.alert {
        for alert in &report.alerts {
            println!(
                "{} {:?} {:.3} breaches threshold {:.3}",
                "⚠ BIAS ALERT".red().bold(),
                alert.metric,
                alert.value,
                alert.threshold
            );
        }
    } else {
        println!("{} No bias alert", "✓".green().bold());
    }
}

fn cmd_summary(gov: &Governance, format: OutputFormat) -> anyhow::Result<()> {
    let summary = gov.summary()?;
    if format == OutputFormat::Json {
        return print_json(&summary);
    }
    println!("Entries:   {}", summary.entries.to_string().bold());
    println!(
        "Decisions: {} ({} approved, {} denied)",
        summary.decisions,
        summary.approvals.to_string().green(),
        summary.denials.to_string().red()
    );
    if let Some(rate) = summary.approval_rate() {
        println!("Approval rate: {:.1}%", rate * 100.0);
    }
    println!(
        "Gate:      {} pauses, {} resumes",
        summary.gate_pauses, summary.gate_resumes
    );
    for (version, count) in &summary.model_versions {
        println!("  {} {count}", version.cyan());
    }
    Ok(())
}

// ---- Formatting ----

fn headline(entry: &LedgerEntry) -> String {
    match &entry.payload {
        EntryPayload::Decision(d) => format!(
            "{} {} p={:.3} ({})",
            entry.kind,
            colored_outcome(d.outcome),
            d.probability,
            d.model_version
        ),
        EntryPayload::Gate { reason } => format!("{} {reason}", entry.kind.to_string().yellow()),
    }
}

fn colored_outcome(outcome: Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::Approve => outcome.to_string().green(),
        Outcome::Deny => outcome.to_string().red(),
    }
}

fn display_time(entry: &LedgerEntry) -> String {
    i64::try_from(entry.timestamp.unix_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| entry.timestamp.to_string())
}
