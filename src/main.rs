// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use rule_curator::{
    load_catalog, load_rule_set, EditingSession, ReconciliationEngine, ReconciliationReport,
    Settings,
};

/// Reconcile generated download rules against the catalog and prune them.
#[derive(Parser, Debug)]
#[command(name = "rule-curator", version)]
struct CliArgs {
    /// Path to JSON config file (default: ./rule-curator.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Season label generated rule keys start with
    #[arg(long, global = true, env = "RULE_CURATOR_SEASON")]
    season: Option<String>,

    /// Catalog file (JSON array of entities)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Generated rule file (never written)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Overlay file commits are written to
    #[arg(long, global = true)]
    overlay: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare catalog entries with generated rules
    Compare {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List rule names from the authoritative rule file
    List,
    /// Print the authoritative rule set as JSON
    Export,
    /// Remove rules by name and commit to the overlay file
    Remove {
        #[arg(required = true)]
        names: Vec<String>,

        /// Print the resulting rule set instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Interactive rule editor (default)
    Edit,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let settings = resolve_settings(&args)?;

    match args.command.unwrap_or(Command::Edit) {
        Command::Compare { json } => run_compare(&settings, json),
        Command::List => run_list(&settings),
        Command::Export => run_export(&settings),
        Command::Remove { names, dry_run } => run_remove(&settings, &names, dry_run),
        Command::Edit => run_edit(&settings),
    }
}

fn resolve_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load configuration")?;

    if let Some(season) = &args.season {
        settings.season = season.clone();
    }
    if let Some(catalog) = &args.catalog {
        settings.catalog_path = catalog.clone();
    }
    if let Some(rules) = &args.rules {
        settings.rules_path = rules.clone();
    }
    if let Some(overlay) = &args.overlay {
        settings.overlay_path = Some(overlay.clone());
    }

    Ok(settings)
}

fn open_session(settings: &Settings) -> Result<EditingSession> {
    let session = EditingSession::load(&settings.rules_path, settings.resolved_overlay_path())
        .context("failed to open rule set")?;

    info!(
        path = %session.authoritative_path().display(),
        source = session.source().as_str(),
        rules = session.rule_count(),
        "loaded rule set"
    );

    Ok(session)
}

fn run_compare(settings: &Settings, as_json: bool) -> Result<()> {
    let entities = load_catalog(&settings.catalog_path).context("failed to load catalog")?;
    let rules = load_rule_set(&settings.rules_path).context("failed to load rule file")?;

    info!(
        catalog = %settings.catalog_path.display(),
        entries = entities.len(),
        rules = rules.len(),
        "comparing catalog with rules"
    );

    let engine = ReconciliationEngine::new(settings.season_prefix());
    let report = engine.reconcile(&entities, rules.keys())?;

    info!("{}", report.summary());

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ReconciliationReport) {
    println!("\n📊 Catalog vs. Rules");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Catalog entries:  {}", report.source_count);
    println!(
        "Rules:            {} ({} with season prefix)",
        report.rule_key_count,
        report.rule_name_count
    );
    println!("Difference:       {}", report.count_difference().abs());

    println!("\n🔍 Differences");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if report.missing_in_target.is_empty() {
        println!("\n✅ Every catalog entry has a rule");
    } else {
        println!(
            "\n❌ In catalog but no rule generated ({}):",
            report.missing_in_target.len()
        );
        for name in &report.missing_in_target {
            println!("  - {}", name);
        }
    }

    if report.extra_in_target.is_empty() {
        println!("\n✅ No rules without a catalog entry");
    } else {
        println!(
            "\n⚠️  Rules without a catalog entry ({}):",
            report.extra_in_target.len()
        );
        for name in &report.extra_in_target {
            println!("  - {}", name);
        }
    }

    if !report.source_duplicates.is_empty() {
        println!(
            "\n🔄 Duplicated catalog names ({}):",
            report.source_duplicates.len()
        );
        for (name, count) in &report.source_duplicates {
            println!("  - {} ({}x)", name, count);
        }
    }

    if !report.target_duplicates.is_empty() {
        println!(
            "\n🔄 Duplicated rule names ({}):",
            report.target_duplicates.len()
        );
        for (name, count) in &report.target_duplicates {
            println!("  - {} ({}x)", name, count);
        }
    }

    for group in &report.source_duplicate_groups {
        println!("\n📺 {} ({} entries)", group.name, group.count());
        for (i, entry) in group.entries.iter().enumerate() {
            println!("   #{}:", i + 1);
            println!(
                "     - Original title: {}",
                entry.original_title.as_deref().unwrap_or("-")
            );
            println!(
                "     - Cleaned title:  {}",
                entry.cleaned_title.as_deref().unwrap_or("-")
            );
            println!(
                "     - Bangumi ID:     {}",
                entry
                    .bangumi_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!(
                "     - Chinese name:   {}",
                entry.chinese_name.as_deref().unwrap_or("-")
            );
            println!(
                "     - Air date:       {}",
                entry
                    .air_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if report.count_difference() > 0 && report.merged_duplicate_count() > 0 {
        println!(
            "{} catalog entries share a name with another entry; rule generation merges them into one rule each.",
            report.merged_duplicate_count()
        );
    }
    if report.is_consistent() {
        println!("✅ Catalog and rules agree");
    }
}

fn run_list(settings: &Settings) -> Result<()> {
    let session = open_session(settings)?;

    println!(
        "📁 {} ({})",
        session.authoritative_path().display(),
        session.source().as_str()
    );
    for name in session.sorted_names() {
        println!("{}", name);
    }
    println!("Total rules: {}", session.rule_count());

    Ok(())
}

fn run_export(settings: &Settings) -> Result<()> {
    let session = open_session(settings)?;
    println!("{}", session.export_json());
    Ok(())
}

fn run_remove(settings: &Settings, names: &[String], dry_run: bool) -> Result<()> {
    let mut session = open_session(settings)?;

    for name in names {
        // Repeating a name on the command line must not unstage it
        if !session.is_staged(name) {
            session.toggle(name)?;
        }
    }

    if dry_run {
        println!("{}", session.export_json());
        return Ok(());
    }

    match session.commit() {
        Ok(result) => {
            info!(
                removed = result.removed_count,
                remaining = result.remaining_count,
                path = %result.path.display(),
                "committed rule set"
            );
            println!(
                "✅ Removed {} rules, {} remain → {}",
                result.removed_count,
                result.remaining_count,
                result.path.display()
            );
            println!(
                "   Original file unchanged: {}",
                session.original_path().display()
            );
            Ok(())
        }
        Err(e) if e.is_informational() => {
            warn!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(feature = "tui")]
fn run_edit(settings: &Settings) -> Result<()> {
    let session = match open_session(settings) {
        Ok(session) => session,
        Err(e) => {
            if let Some(rule_curator::RuleError::NoRuleFileFound { .. }) = e.downcast_ref() {
                eprintln!("❌ Rule file not found: {}", settings.rules_path.display());
                eprintln!("   Pass --rules <path> or set rules_path in the config file.");
                std::process::exit(1);
            }
            return Err(e);
        }
    };

    let mut app = ui::App::new(session);
    ui::run_ui(&mut app)?;

    info!(rules = app.session.rule_count(), "editor closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_edit(_settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: rule-curator remove <NAME>...");
    std::process::exit(1);
}
