// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;

use jurisdiction_quality::{
    missing_report_columns, DashboardAggregator, DashboardConfig, EntityClass, IssueCatalog,
    IssueResolver, OverviewRecord, SqliteStore,
};

#[derive(Parser, Debug)]
#[command(
    name = "jurisdiction-quality",
    version,
    about = "Data-quality dashboard for jurisdictions in the civic catalog"
)]
struct Cli {
    #[command(flatten)]
    config: DashboardConfig,

    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Warning/error counts for every jurisdiction
    Overview {
        #[arg(long, help = "Write rows as CSV")]
        csv: bool,
    },
    /// Issue cards for one jurisdiction
    Detail { jurisdiction: String },
    /// Flagged records behind a counter
    Issues {
        jurisdiction: String,
        /// person, organization, membership, bill or voteevent
        class: String,
        slug: Option<String>,
    },
    /// List the issue taxonomy
    Catalog,
    /// Compare report tables against the taxonomy
    Check,
    /// Interactive dashboard (default)
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Ui);

    // Log lines would tear the alternate screen
    if !matches!(command, Commands::Ui) {
        cli.config.init_logging();
    }

    match command {
        Commands::Catalog => run_catalog(cli.json),
        Commands::Overview { csv } => run_overview(&open(&cli.config)?, cli.json, csv),
        Commands::Detail { jurisdiction } => run_detail(&open(&cli.config)?, &jurisdiction, cli.json),
        Commands::Issues {
            jurisdiction,
            class,
            slug,
        } => run_issues(&open(&cli.config)?, &jurisdiction, &class, slug.as_deref(), cli.json),
        Commands::Check => run_check(&open(&cli.config)?),
        Commands::Ui => run_ui_mode(&cli.config),
    }
}

fn open(config: &DashboardConfig) -> Result<Connection> {
    config.open_database()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_catalog(json: bool) -> Result<()> {
    let catalog = IssueCatalog::global();

    if json {
        return print_json(&catalog.all_issue_types());
    }

    for class in EntityClass::ALL {
        println!("{}", class);
        for issue in catalog.all_issue_types().iter().filter(|i| i.owner == class) {
            println!(
                "  {:<26} {:<8} {}",
                issue.slug,
                issue.severity.as_str(),
                issue.description
            );
        }
    }

    Ok(())
}

fn run_overview(conn: &Connection, json: bool, as_csv: bool) -> Result<()> {
    let store = SqliteStore::new(conn);
    let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);
    let rows = aggregator.overview().context("failed to build overview")?;

    if json {
        return print_json(&rows);
    }

    if as_csv {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        for row in &rows {
            writer.serialize(OverviewRecord::from(row))?;
        }
        writer.flush()?;
        return Ok(());
    }

    println!(
        "{:<28} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}  {}",
        "Jurisdiction", "ppl", "org", "!mem", "bill", "!act", "vote", "!bill", "!cnt", "last run"
    );
    for row in &rows {
        let run = match row.run {
            Some(status) if status.success => format!("✓ {}", status.date),
            Some(status) => format!("✗ {}", status.date),
            None => "never".to_string(),
        };
        println!(
            "{:<28} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}  {}",
            row.name,
            row.people.warning,
            row.organizations.warning,
            row.organizations.no_memberships,
            row.bills.warning,
            row.bills.no_actions,
            row.vote_events.warning,
            row.vote_events.missing_bill,
            row.vote_events.missing_counts,
            run
        );
    }

    Ok(())
}

fn run_detail(conn: &Connection, jurisdiction: &str, json: bool) -> Result<()> {
    let store = SqliteStore::new(conn);
    let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);
    let detail = aggregator
        .jurisdiction_detail(jurisdiction)
        .with_context(|| format!("failed to build detail for {}", jurisdiction))?;

    if json {
        return print_json(&detail);
    }

    println!("📊 {}", jurisdiction);
    for (class, cards) in &detail {
        println!("\n{}", class);
        for card in cards {
            let marker = if card.alert { "❗" } else { "  " };
            println!("  {} {:<50} {:>6}", marker, card.description, card.count);
        }
    }

    Ok(())
}

fn run_issues(
    conn: &Connection,
    jurisdiction: &str,
    class: &str,
    slug: Option<&str>,
    json: bool,
) -> Result<()> {
    let store = SqliteStore::new(conn);
    let resolver = IssueResolver::new(IssueCatalog::global(), &store, &store);
    let resolution = resolver.resolve_issues(jurisdiction, class, slug)?;

    if json {
        return print_json(&resolution);
    }

    println!("🔎 {} / {}", jurisdiction, resolution.class);
    if let Some(link) = resolution.edit_link {
        println!("   edit via: {}", link.as_str());
    }
    for group in &resolution.groups {
        println!("\n{} ({})", group.description, group.entities.len());
        for entity in &group.entities {
            println!("  {:<45} {}", entity.id(), entity.display_name());
        }
    }

    Ok(())
}

fn run_check(conn: &Connection) -> Result<()> {
    let missing = missing_report_columns(conn, IssueCatalog::global())?;

    if missing.is_empty() {
        println!("✓ Report tables match the issue catalog");
        return Ok(());
    }

    for (kind, field) in &missing {
        eprintln!("✗ {} report is missing {}", kind, field);
    }
    anyhow::bail!("{} report column(s) missing", missing.len())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &DashboardConfig) -> Result<()> {
    let conn = config.open_database()?;

    let mut app = ui::App::new(&conn)?;
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin jurisdiction-quality-server --features server");
    std::process::exit(1);
}
