use std::path::{Path, PathBuf};
use std::process::ExitCode;

use absence_report::aggregate::TextContains;
use absence_report::class_report;
use anyhow::{Context, Result};
use app_utils::{init_from_env, init_tracing, InitFromEnv, Overrides};
use chrono::NaiveDate;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, warn};
use webuntis_api::class::Class;
use webuntis_api::class_selector::ClassSelector;
use webuntis_api::client::Client;
use webuntis_api::services::untis_service::UntisService;
use webuntis_api::types::DateRange;

#[derive(Debug, Parser)]
#[command(name = "absence-report")]
#[command(about = "Absence and tardiness report for a WebUntis class", long_about = None)]
struct Cli {
    /// Class to report on, by id, name, long name or `name (id)`. Defaults to `$CLASS`
    #[arg(long)]
    class: Option<String>,
    /// List the classes visible to the account and exit
    #[arg(long)]
    list_classes: bool,
    /// First day of the reporting window, e.g. 2025-02-10
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the reporting window
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Directory to write the CSV export into
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// WebUntis user, instead of `$WEBUNTIS_USER`
    #[arg(long)]
    user: Option<String>,
    /// Only print the table
    #[arg(long)]
    no_csv: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenv().ok();
    if let Err(err) = init_tracing() {
        eprintln!("could not set up logging: {err:#}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(?err, "report failed");
            eprintln!("Fehler beim Login oder beim Abrufen der Daten: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        user: cli.user,
        start: cli.start,
        end: cli.end,
    };
    let InitFromEnv {
        settings,
        untis,
        classes,
    } = init_from_env(overrides).await?;

    let selector = cli.class.map(ClassSelector::new).or(settings.class);
    let result = match selector {
        Some(selector) if !cli.list_classes => {
            let out = (!cli.no_csv).then_some(cli.out.as_path());
            report(&untis, &classes, &selector, &settings.window, out).await
        }
        _ => {
            print_classes(&classes);
            Ok(())
        }
    };

    if let Err(err) = untis.logout().await {
        warn!(%err, "could not log out of WebUntis");
    }

    result
}

async fn report(
    untis: &Client<impl UntisService>,
    classes: &[Class],
    selector: &ClassSelector,
    window: &DateRange,
    out: Option<&Path>,
) -> Result<()> {
    let class = selector
        .select_from(classes)
        .with_context(|| format!("could not find class with selector {selector:?}"))?;

    let table = class_report(untis, class, window, &TextContains::default()).await?;
    println!("{table}");

    if let Some(dir) = out {
        let path = table.export_to(dir)?;
        println!("CSV gespeichert: {}", path.display());
    }

    Ok(())
}

fn print_classes(classes: &[Class]) {
    println!("Klassen:");
    for class in classes {
        println!("  {}", class.label());
    }
}
