//! `catload import` command - load a product export into the catalogue

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{connect_checked, load_config, plural, require_database, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::{Config, RunReport};
use crate::pipeline::{self, Stage};
use crate::source::read_source;
use crate::store::{SqliteStore, StoreCredentials};

/// How many warnings are echoed to the console before pointing at the report
const CONSOLE_WARNING_LIMIT: usize = 10;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Product export (CSV) to import
    pub file: PathBuf,

    /// Catalogue database path (default: from config or CATLOAD_DATABASE)
    #[arg(long, short = 'd')]
    pub database: Option<PathBuf>,

    /// Elevated credential; allows creating and migrating the database
    #[arg(long)]
    pub service_key: Option<String>,

    /// Where to write the run report (default: import-report.json)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Rows per write call
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Rows per ranged read (capped at the store's row limit)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Run every stage against a throwaway in-memory store
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    fn overrides(&self) -> Config {
        Config {
            database: self.database.clone(),
            service_key: self.service_key.clone(),
            report_path: self.report.clone(),
            chunk_size: self.chunk_size,
            page_size: self.page_size,
            ..Config::default()
        }
    }
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(args.overrides())?;
    let quiet = global.quiet;

    if !quiet {
        println!(
            "{} Importing {}{}",
            style("→").blue(),
            style(args.file.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    // Load-time failures (unreadable file, missing columns) happen before any write
    let source = read_source(&args.file).map_err(|e| miette::miette!("{}", e))?;

    let mut store = if args.dry_run {
        SqliteStore::in_memory(config.max_rows()).map_err(|e| miette::miette!("{}", e))?
    } else {
        let credentials =
            StoreCredentials::new(require_database(&config)?, config.service_key.clone());
        connect_checked(&credentials, config.max_rows())?
    };

    let mut options = config.batch_options();
    if options.page_size > store.max_rows() {
        tracing::warn!(
            requested = options.page_size,
            cap = store.max_rows(),
            "page size exceeds the store's row cap; using the cap"
        );
        options.page_size = store.max_rows();
    }

    let mut report = RunReport::start(&args.file, args.dry_run);
    report.source_sha256 = Some(source.sha256.clone());

    pipeline::run(&mut store, &source, &options, &mut report, |stage, stage_report| {
        if quiet {
            return;
        }
        let count = stage_report.count_of(stage.count_key());
        let mark = if !stage_report.errors.is_empty() {
            style("✗").red()
        } else if !stage_report.warnings.is_empty() {
            style("!").yellow()
        } else {
            style("✓").green()
        };
        let mut line = format!("{} {:<32} {:>6}", mark, stage.label(), count);
        if !stage_report.errors.is_empty() {
            line.push_str(&format!("  {}", style(plural(stage_report.errors.len(), "error")).red()));
        }
        if !stage_report.warnings.is_empty() {
            line.push_str(&format!(
                "  {}",
                style(plural(stage_report.warnings.len(), "warning")).yellow()
            ));
        }
        println!("{}", line);
        let unclassifiable = stage_report.count_of("unclassifiable");
        if stage == Stage::Classify && unclassifiable > 0 {
            println!("  {}", style(format!("{} unclassifiable rows skipped", unclassifiable)).dim());
        }
    });
    report.finish();

    let report_path = config.report_path();
    let written = match report.write_to(&report_path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!(
                "{} Cannot write report to {}: {}",
                style("!").yellow(),
                report_path.display(),
                e
            );
            false
        }
    };

    if !quiet {
        print_summary(&report, written.then_some(&report_path));
    }
    Ok(())
}

fn print_summary(report: &RunReport, report_path: Option<&PathBuf>) {
    println!();
    for warning in report.warnings.iter().take(CONSOLE_WARNING_LIMIT) {
        println!(
            "  {} [{}] {}",
            style("!").yellow(),
            warning.step,
            truncate_str(&warning.message, 100)
        );
    }
    if report.warnings.len() > CONSOLE_WARNING_LIMIT {
        println!(
            "  {}",
            style(format!(
                "... and {} more",
                report.warnings.len() - CONSOLE_WARNING_LIMIT
            ))
            .dim()
        );
    }
    for error in &report.errors {
        println!(
            "  {} [{}] {}{}",
            style("✗").red(),
            error.step,
            truncate_str(&error.message, 100),
            error
                .detail
                .as_deref()
                .map(|d| format!(" ({})", d))
                .unwrap_or_default()
        );
    }

    let status = if report.errors.is_empty() {
        style("Import complete").green().bold()
    } else {
        style("Import finished with errors").yellow().bold()
    };
    println!(
        "{} in {:.2}s: {}, {}, {} skipped, {}, {}",
        status,
        report.elapsed_seconds,
        plural(report.count_of("products"), "product"),
        plural(report.count_of("variants"), "variant"),
        report.skipped_rows,
        plural(report.errors.len(), "error"),
        plural(report.warnings.len(), "warning"),
    );
    if let Some(path) = report_path {
        println!("Report written to {}", style(path.display()).cyan());
    }
}
