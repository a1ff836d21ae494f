//! `catload counts` command - row counts of every catalogue table

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{connect_checked, load_config, require_database};
use crate::core::Config;
use crate::store::{CatalogStore, StoreCredentials, Table};

#[derive(clap::Args, Debug)]
pub struct CountsArgs {
    /// Catalogue database path (default: from config or CATLOAD_DATABASE)
    #[arg(long, short = 'd')]
    pub database: Option<PathBuf>,
}

/// Render `(table, rows)` pairs as a markdown table
pub fn render_counts(counts: &[(Table, usize)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Table", "Rows"]);
    for (table, rows) in counts {
        builder.push_record([table.as_str().to_string(), rows.to_string()]);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn run(args: CountsArgs) -> Result<()> {
    let config = load_config(Config {
        database: args.database,
        ..Config::default()
    })?;

    // Counting needs no elevated rights
    let credentials = StoreCredentials::new(require_database(&config)?, None);
    let store = connect_checked(&credentials, config.max_rows())?;

    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let rows = store
            .count(table)
            .map_err(|e| miette::miette!("cannot count {}: {}", table, e))?;
        counts.push((table, rows));
    }

    println!("{}", render_counts(&counts));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_counts() {
        let rendered = render_counts(&[(Table::Categories, 2), (Table::Products, 10)]);
        insta::assert_snapshot!(rendered, @r"
        | Table      | Rows |
        |------------|------|
        | categories | 2    |
        | products   | 10   |
        ");
    }
}
