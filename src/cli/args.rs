//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    completions::CompletionsArgs, counts::CountsArgs, import::ImportArgs, template::TemplateArgs,
};

#[derive(Parser)]
#[command(name = "catload")]
#[command(author, version, about = "Catalogue loader")]
#[command(long_about = "Loads a wide product export (WooCommerce-style CSV) into a normalized relational catalogue. Safe to re-run on the same file.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalOpts {
    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug diagnostics on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a product export into the catalogue
    Import(ImportArgs),

    /// Print a CSV template of the expected columns
    Template(TemplateArgs),

    /// Show row counts of every catalogue table
    Counts(CountsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["catload", "import", "export.csv", "-v"]).unwrap();
        assert!(cli.global.verbose);
        assert!(matches!(cli.command, Commands::Import(_)));
    }
}
