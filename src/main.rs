use catload::cli::{Cli, Commands};
use clap::Parser;
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping `catload template | head` exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    catload::core::logging::init_tracing(global.verbose, global.quiet);

    match cli.command {
        Commands::Import(args) => catload::cli::commands::import::run(args, &global),
        Commands::Template(args) => catload::cli::commands::template::run(args),
        Commands::Counts(args) => catload::cli::commands::counts::run(args),
        Commands::Completions(args) => catload::cli::commands::completions::run(args),
    }
}
