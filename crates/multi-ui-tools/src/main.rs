//! multi-ui CLI - Copy UI components from the multi-ui registry

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "multi-ui")]
#[command(about = "Add multi-ui components to your project")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configure language and component directory for this project
    Setup(SetupArgs),
    /// Fetch a component and write it into the configured directory
    Add {
        /// Component name as published in the registry (e.g. Button_1)
        name: String,
    },
    /// Anything else prints usage instead of failing
    #[command(external_subcommand)]
    Other(Vec<String>),
}

#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Skip the peer dependency install step
    #[arg(long = "skip-install")]
    pub skip_install: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let project_dir = std::env::current_dir()?;

    match args.command {
        Some(Command::Setup(setup_args)) => {
            let result =
                multi_ui_core::setup_flow(&project_dir, setup_args.skip_install).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
        Some(Command::Add { name }) => {
            let result = multi_ui_core::add_flow(&project_dir, &name).await;

            let _ = console::Term::stderr().show_cursor();

            result
        }
        Some(Command::Other(_)) | None => {
            // Unknown or missing subcommand: show usage, exit successfully
            Args::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
