use std::io;
use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use rsprovision::cli::{Cli, Commands};
use rsprovision::executor::{CommandExecutor, SshExecutor};
use rsprovision::{cli, config};
use tracing::error;

fn run(args: Cli) -> Result<()> {
    match &args.command {
        Commands::Provision(opts) => {
            let profile = config::load_profile(&opts.common.file)?;
            let executor: Arc<dyn CommandExecutor> = Arc::new(SshExecutor {
                target: profile.ssh_target(),
                dry_run: opts.dry_run,
            });
            rsprovision::run_provision(opts, executor)
        }
        Commands::Validate(opts) => rsprovision::run_validate(opts),
        Commands::Render(opts) => {
            let options = rsprovision::run_render(opts)?;
            println!("# {}", options.engine_options_path);
            print!("{}", options.engine_options);
            Ok(())
        }
        Commands::Backends => {
            for id in rsprovision::run_backends() {
                println!("{}", id);
            }
            Ok(())
        }
        Commands::Completions(opts) => {
            let mut cmd = cli::Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(opts.shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let args = Cli::parse();

    if let Err(e) = rsprovision::init_logging(args.command.log_level()) {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    if let Err(e) = run(args) {
        error!("{:#}", e);
        process::exit(1);
    }
}
