use std::process;

use anyhow::{self, Context};
use clap::Parser;

use pbcell::interfaces::cli::{configure_logging, log_heading, Cli};
use pbcell::interfaces::input::Input;
use pbcell::interfaces::InputHandle;
use pbcell::io::{read_pbcell_yaml, write_pbcell_yaml};

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    configure_logging(cli.output.as_deref(), cli.verbose)?;
    log_heading();
    if let Some(config) = cli.config.as_ref() {
        let input: Input = read_pbcell_yaml(config)
            .with_context(|| format!("Unable to read the input file `{}`", config.display()))?;
        input.handle()
    } else {
        log::warn!("No input file given. A template input file `pbcell_template.yml` is written.");
        write_pbcell_yaml("pbcell_template", &Input::default())
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        log::error!("{err:#}");
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}
