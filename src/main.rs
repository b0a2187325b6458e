use anyhow;
use clap::Parser;

use cefmat::interfaces::cli::{log_heading, setup_logging, Cli};
use cefmat::interfaces::input::Input;
use cefmat::interfaces::InputHandle;
use cefmat::io::read_cefmat_yaml;

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    setup_logging(cli.output.as_deref(), cli.verbose)?;
    log_heading();

    let input = read_cefmat_yaml::<Input, _>(&cli.config)?;
    input.handle()
}
