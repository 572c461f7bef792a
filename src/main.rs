use anyhow::Result;
use clap::Parser;

use hashcheck::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
