//! Command line interface

use anyhow::{bail, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;

use crate::Runtime;

pub mod help;

const EXAMPLES: &str = "\
Examples:
  # Generate XRDs for all CRDs under apis/, outputting to /tmp/xrds
  crossplane-gen xrd paths=./apis/... output:dir=/tmp/xrds

  # Generate XRDs and output to stdout
  crossplane-gen xrd paths=./apis/... output:stdout

  # Generate XRDs with custom options
  crossplane-gen xrd:maxDescLen=0 paths=./apis/... output:dir=./config/xrd";

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application
    pub fn app() -> Command {
        Command::new("crossplane-gen")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Generate Crossplane API resources.")
            .after_help(EXAMPLES)
            .arg(
                Arg::new("detailed-help")
                    .short('w')
                    .long("detailed-help")
                    .help("Print every option with its fields and help text")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("options")
                    .help("Generators, output rules and paths, e.g. xrd paths=./apis/...")
                    .value_name("OPTION")
                    .num_args(0..)
                    .action(ArgAction::Append),
            )
    }

    /// Run the CLI application
    pub async fn run(matches: &ArgMatches) -> Result<()> {
        let registry = crate::default_registry()?;

        if matches.get_flag("detailed-help") {
            print!("{}", help::detailed_help(&registry));
            return Ok(());
        }

        let tokens: Vec<String> = matches
            .get_many::<String>("options")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        let runtime = Runtime::from_options(&registry, &tokens)?;
        if runtime.generators.is_empty() {
            bail!("no generators specified");
        }

        if runtime.run().await? {
            bail!("not all generators ran successfully");
        }

        info!("All generators ran successfully");
        Ok(())
    }
}
