//! Command-line surface: one request in, one frame out.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::action::ActionContext;
use crate::agent;
use crate::config::{self, Config};
use crate::core::{ClientError, Response};
use crate::svn::SvnCli;
use crate::Result;

#[derive(Parser, Debug)]
#[command(
    name = "svn-agent",
    version,
    about = "Run one Subversion working-copy request and answer with a framed JSON response"
)]
pub struct Cli {
    /// Read the request from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub request: Option<PathBuf>,

    /// Config layer applied over the user config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Increase logging verbosity (-v, -vv).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: &Config) -> Result<()> {
    if cli.print_config {
        print!("{}", config::render(config)?);
        return Ok(());
    }

    let svn = SvnCli::new(config.svn_bin.clone());
    let cx = ActionContext::from_config(config, &svn);
    let stdout = io::stdout().lock();

    let input: Box<dyn Read> = match &cli.request {
        None => Box::new(io::stdin().lock()),
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                let reason = format!("cannot read {}: {err}", path.display());
                let response = Response::error(ClientError::Malformed { reason }.to_string());
                return agent::write_response(stdout, &response);
            }
        },
    };

    agent::run_once(input, stdout, &cx)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = parse_from(["svn-agent", "--request", "req.json", "-vv"]);
        assert_eq!(cli.request, Some(PathBuf::from("req.json")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.print_config);
        assert!(cli.config.is_none());
    }
}
