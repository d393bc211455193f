use std::env;

use clap::error::ErrorKind;
use clap::Parser;
use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};
use log::{info, warn};

use nsbox::{default_format, run, NsBoxError, NsBoxExit, NsBoxParams};

/// Run a command in an ephemeral chroot with its own hostname and pid namespaces
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[arg(help = "Verb, only `run` is meaningful and it is not checked")]
  verb: String,

  #[arg(help = "Image (accepted but not applied)")]
  image: String,

  #[arg(help = "Command, resolved through PATH")]
  command: String,

  #[arg(help = "Arguments", trailing_var_arg = true, allow_hyphen_values = true)]
  arguments: Vec<String>,
}

impl Cli {
  fn resolve(self) -> NsBoxParams {
    if self.verb != "run" {
      warn!("Unknown verb {}, running anyway", self.verb);
    }
    NsBoxParams::new(self.image, self.command, self.arguments)
  }
}

fn setup_logger() -> Result<LoggerHandle, NsBoxError> {
  let handle = match env::var("LOG_DIR") {
    Ok(dir) => {
      Logger::try_with_env_or_str("nsbox=info")?
        .log_to_file(
          FileSpec::default()
            .directory(dir)
            .basename("nsbox")
            .discriminant(format!("{}", chrono::offset::Local::now().format("%Y-%m-%d")))
            .suppress_timestamp(),
        )
        .append()
        .duplicate_to_stderr(Duplicate::Warn)
        .format(default_format)
        .start()?
    }
    Err(_) => {
      Logger::try_with_env_or_str("nsbox=warn")?
        .log_to_stderr()
        .format(default_format)
        .start()?
    }
  };
  Ok(handle)
}

fn launch() -> Result<NsBoxExit, NsBoxError> {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
      let _ = err.print();
      return Ok(NsBoxExit::Ok);
    }
    Err(err) => {
      let message = err.to_string();
      let message = message
        .lines()
        .take_while(|line| !line.starts_with("Usage:"))
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join(" ");
      let message = message.trim_start_matches("error: ");
      return Err(NsBoxError::argument(format!(
        "{} (usage: nsbox <verb> <image> <command> [arg...])",
        message
      )));
    }
  };

  let _logger = setup_logger()?;
  let params = cli.resolve();

  info!("Start running nsbox");
  let result = run(&params)?;
  info!("Running nsbox finished");

  Ok(result.into())
}

fn main() -> NsBoxExit {
  launch().into()
}
