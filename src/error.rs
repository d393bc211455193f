use std::{
  error::Error,
  fmt::{Debug, Display},
  process::{ExitCode, Termination},
};

use flexi_logger::FlexiLoggerError;
use nix::{libc::STDERR_FILENO, unistd::isatty};

/// Exit code used for every failure of the launcher itself
pub const LAUNCH_FAILURE: u8 = 1;

pub enum NsBoxError {
  Argument(String),
  Directory(String),
  Lookup(String),
  Copy(String),
  RootSwitch(String),
  WorkingDirectory(String),
  DeviceSetup(String),
  Spawn(String),
  Logger(FlexiLoggerError),
}

/// What the launcher process exits with
pub enum NsBoxExit {
  Ok,
  /// The child ran and exited with this non-zero code
  Child(u8),
  Err(NsBoxError),
}

impl NsBoxError {
  pub fn argument<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::Argument(msg.into())
  }

  pub fn directory<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::Directory(msg.into())
  }

  pub fn lookup<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::Lookup(msg.into())
  }

  pub fn copy<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::Copy(msg.into())
  }

  pub fn root_switch<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::RootSwitch(msg.into())
  }

  pub fn working_directory<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::WorkingDirectory(msg.into())
  }

  pub fn device_setup<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::DeviceSetup(msg.into())
  }

  pub fn spawn<MS: Into<String>>(msg: MS) -> NsBoxError {
    NsBoxError::Spawn(msg.into())
  }
}

impl Debug for NsBoxError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    std::fmt::Display::fmt(&self, f)
  }
}

impl Display for NsBoxError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self {
      NsBoxError::Argument(msg) => f.write_fmt(format_args!("NsBox Argument Error: {}", msg)),
      NsBoxError::Directory(msg) => f.write_fmt(format_args!("NsBox Directory Error: {}", msg)),
      NsBoxError::Lookup(msg) => f.write_fmt(format_args!("NsBox Lookup Error: {}", msg)),
      NsBoxError::Copy(msg) => f.write_fmt(format_args!("NsBox Copy Error: {}", msg)),
      NsBoxError::RootSwitch(msg) => f.write_fmt(format_args!("NsBox Root Switch Error: {}", msg)),
      NsBoxError::WorkingDirectory(msg) => {
        f.write_fmt(format_args!("NsBox Working Directory Error: {}", msg))
      }
      NsBoxError::DeviceSetup(msg) => {
        f.write_fmt(format_args!("NsBox Device Setup Error: {}", msg))
      }
      NsBoxError::Spawn(msg) => f.write_fmt(format_args!("NsBox Spawn Error: {}", msg)),
      NsBoxError::Logger(err) => f.write_fmt(format_args!("NsBox Logger Error: {}", err)),
    }
  }
}

impl From<FlexiLoggerError> for NsBoxError {
  fn from(err: FlexiLoggerError) -> Self {
    NsBoxError::Logger(err)
  }
}

impl Error for NsBoxError {}

impl NsBoxExit {
  pub fn code(&self) -> u8 {
    match self {
      NsBoxExit::Ok => 0,
      NsBoxExit::Child(code) => *code,
      NsBoxExit::Err(_) => LAUNCH_FAILURE,
    }
  }

  /// The single stderr line reported for this exit, if any
  pub fn diagnostic(&self) -> Option<String> {
    match self {
      NsBoxExit::Ok => None,
      NsBoxExit::Child(code) => Some(format!(
        "NsBox Child Exit Error: command exited with code {}",
        code
      )),
      NsBoxExit::Err(err) => Some(format!("{}", err).replace('\n', " ")),
    }
  }
}

impl From<Result<NsBoxExit, NsBoxError>> for NsBoxExit {
  fn from(result: Result<NsBoxExit, NsBoxError>) -> Self {
    result.unwrap_or_else(NsBoxExit::Err)
  }
}

impl Termination for NsBoxExit {
  fn report(self) -> ExitCode {
    let code = self.code();
    if let Some(text) = self.diagnostic() {
      let text = match text.split_once(": ") {
        Some((prefix, message)) if isatty(STDERR_FILENO).unwrap_or(false) => {
          format!("\x1b[1m\x1b[91m{}\x1b[39m\x1b[22m  {}", prefix, message)
        }
        _ => text,
      };
      eprintln!("{}", text);
    }
    ExitCode::from(code)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_should_describe_every_failure_in_one_line() {
    assert_eq!(NsBoxExit::Ok.diagnostic(), None);
    assert_eq!(
      NsBoxExit::Child(7).diagnostic(),
      Some("NsBox Child Exit Error: command exited with code 7".to_string())
    );
    assert_eq!(NsBoxExit::Child(7).code(), 7);

    let exit = NsBoxExit::Err(NsBoxError::lookup("ls: cannot find\nbinary"));
    assert_eq!(exit.code(), LAUNCH_FAILURE);
    assert_eq!(
      exit.diagnostic(),
      Some("NsBox Lookup Error: ls: cannot find binary".to_string())
    );
  }
}
