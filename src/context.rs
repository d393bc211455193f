use nix::sched::CloneFlags;
use nix::sys::signal::Signal;

use crate::error::NsBoxExit;

/// Isolation domain requested for the child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
  /// Own hostname and domain name
  Uts,
  /// Own process numbering, the child becomes pid 1
  Pid,
}

impl Namespace {
  pub fn defaults() -> Vec<Self> {
    vec![Namespace::Uts, Namespace::Pid]
  }

  pub fn flag(&self) -> CloneFlags {
    match self {
      Namespace::Uts => CloneFlags::CLONE_NEWUTS,
      Namespace::Pid => CloneFlags::CLONE_NEWPID,
    }
  }

  /// unshare(CLONE_NEWPID) only moves later children of the caller, so it has
  /// to happen in the parent before fork
  pub fn applies_to_children(&self) -> bool {
    matches!(self, Namespace::Pid)
  }
}

/// Launch request plus isolation config
#[derive(Debug, Clone)]
pub struct NsBoxParams {
  image: String,
  command: String,
  arguments: Vec<String>,
  namespaces: Vec<Namespace>,
  temp_prefix: String,
}

/// Termination of a child that did run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsBoxResult {
  status: Option<i32>,
  signal: Option<Signal>,
}

impl NsBoxParams {
  pub fn new<IS: Into<String>, CS: Into<String>>(
    image: IS,
    command: CS,
    arguments: Vec<String>,
  ) -> Self {
    NsBoxParams {
      image: image.into(),
      command: command.into(),
      arguments,
      namespaces: Namespace::defaults(),
      temp_prefix: "chroot".to_string(),
    }
  }

  pub fn namespaces(self: &mut Self, namespaces: Vec<Namespace>) -> &mut Self {
    self.namespaces = namespaces;
    self
  }

  pub fn temp_prefix<PS: Into<String>>(self: &mut Self, prefix: PS) -> &mut Self {
    self.temp_prefix = prefix.into();
    self
  }

  pub fn image(&self) -> &String {
    &self.image
  }

  pub fn command(&self) -> &String {
    &self.command
  }

  pub fn arguments(&self) -> &Vec<String> {
    &self.arguments
  }

  pub fn get_namespaces(&self) -> &Vec<Namespace> {
    &self.namespaces
  }

  pub fn get_temp_prefix(&self) -> &String {
    &self.temp_prefix
  }

  /// Flags unshared by the launcher right before fork
  pub(crate) fn parent_flags(&self) -> CloneFlags {
    self
      .namespaces
      .iter()
      .filter(|ns| ns.applies_to_children())
      .fold(CloneFlags::empty(), |flags, ns| flags | ns.flag())
  }

  /// Flags unshared by the forked child before exec
  pub(crate) fn child_flags(&self) -> CloneFlags {
    self
      .namespaces
      .iter()
      .filter(|ns| !ns.applies_to_children())
      .fold(CloneFlags::empty(), |flags, ns| flags | ns.flag())
  }
}

impl NsBoxResult {
  pub(crate) fn new(status: Option<i32>, signal: Option<Signal>) -> Self {
    NsBoxResult { status, signal }
  }

  pub fn status(&self) -> &Option<i32> {
    &self.status
  }

  pub fn signal(&self) -> &Option<Signal> {
    &self.signal
  }

  /// Exit code the launcher reports for this child, 128 + N when killed by signal N
  pub fn exit_code(&self) -> u8 {
    match (self.status, self.signal) {
      (Some(status), _) => (status & 0xff) as u8,
      (None, Some(signal)) => (128 + signal as i32) as u8,
      (None, None) => crate::error::LAUNCH_FAILURE,
    }
  }
}

impl From<NsBoxResult> for NsBoxExit {
  fn from(result: NsBoxResult) -> Self {
    match result.exit_code() {
      0 => NsBoxExit::Ok,
      code => NsBoxExit::Child(code),
    }
  }
}
