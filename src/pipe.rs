use std::os::unix::prelude::RawFd;

use log::warn;
use nix::{
  fcntl::OFlag,
  unistd::{self, close, pipe2},
};

use crate::error::NsBoxError;

/// Close-on-exec pipe the forked child uses to report why it could not exec.
/// Nothing arrives when exec succeeds, the write end simply disappears.
pub struct NsBoxPipe(RawFd, RawFd);

pub struct NsBoxReadPipe(RawFd);

pub struct NsBoxWritePipe(RawFd);

impl NsBoxPipe {
  pub fn new() -> Result<Self, NsBoxError> {
    let result = pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK)
      .map_err(|errno| NsBoxError::spawn(format!("pipe: {}", errno)))?;
    Ok(NsBoxPipe(result.0, result.1))
  }

  /// Parent side
  pub fn read(self) -> NsBoxReadPipe {
    if let Err(errno) = close(self.1) {
      warn!("Fails closing pipe write end: {}", errno);
    }
    NsBoxReadPipe(self.0)
  }

  /// Child side, the logger may hold locks taken before fork
  pub fn write(self) -> NsBoxWritePipe {
    let _ = close(self.0);
    NsBoxWritePipe(self.1)
  }
}

impl NsBoxReadPipe {
  /// Message left by the child, `None` if it wrote nothing
  pub fn read(self: &Self) -> Option<String> {
    let mut buf = vec![0 as u8; 256];
    let size = unistd::read(self.0, buf.as_mut_slice()).ok()?;
    buf.truncate(size);
    let buf = buf.into_iter().take_while(|b| *b != 0).collect::<Vec<u8>>();
    if buf.is_empty() {
      None
    } else {
      Some(String::from_utf8_lossy(&buf).to_string())
    }
  }
}

impl Drop for NsBoxReadPipe {
  fn drop(&mut self) {
    if let Err(errno) = close(self.0) {
      warn!("Fails closing pipe: {}", errno);
    }
  }
}

impl NsBoxWritePipe {
  /// Runs between fork and exec, so no allocation and no logging
  pub fn write(self: &Self, parts: &[&[u8]]) {
    for part in parts {
      let _ = unistd::write(self.0, part);
    }
  }
}

impl Drop for NsBoxWritePipe {
  fn drop(&mut self) {
    // Child side, same as write
    let _ = close(self.0);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_should_read_nothing_when_child_wrote_nothing() {
    let pipe = NsBoxPipe::new().unwrap();
    let (read, write) = (NsBoxReadPipe(pipe.0), NsBoxWritePipe(pipe.1));
    drop(write);
    assert_eq!(read.read(), None);
  }

  #[test]
  fn it_should_read_child_message() {
    let pipe = NsBoxPipe::new().unwrap();
    let (read, write) = (NsBoxReadPipe(pipe.0), NsBoxWritePipe(pipe.1));
    write.write(&[b"exec /tool: ".as_slice(), b"No such file or directory".as_slice()]);
    drop(write);
    assert_eq!(
      read.read(),
      Some("exec /tool: No such file or directory".to_string())
    );
  }
}
