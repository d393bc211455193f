use std::env;
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use nix::unistd::{chdir, chroot, fchdir};
use tempfile::{Builder, TempDir};

use crate::NsBoxError;

/// Ephemeral root directory of a single launch.
///
/// The directory is removed when the value is dropped. If the calling process
/// has entered it with [`NsBoxChroot::enter`], the host root and working
/// directory are restored first, since the directory path is only meaningful
/// from the host root.
pub struct NsBoxChroot {
  dir: Option<TempDir>,
  host: Option<HostRoot>,
}

/// Handle on the root the process had before chroot
struct HostRoot {
  root: File,
  cwd: Option<PathBuf>,
}

impl NsBoxChroot {
  /// Create a uniquely named directory under the system temp root
  pub fn new(prefix: &str) -> Result<Self, NsBoxError> {
    let dir = Builder::new()
      .prefix(prefix)
      .tempdir()
      .map_err(|err| {
        NsBoxError::directory(format!(
          "can not create temporary directory in {}: {}",
          env::temp_dir().to_string_lossy(),
          err
        ))
      })?;
    info!("Create new root: {}", dir.path().to_string_lossy());
    Ok(NsBoxChroot {
      dir: Some(dir),
      host: None,
    })
  }

  /// Host side path of the new root
  pub fn path(&self) -> &Path {
    match &self.dir {
      Some(dir) => dir.path(),
      None => Path::new("/"),
    }
  }

  pub fn entered(&self) -> bool {
    self.host.is_some()
  }

  /// chroot into the directory, then chdir to its top
  pub fn enter(&mut self) -> Result<(), NsBoxError> {
    let root = File::open("/")
      .map_err(|err| NsBoxError::root_switch(format!("can not open host root: {}", err)))?;
    let cwd = env::current_dir().ok();
    let new_root = self.path().to_path_buf();

    chroot(&new_root).map_err(|errno| {
      NsBoxError::root_switch(format!("chroot {}: {}", new_root.to_string_lossy(), errno))
    })?;
    self.host = Some(HostRoot { root, cwd });
    debug!("Chroot ok: {}", new_root.to_string_lossy());

    chdir(Path::new("/"))
      .map_err(|errno| NsBoxError::working_directory(format!("chdir /: {}", errno)))?;

    Ok(())
  }

  /// Go back to the host root, a no-op when not entered
  fn leave(&mut self) -> Result<(), nix::Error> {
    if let Some(host) = self.host.take() {
      fchdir(host.root.as_raw_fd())?;
      chroot(".")?;
      match host.cwd {
        Some(cwd) => chdir(&cwd)?,
        None => chdir("/")?,
      }
      debug!("Restore host root");
    }
    Ok(())
  }
}

impl Drop for NsBoxChroot {
  fn drop(&mut self) {
    if let Err(errno) = self.leave() {
      warn!("Fails restoring host root: {}", errno);
    }
    if let Some(dir) = self.dir.take() {
      let path = dir.path().to_path_buf();
      match dir.close() {
        Ok(_) => {
          info!("Remove new root: {}", path.to_string_lossy());
        }
        Err(err) => {
          warn!(
            "Fails removing new root: {} ({})",
            path.to_string_lossy(),
            err
          );
        }
      }
    }
  }
}
