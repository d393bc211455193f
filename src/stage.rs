use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::NsBoxError;

/// The command binary copied into the new root
#[derive(Debug, Clone)]
pub struct NsBoxStaged {
  source: PathBuf,
  name: String,
}

impl NsBoxStaged {
  pub fn source(&self) -> &PathBuf {
    &self.source
  }

  /// Base name of the source, also the file name under the new root
  pub fn name(&self) -> &String {
    &self.name
  }

  /// Path of the staged binary once the new root is `/`
  pub fn chroot_path(&self) -> PathBuf {
    Path::new("/").join(&self.name)
  }
}

/// Resolve a command the way a shell does with PATH
pub fn lookup(command: &str) -> Result<PathBuf, NsBoxError> {
  let path = which::which(command)
    .map_err(|err| NsBoxError::lookup(format!("{}: {}", command, err)))?;
  debug!("Resolve {} -> {}", command, path.to_string_lossy());
  Ok(path)
}

/// Copy the resolved command into `root` under its base name
pub fn stage_executable(command: &str, root: &Path) -> Result<NsBoxStaged, NsBoxError> {
  let source = lookup(command)?;
  let name = match source.file_name() {
    Some(name) => name.to_string_lossy().to_string(),
    None => {
      return Err(NsBoxError::lookup(format!(
        "{} has no file name",
        source.to_string_lossy()
      )))
    }
  };
  let dest = root.join(&name);

  let size = copy_file(&source, &dest).map_err(|err| {
    NsBoxError::copy(format!(
      "{} -> {}: {}",
      source.to_string_lossy(),
      dest.to_string_lossy(),
      err
    ))
  })?;
  info!(
    "Stage executable {} -> {} ({} bytes)",
    source.to_string_lossy(),
    dest.to_string_lossy(),
    size
  );

  Ok(NsBoxStaged { source, name })
}

/// Byte copy that keeps the mode bits and syncs before returning
fn copy_file(src: &Path, dest: &Path) -> io::Result<u64> {
  let mut input = File::open(src)?;
  let mode = input.metadata()?.permissions().mode();
  let mut output = OpenOptions::new()
    .write(true)
    .create_new(true)
    .mode(mode & 0o7777)
    .open(dest)?;
  let size = io::copy(&mut input, &mut output)?;
  // umask may have stripped the execute bits
  fs::set_permissions(dest, fs::Permissions::from_mode(mode & 0o7777))?;
  output.sync_all()?;
  Ok(size)
}
