use std::ffi::CString;
use std::fs::{DirBuilder, OpenOptions};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use log::{debug, info};
use nix::errno::Errno;
use nix::libc;
use nix::sched::unshare;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execv, fork, ForkResult, Pid};

use crate::chroot::NsBoxChroot;
use crate::context::{NsBoxParams, NsBoxResult};
use crate::pipe::NsBoxPipe;
use crate::stage::stage_executable;
use crate::utils::into_c_string;
use crate::NsBoxError;

/// Null device placeholder inside the new root. It is an empty regular file,
/// so reads see EOF and writes land in the file instead of being discarded.
pub const DEV_NULL: &str = "/dev/null";

/// Exit code of the forked child when it fails before or at exec
const SPAWN_FAILURE: i32 = 127;

/// Write the /dev/null placeholder, to be called after chroot
fn setup_dev_null() -> Result<(), NsBoxError> {
  let dev_null = Path::new(DEV_NULL);
  if let Some(dev) = dev_null.parent() {
    DirBuilder::new()
      .recursive(true)
      .mode(0o755)
      .create(dev)
      .map_err(|err| NsBoxError::device_setup(format!("mkdir {}: {}", dev.to_string_lossy(), err)))?;
  }
  OpenOptions::new()
    .write(true)
    .create(true)
    .truncate(true)
    .mode(0o666)
    .open(dev_null)
    .map_err(|err| NsBoxError::device_setup(format!("write {}: {}", DEV_NULL, err)))?;
  debug!("Create placeholder {}", DEV_NULL);
  Ok(())
}

/// Block until the child is gone
fn wait_child(child: Pid) -> Result<NsBoxResult, NsBoxError> {
  loop {
    match waitpid(child, None) {
      Ok(WaitStatus::Exited(pid, status)) => {
        info!("Child process #{}. exited with status {}", pid, status);
        break Ok(NsBoxResult::new(Some(status), None));
      }
      Ok(WaitStatus::Signaled(pid, signal, _)) => {
        info!("Child process #{}. is signaled by {}", pid, signal);
        break Ok(NsBoxResult::new(None, Some(signal)));
      }
      Ok(status) => {
        debug!("Child process changes state: {:?}", status);
      }
      Err(Errno::EINTR) => {}
      Err(errno) => break Err(NsBoxError::spawn(format!("waitpid {}: {}", child, errno))),
    }
  }
}

/// Fork and exec `program` inside the requested namespaces
fn spawn(
  program: &CString,
  args: &[CString],
  params: &NsBoxParams,
) -> Result<NsBoxResult, NsBoxError> {
  let parent_flags = params.parent_flags();
  if !parent_flags.is_empty() {
    unshare(parent_flags)
      .map_err(|errno| NsBoxError::spawn(format!("unshare {:?}: {}", parent_flags, errno)))?;
  }
  let child_flags = params.child_flags();
  let pipe = NsBoxPipe::new()?;

  match unsafe { fork() } {
    Ok(ForkResult::Parent { child, .. }) => {
      let pipe = pipe.read();
      info!("Start running child process (pid = {})", child);

      let result = wait_child(child)?;
      match pipe.read() {
        Some(message) => Err(NsBoxError::spawn(message)),
        None => Ok(result),
      }
    }
    Ok(ForkResult::Child) => {
      let pipe = pipe.write();

      if !child_flags.is_empty() {
        if let Err(errno) = unshare(child_flags) {
          pipe.write(&[b"unshare: ".as_slice(), errno.desc().as_bytes()]);
          unsafe { libc::_exit(SPAWN_FAILURE) };
        }
      }

      let Err(errno) = execv(program, args);
      pipe.write(&[
        b"exec ".as_slice(),
        program.as_bytes(),
        b": ".as_slice(),
        errno.desc().as_bytes(),
      ]);

      unsafe { libc::_exit(SPAWN_FAILURE) };
    }
    Err(errno) => Err(NsBoxError::spawn(format!("fork: {}", errno))),
  }
}

/// Run one launch request, from temp root creation to child exit.
///
/// The new root is removed when this returns, whatever stage failed.
pub fn run(params: &NsBoxParams) -> Result<NsBoxResult, NsBoxError> {
  debug!("Image {} is not applied", params.image());

  let mut chroot = NsBoxChroot::new(params.get_temp_prefix())?;
  let staged = stage_executable(params.command(), chroot.path())?;

  let program = into_c_string(&staged.chroot_path().to_string_lossy())?;
  let args = [params.command()]
    .into_iter()
    .chain(params.arguments().iter())
    .map(|arg| into_c_string(arg))
    .collect::<Result<Vec<CString>, NsBoxError>>()?;

  chroot.enter()?;
  setup_dev_null()?;

  {
    let args = args
      .iter()
      .map(|cstr| cstr.to_string_lossy().into())
      .collect::<Vec<Box<str>>>();
    info!("Start running program {}", args.join(" "));
  }

  spawn(&program, &args, params)
}
