use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use log::info;

use nsbox::{lookup, stage_executable, NsBoxChroot, NsBoxError};

mod common;

fn current_exe() -> PathBuf {
  env::current_exe().unwrap()
}

#[test]
fn it_should_stage_a_byte_identical_copy() {
  common::setup();

  let chroot = NsBoxChroot::new("stage").unwrap();
  let source = current_exe();
  let staged = stage_executable(source.to_str().unwrap(), chroot.path()).unwrap();

  let name = source.file_name().unwrap().to_string_lossy().to_string();
  assert_eq!(staged.name(), &name);
  assert_eq!(staged.source(), &source);
  assert_eq!(staged.chroot_path(), PathBuf::from("/").join(&name));

  let copy = chroot.path().join(&name);
  info!("Staged {} -> {}", source.to_string_lossy(), copy.to_string_lossy());
  assert_eq!(fs::read(&source).unwrap(), fs::read(&copy).unwrap());

  let mode = fs::metadata(&copy).unwrap().permissions().mode();
  assert_ne!(mode & 0o111, 0, "staged copy should stay executable");

  let entries = fs::read_dir(chroot.path()).unwrap().count();
  assert_eq!(entries, 1);
}

#[test]
fn it_should_resolve_command_through_path() {
  common::setup();

  let path = lookup("sh").unwrap();
  assert!(path.is_absolute());
  assert!(path.is_file());
}

#[test]
fn it_should_report_lookup_error_for_unknown_command() {
  common::setup();

  let chroot = NsBoxChroot::new("stage").unwrap();
  let result = stage_executable("nsbox-definitely-missing-command", chroot.path());
  match result {
    Err(NsBoxError::Lookup(message)) => {
      assert!(message.contains("nsbox-definitely-missing-command"));
    }
    other => panic!("expected lookup error, got {:?}", other.map(|s| s.name().clone())),
  }
  assert_eq!(fs::read_dir(chroot.path()).unwrap().count(), 0);
}

#[test]
fn it_should_report_copy_error_when_root_is_missing() {
  common::setup();

  let chroot = NsBoxChroot::new("stage").unwrap();
  let missing = chroot.path().join("missing");
  let source = current_exe();
  let result = stage_executable(source.to_str().unwrap(), &missing);
  assert!(matches!(result, Err(NsBoxError::Copy(_))));
}

#[test]
fn it_should_remove_chroot_on_drop() {
  common::setup();

  let chroot = NsBoxChroot::new("drop").unwrap();
  let path = chroot.path().to_path_buf();
  assert!(path.is_dir());
  assert!(path.starts_with(env::temp_dir()));
  assert!(!chroot.entered());

  fs::create_dir_all(path.join("dev")).unwrap();
  fs::write(path.join("dev").join("null"), b"").unwrap();
  stage_executable(current_exe().to_str().unwrap(), &path).unwrap();

  drop(chroot);
  assert!(!path.exists());
}

#[test]
fn it_should_create_distinct_chroots() {
  common::setup();

  let chroots = (0..8)
    .map(|_| NsBoxChroot::new("chroot").unwrap())
    .collect::<Vec<NsBoxChroot>>();
  let mut paths = chroots
    .iter()
    .map(|c| c.path().to_path_buf())
    .collect::<Vec<PathBuf>>();
  paths.sort();
  paths.dedup();
  assert_eq!(paths.len(), chroots.len());
}
