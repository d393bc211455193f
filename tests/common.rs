#![allow(dead_code)]

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Once;

use flexi_logger::Logger;
use nix::unistd::Uid;

static INIT: Once = Once::new();

pub fn setup() {
  INIT.call_once(|| {
    Logger::try_with_str("nsbox=debug,info")
      .unwrap()
      .start()
      .unwrap();
  });
}

pub fn is_root() -> bool {
  Uid::effective().is_root()
}

/// Compile the multi-call fixture tool statically into `dir/name`, so it runs
/// without the host's shared libraries
pub fn static_tool(dir: &Path, name: &str) -> PathBuf {
  let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/tool/tool.c");
  let executable = dir.join(name);

  let status = Command::new(env::var("CC").unwrap_or("cc".to_string()))
    .arg("-static")
    .arg("-O2")
    .arg(&source)
    .arg("-o")
    .arg(&executable)
    .status()
    .expect("C compiler should be available");
  assert!(status.success(), "Compile {} should be ok", source.to_string_lossy());

  executable
}
