use std::ffi::CString;

use flexi_logger::DeferredNow;
use log::Record;

use crate::NsBoxError;

/// A logline-formatter that produces log lines like <br>
/// ```[datetime: INFO] Create new root: /tmp/chrootXXXX```
pub fn default_format(
  w: &mut dyn std::io::Write,
  now: &mut DeferredNow,
  record: &Record,
) -> Result<(), std::io::Error> {
  write!(
    w,
    "[{}: {:5}] {}",
    now.format("%Y-%m-%d %H:%M:%S"),
    record.level(),
    record.args()
  )
}

pub(crate) fn into_c_string(string: &str) -> Result<CString, NsBoxError> {
  CString::new(string)
    .map_err(|_| NsBoxError::spawn(format!("argument contains a NUL byte: {:?}", string)))
}
