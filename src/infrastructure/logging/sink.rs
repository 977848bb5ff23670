//! Daily rotating file sink with a link to the current file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

pub const LOG_FILE_SUFFIX: &str = "log";

/// Daily files kept on disk, one week.
pub const RETAINED_FILES: usize = 7;

/// Name of the file written on `date`, e.g. `2024-03-09.log`.
///
/// Dates are UTC, matching the rotation boundary of the appender.
pub fn file_name_for(date: NaiveDate) -> String {
    format!("{}.{}", date.format("%Y-%m-%d"), LOG_FILE_SUFFIX)
}

/// A [`RollingFileAppender`] that keeps a symlink pointed at today's file.
///
/// The link is refreshed on the first write after each date change, so it
/// follows the appender across rotations.
pub struct RotatingFile {
    appender: RollingFileAppender,
    link: Option<PathBuf>,
    linked_on: Option<NaiveDate>,
}

impl RotatingFile {
    /// Opens the appender in `dir`. An empty `link_name` disables the link.
    pub fn new(dir: &Path, link_name: &str) -> Result<Self, InitError> {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(RETAINED_FILES)
            .build(dir)?;

        let link = (!link_name.is_empty()).then(|| dir.join(link_name));

        Ok(Self {
            appender,
            link,
            linked_on: None,
        })
    }

    fn refresh_link(&mut self) {
        let Some(link) = &self.link else {
            return;
        };

        let today = Utc::now().date_naive();
        if self.linked_on == Some(today) {
            return;
        }
        self.linked_on = Some(today);

        if let Err(e) = point_link(link, &file_name_for(today)) {
            println!("update log link {} failed: {}", link.display(), e);
        }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.appender.write(buf)?;
        self.refresh_link();
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.appender.flush()
    }
}

/// Replaces `link` with a relative symlink to `target` in the same directory.
#[cfg(unix)]
fn point_link(link: &Path, target: &str) -> io::Result<()> {
    match fs::symlink_metadata(link) {
        Ok(_) => fs::remove_file(link)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn point_link(_link: &Path, _target: &str) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_for_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(file_name_for(date), "2024-03-09.log");
    }

    #[cfg(unix)]
    #[test]
    fn test_point_link_replaces_existing_link() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("latest_log");

        point_link(&link, "2024-03-08.log").unwrap();
        point_link(&link, "2024-03-09.log").unwrap();

        assert_eq!(
            fs::read_link(&link).unwrap(),
            PathBuf::from("2024-03-09.log")
        );
    }
}
