//! Log output setup
//!
//! env_logger writes to stderr and, when a log file is configured, to that
//! file as well. The file rotates at [`MAX_LOG_BYTES`] keeping
//! [`LOG_BACKUPS`] old copies (`junbot.log.1` is the newest).
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.2.0

use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use super::config::LoggingSettings;

pub const MAX_LOG_BYTES: u64 = 1_000_000;
pub const LOG_BACKUPS: usize = 3;

/// Append-only file that rolls over to `<path>.1`, `<path>.2`, ... when full
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = File::create(&self.path)?;
        } else {
            for index in (1..self.backups).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Writes every buffer to both sinks
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.level));

    if let Some(path) = &settings.file {
        let file = RotatingFile::open(path, MAX_LOG_BYTES, LOG_BACKUPS)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path, e))?;
        builder.target(env_logger::Target::Pipe(Box::new(Tee::new(io::stderr(), file))));
    }

    builder.init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("junbot-log-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn test_tee_writes_both_sinks() {
        let mut tee = Tee::new(Vec::new(), Vec::new());
        writeln!(tee, "hello").unwrap();
        tee.flush().unwrap();

        assert_eq!(tee.first, b"hello\n");
        assert_eq!(tee.second, b"hello\n");
    }

    #[test]
    fn test_rotation_keeps_backups() {
        let dir = scratch_dir();
        let path = dir.join("junbot.log");
        let mut file = RotatingFile::open(&path, 10, 2).unwrap();

        for line in ["first\n", "second\n", "third\n", "fourth\n"] {
            file.write_all(line.as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert_eq!(read(&path), "fourth\n");
        assert_eq!(read(&dir.join("junbot.log.1")), "third\n");
        assert_eq!(read(&dir.join("junbot.log.2")), "second\n");
        assert!(!dir.join("junbot.log.3").exists());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_reopen_appends_and_counts_existing_size() {
        let dir = scratch_dir();
        let path = dir.join("bot.log");
        fs::write(&path, "0123456789").unwrap();

        let mut file = RotatingFile::open(&path, 12, 1).unwrap();
        file.write_all(b"abc\n").unwrap();
        file.flush().unwrap();

        assert_eq!(read(&dir.join("bot.log.1")), "0123456789");
        assert_eq!(read(&path), "abc\n");

        fs::remove_dir_all(dir).unwrap();
    }
}
