use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    sync::Arc,
};

use parking_lot::Mutex;

/// Removes ANSI escape sequences so the log file stays plain text.
pub fn strip_ansi_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Append-only log file that is trimmed back to its newest `max_lines` lines
/// every time roughly a tenth of that budget has been written.
#[derive(Clone)]
pub(crate) struct CircularFileWriter {
    path: PathBuf,
    max_lines: u32,
    state: Arc<Mutex<WriterState>>,
}

struct WriterState {
    file: Option<File>,
    lines_since_prune: u32,
}

impl CircularFileWriter {
    pub fn new(path: impl Into<PathBuf>, max_lines: u32) -> Self {
        Self {
            path: path.into(),
            max_lines: max_lines.max(1),
            state: Arc::new(Mutex::new(WriterState {
                file: None,
                lines_since_prune: 0,
            })),
        }
    }

    fn prune_threshold(&self) -> u32 {
        (self.max_lines / 10).max(50)
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn prune(&self) -> io::Result<()> {
        let lines: Vec<String> = match File::open(&self.path) {
            Ok(file) => BufReader::new(file).lines().collect::<Result<_, _>>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let keep = self.max_lines as usize;
        if lines.len() > keep {
            let mut file = File::create(&self.path)?;
            for line in &lines[lines.len() - keep..] {
                writeln!(file, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl io::Write for CircularFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.file.is_none() {
            state.file = Some(self.open()?);
        }
        if let Some(file) = state.file.as_mut() {
            file.write_all(buf)?;
        }

        state.lines_since_prune += buf.iter().filter(|&&b| b == b'\n').count() as u32;
        if state.lines_since_prune >= self.prune_threshold() {
            // Reopen after pruning, the file was truncated underneath us.
            state.file = None;
            if let Err(e) = self.prune() {
                eprintln!("Failed to prune log file: {}", e);
            }
            state.lines_since_prune = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CircularFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi_escapes("\x1b[32mINFO\x1b[0m ok"), "INFO ok");
    }

    #[test]
    fn keeps_only_newest_lines() {
        let path = std::env::temp_dir().join(format!("plexporter-writer-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut writer = CircularFileWriter::new(&path, 20);

        for i in 0..50 {
            writeln!(writer, "line {}", i).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines.first(), Some(&"line 30"));
        assert_eq!(lines.last(), Some(&"line 49"));
        let _ = std::fs::remove_file(&path);
    }
}
