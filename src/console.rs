use super::*;

/// Bounded buffer of human-readable output lines.
///
/// When echo is on, every line is also printed to stdout as it arrives.
#[derive(Debug, Clone)]
pub struct Console {
    lines: VecDeque<String>,
    limit: usize,
    echo: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            lines: VecDeque::new(),
            limit: 10_000,
            echo: false,
        }
    }
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn line(&mut self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        if self.lines.len() >= self.limit {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn take_lines(&mut self) -> Vec<String> {
        self.lines.drain(..).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    pub fn set_echo(&mut self, enabled: bool) {
        self.echo = enabled;
    }

    pub fn set_limit(&mut self, max_lines: usize) -> Result<()> {
        if max_lines == 0 {
            return Err(Error::InvalidConfig(
                "console limit requires at least 1 line".into(),
            ));
        }
        self.limit = max_lines;
        while self.lines.len() > self.limit {
            self.lines.pop_front();
        }
        Ok(())
    }
}
