use colored::Colorize;
use std::io::{self, IsTerminal, Stdout, Write};

/// Column the `[ PASS ]`/`[ FAIL ]` tags start at
pub const STATUS_WIDTH: usize = 65;

/// Fixed-width test report lines
pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl Console<Stdout> {
    pub fn stdout() -> Self {
        let color = io::stdout().is_terminal();
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Start a check line; finish it with `pass` or `fail`.
    pub fn status(&mut self, message: &str) -> io::Result<()> {
        write!(self.out, "{}", pad_status(message))?;
        self.out.flush()
    }

    pub fn pass(&mut self) -> io::Result<()> {
        let tag = if self.color {
            "[ PASS ]".green().to_string()
        } else {
            "[ PASS ]".to_string()
        };
        writeln!(self.out, "{tag}")
    }

    pub fn fail(&mut self) -> io::Result<()> {
        let tag = if self.color {
            "[ FAIL ]".red().to_string()
        } else {
            "[ FAIL ]".to_string()
        };
        writeln!(self.out, "{tag}")
    }

    /// `pass` or `fail` depending on `ok`
    pub fn result(&mut self, ok: bool) -> io::Result<()> {
        if ok { self.pass() } else { self.fail() }
    }

    pub fn line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Left-justify to `STATUS_WIDTH` characters; longer messages are left as is.
pub fn pad_status(message: &str) -> String {
    format!("{message:<width$}", width = STATUS_WIDTH)
}
