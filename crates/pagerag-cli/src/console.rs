use std::io::{BufRead, Cursor, Stderr, StdinLock, Stdout, Write};

/// Line input plus the two output streams a command talks to.
pub trait Console {
    fn input(&mut self) -> &mut dyn BufRead;
    fn out(&mut self) -> &mut dyn Write;
    fn err(&mut self) -> &mut dyn Write;
}

/// The process's stdin, stdout and stderr.
pub struct StdConsole {
    input: StdinLock<'static>,
    out: Stdout,
    err: Stderr,
}

impl StdConsole {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: std::io::stdin().lock(),
            out: std::io::stdout(),
            err: std::io::stderr(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for StdConsole {
    fn input(&mut self) -> &mut dyn BufRead {
        &mut self.input
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn err(&mut self) -> &mut dyn Write {
        &mut self.err
    }
}

/// Canned input and captured output, for tests.
#[derive(Default)]
pub struct BufferedConsole {
    input: Cursor<Vec<u8>>,
    out: Vec<u8>,
    err: Vec<u8>,
}

impl BufferedConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_input(data: &str) -> Self {
        Self {
            input: Cursor::new(data.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    pub fn out_text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn err_text(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }
}

impl Console for BufferedConsole {
    fn input(&mut self) -> &mut dyn BufRead {
        &mut self.input
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn err(&mut self) -> &mut dyn Write {
        &mut self.err
    }
}
