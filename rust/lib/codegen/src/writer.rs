//! Indentation-tracking writer for emitted Rust source.

use std::fmt::{self, Write};

const INDENT: &str = "    ";

/// Line-oriented writer. Blocks are written through closures so the indent
/// level always unwinds, even when the body returns early with an error.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    level: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indent. Empty text writes a bare newline.
    pub fn line(&mut self, text: &str) -> fmt::Result {
        if !text.is_empty() {
            for _ in 0..self.level {
                self.out.write_str(INDENT)?;
            }
            self.out.write_str(text)?;
        }
        self.out.write_char('\n')
    }

    pub fn line_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.line(&args.to_string())
    }

    pub fn blank(&mut self) -> fmt::Result {
        self.out.write_char('\n')
    }

    /// `// text`
    pub fn comment(&mut self, text: &str) -> fmt::Result {
        self.line_fmt(format_args!("// {}", text))
    }

    /// Indent the lines written by `body` one level.
    pub fn indented<F>(&mut self, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.level += 1;
        let result = body(self);
        self.level -= 1;
        result
    }

    /// `header {` ... `}`
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.delimited(&format!("{} {{", header), "}", body)
    }

    /// `open` ... `close`, for struct literals, `vec![` lists and blocks that
    /// end with `};` or `},`.
    pub fn delimited<F>(&mut self, open: &str, close: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.line(open)?;
        self.indented(body)?;
        self.line(close)
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

/// `cw_line!(w, "fn {}()", name)`
#[macro_export]
macro_rules! cw_line {
    ($writer:expr, $($arg:tt)*) => {
        $writer.line_fmt(format_args!($($arg)*))
    };
}
