const INDENT: &str = "    ";

/// Line-oriented buffer for generated source.
pub struct CodeWriter {
    buf: String,
    base: usize,
}

impl CodeWriter {
    pub fn new(base: usize) -> Self {
        Self {
            buf: String::new(),
            base,
        }
    }

    /// Appends `text` at `level` levels past the base indentation.
    pub fn line(&mut self, level: usize, text: impl AsRef<str>) {
        for _ in 0..self.base + level {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Quotes `s` as a C string literal body.
pub fn escape_c(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
