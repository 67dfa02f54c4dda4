//! Line buffered console output.
//!
//! A sweep is written as many small segments. Collecting them and handing the
//! console one complete line at a time keeps log records from landing in the
//! middle of a line of counts.

use core::fmt::{self, Write};

use heapless::String;

pub struct LineWriter<W: Write, const N: usize> {
    inner: W,
    line: String<N>,
}

impl<W: Write, const N: usize> LineWriter<W, N> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line: String::new(),
        }
    }

    /// Write out whatever has been buffered so far
    pub fn flush(&mut self) -> fmt::Result {
        let result = self.inner.write_str(self.line.as_str());
        self.line.clear();
        result
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }

    fn buffer(&mut self, s: &str) -> fmt::Result {
        if self.line.push_str(s).is_ok() {
            return Ok(());
        }
        // Full: make room, and pass through anything that can never fit
        self.flush()?;
        if self.line.push_str(s).is_err() {
            self.inner.write_str(s)?;
        }
        Ok(())
    }
}

impl<W: Write, const N: usize> Write for LineWriter<W, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut rest = s;
        while let Some(end) = rest.find('\n') {
            self.buffer(&rest[..=end])?;
            self.flush()?;
            rest = &rest[end + 1..];
        }
        if !rest.is_empty() {
            self.buffer(rest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    /// Records each write the console receives
    #[derive(Default)]
    struct Chunks(Vec<std::string::String>);

    impl Write for Chunks {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.push(s.to_owned());
            Ok(())
        }
    }

    #[test]
    fn test_flushes_whole_lines() {
        let mut w: LineWriter<Chunks, 64> = LineWriter::new(Chunks::default());
        write!(w, "T0:[{:4}] ", 5).unwrap();
        write!(w, "T1:[{:4}] ", 6).unwrap();
        assert!(w.inner().0.is_empty(), "Nothing should be written before the newline");

        w.write_char('\n').unwrap();
        assert_eq!(w.inner().0, vec!["T0:[   5] T1:[   6] \n"]);
    }

    #[test]
    fn test_header_splits_on_newlines() {
        let mut w: LineWriter<Chunks, 64> = LineWriter::new(Chunks::default());
        w.write_str("first\nsecond\n\nrest").unwrap();
        assert_eq!(w.inner().0, vec!["first\n", "second\n", "\n"]);

        w.flush().unwrap();
        assert_eq!(w.inner().0.last().unwrap(), "rest");
    }

    #[test]
    fn test_overflow_keeps_order() {
        let mut w: LineWriter<Chunks, 8> = LineWriter::new(Chunks::default());
        w.write_str("abcdef").unwrap();
        w.write_str("ghij").unwrap();
        w.write_str("0123456789abc\n").unwrap();

        let joined: std::string::String = w.inner().0.concat();
        assert_eq!(joined, "abcdefghij0123456789abc\n");
    }
}
