//! Bounded line reading over any byte source.
//!
//! Mirrors the console file layer: `\r` is consumed but never written,
//! `\n` terminates the line, and a line longer than the buffer limit is split
//! into several physical lines the way a bounded `fgets` would split it.

use std::io::{self, BufRead, BufReader, Read};

/// Maximum number of bytes returned for one physical line.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Byte accounting for one `read_line` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRead {
    /// Bytes taken from the source, including `\r` and `\n`.
    pub consumed: u64,
    /// Bytes placed in the caller's buffer.
    pub written: u64,
}

impl LineRead {
    pub fn is_eof(&self) -> bool {
        self.consumed == 0
    }
}

pub struct LineReader<R> {
    inner: BufReader<R>,
    max_len: usize,
    total_consumed: u64,
}

impl<R: Read> LineReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_max_len(source, MAX_LINE_LENGTH)
    }

    pub fn with_max_len(source: R, max_len: usize) -> Self {
        Self {
            inner: BufReader::new(source),
            max_len: max_len.max(1),
            total_consumed: 0,
        }
    }

    /// Total bytes consumed from the source so far.
    pub fn total_consumed(&self) -> u64 {
        self.total_consumed
    }

    /// Read the next line into `buf` (cleared first), without the line
    /// terminator. Returns zero consumed bytes at end of input.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<LineRead> {
        buf.clear();
        let mut read = LineRead::default();

        loop {
            let available = match self.inner.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }

            let mut used = 0;
            let mut done = false;
            for &b in available {
                if b != b'\r' && b != b'\n' && buf.len() >= self.max_len {
                    done = true;
                    break;
                }
                used += 1;
                match b {
                    b'\r' => {}
                    b'\n' => {
                        done = true;
                        break;
                    }
                    _ => buf.push(b),
                }
            }
            self.inner.consume(used);
            read.consumed += used as u64;
            if done {
                break;
            }
        }

        read.written = buf.len() as u64;
        self.total_consumed += read.consumed;
        Ok(read)
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.read_line(&mut buf) {
            Ok(read) if read.is_eof() => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&buf).into_owned())),
            Err(e) => Some(Err(e)),
        }
    }
}
