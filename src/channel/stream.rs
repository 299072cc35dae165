//! Text adapters over the child's byte pipes.

use std::io::{BufRead, BufReader, Read, Write};

use crate::encoding::TextEncoding;

use super::ChannelError;

/// Line writer that flushes after every record.
#[derive(Debug)]
pub(crate) struct LineWriter<W: Write> {
    inner: W,
    encoding: TextEncoding,
    buf: Vec<u8>,
}

impl<W: Write> LineWriter<W> {
    pub(crate) fn new(inner: W, encoding: TextEncoding) -> Self {
        Self {
            inner,
            encoding,
            buf: Vec::new(),
        }
    }

    /// Encode `line`, append `\n`, write and flush.
    ///
    /// Encoding happens before any byte reaches the pipe.
    pub(crate) fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        self.buf.clear();
        self.encoding.encode_into(line, &mut self.buf)?;
        self.buf.push(b'\n');
        self.inner.write_all(&self.buf)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Buffered line reader decoding with a fixed encoding.
#[derive(Debug)]
pub(crate) struct LineReader<R: Read> {
    inner: BufReader<R>,
    encoding: TextEncoding,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(inner: R, encoding: TextEncoding) -> Self {
        Self {
            inner: BufReader::new(inner),
            encoding,
        }
    }

    /// Read one record, stripping a single trailing `\n`.
    ///
    /// Returns `Ok(None)` at end of stream when no bytes were read. An
    /// unterminated final record is returned as is.
    pub(crate) fn read_line(&mut self) -> Result<Option<String>, ChannelError> {
        let mut bytes = Vec::new();
        if self.inner.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        Ok(Some(self.encoding.decode(bytes)?))
    }
}
