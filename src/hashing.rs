//! Fan-out sink: every byte accepted by the inner writer is also fed to a
//! CRC-32 (IEEE) accumulator, in the same order.

use std::io::{self, Write};

use crc32fast::Hasher as Crc32Hasher;

pub struct HashingWriter<W> {
    inner: W,
    crc: Crc32Hasher,
    bytes: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, crc: Crc32Hasher::new(), bytes: 0 }
    }

    /// Returns the inner writer, the final checksum and the byte count.
    pub fn into_parts(self) -> (W, u32, u64) {
        (self.inner, self.crc.finalize(), self.bytes)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        // hash only what the inner writer took; the caller retries the rest
        self.crc.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
