use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io;

pub type Fingerprint = [u8; 32];

/// Feeds serialized bytes straight into the hasher (constant memory).
struct HashWriter(Sha256);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// SHA-256 of the canonical JSON form of `value`; `None` if it cannot be
/// serialized.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Option<Fingerprint> {
    let mut writer = HashWriter(Sha256::new());
    serde_json::to_writer(&mut writer, value).ok()?;
    Some(writer.0.finalize().into())
}
