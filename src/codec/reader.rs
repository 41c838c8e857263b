use bytes::Buf;

use crate::foundation::error::{AnimaError, AnimaResult};

/// Compiled codec version, encoded as `(major, minor, patch)`.
///
/// Every buffer starts with three version bytes. Decoding accepts any
/// buffer whose major version is ≤ ours; a newer major is a hard error
/// since the layout may have changed incompatibly.
pub const CODEC_VERSION: (u8, u8, u8) = (1, 2, 0);

/// Bounds-checked little-endian cursor over a codec payload.
///
/// Every read reports a typed [`AnimaError::Codec`] instead of panicking
/// on truncated input, so a malformed single frame never takes down the
/// scheduler.
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Wrap a raw payload.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes left to consume.
    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, n: usize, what: &str) -> AnimaResult<()> {
        if self.buf.remaining() < n {
            return Err(AnimaError::codec(format!(
                "buffer too short reading {what}: need {n} bytes, have {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    /// Read and validate the 3-byte version header.
    pub fn read_version(&mut self) -> AnimaResult<(u8, u8, u8)> {
        self.ensure(3, "version header")?;
        let version = (self.buf.get_u8(), self.buf.get_u8(), self.buf.get_u8());
        if version.0 > CODEC_VERSION.0 {
            return Err(AnimaError::codec(format!(
                "unsupported major version {} (compiled for {})",
                version.0, CODEC_VERSION.0
            )));
        }
        Ok(version)
    }

    /// Read one byte.
    pub fn read_u8(&mut self, what: &str) -> AnimaResult<u8> {
        self.ensure(1, what)?;
        Ok(self.buf.get_u8())
    }

    /// Read a little-endian u16.
    pub fn read_u16(&mut self, what: &str) -> AnimaResult<u16> {
        self.ensure(2, what)?;
        Ok(self.buf.get_u16_le())
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self, what: &str) -> AnimaResult<u32> {
        self.ensure(4, what)?;
        Ok(self.buf.get_u32_le())
    }

    /// Read a little-endian f32.
    pub fn read_f32(&mut self, what: &str) -> AnimaResult<f32> {
        self.ensure(4, what)?;
        Ok(self.buf.get_f32_le())
    }

    /// Read `count` little-endian f32 values.
    pub fn read_f32_vec(&mut self, count: usize, what: &str) -> AnimaResult<Vec<f32>> {
        self.ensure(count * 4, what)?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.buf.get_f32_le());
        }
        Ok(out)
    }

    /// Read three f32 as a vector.
    pub fn read_vec3(&mut self, what: &str) -> AnimaResult<glam::Vec3> {
        self.ensure(12, what)?;
        Ok(glam::Vec3::new(
            self.buf.get_f32_le(),
            self.buf.get_f32_le(),
            self.buf.get_f32_le(),
        ))
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize, what: &str) -> AnimaResult<Vec<u8>> {
        self.ensure(len, what)?;
        let mut out = vec![0u8; len];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// Read a u16-length-prefixed UTF-8 string.
    pub fn read_string(&mut self, what: &str) -> AnimaResult<String> {
        let len = usize::from(self.read_u16(what)?);
        let bytes = self.read_bytes(len, what)?;
        String::from_utf8(bytes)
            .map_err(|e| AnimaError::codec(format!("{what} is not valid UTF-8: {e}")))
    }
}
