//! Response framing (length + payload).
//!
//! A frame is a 4-byte little-endian `u32` holding the payload length,
//! followed by exactly that many bytes of JSON. Little-endian is what the
//! legacy native 32-bit packing produced on every host the historical
//! callers ran on; it is fixed here rather than taken from the platform.

use std::io::{Read, Write};

use thiserror::Error;

use crate::core::Response;
use crate::error::{Effect, Transience};

pub const FRAME_HEADER_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("response serialization failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("frame too large: max {max_frame_bytes} got {got_bytes}")]
    FrameTooLarge {
        max_frame_bytes: usize,
        got_bytes: usize,
    },
}

impl FrameError {
    pub fn transience(&self) -> Transience {
        match self {
            FrameError::Io(_) => Transience::Unknown,
            FrameError::Encode(_) | FrameError::FrameTooLarge { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            FrameError::Io(_) => Effect::Unknown,
            FrameError::Encode(_) | FrameError::FrameTooLarge { .. } => Effect::None,
        }
    }
}

pub struct FrameReader<R> {
    reader: R,
    max_frame_bytes: usize,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R, max_frame_bytes: usize) -> Self {
        Self {
            reader,
            max_frame_bytes,
        }
    }

    /// Read one frame. `Ok(None)` on a clean end of stream.
    pub fn read_next(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        let mut read = 0usize;
        while read < header.len() {
            let n = self.reader.read(&mut header[read..])?;
            if n == 0 {
                if read == 0 {
                    return Ok(None);
                }
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "frame header truncated",
                )
                .into());
            }
            read += n;
        }

        let length = u32::from_le_bytes(header) as usize;
        if length > self.max_frame_bytes {
            return Err(FrameError::FrameTooLarge {
                max_frame_bytes: self.max_frame_bytes,
                got_bytes: length,
            });
        }

        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "frame body truncated")
            } else {
                err
            }
        })?;
        Ok(Some(body))
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_frame(&mut self, payload: &[u8]) -> Result<usize, FrameError> {
        let frame = encode_frame(payload)?;
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(frame.len())
    }

    /// Serialize and frame a response.
    pub fn write_response(&mut self, response: &Response) -> Result<usize, FrameError> {
        let payload = response.to_json()?;
        self.write_frame(&payload)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        max_frame_bytes: u32::MAX as usize,
        got_bytes: payload.len(),
    })?;

    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChangeRecord, ChangeType, RepoPath};
    use std::io::Cursor;

    #[test]
    fn response_frame_roundtrips_byte_for_byte() {
        let response = Response::bulk(vec![
            Response::review(
                RepoPath::parse("path/0").unwrap(),
                vec![ChangeRecord::new(ChangeType::Missing, "/wc/path/0/0")],
            ),
            Response::path_error("Folder '/wc/path/1/' not exist", RepoPath::parse("/path/1").unwrap()),
        ]);
        let payload = response.to_json().unwrap();

        let mut writer = FrameWriter::new(Vec::new());
        let written = writer.write_response(&response).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(written, FRAME_HEADER_LEN + payload.len());
        assert_eq!(&bytes[..4], &(payload.len() as u32).to_le_bytes());

        let mut reader = FrameReader::new(Cursor::new(bytes), 1 << 20);
        let decoded = reader.read_next().unwrap().unwrap();
        assert_eq!(decoded, payload);
        assert!(reader.read_next().unwrap().is_none());

        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value, response.to_value());
    }

    #[test]
    fn empty_payload_is_a_valid_frame() {
        let frame = encode_frame(b"").unwrap();
        assert_eq!(frame, vec![0, 0, 0, 0]);
        let mut reader = FrameReader::new(Cursor::new(frame), 16);
        assert_eq!(reader.read_next().unwrap().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn reader_rejects_oversize_frame() {
        let frame = encode_frame(&[b'x'; 10]).unwrap();
        let mut reader = FrameReader::new(Cursor::new(frame), 5);
        let err = reader.read_next().unwrap_err();
        assert!(matches!(
            err,
            FrameError::FrameTooLarge {
                max_frame_bytes: 5,
                got_bytes: 10
            }
        ));
    }

    #[test]
    fn reader_reports_truncation() {
        let mut frame = encode_frame(b"hello").unwrap();
        frame.truncate(6);
        let mut reader = FrameReader::new(Cursor::new(frame), 1024);
        let err = reader.read_next().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof));

        let mut reader = FrameReader::new(Cursor::new(vec![1u8, 0]), 1024);
        assert!(matches!(reader.read_next(), Err(FrameError::Io(_))));
    }
}
