//! Content sniffing - classify uploads by their leading bytes.
//!
//! The declared content type of an upload is advisory. What gets stored, and how it is
//! decoded later, is decided here from magic-byte signatures.

use photowall_core::models::ImageKind;
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, Chain};

/// Number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

/// Buffers shorter than this are never classified.
const MIN_SNIFF_LEN: usize = 8;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Classify a content prefix.
pub fn sniff(data: &[u8]) -> ImageKind {
    if data.len() < MIN_SNIFF_LEN {
        return ImageKind::Unknown;
    }

    if data.starts_with(&JPEG_MAGIC) {
        return ImageKind::Jpeg;
    }

    if data.starts_with(&PNG_MAGIC) {
        return ImageKind::Png;
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return ImageKind::Gif;
    }

    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return ImageKind::Webp;
    }

    tracing::debug!(
        "Unrecognized image content, first 8 bytes: {:02X?}",
        &data[..MIN_SNIFF_LEN]
    );
    ImageKind::Unknown
}

/// Read up to `SNIFF_LEN` bytes. Short reads are retried until the limit or EOF.
pub async fn read_prefix<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Sniff a stream without losing the bytes consumed to do it.
///
/// The returned reader yields the inspected prefix followed by the rest of the stream.
pub async fn sniff_reader<R>(mut reader: R) -> io::Result<(ImageKind, Chain<Cursor<Vec<u8>>, R>)>
where
    R: AsyncRead + Unpin,
{
    let prefix = read_prefix(&mut reader).await?;
    let kind = sniff(&prefix);
    Ok((kind, Cursor::new(prefix).chain(reader)))
}
