//! Streaming copy from a torrent file reader into the library.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};

use super::error::PlacerError;

/// Streams `reader` into `destination`, creating or truncating the file.
///
/// Returns the number of bytes written. The destination is left as-is on
/// failure.
pub async fn transfer<R>(
    reader: R,
    destination: &Path,
    buffer_size: usize,
) -> Result<u64, PlacerError>
where
    R: AsyncRead + Unpin,
{
    let dest_file = File::create(destination)
        .await
        .map_err(|e| PlacerError::write_failed(destination.to_path_buf(), e))?;

    let mut reader = BufReader::with_capacity(buffer_size, reader);
    let mut writer = BufWriter::with_capacity(buffer_size, dest_file);

    let mut total_bytes = 0u64;
    let mut buffer = vec![0u8; buffer_size];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| PlacerError::read_failed(destination.to_path_buf(), e))?;

        if bytes_read == 0 {
            break;
        }

        writer
            .write_all(&buffer[..bytes_read])
            .await
            .map_err(|e| PlacerError::write_failed(destination.to_path_buf(), e))?;

        total_bytes += bytes_read as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| PlacerError::write_failed(destination.to_path_buf(), e))?;

    Ok(total_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    /// Yields some bytes and then errors.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "peer gone")));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_transfer_writes_all_bytes() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("movie.mkv");
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let written = transfer(Cursor::new(content.clone()), &dest, 1024)
            .await
            .unwrap();

        assert_eq!(written, content.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn test_transfer_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("movie.mkv");
        std::fs::write(&dest, b"old content that is longer").unwrap();

        transfer(Cursor::new(b"new".to_vec()), &dest, 64)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_transfer_create_failure() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("taken");
        std::fs::create_dir(&dest).unwrap();

        let err = transfer(Cursor::new(b"data".to_vec()), &dest, 64)
            .await
            .unwrap_err();
        assert!(matches!(err, PlacerError::WriteFailed { .. }));
    }

    #[tokio::test]
    async fn test_transfer_read_failure_keeps_partial_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("movie.mkv");

        let err = transfer(BrokenReader { sent: false }, &dest, 64)
            .await
            .unwrap_err();

        assert!(matches!(err, PlacerError::ReadFailed { .. }));
        assert!(dest.exists());
    }
}
