//! Bounded read of the client's solution line.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Hard cap on bytes read while waiting for the solution line.
pub const MAX_SOLUTION_BYTES: usize = 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum SolutionRead {
    /// A newline-terminated line (newline removed) and whatever the client
    /// sent after it in the same reads.
    Line { line: String, pipelined: Vec<u8> },
    /// The cap was reached without a newline.
    TooLong,
    /// The peer closed before sending a newline.
    Disconnected,
    /// The optional deadline passed.
    TimedOut,
}

/// Read until the first newline, never buffering more than `MAX_SOLUTION_BYTES`.
pub async fn read_solution<R>(reader: &mut R, timeout: Option<Duration>) -> io::Result<SolutionRead>
where
    R: AsyncRead + Unpin,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, read_line(reader)).await {
            Ok(read) => read,
            Err(_) => Ok(SolutionRead::TimedOut),
        },
        None => read_line(reader).await,
    }
}

async fn read_line<R>(reader: &mut R) -> io::Result<SolutionRead>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; MAX_SOLUTION_BYTES];
    let mut filled = 0;

    while filled < MAX_SOLUTION_BYTES {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Ok(SolutionRead::Disconnected);
        }

        if let Some(pos) = buf[filled..filled + n].iter().position(|&b| b == b'\n') {
            let end = filled + pos;
            return Ok(SolutionRead::Line {
                line: String::from_utf8_lossy(&buf[..end]).into_owned(),
                pipelined: buf[end + 1..filled + n].to_vec(),
            });
        }
        filled += n;
    }

    Ok(SolutionRead::TooLong)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn splits_line_and_pipelined_bytes() {
        let mut input: &[u8] = b"s.AAAA\nhello backend";
        let read = read_solution(&mut input, None).await.unwrap();
        assert_eq!(
            read,
            SolutionRead::Line {
                line: "s.AAAA".into(),
                pipelined: b"hello backend".to_vec(),
            }
        );
    }

    #[tokio::test]
    async fn eof_before_newline() {
        let mut input: &[u8] = b"s.AAAA";
        assert_eq!(
            read_solution(&mut input, None).await.unwrap(),
            SolutionRead::Disconnected
        );
    }

    #[tokio::test]
    async fn cap_without_newline() {
        let data = vec![b'A'; MAX_SOLUTION_BYTES + 10];
        let mut input: &[u8] = &data;
        assert_eq!(
            read_solution(&mut input, None).await.unwrap(),
            SolutionRead::TooLong
        );
    }

    #[tokio::test]
    async fn newline_as_last_allowed_byte() {
        let mut data = vec![b'A'; MAX_SOLUTION_BYTES - 1];
        data.push(b'\n');
        data.extend_from_slice(b"beyond the cap");
        let mut input: &[u8] = &data;
        match read_solution(&mut input, None).await.unwrap() {
            SolutionRead::Line { line, pipelined } => {
                assert_eq!(line.len(), MAX_SOLUTION_BYTES - 1);
                assert!(pipelined.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn line_split_across_reads() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            client.write_all(b"s.AA").await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(b"AA\r\nx").await.unwrap();
            client
        });

        let read = read_solution(&mut server, None).await.unwrap();
        assert_eq!(
            read,
            SolutionRead::Line {
                line: "s.AAAA\r".into(),
                pipelined: b"x".to_vec(),
            }
        );
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (_client, mut server) = tokio::io::duplex(64);
        let read = read_solution(&mut server, Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(read, SolutionRead::TimedOut);
    }
}
