//! Pipe CLI Demo
//!
//! Pushes stdin lines through a pipe with a tiny threshold, so the writer
//! and the reader take turns waiting on each other. Run with
//! `RUST_LOG=debug` to see the suspensions.

use std::convert::Infallible;

use pcmpipe::{pipe_with_config, PipeConfig, Reader, Writer};
use tokio::io::AsyncBufReadExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 8 });

    // Both ends run in this one task
    let written = tokio::select! {
        result = write_lines(&mut writer) => result?,
        never = read_forever(&mut reader) => match never {},
    };

    // The writer is done; show what the reader hasn't picked up yet
    let mut buf = [0u8; 4];
    while reader.buffered() > 0 {
        let n = reader.read(&mut buf).await;
        print_chunk(&buf[..n]);
    }

    println!("Writer wrote {written} bytes");
    Ok(())
}

async fn write_lines(writer: &mut Writer) -> std::io::Result<usize> {
    println!("Enter text (empty line to quit):");

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    let mut total = 0;
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        total += writer.write(trimmed.as_bytes()).await;
    }

    writer.close();
    Ok(total)
}

async fn read_forever(reader: &mut Reader) -> Infallible {
    let mut buf = [0u8; 4];
    loop {
        let n = reader.read(&mut buf).await;
        // read returns 1..=buf.len() for a non-empty buf
        #[allow(clippy::indexing_slicing)]
        print_chunk(&buf[..n]);
    }
}

fn print_chunk(chunk: &[u8]) {
    println!("(reader): {}", String::from_utf8_lossy(chunk));
}
