use std::pin::pin;

use futures::poll;
use pcmpipe::{pipe, pipe_with_config, PipeConfig, PIPE_BUF_SIZE};

#[tokio::test]
async fn test_write_read() {
    let (mut reader, mut writer) = pipe();

    // Write some data
    let n = writer.write(b"Hello").await;
    assert_eq!(n, 5);

    // Read it back
    let mut buf = [0u8; 10];
    let n = reader.read(&mut buf).await;
    assert_eq!(n, 5);
    assert_eq!(&buf[..n], b"Hello");
}

#[tokio::test]
async fn test_multiple_write_read_cycles() {
    let (mut reader, mut writer) = pipe();
    let mut buf = [0u8; 20];

    // Cycle 1: write-write-read
    assert_eq!(writer.write(b"Hello").await, 5);
    assert_eq!(writer.write(b" ").await, 1);
    assert_eq!(writer.write(b"World").await, 5);

    let n = reader.read(&mut buf).await;
    assert_eq!(n, 11);
    assert_eq!(&buf[..n], b"Hello World");

    // Cycle 2: write-write-read
    assert_eq!(writer.write(b"Foo").await, 3);
    assert_eq!(writer.write(b"Bar").await, 3);

    let n = reader.read(&mut buf).await;
    assert_eq!(n, 6);
    assert_eq!(&buf[..n], b"FooBar");

    // Cycle 3: single write, partial read
    assert_eq!(writer.write(b"LongMessage").await, 11);

    let mut small_buf = [0u8; 5];
    let n = reader.read(&mut small_buf).await;
    assert_eq!(n, 5);
    assert_eq!(&small_buf[..], b"LongM");

    // Read remainder
    let n = reader.read(&mut buf).await;
    assert_eq!(n, 6);
    assert_eq!(&buf[..n], b"essage");
    assert_eq!(reader.buffered(), 0);
}

#[tokio::test]
async fn test_default_threshold_scenario() {
    let (mut reader, mut writer) = pipe();
    assert_eq!(writer.threshold(), PIPE_BUF_SIZE);

    // The pipe is empty, so the write doesn't wait
    let payload = vec![0xABu8; 5000];
    let n = writer.write(&payload).await;
    assert_eq!(n, 5000);
    assert_eq!(reader.buffered(), 5000);

    let mut buf = vec![0u8; 4096];
    let n = reader.read(&mut buf).await;
    assert_eq!(n, 4096);
    assert!(buf.iter().all(|&b| b == 0xAB));

    let n = reader.read(&mut buf).await;
    assert_eq!(n, 904);
    assert!(buf[..n].iter().all(|&b| b == 0xAB));
    assert_eq!(reader.buffered(), 0);
}

#[tokio::test]
async fn test_single_write_may_overshoot_threshold() {
    let (reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 16 });

    let n = writer.write(&[7u8; 100]).await;
    assert_eq!(n, 100);
    assert_eq!(reader.buffered(), 100);
}

#[tokio::test]
async fn test_writer_waits_while_above_threshold() {
    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 16 });

    // Goes above the threshold without waiting: the pipe was empty
    assert_eq!(writer.write(&[1u8; 17]).await, 17);

    let second = [2u8; 17];
    let mut pending_write = pin!(writer.write(&second));
    assert!(poll!(pending_write.as_mut()).is_pending());
    assert!(poll!(pending_write.as_mut()).is_pending());

    // The second append is not observed yet
    assert_eq!(reader.buffered(), 17);

    // Drain to at-or-below the threshold; this wakes the writer
    let mut buf = [0u8; 16];
    assert_eq!(reader.read(&mut buf).await, 16);
    assert_eq!(reader.buffered(), 1);

    assert_eq!(pending_write.await, 17);
    assert_eq!(reader.buffered(), 18);

    let mut rest = [0u8; 32];
    let n = reader.read(&mut rest).await;
    assert_eq!(n, 18);
    assert_eq!(rest[0], 1);
    assert!(rest[1..n].iter().all(|&b| b == 2));
}

#[tokio::test]
async fn test_writer_keeps_waiting_until_at_threshold() {
    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 16 });
    assert_eq!(writer.write(&[0u8; 40]).await, 40);

    let mut pending_write = pin!(writer.write(b"tail"));
    assert!(poll!(pending_write.as_mut()).is_pending());

    // Woken, but 30 bytes are still above the threshold
    let mut buf = [0u8; 10];
    assert_eq!(reader.read(&mut buf).await, 10);
    assert!(poll!(pending_write.as_mut()).is_pending());
    assert_eq!(reader.buffered(), 30);

    // Exactly at the threshold is enough
    let mut buf = [0u8; 14];
    assert_eq!(reader.read(&mut buf).await, 14);
    assert_eq!(reader.buffered(), 16);
    assert_eq!(pending_write.await, 4);
    assert_eq!(reader.buffered(), 20);
}

#[tokio::test]
async fn test_zero_threshold() {
    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 0 });
    assert_eq!(writer.write(b"a").await, 1);

    let mut pending_write = pin!(writer.write(b"b"));
    assert!(poll!(pending_write.as_mut()).is_pending());

    let mut buf = [0u8; 4];
    assert_eq!(reader.read(&mut buf).await, 1);
    assert_eq!(buf[0], b'a');
    assert_eq!(pending_write.await, 1);
    assert_eq!(reader.buffered(), 1);
}

#[tokio::test]
async fn test_reader_waits_for_data() {
    let (mut reader, mut writer) = pipe();
    let mut buf = [0u8; 16];

    let (n, ()) = tokio::join!(reader.read(&mut buf), async {
        tokio::task::yield_now().await;
        assert_eq!(writer.write(b"late").await, 4);
    });

    assert_eq!(n, 4);
    assert_eq!(&buf[..n], b"late");
}

#[tokio::test]
async fn test_empty_write_does_not_wake_reader() {
    let (mut reader, mut writer) = pipe();
    let mut buf = [0u8; 16];

    {
        let mut pending_read = pin!(reader.read(&mut buf));
        assert!(poll!(pending_read.as_mut()).is_pending());

        // Empty write should succeed, return 0 and leave the reader waiting
        assert_eq!(writer.write(b"").await, 0);
        assert!(poll!(pending_read.as_mut()).is_pending());

        assert_eq!(writer.write(b"x").await, 1);
        assert_eq!(pending_read.await, 1);
    }
    assert_eq!(buf[0], b'x');
}

#[tokio::test]
async fn test_empty_write_does_not_wait_above_threshold() {
    let (reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 2 });
    assert_eq!(writer.write(b"abcdef").await, 6);

    let mut empty_write = pin!(writer.write(b""));
    assert_eq!(poll!(empty_write.as_mut()), std::task::Poll::Ready(0));
    assert_eq!(reader.buffered(), 6);
}

#[tokio::test]
async fn test_read_never_returns_zero() {
    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 3 });
    const TOTAL: usize = 1000;

    let produce = async {
        for byte in (0..=u8::MAX).cycle().take(TOTAL) {
            assert_eq!(writer.write(&[byte]).await, 1);
        }
    };
    let consume = async {
        let mut seen = 0;
        let mut buf = [0u8; 7];
        while seen < TOTAL {
            let n = reader.read(&mut buf).await;
            assert!(n >= 1 && n <= buf.len(), "read returned {n}");
            seen += n;
        }
        seen
    };

    let ((), seen) = tokio::join!(produce, consume);
    assert_eq!(seen, TOTAL);
}

#[tokio::test]
async fn test_fifo_preserved_across_chunked_reads() {
    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 32 });

    #[allow(clippy::cast_possible_truncation)]
    let payloads: Vec<Vec<u8>> = (0..50u8)
        .map(|i| {
            let len = usize::from(i) * 7 % 61;
            (0..len)
                .map(|j| i.wrapping_mul(31).wrapping_add(j as u8))
                .collect()
        })
        .collect();
    let expected = payloads.concat();
    let total = expected.len();

    let produce = async {
        for payload in &payloads {
            assert_eq!(writer.write(payload).await, payload.len());
        }
    };
    let consume = async {
        let chunk_sizes = [1usize, 5, 64, 3, 17];
        let mut got = Vec::with_capacity(total);
        let mut i = 0;
        while got.len() < total {
            let mut buf = vec![0u8; chunk_sizes[i % chunk_sizes.len()]];
            let n = reader.read(&mut buf).await;
            got.extend_from_slice(&buf[..n]);
            i += 1;
        }
        got
    };

    let ((), got) = tokio::join!(produce, consume);
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_ends_on_local_tasks() {
    const TEXT: &[u8] = b"the quick brown fox jumps over the lazy dog";

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 8 });

            let producer = tokio::task::spawn_local(async move {
                for chunk in TEXT.chunks(5) {
                    writer.write(chunk).await;
                }
            });

            let mut got = Vec::new();
            let mut buf = [0u8; 3];
            while got.len() < TEXT.len() {
                let n = reader.read(&mut buf).await;
                got.extend_from_slice(&buf[..n]);
            }

            producer.await.unwrap();
            assert_eq!(got, TEXT);
        })
        .await;
}

#[tokio::test]
async fn test_close_is_a_no_op() {
    let (mut reader, mut writer) = pipe();

    // Before any I/O
    reader.close();
    writer.close();

    assert_eq!(writer.write(b"abc").await, 3);

    // Any number of times, buffered content is kept
    writer.close();
    writer.close();
    reader.close();
    assert_eq!(reader.buffered(), 3);

    let mut buf = [0u8; 8];
    assert_eq!(reader.read(&mut buf).await, 3);
    assert_eq!(&buf[..3], b"abc");
    reader.close();

    // Closing the writer doesn't release a waiting reader
    let mut pending_read = pin!(reader.read(&mut buf));
    assert!(poll!(pending_read.as_mut()).is_pending());
    writer.close();
    assert!(poll!(pending_read.as_mut()).is_pending());

    // Writes still work after close
    assert_eq!(writer.write(b"z").await, 1);
    assert_eq!(pending_read.await, 1);
}

#[tokio::test]
async fn test_embedded_io_traits() {
    use embedded_io_async::{Read, Write};

    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 4 });

    let produce = async {
        Write::write_all(&mut writer, b"0123456789").await.unwrap();
        Write::flush(&mut writer).await.unwrap();
    };
    let consume = async {
        let mut buf = [0u8; 10];
        Read::read_exact(&mut reader, &mut buf).await.unwrap();
        buf
    };

    let ((), buf) = tokio::join!(produce, consume);
    assert_eq!(&buf, b"0123456789");
}

#[tokio::test]
async fn test_dropped_write_releases_the_writer() {
    let (mut reader, mut writer) = pipe_with_config(&PipeConfig { threshold: 4 });
    assert_eq!(writer.write(&[9u8; 10]).await, 10);

    {
        let mut pending_write = pin!(writer.write(b"a"));
        assert!(poll!(pending_write.as_mut()).is_pending());
    }
    // The abandoned write appended nothing and left no live waiter
    assert_eq!(reader.buffered(), 10);
    assert!(format!("{writer:?}").contains("writer_waiting=false"));

    let mut buf = [0u8; 8];
    assert_eq!(reader.read(&mut buf).await, 8);
    assert_eq!(writer.write(b"b").await, 1);

    let n = reader.read(&mut buf).await;
    assert_eq!(&buf[..n], &[9, 9, b'b']);
}
