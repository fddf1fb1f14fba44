//! Operator input channel.
//!
//! A background thread reads lines from the operator and forwards trimmed,
//! non-empty lines over a bounded channel. The loop drains it without blocking at
//! iteration boundaries. End of input closes the channel; the loop sees that as
//! [`Drained::closed`] rather than as a stop request.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Lines available at one iteration boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drained {
    /// Lines in the order they were typed.
    pub lines: Vec<String>,
    /// The producer is gone: no further lines will ever arrive.
    pub closed: bool,
}

/// Source of operator lines for the loop.
pub trait OperatorInput {
    /// Take every line currently available without waiting for more.
    fn drain(&mut self) -> Drained;
}

/// Bounded channel fed by a reader thread.
#[derive(Debug)]
pub struct InputChannel {
    rx: Receiver<String>,
    cancelled: Arc<AtomicBool>,
}

impl InputChannel {
    /// Start the reader thread over `reader` with room for `capacity` pending lines.
    pub fn spawn<R>(reader: R, capacity: usize) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = sync_channel(capacity);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::Builder::new()
            .name("operator-input".to_string())
            .spawn(move || read_lines(reader, tx, flag))
            .context("spawn operator input thread")?;
        Ok(Self { rx, cancelled })
    }

    /// Ask the reader to stop. It exits after its current blocking read returns.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl OperatorInput for InputChannel {
    fn drain(&mut self) -> Drained {
        let mut drained = Drained::default();
        loop {
            match self.rx.try_recv() {
                Ok(line) => drained.lines.push(line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drained.closed = true;
                    break;
                }
            }
        }
        drained
    }
}

impl Drop for InputChannel {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: SyncSender<String>, cancelled: Arc<AtomicBool>) {
    let mut buf = String::new();
    loop {
        if cancelled.load(Ordering::SeqCst) {
            debug!("operator input cancelled");
            return;
        }
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => {
                debug!("operator input reached end of stream");
                return;
            }
            Ok(_) => {
                let line = buf.trim();
                if line.is_empty() {
                    continue;
                }
                if tx.send(line.to_string()).is_err() {
                    debug!("operator input receiver dropped");
                    return;
                }
            }
            Err(err) => {
                warn!(err = %err, "failed to read operator input");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    /// Drain until the channel reports closed, collecting every line.
    fn drain_to_close(channel: &mut InputChannel) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut lines = Vec::new();
        loop {
            let drained = channel.drain();
            lines.extend(drained.lines);
            if drained.closed {
                return lines;
            }
            assert!(Instant::now() < deadline, "input channel never closed");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn forwards_trimmed_lines_in_order_and_closes_at_eof() {
        let reader = Cursor::new("  first \n\n   \nsecond\nquit\n");
        let mut channel = InputChannel::spawn(reader, 2).expect("spawn");

        let lines = drain_to_close(&mut channel);

        assert_eq!(lines, vec!["first", "second", "quit"]);
        assert!(channel.drain().closed);
    }

    #[test]
    fn empty_input_closes_without_lines() {
        let mut channel = InputChannel::spawn(Cursor::new(""), 1).expect("spawn");
        assert!(drain_to_close(&mut channel).is_empty());
    }

    /// Reader that never reaches end of input.
    struct Endless {
        reads: Arc<AtomicUsize>,
    }

    impl Read for Endless {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let line = b"again\n";
            let n = line.len().min(buf.len());
            buf[..n].copy_from_slice(&line[..n]);
            Ok(n)
        }
    }

    #[test]
    fn cancel_stops_reader_on_endless_input() {
        let reads = Arc::new(AtomicUsize::new(0));
        let reader = BufReader::with_capacity(
            16,
            Endless {
                reads: Arc::clone(&reads),
            },
        );
        let mut channel = InputChannel::spawn(reader, 1).expect("spawn");

        channel.cancel();
        let lines = drain_to_close(&mut channel);

        assert!(lines.iter().all(|line| line == "again"));
        let settled = reads.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(reads.load(Ordering::SeqCst), settled);
    }
}
