//! Output capture threads.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

use crate::relay::ConsoleRelay;
use crate::types::{LogLine, StreamType};

/// Read `reader` line by line on a thread named `<service>-<stream>` and hand
/// every line to `relay` until EOF.
///
/// Invalid UTF-8 is replaced; line terminators (`\n`, `\r\n`) are stripped.
pub fn spawn_capture<R>(
    service: &str,
    stream: StreamType,
    reader: R,
    relay: Arc<ConsoleRelay>,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let thread_name = format!("{}-{}", service, stream);
    let service = service.to_string();

    thread::Builder::new().name(thread_name).spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::new();
        let mut lines = 0u64;

        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {
                    if buffer.last() == Some(&b'\n') {
                        buffer.pop();
                        if buffer.last() == Some(&b'\r') {
                            buffer.pop();
                        }
                    }
                    relay.on_line(LogLine::new(String::from_utf8_lossy(&buffer), stream));
                    lines += 1;
                }
                Err(e) => {
                    debug!(service = %service, stream = %stream, error = %e, "Console read failed");
                    break;
                }
            }
        }

        debug!(service = %service, stream = %stream, lines, "Console capture finished");
    })
}
