//! Captured feature output, logged line by line under the feature's name.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::debug;
use crate::utils::exec::strip_ansi;

/// Spawn a task that logs every line `reader` produces until EOF.
pub(super) fn forward<R>(feature: &'static str, reader: R, stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(line) = clean_line(&line) {
                        crate::logger::feature_line(feature, &line, stderr);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(feature; "output stream closed: {}", e);
                    break;
                }
            }
        }
    });
}

/// Strip color codes and trailing whitespace; drop blank lines.
fn clean_line(line: &str) -> Option<String> {
    let plain = strip_ansi(line);
    let trimmed = plain.trim_end();
    (!trimmed.trim_start().is_empty()).then(|| trimmed.to_string())
}
