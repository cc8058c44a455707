use crossbeam_channel::Sender;
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crate::error::InputError;

pub fn parse_line(line: usize, text: &str) -> Result<f64, InputError> {
    text.parse().map_err(|source| InputError::Parse {
        line,
        text: text.to_string(),
        source,
    })
}

/// Reads one number per line until end of input.
pub struct ValueSource<R> {
    reader: R,
}

impl<R: BufRead> ValueSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Sends every parsed value to `values`, blocking while the queue is
    /// full. Stops at the first malformed line. Returns how many values
    /// were sent.
    pub fn run(self, values: &Sender<f64>) -> Result<usize, InputError> {
        let mut sent = 0;
        for (idx, line) in self.reader.lines().enumerate() {
            let line = line?;
            let value = parse_line(idx + 1, &line)?;
            if values.send(value).is_err() {
                log::debug!("intake queue closed, stopping after {} values", sent);
                break;
            }
            sent += 1;
        }
        Ok(sent)
    }
}

/// Runs a [`ValueSource`] on its own thread. A fatal input error is handed
/// to `failures` instead of being queued behind pending values.
pub fn spawn<R>(
    reader: R,
    values: Sender<f64>,
    failures: Sender<InputError>,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("value-source".to_string())
        .spawn(move || {
            log::debug!("value source started");
            match ValueSource::new(reader).run(&values) {
                Ok(count) => log::info!("end of input after {} values", count),
                Err(e) => {
                    let _ = failures.send(e);
                }
            }
        })
}
