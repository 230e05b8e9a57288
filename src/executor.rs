use std::io::Write;

use crate::kvfeed_error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub command: &'a str,
    pub key: &'a str,
    pub value: &'a [u8],
}

pub trait CommandSink {
    /// Blocks until the reply arrives. Error replies are `KvfeedError::ErrorReply`.
    fn send(&mut self, invocation: &Invocation<'_>) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Only a failure to write the diagnostic is returned.
pub fn execute_and_report<S, W>(
    sink: &mut S,
    invocation: &Invocation<'_>,
    diag: &mut W,
    summary: &mut RunSummary,
) -> Result<()>
where
    S: CommandSink + ?Sized,
    W: Write,
{
    summary.sent += 1;
    match sink.send(invocation) {
        Ok(()) => {}
        Err(err) => {
            summary.failed += 1;
            writeln!(diag, "{}", err)?;
        }
    }
    Ok(())
}
