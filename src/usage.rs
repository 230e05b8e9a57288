use std::ffi::OsString;

use clap::{error::ErrorKind, Parser};

use crate::{kvfeed_error::Result, KvfeedError};

/// Parses `args` into `P`, turning every clap failure into a usage error.
///
/// `--version` still prints and exits straight away.
pub fn try_parse_from<P, I, T>(args: I) -> Result<P>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    P::try_parse_from(args).map_err(|err| match err.kind() {
        ErrorKind::DisplayVersion | ErrorKind::DisplayHelp => err.exit(),
        _ => KvfeedError::Usage(first_line(&err.to_string())),
    })
}

fn first_line(message: &str) -> String {
    let line = message.lines().next().unwrap_or_default();
    let line = line.strip_prefix("error: ").unwrap_or(line);
    line.trim().to_owned()
}
