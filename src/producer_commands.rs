use std::{ffi::OsString, io::Write, path::PathBuf};

use clap::Parser;
use log::info;
use rustyline::{error::ReadlineError, Cmd, Editor, KeyCode, KeyEvent, Modifiers};

use crate::{
    connection::ConnectionTarget,
    executor::{execute_and_report, CommandSink, Invocation, RunSummary},
    kvfeed_error::Result,
    usage, KvfeedError,
};

pub const DEFAULT_PRODUCER_PORT: u16 = 6379;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Send TAB separated key/value pairs to a store, one command per line",
    long_about = None,
    disable_help_flag = true
)]
pub struct ProducerArgs {
    #[clap(short = 'h', long)]
    pub host: Option<String>,
    #[clap(short = 'p', long, default_value_t = DEFAULT_PRODUCER_PORT)]
    pub port: u16,
    #[clap(short = 's', long = "socket")]
    pub socket: Option<PathBuf>,
    /// Command issued for every line, e.g. SET or LPUSH.
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig {
    pub target: ConnectionTarget,
    pub command: String,
}

impl ProducerArgs {
    pub fn into_config(self) -> Result<ProducerConfig> {
        let command = self
            .command
            .ok_or_else(|| KvfeedError::Usage("Missing store command".to_owned()))?;
        let target = ConnectionTarget::from_flags(self.host, self.port, self.socket)?;
        Ok(ProducerConfig { target, command })
    }
}

pub fn parse_producer_args<I, T>(args: I) -> Result<ProducerConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    usage::try_parse_from::<ProducerArgs, _, _>(args)?.into_config()
}

pub fn producer_usage(prog: &str) -> String {
    format!(
        "Usage:\n  \
         {prog} -h <host> -p <port> <command>\n  \
         {prog} -s <socket> <command>\n\
         Examples:\n  \
         {prog} -h 127.0.0.1 -p 6379 SET\n  \
         {prog} -s /tmp/redis.sock LPUSH\n",
        prog = prog
    )
}

/// Source of interactive input lines.
pub trait LineEditor {
    /// Shows `prompt` and returns the next line, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    fn add_history(&mut self, line: &str);
}

/// Line editor on the controlling terminal, with in-session history.
pub struct TerminalEditor {
    editor: Editor<()>,
}

impl TerminalEditor {
    pub fn new() -> Self {
        let mut editor = Editor::<()>::new();
        // TAB separates key from value, so it must insert itself instead of completing.
        editor.bind_sequence(
            KeyEvent(KeyCode::Tab, Modifiers::NONE),
            Cmd::Insert(1, "\t".to_owned()),
        );
        Self { editor }
    }
}

impl Default for TerminalEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor for TerminalEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let editor = &mut self.editor;
        next_line(|| editor.readline(prompt))
    }

    fn add_history(&mut self, line: &str) {
        self.editor.add_history_entry(line);
    }
}

/// Ctrl-C drops the line being typed and prompts again; Ctrl-D ends input.
fn next_line<F>(mut readline: F) -> Result<Option<String>>
where
    F: FnMut() -> rustyline::Result<String>,
{
    loop {
        match readline() {
            Ok(line) => return Ok(Some(line)),
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LineAction<'a> {
    Skip,
    Quit,
    /// Non-empty line without a TAB.
    Malformed,
    Send { key: &'a str, value: &'a str },
}

/// Splits a line at its first TAB; the value keeps any further TABs.
pub fn interpret_line(line: &str) -> LineAction<'_> {
    if line.is_empty() {
        return LineAction::Skip;
    }
    if line == "exit" || line == "quit" {
        return LineAction::Quit;
    }
    match line.split_once('\t') {
        Some((key, value)) => LineAction::Send { key, value },
        None => LineAction::Malformed,
    }
}

pub fn run_producer<E, S, W>(
    command: &str,
    editor: &mut E,
    sink: &mut S,
    diag: &mut W,
) -> Result<RunSummary>
where
    E: LineEditor + ?Sized,
    S: CommandSink + ?Sized,
    W: Write,
{
    let prompt = format!("{}> ", command);
    let mut summary = RunSummary::default();

    while let Some(line) = editor.read_line(&prompt)? {
        match interpret_line(&line) {
            LineAction::Skip => summary.skipped += 1,
            LineAction::Quit => break,
            LineAction::Malformed => {
                editor.add_history(&line);
                summary.skipped += 1;
                writeln!(diag, "Error: use TAB separated key-value pairs.")?;
            }
            LineAction::Send { key, value } => {
                editor.add_history(&line);
                let invocation = Invocation {
                    command,
                    key,
                    value: value.as_bytes(),
                };
                execute_and_report(sink, &invocation, diag, &mut summary)?;
            }
        }
    }

    info!(
        "{} commands sent, {} failed, {} lines skipped",
        summary.sent, summary.failed, summary.skipped
    );
    Ok(summary)
}
