use std::{
    ffi::OsString,
    fs::File,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use clap::Parser;
use log::info;

use crate::{
    connection::ConnectionTarget,
    executor::{execute_and_report, CommandSink, Invocation, RunSummary},
    kvfeed_error::Result,
    usage, KvfeedError,
};

pub const DEFAULT_REPLAY_PORT: u16 = 6389;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Replay a file into a store, one command per line",
    long_about = None,
    disable_help_flag = true
)]
pub struct ReplayArgs {
    #[clap(short = 's', long = "socket")]
    pub socket: Option<PathBuf>,
    #[clap(short = 'h', long)]
    pub host: Option<String>,
    #[clap(short = 'p', long, default_value_t = DEFAULT_REPLAY_PORT)]
    pub port: u16,
    #[clap(short = 'c', long)]
    pub command: Option<String>,
    #[clap(short = 'k', long)]
    pub key: Option<String>,
    #[clap(short = 'f', long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    pub target: ConnectionTarget,
    pub command: String,
    pub key: String,
    pub file: PathBuf,
}

impl ReplayArgs {
    pub fn into_config(self) -> Result<ReplayConfig> {
        let missing: Vec<&str> = [
            ("-c <command>", self.command.is_none()),
            ("-k <key>", self.key.is_none()),
            ("-f <file>", self.file.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(flag, _)| *flag)
        .collect();

        let target = ConnectionTarget::from_flags(self.host, self.port, self.socket)?;

        match (self.command, self.key, self.file) {
            (Some(command), Some(key), Some(file)) => Ok(ReplayConfig {
                target,
                command,
                key,
                file,
            }),
            _ => Err(KvfeedError::Usage(format!(
                "Missing required option(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

pub fn parse_replay_args<I, T>(args: I) -> Result<ReplayConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    usage::try_parse_from::<ReplayArgs, _, _>(args)?.into_config()
}

pub fn replay_usage(prog: &str) -> String {
    format!(
        "Usage:\n  \
         {prog} -s <socket> -c <command> -k <key> -f <file>\n  \
         {prog} -h <host> -p <port> -c <command> -k <key> -f <file>\n",
        prog = prog
    )
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| KvfeedError::FileOpen {
            path: path.to_owned(),
            source,
        })
}

/// Drops one trailing `\n`, and a `\r` directly before it.
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    match line.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => line,
    }
}

/// Issues `<command> <key> <line>` for every non-empty line of `input`.
///
/// Lines are raw bytes, so NUL and other control bytes reach the store intact.
/// A read error ends the replay with `KvfeedError::FileRead`.
pub fn run_replay<R, S, W>(
    command: &str,
    key: &str,
    input: &mut R,
    sink: &mut S,
    diag: &mut W,
) -> Result<RunSummary>
where
    R: BufRead + ?Sized,
    S: CommandSink + ?Sized,
    W: Write,
{
    let mut summary = RunSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .map_err(KvfeedError::FileRead)?;
        if read == 0 {
            break;
        }

        let value = strip_line_ending(&buf);
        if value.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let invocation = Invocation {
            command,
            key,
            value,
        };
        execute_and_report(sink, &invocation, diag, &mut summary)?;
    }

    info!(
        "{} commands sent, {} failed, {} blank lines skipped",
        summary.sent, summary.failed, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use super::*;
    use crate::executor::tests::RecordingSink;

    fn replay(input: &[u8]) -> (RecordingSink, RunSummary) {
        let mut sink = RecordingSink::default();
        let summary = run_replay(
            "LPUSH",
            "mylist",
            &mut Cursor::new(input),
            &mut sink,
            &mut Vec::new(),
        )
        .unwrap();
        (sink, summary)
    }

    #[test]
    fn strips_lf_and_crlf() {
        assert_eq!(strip_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc\n"), b"abc");
        assert_eq!(strip_line_ending(b"\n"), b"");
        assert_eq!(strip_line_ending(b"abc"), b"abc");
    }

    #[test]
    fn lone_carriage_return_is_kept() {
        assert_eq!(strip_line_ending(b"abc\r"), b"abc\r");
        assert_eq!(strip_line_ending(b"abc\r\r\n"), b"abc\r");
    }

    #[test]
    fn issues_one_command_per_non_empty_line_in_order() {
        let (sink, summary) = replay(b"one\ntwo\r\n\nthree");
        let values: Vec<&[u8]> = sink.sent.iter().map(|(_, _, v)| v.as_slice()).collect();
        assert_eq!(values, vec![&b"one"[..], &b"two"[..], &b"three"[..]]);
        assert!(sink
            .sent
            .iter()
            .all(|(cmd, key, _)| cmd == "LPUSH" && key == "mylist"));
        assert_eq!(
            summary,
            RunSummary {
                sent: 3,
                skipped: 1,
                failed: 0
            }
        );
    }

    #[test]
    fn embedded_nul_keeps_full_length() {
        let (sink, _) = replay(b"ab\0cd\r\n");
        assert_eq!(sink.sent.len(), 1);
        assert_eq!(sink.sent[0].2, b"ab\0cd".to_vec());
        assert_eq!(sink.sent[0].2.len(), 5);
    }

    #[test]
    fn non_utf8_bytes_pass_through() {
        let (sink, _) = replay(b"\xff\xfe\x01\n");
        assert_eq!(sink.sent[0].2, vec![0xff, 0xfe, 0x01]);
    }

    #[test]
    fn empty_input_sends_nothing() {
        let (sink, summary) = replay(b"");
        assert!(sink.sent.is_empty());
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn error_replies_are_reported_and_replay_continues() {
        let mut sink = RecordingSink {
            replies: vec![Err(KvfeedError::ErrorReply(
                "WRONGTYPE Operation against a key holding the wrong kind of value".into(),
            ))],
            ..Default::default()
        };
        let mut diag = Vec::new();
        let summary = run_replay(
            "LPUSH",
            "mylist",
            &mut Cursor::new(&b"a\nb\n"[..]),
            &mut sink,
            &mut diag,
        )
        .unwrap();
        assert_eq!(sink.sent.len(), 2);
        assert_eq!(summary.failed, 1);
        assert!(String::from_utf8(diag).unwrap().starts_with("Store error: WRONGTYPE"));
    }

    struct FailAfter<'a> {
        data: &'a [u8],
    }

    impl Read for FailAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
            }
            let n = self.data.read(buf)?;
            Ok(n)
        }
    }

    #[test]
    fn read_error_is_not_a_clean_end() {
        let mut input = BufReader::new(FailAfter { data: b"first\n" });
        let mut sink = RecordingSink::default();
        let result = run_replay("LPUSH", "mylist", &mut input, &mut sink, &mut Vec::new());
        assert!(matches!(result, Err(KvfeedError::FileRead(_))));
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        match open_input(&path) {
            Err(KvfeedError::FileOpen { path: failed, source }) => {
                assert_eq!(failed, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("expected a file open error"),
        }
    }

    #[test]
    fn replays_from_an_opened_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"x\n\ny\n").unwrap();
        let mut input = open_input(file.path()).unwrap();
        let mut sink = RecordingSink::default();
        let summary = run_replay("RPUSH", "k", &mut input, &mut sink, &mut Vec::new()).unwrap();
        assert_eq!(summary.sent, 2);
    }

    #[test]
    fn parses_full_host_form() {
        let config = parse_replay_args([
            "prog", "-h", "10.0.0.1", "-p", "7000", "-c", "LPUSH", "-k", "mylist", "-f", "in.txt",
        ])
        .unwrap();
        assert_eq!(
            config,
            ReplayConfig {
                target: ConnectionTarget::Tcp {
                    host: "10.0.0.1".into(),
                    port: 7000
                },
                command: "LPUSH".into(),
                key: "mylist".into(),
                file: PathBuf::from("in.txt"),
            }
        );
    }

    #[test]
    fn port_defaults_to_6389() {
        let config =
            parse_replay_args(["prog", "-h", "localhost", "-c", "SET", "-k", "k", "-f", "f"])
                .unwrap();
        assert_eq!(
            config.target,
            ConnectionTarget::Tcp {
                host: "localhost".into(),
                port: 6389
            }
        );
    }

    #[test]
    fn names_every_missing_option() {
        match parse_replay_args(["prog", "-s", "/tmp/test.sock", "-c", "LPUSH"]) {
            Err(KvfeedError::Usage(message)) => {
                assert_eq!(message, "Missing required option(s): -k <key>, -f <file>")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_both_or_neither_target() {
        assert!(matches!(
            parse_replay_args(["prog", "-c", "SET", "-k", "k", "-f", "f"]),
            Err(KvfeedError::Usage(_))
        ));
        assert!(matches!(
            parse_replay_args([
                "prog", "-s", "/tmp/a.sock", "-h", "localhost", "-c", "SET", "-k", "k", "-f", "f",
            ]),
            Err(KvfeedError::Usage(_))
        ));
    }
}
