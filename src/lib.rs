mod connection;
mod executor;
mod kvfeed_error;
mod producer_commands;
mod replay_commands;
mod usage;
pub use connection::{ConnectionTarget, StoreSession};
pub use executor::{execute_and_report, CommandSink, Invocation, RunSummary};
pub use kvfeed_error::{KvfeedError, Result};
pub use producer_commands::{
    interpret_line, parse_producer_args, producer_usage, run_producer, LineAction, LineEditor,
    ProducerArgs, ProducerConfig, TerminalEditor, DEFAULT_PRODUCER_PORT,
};
pub use replay_commands::{
    open_input, parse_replay_args, replay_usage, run_replay, strip_line_ending, ReplayArgs,
    ReplayConfig, DEFAULT_REPLAY_PORT,
};
