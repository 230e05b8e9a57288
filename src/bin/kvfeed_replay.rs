use std::{env, io, process::exit};

use kvfeed::{open_input, parse_replay_args, replay_usage, run_replay, StoreSession};

fn main() {
    env_logger::init();

    let config = match parse_replay_args(env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprint!("{}", replay_usage(env!("CARGO_BIN_NAME")));
            exit(1);
        }
    };

    let mut session = match StoreSession::connect(config.target) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    let mut input = match open_input(&config.file) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("{}", err);
            session.close();
            exit(1);
        }
    };

    let result = run_replay(
        &config.command,
        &config.key,
        &mut input,
        &mut session,
        &mut io::stderr(),
    );
    session.close();

    if let Err(err) = result {
        eprintln!("{}", err);
        exit(1);
    }
}
