use std::{env, io, process::exit};

use kvfeed::{parse_producer_args, producer_usage, run_producer, StoreSession, TerminalEditor};

fn main() {
    env_logger::init();

    let config = match parse_producer_args(env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprint!("{}", producer_usage(env!("CARGO_BIN_NAME")));
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
    println!(
        "Connected to {}. Use TAB separated key-value pairs.",
        session.target()
    );

    let mut editor = TerminalEditor::new();
    let result = run_producer(
        &config.command,
        &mut editor,
        &mut session,
        &mut io::stderr(),
    );

    let target = session.target().to_string();
    session.close();
    println!("\nDisconnected from {}", target);

    if let Err(err) = result {
        eprintln!("{}", err);
        exit(1);
    }
}
