//! Writes the benchboard man page (roff) to stdout, or to the path given as the first argument.

use benchboard::cli::Cli;
use clap::CommandFactory;
use std::io::Write;

fn main() -> std::io::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buffer: Vec<u8> = Vec::new();
    man.render(&mut buffer)?;

    match std::env::args().nth(1) {
        Some(path) => std::fs::write(path, buffer),
        None => std::io::stdout().write_all(&buffer),
    }
}
