use std::path::PathBuf;

use clap::Parser;
use jsshape::{script::Session, vm::VM};

/// Object shape and array storage playground
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub enum Cli {
    /// Execute a command script
    Run {
        file: PathBuf,
        /// Print structure heap statistics when done
        #[clap(long, short)]
        stats: bool,
    },
}

fn main() -> Result<(), String> {
    match Cli::parse() {
        Cli::Run { file, stats } => {
            let source = std::fs::read_to_string(&file)
                .map_err(|err| format!("{}: {}", file.display(), err))?;
            let mut session = Session::new(VM::from_env());
            let output = session.run(&source).map_err(|err| err.to_string())?;
            for line in output {
                println!("{}", line);
            }
            if stats {
                let stats = session.vm().collect(&[]);
                eprintln!(
                    "structures: {} live after dropping all objects ({} freed)",
                    stats.live_structures, stats.freed_structures
                );
            }
        }
    }
    Ok(())
}
