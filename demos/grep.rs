use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use anyhow::Result;
use clap::Parser;
use dfaregex::RegexBuilder;

#[derive(Parser)]
struct Cli {
    pattern: String,
    file: String,
    /// Print only the matched parts of each line.
    #[arg(short = 'o', long)]
    only_matching: bool,
    /// Print the compiled automaton in DOT form and exit.
    #[arg(long)]
    dot: bool,
    #[arg(long, default_value_t = 10_000)]
    state_limit: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let re = RegexBuilder::new(&args.pattern)
        .state_limit(args.state_limit)
        .build()?;
    if args.dot {
        print!("{re}");
        return Ok(());
    }

    let file = File::open(args.file)?;
    let reader = BufReader::new(file);

    for line in reader.lines() {
        let line = line?;
        let chars = line.chars().collect::<Vec<_>>();
        if args.only_matching {
            for m in re.find_iter(&chars).filter(|m| !m.is_empty()) {
                println!("{}", chars[m.range()].iter().collect::<String>());
            }
        } else if re.find_iter(&chars).next().is_some() {
            println!("{line}");
        }
    }

    Ok(())
}
