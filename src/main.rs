use std::env;

use anyhow::{anyhow, Context, Result};
use memorvm::{assemble_file, Config, Executor, ExecutorType, Program};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: memo_rvm <file.rasm> <text> [--backtracking] [--step-limit N]";

struct Args {
    path: String,
    text: String,
    typ: ExecutorType,
    config: Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(env::args().skip(1).collect()).map_err(|e| anyhow!("{}\n{}", e, USAGE))?;
    let records = assemble_file(&args.path).with_context(|| format!("reading {}", args.path))?;
    let program =
        Program::from_records(&records).with_context(|| format!("loading {}", args.path))?;

    let outcome = Executor::with_config(args.typ, args.config).exec(&program, &args.text)?;
    match outcome.matched {
        Some(m) => println!("Matched text: '{}'", m.as_str()),
        None => println!("No match"),
    }
    let stats = outcome.stats;
    println!(
        "steps: {}, forks: {}, memo kills: {}, epsilon kills: {}, max stack: {}",
        stats.steps, stats.forks, stats.memo_kills, stats.epsilon_kills, stats.max_stack_depth
    );
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    let mut positional = vec![];
    let mut typ = ExecutorType::Memoized;
    let mut config = Config::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backtracking" => typ = ExecutorType::Backtracking,
            "--step-limit" => {
                let n = args.next().ok_or("--step-limit needs a value")?;
                let n = n
                    .parse()
                    .map_err(|_| format!("invalid step limit `{}`", n))?;
                config = config.step_limit(n);
            }
            _ => positional.push(arg),
        }
    }
    if positional.len() != 2 {
        return Err(String::from("Need 2 args"));
    }
    let text = positional.pop().unwrap_or_default();
    let path = positional.pop().unwrap_or_default();
    Ok(Args {
        path,
        text,
        typ,
        config,
    })
}
