use anyhow::Context;
use clap::Parser;

use jail_proxy::pow::Challenge;

#[derive(Parser)]
#[command(name = "jailpow")]
#[command(about = "Solve or check a jail proof-of-work challenge", long_about = None)]
struct Cli {
    /// Challenge string, as printed by the server.
    challenge: String,

    /// Check this solution instead of solving.
    #[arg(long)]
    check: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let challenge = Challenge::decode(cli.challenge.trim()).context("decode challenge")?;

    match cli.check {
        Some(solution) => {
            let valid = challenge
                .check(solution.trim())
                .context("decode solution")?;
            println!("{}", if valid { "valid" } else { "invalid" });
            if !valid {
                std::process::exit(1);
            }
        }
        None => println!("{}", challenge.solve()),
    }
    Ok(())
}
