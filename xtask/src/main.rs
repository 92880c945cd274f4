use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for driftfield")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the field update benchmarks in release mode
    Bench,
}

/// One cargo invocation with a banner and a failure message.
struct Step {
    banner: &'static str,
    args: &'static [&'static str],
    failure: &'static str,
}

const FMT: Step = Step {
    banner: "cargo fmt --check",
    args: &["fmt", "--all", "--", "--check"],
    failure: "cargo fmt check failed",
};

const CLIPPY: Step = Step {
    banner: "cargo clippy",
    args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    failure: "cargo clippy failed",
};

const TEST: Step = Step {
    banner: "cargo test",
    args: &["test", "--workspace"],
    failure: "cargo test failed",
};

const DOC: Step = Step {
    banner: "cargo doc",
    args: &["doc", "--workspace", "--no-deps"],
    failure: "cargo doc failed",
};

const BUILD: Step = Step {
    banner: "cargo build",
    args: &["build", "--workspace"],
    failure: "cargo build failed",
};

const BENCH: Step = Step {
    banner: "field benchmarks",
    args: &[
        "bench",
        "-p",
        "driftfield-field",
        "--bench",
        "bench_field_update",
    ],
    failure: "field benchmarks failed",
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for step in [&FMT, &CLIPPY, &TEST, &DOC] {
                run(step)?;
            }
        }
        Commands::Fmt => run(&FMT)?,
        Commands::Clippy => run(&CLIPPY)?,
        Commands::Test => run(&TEST)?,
        Commands::Doc => run(&DOC)?,
        Commands::Build => run(&BUILD)?,
        Commands::Bench => run(&BENCH)?,
    }

    Ok(())
}

fn run(step: &Step) -> Result<()> {
    println!("==> Running {}", step.banner);
    let status = Command::new("cargo").args(step.args).status()?;
    if !status.success() {
        anyhow::bail!("{}", step.failure);
    }
    Ok(())
}
