use std::process::ExitCode;

fn main() -> ExitCode {
    agentquote_cli::run()
}
