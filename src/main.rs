use std::process::ExitCode;

fn main() -> ExitCode {
    msgflow::cli::run()
}
