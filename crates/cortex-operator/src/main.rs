use std::process::ExitCode;

fn main() -> ExitCode {
    cortex_operator::run_operator()
}
