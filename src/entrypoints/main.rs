use std::process::ExitCode;

// === Entry point for the command line ===
pub fn main() -> ExitCode {
    super::run::native_main()
}
