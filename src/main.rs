use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match yolodex::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
