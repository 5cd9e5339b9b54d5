use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = lms_cli::build_cli().get_matches();
    lms_cli::logging::init_tracing(matches.get_flag("log-json"));

    match lms_cli::run(&matches).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
