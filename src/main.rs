use workspace_cli::error::Error;

fn main() {
    if let Err(err) = workspace_cli::run() {
        eprintln!("error: {err:#}");
        let engine_error = err.chain().find_map(|cause| cause.downcast_ref::<Error>());
        if let Some(hint) = engine_error.and_then(Error::hint) {
            eprintln!("hint: {hint}");
        }
        let code = if engine_error.is_some_and(Error::is_user_error) {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}
