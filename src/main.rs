use pyswitch::cli::Cli;
use pyswitch::{App, exit_code_for, observability};
use std::io::Write;

fn main() {
    let cli: Cli = argh::from_env();
    let mut app = App::from_process();
    observability::init_tracing(cli.quiet, app.env());

    let mut stdout = std::io::stdout().lock();
    let code = match app.dispatch(cli, &mut stdout) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("pyswitch: {:#}", err);
            exit_code_for(&err)
        }
    };
    let _ = stdout.flush();
    drop(stdout);
    std::process::exit(code);
}
