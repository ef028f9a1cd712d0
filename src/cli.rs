use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs, Debug, PartialEq)]
/// Switch which interpreter this session resolves to.
/// With no subcommand, prints export lines for `eval "$(pyswitch)"`.
pub struct Cli {
    #[argh(option, short = 't')]
    /// executable to switch to (default: $PYSWITCH_TARGET or python3.12)
    pub target: Option<String>,

    #[argh(option)]
    /// version marker to export (default: derived from the target name)
    pub version: Option<String>,

    #[argh(switch, short = 'q')]
    /// only log warnings and errors.
    pub quiet: bool,

    #[argh(subcommand)]
    pub command: Option<Command>,
}

#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand)]
pub enum Command {
    Activate(Activate),
    Venv(Venv),
    System(System),
    Link(Link),
    Restore(Restore),
    Locate(Locate),
    Status(Status),
    Run(Run),
    WriteScript(WriteScript),
}

#[derive(FromArgs, Debug, PartialEq)]
/// Prepend the target's directory to PATH and set version markers.
#[argh(subcommand, name = "activate")]
pub struct Activate {}

#[derive(FromArgs, Debug, PartialEq)]
/// Create the isolated environment if missing, then activate it.
#[argh(subcommand, name = "venv")]
pub struct Venv {
    #[argh(option)]
    /// environment directory (default: $PYSWITCH_VENV_DIR or ~/venvs/py<version>)
    pub dir: Option<PathBuf>,

    #[argh(option)]
    /// package to install on creation; repeat for several (replaces the default set)
    pub package: Vec<String>,

    #[argh(switch)]
    /// do not install any packages on creation.
    pub no_packages: bool,
}

#[derive(FromArgs, Debug, PartialEq)]
/// Register the target system-wide with update-alternatives (needs root or sudo).
#[argh(subcommand, name = "system")]
pub struct System {
    #[argh(switch, short = 'y')]
    /// do not ask for confirmation.
    pub yes: bool,

    #[argh(option)]
    /// alternatives priority (default: $PYSWITCH_ALT_PRIORITY or 100)
    pub priority: Option<u32>,
}

#[derive(FromArgs, Debug, PartialEq)]
/// Link the target into a user-writable directory and activate that directory.
#[argh(subcommand, name = "link")]
pub struct Link {
    #[argh(option)]
    /// link directory (default: $PYSWITCH_LINK_DIR or ~/local/bin)
    pub dir: Option<PathBuf>,

    #[argh(option)]
    /// name of the link (default: python3)
    pub name: Option<String>,
}

#[derive(FromArgs, Debug, PartialEq)]
/// Print export lines that undo a previous activation.
#[argh(subcommand, name = "restore")]
pub struct Restore {}

#[derive(FromArgs, Debug, PartialEq)]
/// Print the path the target resolves to.
#[argh(subcommand, name = "locate")]
pub struct Locate {}

#[derive(FromArgs, Debug, PartialEq)]
/// Show which interpreter is active and which markers are set.
#[argh(subcommand, name = "status")]
pub struct Status {}

#[derive(FromArgs, Debug, PartialEq)]
/// Run a command with the switched environment.
#[argh(subcommand, name = "run")]
pub struct Run {
    #[argh(switch)]
    /// use the isolated environment instead of the bare interpreter.
    pub venv: bool,

    #[argh(positional, greedy)]
    /// program and arguments to run.
    pub command: Vec<String>,
}

#[derive(FromArgs, Debug, PartialEq)]
/// Write a sourceable script that performs the switch at session start.
#[argh(subcommand, name = "write-script")]
pub struct WriteScript {
    #[argh(option, short = 'o')]
    /// output path (default: $PYSWITCH_SCRIPT or ~/switch_to_python<version>.sh)
    pub output: Option<PathBuf>,

    #[argh(switch)]
    /// also write ~/.bashrc_python<version> with python/pip aliases.
    pub aliases: bool,
}
