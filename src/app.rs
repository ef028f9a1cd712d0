use crate::cli::{self, Cli, Command};
use crate::command::{CommandRunner, ExitCode};
use crate::config::Config;
use crate::env::Environment;
use crate::error::SwitchError;
use crate::external::{SystemRunner, run_in};
use crate::script::{render_exports, write_alias_file, write_switch_script};
use crate::status::status;
use crate::switcher::{activate, link, restore};
use crate::system::{Privileges, reconfigure_system};
use crate::venv::provision;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use std::io::Write;

/// Asks the user before a persistent, host-wide change.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Interactive confirmation on the terminal.
pub struct Prompt;

impl Confirm for Prompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let mut rl = DefaultEditor::new()?;
        let answer = match rl.readline(&format!("{} [y/N] ", question)) {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Dispatches parsed command lines against an explicit environment.
///
/// The environment is never written back to the process; commands that
/// change it print export lines instead.
pub struct App {
    env: Environment,
    runner: Box<dyn CommandRunner>,
    confirm: Box<dyn Confirm>,
}

impl App {
    pub fn new(env: Environment, runner: Box<dyn CommandRunner>, confirm: Box<dyn Confirm>) -> Self {
        Self {
            env,
            runner,
            confirm,
        }
    }

    /// Wire the app to the real process environment and terminal.
    pub fn from_process() -> Self {
        Self::new(Environment::from_process(), Box::new(SystemRunner), Box::new(Prompt))
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    fn config(&self, cli: &Cli) -> Config {
        let mut config = Config::from_env(&self.env);
        if let Some(target) = &cli.target {
            config.target = target.clone();
        }
        if let Some(version) = &cli.version {
            config.version = Some(version.clone());
        }
        config
    }

    /// Execute one command line, writing eval-able or report output to `stdout`.
    pub fn dispatch(&mut self, cli: Cli, stdout: &mut dyn Write) -> Result<ExitCode> {
        let mut config = self.config(&cli);
        let command = cli.command.unwrap_or(Command::Activate(cli::Activate {}));
        // `restore` needs no target, so resolution errors surface per command
        let target = config.target();

        match command {
            Command::Activate(_) => {
                let target = target?;
                let activation = activate(&target, &self.env)?;
                stdout.write_all(render_exports(&self.env.diff(&activation.env)).as_bytes())?;
            }
            Command::Venv(args) => {
                let target = target?;
                if let Some(dir) = args.dir {
                    config.venv_dir = Some(dir);
                }
                if args.no_packages {
                    config.packages.clear();
                } else if !args.package.is_empty() {
                    config.packages = args.package;
                }
                let provisioned = provision(&config, &target, &self.env, self.runner.as_ref())?;
                if provisioned.created {
                    tracing::info!(root = %provisioned.isolated.root().display(), "isolated environment created");
                }
                let changes = self.env.diff(&provisioned.activation.env);
                stdout.write_all(render_exports(&changes).as_bytes())?;
            }
            Command::System(args) => {
                let target = target?;
                if let Some(priority) = args.priority {
                    config.alt_priority = priority;
                }
                let question = format!(
                    "Register {} as {} for all users of this host?",
                    target.executable,
                    config.python_link.display()
                );
                if !args.yes && !self.confirm.confirm(&question)? {
                    tracing::warn!("system reconfiguration cancelled");
                    return Ok(1);
                }
                let privileges = Privileges::detect(&self.env);
                let report = reconfigure_system(
                    &config,
                    &target,
                    &self.env,
                    self.runner.as_ref(),
                    &privileges,
                )?;
                for step in &report.completed {
                    writeln!(stdout, "done: {}", step)?;
                }
            }
            Command::Link(args) => {
                let target = target?;
                let dir = args.dir.unwrap_or_else(|| config.link_dir());
                let name = args.name.unwrap_or_else(|| config.alternative_name());
                let activation = link(&target, &dir, &name, &self.env)?;
                stdout.write_all(render_exports(&self.env.diff(&activation.env)).as_bytes())?;
            }
            Command::Restore(_) => match restore(&self.env) {
                Some(restored) => {
                    stdout.write_all(render_exports(&self.env.diff(&restored)).as_bytes())?;
                }
                None => tracing::warn!("no active switch to restore"),
            },
            Command::Locate(_) => {
                let target = target?;
                let path = self.env.search_path().locate(&target.executable)?;
                writeln!(stdout, "{}", path.display())?;
            }
            Command::Status(_) => {
                let target = target?;
                let report = status(&config, &target, &self.env, self.runner.as_ref());
                write!(stdout, "{}", report)?;
            }
            Command::Run(args) => {
                let target = target?;
                let Some((program, rest)) = args.command.split_first() else {
                    anyhow::bail!("run: missing program");
                };
                let switched = if args.venv {
                    provision(&config, &target, &self.env, self.runner.as_ref())?
                        .activation
                        .env
                } else {
                    activate(&target, &self.env)?.env
                };
                return Ok(run_in(&switched, program, rest)?);
            }
            Command::WriteScript(args) => {
                let target = target?;
                let path = args.output.unwrap_or_else(|| config.script_path(&target));
                write_switch_script(&path, &target)
                    .with_context(|| format!("write-script: {}", path.display()))?;
                writeln!(stdout, "{}", path.display())?;
                if args.aliases {
                    let aliases = config.alias_path(&target);
                    write_alias_file(&aliases, &target)
                        .with_context(|| format!("write-script: {}", aliases.display()))?;
                    writeln!(stdout, "{}", aliases.display())?;
                }
            }
        }
        Ok(0)
    }
}

/// Exit code for an error escaping [`App::dispatch`].
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SwitchError>())
        .map_or(2, SwitchError::exit_code)
}
