/// Return the credentials as AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and AWS_SESSION_TOKEN
/// environment variables, or execute a command with them.
#[derive(clap::Args)]
pub struct EnvArgs {
    #[clap(flatten)]
    federation: super::FederationArgs,
    /// Write to this file instead of stdout
    #[clap(long, short = 'f', conflicts_with = "command")]
    filename: Option<String>,
    /// Prefix variables with the export keyword
    #[clap(long, short = 'e', action = clap::ArgAction::SetTrue)]
    export: bool,
    /// Command to execute with the credentials in its environment, given after `--`
    ///
    /// The current process is replaced by the command; nothing is written.
    #[clap(value_parser, last = true)]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
pub async fn run(
    env: &crate::environment::Environment,
    args: &EnvArgs,
) -> Result<(), anyhow::Error> {
    let _span = tracing::info_span!("env").entered();

    let credentials = super::obtain_credentials_from_env(env, &args.federation).await?;
    let envlist = crate::environment::EnvironmentList::from_credentials(&credentials);

    if !args.command.is_empty() {
        return Err(exec(&args.command, &envlist).into());
    }

    let style = if args.export {
        crate::environment::LineStyle::Export
    } else {
        crate::environment::LineStyle::Plain
    };
    let contents = envlist.render(style);

    match args.filename {
        Some(ref filename) => {
            super::write_private_file(std::path::Path::new(filename), contents.as_bytes())
                .await?;
            tracing::info!(message = "Wrote credentials to an environment file", filename = %filename, expiration = ?credentials.expiration);
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Replace the current process with `command`, adding credentials to the current environment.
///
/// Returns only when the command couldn't be executed.
pub fn exec(command: &[String], envlist: &crate::environment::EnvironmentList) -> crate::error::Error {
    use std::os::unix::process::CommandExt;

    let Some((program, args)) = command.split_first() else {
        return crate::error::Error::ConfigError("no command to execute".to_string());
    };

    tracing::debug!(message = "Executing a command with credentials", program = %program, args = ?args);
    // Read from the process rather than `Environment`, which skips non UTF-8 variables.
    let e = std::process::Command::new(program)
        .args(args)
        .env_clear()
        .envs(envlist.apply_to(std::env::vars_os()))
        .exec();
    crate::error::Error::ExecError(program.to_owned(), e)
}
