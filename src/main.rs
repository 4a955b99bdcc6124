use clap::Parser;

const LONG_ABOUT: &str = "\
Get AWS credentials using the GitLab pipeline ID token.

The role and the session name are derived from the GitLab project path slug and the pipeline id;
just provide the AWS account id and the ID token:

| name                    | default value                   | override                     |
|-------------------------|---------------------------------|------------------------------|
| role name               | gitlab-$CI_PROJECT_PATH_SLUG    | --role-name/-r               |
| role session name       | <role name>-$CI_PIPELINE_ID     | --role-session-name/-n       |
| aws account id          | $GITLAB_AWS_ACCOUNT_ID          | --aws-account/-A             |
| duration seconds        | $GITLAB_AWS_DURATION_SECONDS    | --duration-seconds/-d        |
| web identity token name | GITLAB_AWS_IDENTITY_TOKEN       | --web-identity-token-name/-j |";

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = LONG_ABOUT)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Store the credentials as a dotenv file
    Dotenv(gitlab_aws_credential_helper::cmd::dotenv::DotenvArgs),
    /// Return the credentials as environment variables, or execute a command with them
    Env(gitlab_aws_credential_helper::cmd::env::EnvArgs),
    /// Store the credentials in the AWS shared credentials file
    AwsProfile(gitlab_aws_credential_helper::cmd::aws_profile::AwsProfileArgs),
    /// Return the credentials as required by the AWS credential_process
    Process(gitlab_aws_credential_helper::cmd::process::ProcessArgs),
}

fn main() -> Result<(), anyhow::Error> {
    // stdout is reserved for credentials (env, process)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let env = gitlab_aws_credential_helper::environment::Environment::from_process();

    use gitlab_aws_credential_helper::cmd;
    match &cli.command {
        Commands::Dotenv(args) => cmd::dotenv::run(&env, args),
        Commands::Env(args) => cmd::env::run(&env, args),
        Commands::AwsProfile(args) => cmd::aws_profile::run(&env, args),
        Commands::Process(args) => cmd::process::run(&env, args),
    }
}
