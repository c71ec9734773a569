use crate::commands::{
    run_catalog, run_classify, run_evaluate, CatalogArgs, ClassifyArgs, EvaluateArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use csm_playbooks::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "CSM Playbooks",
    about = "Classify customers and evaluate customer-success playbook triggers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Classify a plan code and MRR into a segment
    Classify(ClassifyArgs),
    /// Evaluate a customer snapshot file against the playbook catalog
    Evaluate(EvaluateArgs),
    /// List the configured playbook triggers
    Catalog(CatalogArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Classify(args) => run_classify(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Catalog(args) => run_catalog(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["csm-playbooks"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn evaluate_requires_snapshot_path() {
        assert!(Cli::try_parse_from(["csm-playbooks", "evaluate"]).is_err());

        let cli = Cli::try_parse_from([
            "csm-playbooks",
            "evaluate",
            "--snapshot",
            "snapshot.json",
            "--customer-id",
            "cust-7",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.customer_id, "cust-7");
                assert!(args.previous.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn catalog_segment_filter_is_parsed() {
        let cli = Cli::try_parse_from(["csm-playbooks", "catalog", "--segment", "mid_market"])
            .expect("parses");
        match cli.command {
            Some(Command::Catalog(args)) => {
                assert_eq!(args.segment.as_deref(), Some("mid_market"))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
