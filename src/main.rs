use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    docuvid::logging::init().context("init logging")?;

    let cli = docuvid::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        docuvid::cli::Command::Generate(args) => {
            docuvid::generate::run(args).await.context("generate")?;
        }
        docuvid::cli::Command::Watch(args) => {
            docuvid::watch::run(args).await.context("watch")?;
        }
        docuvid::cli::Command::Status(args) => {
            docuvid::status::run_status(args).await.context("status")?;
        }
        docuvid::cli::Command::Sections(args) => {
            docuvid::status::run_sections(args).await.context("sections")?;
        }
        docuvid::cli::Command::Fix(args) => {
            docuvid::fix::run_fix(args).await.context("fix")?;
        }
        docuvid::cli::Command::Regenerate(args) => {
            docuvid::fix::run_regenerate(args).await.context("regenerate")?;
        }
        docuvid::cli::Command::UpdateCode(args) => {
            docuvid::fix::run_update_code(args).await.context("update code")?;
        }
        docuvid::cli::Command::Compile(args) => {
            docuvid::fix::run_compile(args).await.context("compile")?;
        }
        docuvid::cli::Command::Translate {
            command: docuvid::cli::TranslateCommand::Languages(args),
        } => {
            docuvid::translate::run_languages(args)
                .await
                .context("translate languages")?;
        }
        docuvid::cli::Command::Translate {
            command: docuvid::cli::TranslateCommand::List(args),
        } => {
            docuvid::translate::run_list(args)
                .await
                .context("translate list")?;
        }
        docuvid::cli::Command::Translate {
            command: docuvid::cli::TranslateCommand::Request(args),
        } => {
            docuvid::translate::run_request(args)
                .await
                .context("translate request")?;
        }
    }

    Ok(())
}
