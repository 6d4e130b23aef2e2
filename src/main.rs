use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ticketdesk::cli::{Cli, Commands, ConfigAction, ProjectAction};
use ticketdesk::commands::{
    cmd_attach, cmd_board, cmd_categories, cmd_config_get, cmd_config_set, cmd_config_show,
    cmd_create, cmd_delete, cmd_login, cmd_logout, cmd_ls, cmd_move, cmd_note, cmd_passwd,
    cmd_project_create, cmd_project_delete, cmd_project_ls, cmd_project_show,
    cmd_project_update, cmd_show, cmd_update, cmd_users, cmd_whoami,
};
use ticketdesk::query::GroupMode;

/// Log filter, e.g. `TICKETDESK_LOG=debug`.
const LOG_ENV: &str = "TICKETDESK_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login {
            email,
            password,
            user_type,
            json,
        } => cmd_login(&email, password, user_type, json).await,
        Commands::Logout { json } => cmd_logout(json),
        Commands::Whoami { json } => cmd_whoami(json),
        Commands::Passwd { current, new, json } => cmd_passwd(current, new, json).await,

        Commands::Ls {
            view,
            server,
            page,
            json,
        } => cmd_ls(view.to_controls(GroupMode::Status), server, page, json).await,
        Commands::Board {
            view,
            group,
            height,
            json,
        } => cmd_board(view.to_controls(group), height, json).await,
        Commands::Show { id, json } => cmd_show(&id, json).await,

        Commands::Create {
            subject,
            fields,
            json,
        } => cmd_create(fields.into_options(Some(subject)), json).await,
        Commands::Update {
            id,
            subject,
            fields,
            json,
        } => cmd_update(&id, fields.into_options(subject), json).await,
        Commands::Delete { id, yes, json } => cmd_delete(&id, yes, json).await,
        Commands::Move { id, status, json } => cmd_move(&id, status, json).await,
        Commands::Note { id, text, json } => cmd_note(&id, &text, json).await,
        Commands::Attach { id, files, json } => cmd_attach(&id, &files, json).await,

        Commands::Project { action } => match action {
            ProjectAction::Ls { json } => cmd_project_ls(json).await,
            ProjectAction::Show { id, json } => cmd_project_show(&id, json).await,
            ProjectAction::Create { name, fields, json } => {
                cmd_project_create(fields.into_options(Some(name)), json).await
            }
            ProjectAction::Update {
                id,
                name,
                fields,
                json,
            } => cmd_project_update(&id, fields.into_options(name), json).await,
            ProjectAction::Delete { id, yes, json } => cmd_project_delete(&id, yes, json).await,
        },

        Commands::Categories { json } => cmd_categories(json).await,
        Commands::Users { json } => cmd_users(json).await,

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(json),
            ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
            ConfigAction::Get { key, json } => cmd_config_get(&key, json),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
