mod config;
mod render;

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    operations::{catalog, WEAPON_TYPE_INPUT},
    AdminSession, FormDraft, HumanBeingClient, NoticeKind, OperationId, SubmitOutcome,
};
use shared::domain::{Car, HumanBeingId, Mood, WeaponType};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

/// Admin client for the human-being registry.
#[derive(Parser, Debug)]
#[command(name = "hb-admin", version)]
struct Cli {
    /// Overrides `api_base_url` from the config file and environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One page of records.
    List {
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: i64,
    },
    Create(RecordArgs),
    /// Changes the given fields and keeps the rest.
    Update {
        id: i64,
        #[command(flatten)]
        fields: RecordArgs,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Bulk operations.
    Ops {
        #[command(subcommand)]
        command: Option<OpsCommand>,
    },
}

#[derive(Subcommand, Debug)]
enum OpsCommand {
    Run {
        operation: OperationId,
        #[arg(long)]
        weapon_type: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct RecordArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    x: Option<String>,
    #[arg(long)]
    y: Option<String>,
    #[arg(long)]
    real_hero: Option<bool>,
    #[arg(long)]
    has_toothpick: Option<bool>,
    #[arg(long, conflicts_with = "no_car")]
    car_name: Option<String>,
    #[arg(long, conflicts_with = "no_car")]
    car_cool: Option<bool>,
    /// Removes the car from the record.
    #[arg(long)]
    no_car: bool,
    #[arg(long)]
    mood: Option<Mood>,
    #[arg(long)]
    impact_speed: Option<String>,
    #[arg(long)]
    soundtrack: Option<String>,
    #[arg(long)]
    weapon_type: Option<WeaponType>,
}

impl RecordArgs {
    fn apply(self, draft: &mut FormDraft) {
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.x {
            draft.x = v;
        }
        if let Some(v) = self.y {
            draft.y = v;
        }
        if let Some(v) = self.real_hero {
            draft.real_hero = v;
        }
        if let Some(v) = self.has_toothpick {
            draft.has_toothpick = Some(v);
        }
        if self.no_car {
            draft.car = None;
        } else if self.car_name.is_some() || self.car_cool.is_some() {
            let car = draft.car.get_or_insert_with(|| Car {
                name: String::new(),
                cool: false,
            });
            if let Some(v) = self.car_name {
                car.name = v;
            }
            if let Some(v) = self.car_cool {
                car.cool = v;
            }
        }
        if let Some(v) = self.mood {
            draft.mood = Some(v);
        }
        if let Some(v) = self.impact_speed {
            draft.impact_speed = v;
        }
        if let Some(v) = self.soundtrack {
            draft.soundtrack_name = v;
        }
        if let Some(v) = self.weapon_type {
            draft.weapon_type = Some(v);
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings()?;
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(size) = cli.page_size {
        settings.page_size = size;
    }
    settings.validate()?;
    Ok(settings)
}

/// Prints the session banner; an error banner becomes the command's error.
fn finish(session: &AdminSession) -> Result<()> {
    match session.notice() {
        Some(notice) if notice.kind == NoticeKind::Error => bail!("{}", notice.message),
        Some(notice) => {
            println!("{}", render::render_notice(notice));
            Ok(())
        }
        None => Ok(()),
    }
}

fn print_page(session: &AdminSession) {
    let pagination = session.list().pagination();
    println!("{}", render::render_table(session.records(), &pagination));
    if let Some(footer) = render::render_footer(&pagination) {
        println!("\n{footer}");
    }
}

async fn submit(session: &mut AdminSession, draft: FormDraft) -> Result<()> {
    match session.submit(&draft).await {
        SubmitOutcome::Saved(record) => {
            println!("{}", render::render_record(&record));
            finish(session)
        }
        SubmitOutcome::Invalid(errors) => {
            eprintln!("{}:", session.form().title());
            eprintln!("{}", render::render_field_errors(&errors));
            bail!("{} field(s) failed validation", errors.len())
        }
        SubmitOutcome::Failed(_) => finish(session),
    }
}

fn confirm_delete() -> Result<bool> {
    print!("Are you sure you want to delete this human being? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    info!(api = %settings.api_base_url, page_size = settings.page_size, "starting admin client");

    let client = HumanBeingClient::with_timeout(
        &settings.api_base_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let mut session = AdminSession::new(Arc::new(client), settings.page_size);

    match cli.command {
        Command::List { page, search } => {
            let index = page.saturating_sub(1);
            let searched = match search {
                Some(term) => session.search(&term).await,
                None => None,
            };
            if searched.is_none() || index > 0 {
                session.go_to_page(index).await;
            }
            finish(&session)?;
            print_page(&session);
        }
        Command::Show { id } => {
            if let Some(record) = session.fetch(HumanBeingId(id)).await {
                println!("{}", render::render_record(&record));
            }
            finish(&session)?;
        }
        Command::Create(fields) => {
            let mut draft = session.open_create();
            fields.apply(&mut draft);
            submit(&mut session, draft).await?;
        }
        Command::Update { id, fields } => {
            let Some(mut draft) = session.open_edit(HumanBeingId(id)).await else {
                return finish(&session);
            };
            fields.apply(&mut draft);
            submit(&mut session, draft).await?;
        }
        Command::Delete { id, yes } => {
            let id = HumanBeingId(id);
            if !yes && !confirm_delete()? {
                println!("Cancelled");
                return Ok(());
            }
            session.delete(id).await;
            finish(&session)?;
        }
        Command::Ops { command: None } => {
            println!("{}", render::render_catalog(&catalog()));
        }
        Command::Ops {
            command:
                Some(OpsCommand::Run {
                    operation,
                    weapon_type,
                }),
        } => {
            if let Some(value) = weapon_type {
                session.set_operation_input(operation, WEAPON_TYPE_INPUT, value);
            }
            let Some(report) = session.run_operation(operation).await else {
                bail!(
                    "{} needs its required inputs; see `hb-admin ops`",
                    operation.descriptor().title
                );
            };
            finish(&session)?;
            if report.refresh_requested && session.list().last_error().is_none() {
                println!();
                print_page(&session);
            }
        }
    }

    Ok(())
}
