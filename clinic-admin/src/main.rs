mod api;
mod app;
mod bootstrap;
mod cli;
mod config;
mod render;
mod runtime;
mod storage;
mod time_utils;

use anyhow::{bail, Context, Result};
use app::{surface_channel, App, OperationStatus, SessionStore, SurfaceRequest, SurfaceRx};
use clap::Parser;
use clinic_api::{AppointmentId, ClinicApi, Credentials, NewUser};
use cli::{AppointmentsCommand, Cli, Commands, PatientsCommand};
use runtime::{Action, ActionRx, ActionTx};
use std::io::{self, BufRead, Write};
use time::OffsetDateTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env.clinic
    dotenvy::from_filename(".env.clinic").ok();

    // Logs go to stderr; stdout carries the tables
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_admin=info,clinic_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Commands::ConfigPath = cli.command {
        let path = config::ClinicConfig::config_path()?;
        if config::ClinicConfig::write_default_if_missing(&path)? {
            println!("Created default config at:");
        }
        println!("{}", path.display());
        return Ok(());
    }

    let mut cfg = config::ClinicConfig::load()?;
    if let Some(url) = cli.api_url {
        cfg.api_url = url;
    }

    let (api, storage) = bootstrap::connect(cli.dev, &cfg)?;
    let (surface_tx, surface_rx) = surface_channel();
    let app = App::new(SessionStore::restore(storage), surface_tx);
    let (action_tx, action_rx) = runtime::channel();

    let mut runner = Runner {
        app,
        api,
        action_tx,
        action_rx,
        surface_rx,
    };
    runner.run(cli.command).await
}

struct Runner {
    app: App,
    api: Box<dyn ClinicApi>,
    action_tx: ActionTx,
    action_rx: ActionRx,
    surface_rx: SurfaceRx,
}

impl Runner {
    async fn dispatch(&mut self, actions: impl IntoIterator<Item = Action>) -> Result<()> {
        for action in actions {
            self.action_tx
                .send(action)
                .context("Action queue closed")?;
        }
        runtime::drain_actions(&mut self.action_rx, &mut self.app, self.api.as_ref()).await;
        Ok(())
    }

    async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login { username } => {
                let username = match username {
                    Some(username) => username,
                    None => prompt("Username: ")?,
                };
                let password = rpassword::prompt_password("Password: ")
                    .context("Failed to read password")?;
                self.dispatch([Action::Login(Credentials::new(username, password))])
                    .await?;
                self.print_session()
            }
            Commands::Register {
                username,
                first_name,
                last_name,
                email,
                role,
            } => {
                let password = rpassword::prompt_password("Password: ")
                    .context("Failed to read password")?;
                let new_user = NewUser {
                    username,
                    password,
                    first_name,
                    last_name,
                    email,
                    role,
                };
                self.dispatch([Action::Register(new_user)]).await?;
                self.print_session()
            }
            Commands::Logout => {
                if !self.app.session.is_authenticated() {
                    println!("Not logged in.");
                }
                self.dispatch([Action::Logout]).await?;
                println!("Local session removed.");
                ensure_ok(self.app.session.status())
            }
            Commands::Profile => {
                let Some(user_id) = self.app.session.session().map(|s| s.user_id.clone()) else {
                    bail!("Not logged in. Run `clinic-admin login` first.");
                };
                self.dispatch([Action::FetchProfile { user_id }]).await?;
                ensure_ok(self.app.session.status())?;
                if let Some(profile) = self.app.session.profile() {
                    println!("{}", render::profile_detail(profile));
                }
                Ok(())
            }
            Commands::Appointments(command) => self.run_appointments(command).await,
            Commands::Patients(PatientsCommand::List) => {
                self.dispatch([Action::FetchPatients]).await?;
                ensure_ok(self.app.patients.status())?;
                println!("{}", render::patients_table(&self.app.patients));
                Ok(())
            }
            Commands::ConfigPath => Ok(()),
        }
    }

    async fn run_appointments(&mut self, command: AppointmentsCommand) -> Result<()> {
        bootstrap::initialize_app_state(&mut self.app, self.api.as_ref()).await?;
        ensure_ok(self.app.appointments.status())?;

        match command {
            AppointmentsCommand::List => {
                let now = time_utils::to_local_time(OffsetDateTime::now_utc());
                println!(
                    "{}",
                    render::appointments_table(&self.app.appointments, &self.app.selection, now)
                );
                if let Some(line) = render::status_line("patients", self.app.patients.status()) {
                    eprintln!("{}", line);
                }
                Ok(())
            }
            AppointmentsCommand::View { id } => {
                self.dispatch([Action::SetSelection(vec![id]), Action::RequestView])
                    .await?;
                match self.surface_rx.try_recv() {
                    Ok(SurfaceRequest::View(payload)) => {
                        println!("{}", render::payload_detail("View", &payload));
                        Ok(())
                    }
                    _ => bail!("Appointment {} not found", id),
                }
            }
            AppointmentsCommand::Edit { id } => {
                self.dispatch([Action::SetSelection(vec![id]), Action::RequestEdit])
                    .await?;
                match self.surface_rx.try_recv() {
                    Ok(SurfaceRequest::Edit(payload)) => {
                        println!("{}", serde_json::to_string_pretty(&payload)?);
                        Ok(())
                    }
                    _ => bail!("Appointment {} not found", id),
                }
            }
            AppointmentsCommand::Delete { ids, yes } => self.delete(ids, yes).await,
        }
    }

    async fn delete(&mut self, ids: Vec<AppointmentId>, yes: bool) -> Result<()> {
        self.dispatch([Action::SetSelection(ids), Action::RequestDelete])
            .await?;
        if !self.app.is_delete_dialog_open() {
            bail!("Nothing selected");
        }
        let count = self.app.selection.len();

        let confirmed = yes || confirm(&format!("Delete {} appointment(s)? [y/N] ", count))?;
        if !confirmed {
            self.dispatch([Action::CancelDelete]).await?;
            println!("Cancelled.");
            return Ok(());
        }

        self.dispatch([Action::ConfirmDelete]).await?;
        let Some(report) = &self.app.last_delete_report else {
            return Ok(());
        };
        println!("{}", render::delete_report(report));
        if !report.all_succeeded() {
            bail!("{} appointment(s) were not deleted", report.failed().len());
        }
        Ok(())
    }

    fn print_session(&self) -> Result<()> {
        if let Some(message) = self.app.session.last_error() {
            bail!("{}", message);
        }
        if let Some(session) = self.app.session.session() {
            println!("{}", render::session_summary(session));
        }
        Ok(())
    }
}

fn ensure_ok(status: &OperationStatus) -> Result<()> {
    match status.error() {
        Some(message) => bail!("{}", message),
        None => Ok(()),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(question)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
