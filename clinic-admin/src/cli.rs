use clap::{Parser, Subcommand};
use clinic_api::AppointmentId;

#[derive(Debug, Parser)]
#[command(name = "clinic-admin")]
#[command(about = "Admin client for clinic appointments and patients")]
pub struct Cli {
    /// Run against local in-memory data instead of the clinic backend
    #[arg(long, global = true)]
    pub dev: bool,

    /// Override the configured backend URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and store the session locally
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account and sign in with it
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "USER")]
        role: String,
    },
    /// Sign out and remove the local session
    Logout,
    /// Show the signed-in user's profile
    Profile,
    /// Work with appointments
    #[command(subcommand)]
    Appointments(AppointmentsCommand),
    /// Work with patients
    #[command(subcommand)]
    Patients(PatientsCommand),
    /// Print config path and create default file if missing
    ConfigPath,
}

#[derive(Debug, Subcommand)]
pub enum AppointmentsCommand {
    /// List all appointments
    List,
    /// Show one appointment
    View { id: AppointmentId },
    /// Hand one appointment to the editor
    Edit { id: AppointmentId },
    /// Delete one or more appointments
    Delete {
        #[arg(required = true)]
        ids: Vec<AppointmentId>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum PatientsCommand {
    /// List all patients
    List,
}
