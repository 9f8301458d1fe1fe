use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use ecoedu_panel::{
    Config, PanelState,
    models::proof::ForwardOutcome,
    notify::TracingNotifier,
    view_models::roster::ViewMode,
};

#[derive(Parser)]
#[command(name = "ecoedu-panel", about = "EcoEdu service-provider panel")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login {
        #[arg(long, env = "PANEL_EMAIL")]
        email: String,
        /// Account password.
        #[arg(long, env = "PANEL_PASSWORD", hide_env_values = true)]
        password: String,
        /// "Participant", "Service Provider", "College" or "admin".
        #[arg(long = "as", default_value = "Service Provider")]
        user_type: String,
    },
    /// Forget the persisted session.
    Logout,
    /// Show the restored session.
    Whoami,
    /// Ask the server whether the session is still valid.
    Check,
    /// List a project's enrolled participants.
    Roster {
        project_id: String,
        /// Filter by participant name or service type.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        grid: bool,
    },
    /// Approve a pending or rejected enrollment.
    Approve {
        project_id: String,
        enrollment_id: String,
    },
    /// Reject a pending enrollment.
    Reject {
        project_id: String,
        enrollment_id: String,
        #[arg(long)]
        remark: String,
    },
    /// Show the proof a participant submitted.
    Proof {
        project_id: String,
        enrollment_id: String,
    },
    /// Forward a participant's submitted proof to the administrator.
    SendProof {
        project_id: String,
        enrollment_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    tracing::debug!("Configuration loaded for {}", config.api_base_url);

    let state = PanelState::new(&config, Arc::new(TracingNotifier))?;
    state.session.restore().await;

    match cli.command {
        Command::Login { email, password, user_type } => {
            let password = Zeroizing::new(password);
            let route = state
                .session
                .login(&email, &password, &user_type)
                .await
                .context("Login failed")?;
            println!("{}", route);
        }

        Command::Logout => {
            state.session.logout().await?;
        }

        Command::Whoami => {
            let session = state.session.snapshot().await;
            match session.user_type() {
                Some(user_type) => println!("{} -> {}", user_type, session.profile_route()),
                None => println!("not logged in"),
            }
        }

        Command::Check => {
            let valid = state.session.check().await;
            println!("{}", if valid { "authenticated" } else { "not authenticated" });
            if !valid {
                std::process::exit(1);
            }
        }

        Command::Roster { project_id, search, grid } => {
            let mut roster = state.roster(&project_id);
            roster.refresh().await?;
            if let Some(search) = search {
                roster.set_query(search);
            }
            if grid {
                roster.set_view_mode(ViewMode::Grid);
            }

            for row in roster.rows() {
                let e = row.enrollment;
                match roster.view_mode() {
                    ViewMode::List => println!(
                        "{:>3}  {:<24} {:<28} {:<16} {:<18} {:<18} earned={} allocated={} actions={:?}",
                        row.serial,
                        e.name,
                        e.display_email(),
                        e.location,
                        e.service_type,
                        e.status,
                        e.credits_earned_label(),
                        e.credits_allocated_label(),
                        row.actions,
                    ),
                    ViewMode::Grid => println!(
                        "[{}] {} | {} | {} | {}",
                        e.status,
                        e.name,
                        e.service_type,
                        e.location,
                        e.enrollment_day(),
                    ),
                }
            }
        }

        Command::Approve { project_id, enrollment_id } => {
            let mut roster = state.roster(&project_id);
            roster.refresh().await?;
            roster.approve(&enrollment_id).await?;
        }

        Command::Reject { project_id, enrollment_id, remark } => {
            let mut roster = state.roster(&project_id);
            roster.refresh().await?;
            roster.open_reject(&enrollment_id)?;
            roster.set_reject_remark(remark);
            roster.confirm_reject().await?;
        }

        Command::Proof { project_id, enrollment_id } => {
            let mut roster = state.roster(&project_id);
            roster.refresh().await?;
            let enrollment = roster.view_details(&enrollment_id)?.clone();

            let mut inspector = state.proof_inspector();
            let artifact = inspector.open(&project_id, &enrollment).await;
            println!("image: {}", artifact.proof_image.as_deref().unwrap_or("No Image Proof Available"));
            println!("video: {}", artifact.proof_video.as_deref().unwrap_or("No Video Proof Available"));
            if inspector.can_send_to_admin() {
                println!("proof can be sent to the admin");
            }
        }

        Command::SendProof { project_id, enrollment_id } => {
            let mut roster = state.roster(&project_id);
            roster.refresh().await?;
            let enrollment = roster.view_details(&enrollment_id)?.clone();

            let mut inspector = state.proof_inspector();
            inspector.open(&project_id, &enrollment).await;
            if inspector.send_to_admin().await? != ForwardOutcome::Forwarded {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
