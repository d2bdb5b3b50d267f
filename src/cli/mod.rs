//! CLI module for the Kebun terminal client.
//!
//! Subcommands:
//! - `register` / `login` / `logout` / `whoami` - account and session
//! - `diagnose <plant> <image>` - run a diagnosis, optionally saving it
//! - `history list|show` - browse saved diagnoses
//! - `diseases list|show` - browse the disease catalog
//! - `plantings list|start|complete` - the planting tracker
//! - `weather` - daily forecast for a location

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::ApiFailure;
use crate::config::default_config_path;
use crate::diagnosis::{
    DiagnosisController, DiagnosisGateway, HistoryState, HistoryStore, Phase, PlantKind,
    ResultView, WorkflowEvent,
};
use crate::session::Session;
use crate::App;

#[derive(Parser, Debug)]
#[command(name = "kebun")]
#[command(author, version, about = "Terminal client for the Kebun plant-care platform", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override the API base URL
    #[arg(long, env = "KEBUN_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        /// Repeat the password
        #[arg(long)]
        repassword: String,
    },

    /// Log in and store the session
    Login {
        #[arg(long, required_unless_present = "google")]
        email: Option<String>,
        #[arg(long, required_unless_present = "google")]
        password: Option<String>,
        /// Sign in with Google instead of a password
        #[arg(long)]
        google: bool,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Diagnose a plant photo
    Diagnose {
        /// Plant type: tomat, cabai, or selada
        #[arg(long, value_parser = parse_plant)]
        plant: PlantKind,
        /// Path to a PNG or JPEG photo (max 5MB)
        #[arg(long)]
        image: PathBuf,
        /// Save the result without asking
        #[arg(long)]
        save: bool,
        /// Discard the result without asking
        #[arg(long, conflicts_with = "save")]
        discard: bool,
    },

    /// Saved diagnosis history
    #[command(subcommand)]
    History(HistoryCommands),

    /// Disease catalog
    #[command(subcommand)]
    Diseases(DiseaseCommands),

    /// Planting tracker
    #[command(subcommand)]
    Plantings(PlantingCommands),

    /// Daily weather forecast
    Weather {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List saved diagnoses
    List,
    /// Show one saved diagnosis in full
    Show {
        /// Record ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DiseaseCommands {
    /// List the disease catalog
    List,
    /// Show one disease in full
    Show {
        /// Disease ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlantingCommands {
    /// List your plantings
    List,
    /// Start tracking a planting
    Start {
        /// Plant type: tomat, cabai, or selada
        #[arg(value_parser = parse_plant)]
        plant: PlantKind,
    },
    /// Mark a planting as done
    Complete {
        /// Planting ID
        id: String,
    },
}

fn parse_plant(s: &str) -> Result<PlantKind, String> {
    s.parse()
}

/// Run a CLI command against the shared app state.
pub async fn run_command(cli: &Cli, app: &App) -> Result<()> {
    match &cli.command {
        Commands::Register {
            email,
            name,
            password,
            repassword,
        } => cmd_register(app, email, name, password, repassword).await,
        Commands::Login {
            email,
            password,
            google,
        } => {
            if *google {
                cmd_login_google(app).await
            } else {
                // clap guarantees both are present when --google is absent.
                cmd_login(
                    app,
                    email.as_deref().unwrap_or_default(),
                    password.as_deref().unwrap_or_default(),
                )
                .await
            }
        }
        Commands::Logout => cmd_logout(app).await,
        Commands::Whoami => cmd_whoami(app).await,
        Commands::Diagnose {
            plant,
            image,
            save,
            discard,
        } => {
            let choice = if *save {
                SaveChoice::Save
            } else if *discard {
                SaveChoice::Discard
            } else {
                SaveChoice::Ask
            };
            cmd_diagnose(app, *plant, image, choice).await
        }
        Commands::History(HistoryCommands::List) => cmd_history_list(app).await,
        Commands::History(HistoryCommands::Show { id }) => cmd_history_show(app, id).await,
        Commands::Diseases(DiseaseCommands::List) => cmd_diseases_list(app).await,
        Commands::Diseases(DiseaseCommands::Show { id }) => cmd_diseases_show(app, id).await,
        Commands::Plantings(PlantingCommands::List) => cmd_plantings_list(app).await,
        Commands::Plantings(PlantingCommands::Start { plant }) => {
            cmd_plantings_start(app, *plant).await
        }
        Commands::Plantings(PlantingCommands::Complete { id }) => {
            cmd_plantings_complete(app, id).await
        }
        Commands::Weather { lat, lon } => cmd_weather(app, *lat, *lon).await,
    }
}

fn api_err(failure: ApiFailure) -> anyhow::Error {
    anyhow::anyhow!(failure.user_message())
}

fn require_session(app: &App) -> Result<Arc<Session>> {
    app.session
        .current()
        .context("Anda harus login terlebih dahulu.")
}

async fn cmd_register(
    app: &App,
    email: &str,
    name: &str,
    password: &str,
    repassword: &str,
) -> Result<()> {
    let message = app
        .api
        .signup(email, name, password, repassword)
        .await
        .map_err(api_err)?;
    println!("{}", message);
    println!("Account created. Log in with: kebun login --email {}", email);
    Ok(())
}

async fn cmd_login(app: &App, email: &str, password: &str) -> Result<()> {
    let message = app.api.login(email, password).await.map_err(api_err)?;
    // Login does not return the name; fill it in from the profile.
    match app.api.refresh_profile().await {
        Ok(profile) => println!("Logged in as {} <{}>", profile.name, profile.email),
        Err(_) => println!("{}", message),
    }
    Ok(())
}

async fn cmd_login_google(app: &App) -> Result<()> {
    println!("Open this URL in your browser and sign in:");
    println!();
    println!("  {}", app.api.google_login_url());
    println!();
    print!("Paste the redirect URL (or the token) here: ");
    std::io::stdout().flush().ok();

    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read the callback input")?;

    let session = app.api.session_from_callback(&input).map_err(api_err)?;
    // Best effort; the decoded claims already carry email and name.
    let _ = app.api.refresh_profile().await;
    println!("Logged in as {}", session.user.email);
    Ok(())
}

async fn cmd_logout(app: &App) -> Result<()> {
    app.api.logout().await.map_err(api_err)?;
    println!("Logged out.");
    Ok(())
}

async fn cmd_whoami(app: &App) -> Result<()> {
    require_session(app)?;
    let profile = app.api.refresh_profile().await.map_err(api_err)?;

    println!("ID:     {}", profile.id);
    println!("Name:   {}", profile.name);
    println!("Email:  {}", profile.email);
    if let Some(created) = &profile.created_at {
        println!("Joined: {}", format_timestamp(created));
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SaveChoice {
    Save,
    Discard,
    Ask,
}

async fn cmd_diagnose(app: &App, plant: PlantKind, image: &Path, choice: SaveChoice) -> Result<()> {
    let gateway: Arc<dyn DiagnosisGateway> = app.api.clone();
    let (controller, mut events) = DiagnosisController::new(gateway, app.session.clone());

    controller.select_plant(plant);
    controller
        .attach_photo_from_path(image)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    println!("Menganalisis foto {}...", image.display());
    controller.start_diagnosis().await;
    print_toasts(&mut events);

    let Some(view) = controller.result_view() else {
        anyhow::bail!("Diagnosa tidak dapat dimulai.");
    };
    print_result(&view);

    if matches!(view, ResultView::Failed { .. }) {
        anyhow::bail!("Diagnosa gagal.");
    }

    if !view.offer_save() {
        if choice == SaveChoice::Save {
            println!();
            println!("Hasil ini tidak dapat disimpan.");
        }
        controller.close_result();
        return Ok(());
    }

    let save = match choice {
        SaveChoice::Save => true,
        SaveChoice::Discard => false,
        SaveChoice::Ask => {
            println!();
            print!("Simpan Diagnosa? [y/N] ");
            std::io::stdout().flush().ok();
            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer).ok();
            matches!(answer.trim().to_lowercase().as_str(), "y" | "ya" | "yes")
        }
    };

    if save {
        controller.save_diagnosis().await;
        print_toasts(&mut events);
        if controller.phase() != Phase::Idle {
            anyhow::bail!("Gagal menyimpan diagnosa.");
        }
    } else {
        controller.close_result();
    }
    Ok(())
}

async fn cmd_history_list(app: &App) -> Result<()> {
    let session = require_session(app)?;
    let gateway: Arc<dyn DiagnosisGateway> = app.api.clone();
    let store = HistoryStore::new(gateway);

    match store.refresh(&session.user.id).await.as_ref() {
        HistoryState::Loaded(records) if records.is_empty() => {
            println!("Belum ada riwayat diagnosa.");
        }
        HistoryState::Loaded(records) => {
            println!();
            println!(
                "{:24} {:18} {:8} {:24} {:>9}",
                "ID", "TANGGAL", "TANAMAN", "HASIL", "KEYAKINAN"
            );
            println!("{}", "-".repeat(88));
            for record in records {
                println!(
                    "{:24} {:18} {:8} {:24} {:>9}",
                    record.id,
                    format_timestamp(&record.created_at),
                    record.tanaman,
                    record.hasil.as_deref().unwrap_or("-"),
                    format!("{:.1}%", record.confidence * 100.0),
                );
            }
            println!();
        }
        HistoryState::Failed(message) => anyhow::bail!("{}", message.clone()),
        HistoryState::Loading => unreachable!("refresh returns a settled state"),
    }
    Ok(())
}

async fn cmd_history_show(app: &App, id: &str) -> Result<()> {
    let session = require_session(app)?;
    let gateway: Arc<dyn DiagnosisGateway> = app.api.clone();
    let store = HistoryStore::new(gateway);

    if let HistoryState::Failed(message) = store.refresh(&session.user.id).await.as_ref() {
        anyhow::bail!("{}", message.clone());
    }
    let view = store
        .view_record(id)
        .with_context(|| format!("Riwayat dengan ID {} tidak ditemukan", id))?;
    print_result(&view);
    Ok(())
}

async fn cmd_diseases_list(app: &App) -> Result<()> {
    let diseases = app.api.diseases().await.map_err(api_err)?;
    if diseases.is_empty() {
        println!("No diseases in the catalog.");
        return Ok(());
    }

    println!();
    println!("{:24} {:28} {:8}", "ID", "NAMA", "TANAMAN");
    println!("{}", "-".repeat(64));
    for disease in &diseases {
        println!(
            "{:24} {:28} {:8}",
            disease.id,
            disease.name,
            disease.tanaman.as_deref().unwrap_or("-"),
        );
    }
    println!();
    Ok(())
}

async fn cmd_diseases_show(app: &App, id: &str) -> Result<()> {
    let disease = app.api.disease(id).await.map_err(api_err)?;

    println!();
    println!("=== {} ===", disease.name);
    println!();
    if let Some(tanaman) = &disease.tanaman {
        println!("Tanaman:   {}", tanaman);
    }
    if let Some(deskripsi) = &disease.deskripsi {
        println!("Deskripsi: {}", deskripsi);
    }
    if let Some(penyebab) = &disease.penyebab {
        println!("Penyebab:  {}", penyebab);
    }
    print_guidance("Pencegahan", &disease.pencegahan);
    print_guidance("Pengendalian", &disease.pengendalian);
    println!();
    Ok(())
}

async fn cmd_plantings_list(app: &App) -> Result<()> {
    let session = require_session(app)?;
    let plantings = app.api.plantings(&session.user.id).await.map_err(api_err)?;
    if plantings.is_empty() {
        println!("Belum ada penanaman.");
        return Ok(());
    }

    println!();
    println!(
        "{:24} {:8} {:8} {:18} {:>9} {:18}",
        "ID", "TANAMAN", "STATUS", "MULAI", "DIAGNOSA", "TERAKHIR"
    );
    println!("{}", "-".repeat(92));
    for planting in &plantings {
        println!(
            "{:24} {:8} {:8} {:18} {:>9} {:18}",
            planting.id,
            planting.tanaman,
            if planting.is_done { "selesai" } else { "aktif" },
            format_timestamp(&planting.created_at),
            planting.diagnosis_count,
            planting
                .last_diagnosis_date
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();
    Ok(())
}

async fn cmd_plantings_start(app: &App, plant: PlantKind) -> Result<()> {
    let session = require_session(app)?;
    let planting = app
        .api
        .start_planting(&session.user.id, plant)
        .await
        .map_err(api_err)?;
    println!("Penanaman {} dimulai (ID: {}).", plant.label(), planting.id);
    Ok(())
}

async fn cmd_plantings_complete(app: &App, id: &str) -> Result<()> {
    let planting = app.api.complete_planting(id).await.map_err(api_err)?;
    println!("Penanaman {} ditandai selesai.", planting.id);
    Ok(())
}

async fn cmd_weather(app: &App, lat: f64, lon: f64) -> Result<()> {
    let forecast = app.api.weather_forecast(lat, lon).await.map_err(api_err)?;

    println!();
    println!("{:12} {:>7} {}", "TANGGAL", "SUHU", "CUACA");
    println!("{}", "-".repeat(44));
    for day in &forecast {
        println!("{:12} {:>6.1}C {}", day.date, day.temp, day.weather);
    }
    println!();
    Ok(())
}

/// Render one diagnosis result view, live or replayed from history.
fn print_result(view: &ResultView) {
    match view {
        ResultView::Analyzing => println!("Menganalisis..."),
        ResultView::Failed { message } => println!("[!!] {}", message),
        ResultView::DiseaseFound {
            title,
            plant,
            confidence_pct,
            image,
            description,
            cause,
            preventions,
            controls,
            ..
        } => {
            println!();
            println!("=== {} ===", title);
            println!();
            println!("Tanaman:   {}", plant);
            println!("Keyakinan: {}", confidence_pct);
            if let Some(image) = image {
                println!("Gambar:    {}", image);
            }
            println!();
            println!("Deskripsi: {}", description);
            println!("Penyebab:  {}", cause);
            println!();
            print_guidance("Pencegahan", preventions);
            print_guidance("Pengendalian", controls);
        }
        ResultView::NoDiseaseFound {
            message,
            confidence_pct,
            ..
        } => {
            println!();
            println!("{} (keyakinan {})", message, confidence_pct);
        }
    }
}

fn print_guidance(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", heading);
    for item in items {
        println!("  - {}", item);
    }
}

fn print_toasts(events: &mut tokio::sync::mpsc::UnboundedReceiver<WorkflowEvent>) {
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::Toast(message) = event {
            println!("{}", message);
        }
    }
}

fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn diagnose_parses_plant_and_image() {
        let cli = Cli::try_parse_from([
            "kebun", "diagnose", "--plant", "Tomat", "--image", "daun.jpg", "--save",
        ])
        .unwrap();
        match cli.command {
            Commands::Diagnose {
                plant,
                image,
                save,
                discard,
            } => {
                assert_eq!(plant, PlantKind::Tomat);
                assert_eq!(image, PathBuf::from("daun.jpg"));
                assert!(save);
                assert!(!discard);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn diagnose_rejects_unknown_plants_and_conflicting_flags() {
        assert!(Cli::try_parse_from([
            "kebun", "diagnose", "--plant", "bayam", "--image", "daun.jpg"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "kebun", "diagnose", "--plant", "tomat", "--image", "daun.jpg", "--save", "--discard"
        ])
        .is_err());
    }

    #[test]
    fn login_requires_credentials_unless_google() {
        assert!(Cli::try_parse_from(["kebun", "login"]).is_err());
        assert!(Cli::try_parse_from(["kebun", "login", "--google"]).is_ok());
        assert!(Cli::try_parse_from([
            "kebun",
            "login",
            "--email",
            "tani@kebun.id",
            "--password",
            "Rahasia1"
        ])
        .is_ok());
    }

    #[test]
    fn timestamps_render_human_readable() {
        assert_eq!(format_timestamp("2025-06-01T08:30:00Z"), "01 Jun 2025 08:30");
        assert_eq!(format_timestamp("not-a-date"), "not-a-date");
    }
}
