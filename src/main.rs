use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spotify_analytics::{
    fetch_profile, fetch_report, save_report, AuthProgress, Config, RecencyWindow, SessionContext,
    SessionManager, TrackReport, UserProfile, DEFAULT_LIMIT,
};

#[derive(Parser)]
#[command(name = "spotify-analytics")]
#[command(about = "Report your most listened Spotify tracks")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect your Spotify account
    Login,

    /// Show your top tracks and their popularity breakdown
    Report {
        /// How many tracks to fetch (Spotify caps a page at 50)
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,

        /// Listening window to report on
        #[arg(long, value_enum, default_value_t = RecencyWindow::ShortTerm)]
        window: RecencyWindow,

        /// Save the report as JSON under reports/
        #[arg(long)]
        save: bool,
    },

    /// Show the connected account
    Whoami,

    /// Disconnect and clear this session's token cache
    Logout,

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Login => {
            login().await?;
        }
        Commands::Report {
            limit,
            window,
            save,
        } => {
            report(limit, window, save).await?;
        }
        Commands::Whoami => {
            whoami().await?;
        }
        Commands::Logout => {
            logout().await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

fn load_manager() -> Result<SessionManager> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Please copy .env.example to .env and fill in your credentials.".yellow()
        );
        std::process::exit(1);
    }

    SessionManager::new(config).context("Failed to initialize session manager")
}

/// Run the interactive handshake unless a cached token already covers this
/// session. Returns the profile when a fresh handshake completed.
async fn ensure_authenticated(
    manager: &SessionManager,
    session: &mut SessionContext,
) -> Result<Option<UserProfile>> {
    match manager.begin_authorization(session).await? {
        AuthProgress::Authenticated => Ok(None),
        AuthProgress::RedirectTo(auth_url) => {
            println!("\nOpen this URL in your browser to authorize Spotify:");
            println!("{}\n", auth_url);

            print!("Enter the URL you were redirected to: ");
            io::stdout().flush()?;

            let mut redirect_url = String::new();
            io::stdin().read_line(&mut redirect_url)?;

            let profile = manager
                .complete_authorization(session, redirect_url.trim())
                .await
                .context("Authentication failed")?;

            Ok(Some(profile))
        }
    }
}

async fn login() -> Result<()> {
    println!("{}", "Spotify Analytics".cyan().bold());
    println!("{}", "=".repeat(50));

    let manager = load_manager()?;
    let mut session = manager.start_session()?;

    let profile = match ensure_authenticated(&manager, &mut session).await? {
        Some(profile) => Some(profile),
        None => {
            let client = session.client().context("Session is not authenticated")?;
            fetch_profile(client).await.ok()
        }
    };

    match profile {
        Some(profile) => {
            let email = profile.email.as_deref().unwrap_or("no email on record");
            println!(
                "\nConnected as {} ({})",
                profile.display_name.green(),
                email.cyan()
            );
        }
        None => println!("\n{}", "Connected, but could not fetch your profile.".yellow()),
    }

    Ok(())
}

async fn report(limit: u32, window: RecencyWindow, save: bool) -> Result<()> {
    println!("{}", "Your Top Tracks".cyan().bold());
    println!("{}", "=".repeat(50));

    let manager = load_manager()?;
    let mut session = manager.start_session()?;
    ensure_authenticated(&manager, &mut session).await?;

    let client = session.client().context("Session is not authenticated")?;

    match fetch_profile(client).await {
        Ok(profile) => println!("Connected as {}", profile.display_name.green()),
        Err(e) => println!("{} {}", "Could not fetch your profile:".yellow(), e),
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!("Fetching your {} top tracks...", window));

    let (track_report, fetch_error) = fetch_report(client, limit, window).await;

    spinner.finish_and_clear();

    if let Some(message) = fetch_error {
        println!("{}", "Could not fetch your top tracks from Spotify.".red());
        println!("{}", message.red());
        return Ok(());
    }

    if track_report.is_empty() {
        println!("{}", "No tracks in your listening history yet.".yellow());
        return Ok(());
    }

    print_track_table(&track_report);
    print_popularity_breakdown(&track_report);

    if save {
        let path = save_report(&track_report, Path::new("reports"))?;
        println!("\nReport saved to {}", path.display().to_string().cyan());
    }

    Ok(())
}

fn print_track_table(report: &TrackReport) {
    println!("\n{}", "Your most listened tracks, by popularity:".bold());

    for (i, record) in report.records().iter().enumerate() {
        println!(
            "{:2}. {} - {} (popularity {})",
            i + 1,
            record.name.green(),
            record.artists.join(", ").cyan(),
            record.popularity
        );
    }
}

fn print_popularity_breakdown(report: &TrackReport) {
    let Some(slices) = report.summarize_popularity() else {
        println!(
            "\n{}",
            "All popularity scores are zero; skipping the breakdown.".yellow()
        );
        return;
    };

    println!("\n{}", "Popularity share:".bold());

    let width = slices
        .iter()
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(48);

    for slice in &slices {
        let label: String = slice.label.chars().take(48).collect();
        let bar = "#".repeat((slice.share / 2.0).round() as usize);
        println!(
            "  {:<width$}  {:>5.1}%  {}",
            label,
            slice.share,
            bar.cyan(),
            width = width
        );
    }
}

async fn whoami() -> Result<()> {
    let manager = load_manager()?;
    let mut session = manager.start_session()?;

    match manager.begin_authorization(&mut session).await? {
        AuthProgress::Authenticated => {
            let client = session.client().context("Session is not authenticated")?;
            let profile = fetch_profile(client)
                .await
                .context("Failed to fetch your profile")?;

            let email = profile.email.as_deref().unwrap_or("no email on record");
            println!(
                "Connected as {} ({})",
                profile.display_name.green(),
                email.cyan()
            );
        }
        AuthProgress::RedirectTo(_) => {
            println!(
                "{}",
                "Not connected. Run `spotify-analytics login` first.".yellow()
            );
        }
    }

    Ok(())
}

async fn logout() -> Result<()> {
    let manager = load_manager()?;
    let mut session = manager.start_session()?;

    manager.logout(&mut session).context("Failed to log out")?;

    println!(
        "{}",
        "Logged out. This session's token cache has been cleared.".green()
    );

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Spotify Analytics Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");
    println!("   - Add 'http://127.0.0.1:8080/callback' as a redirect URI");

    println!("\n{}", "2. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REDIRECT_URI=http://127.0.0.1:8080/callback");

    println!("\n{}", "3. Usage".yellow());
    println!("   - spotify-analytics login                  (connect your account)");
    println!("   - spotify-analytics report                 (your top 10 of the last weeks)");
    println!("   - spotify-analytics report --window long-term --limit 20");
    println!("   - spotify-analytics logout                 (disconnect this session)");

    println!("\n{}", "Ready to go!".green());
}
