use std::sync::Arc;

use portal_onboarding::cli;
use portal_onboarding::config::PortalConfig;
use portal_onboarding::onboarding::{OnboardingManager, Route, SettingsMarkerStore};
use portal_onboarding::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = PortalConfig::from_env()?;

    eprintln!("Institution portal v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Role: {}", config.role);
    eprintln!(
        "   Institution: {}",
        config.institution_id.as_deref().unwrap_or("(none)")
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}\n", config.db_path.display());

    // ── Onboarding ───────────────────────────────────────────────────────
    let markers = Arc::new(SettingsMarkerStore::new(Arc::clone(&db)));
    let manager = OnboardingManager::new(markers, config.institution_id.clone());
    let auth = config.auth_context();

    let route = manager.resolve_route(&auth).await;
    tracing::info!(route = ?route, "Resolved landing route");

    match route {
        Route::Onboarding => {
            eprintln!("{}\n", cli::HELP);
            cli::run(&manager).await?;
            let route = manager.resolve_route(&auth).await;
            println!("Landing: {}", describe(&route));
        }
        other => println!("Landing: {}", describe(&other)),
    }

    Ok(())
}

fn describe(route: &Route) -> String {
    match route {
        Route::Login(reason) => format!("login ({reason:?})"),
        Route::AdminShell => "administrative shell".to_string(),
        Route::UserShell => "user shell".to_string(),
        Route::Onboarding => "onboarding wizard".to_string(),
        Route::InstitutionShell => "institution shell".to_string(),
    }
}
