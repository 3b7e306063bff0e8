//! Ticket scanner console.
//!
//! Reads scanned payloads (one per line, as keyboard-wedge scanners type
//! them) from stdin and shows each verification result until the operator
//! presses Enter.

use std::sync::Arc;
use std::time::Duration;
use tixscan::auth::{LoginClient, SessionStore};
use tixscan::config::AuthorityKind;
use tixscan::console::Console;
use tixscan::decoder::ChannelDevice;
use tixscan::validation::{ValidationClient, ValidationConfig};
use tixscan::{
    Config, Credential, DriverExit, Extractor, HttpAuthority, InMemoryAuthority, ScanDriver,
    ScanEnvironment, ScanReducer, ScanState, ScanStore, TicketAuthority,
};
use tixscan_core::environment::{Clock, SystemClock};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // stdout belongs to the console
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tixscan=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        api_base_url = %config.api_base_url,
        authority = ?config.authority,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let session = Arc::new(SessionStore::new());
    let authority: Arc<dyn TicketAuthority> = match config.authority {
        AuthorityKind::Http => {
            sign_in(&config, &session).await;
            let client = ValidationClient::new(&ValidationConfig {
                base_url: config.api_base_url.clone(),
                timeout: config.request_timeout,
            })?;
            Arc::new(HttpAuthority::new(client))
        },
        AuthorityKind::Memory => {
            session.set(Credential::new(
                config.token.clone().unwrap_or_else(|| "rehearsal-session".to_string()),
            ));
            Arc::new(InMemoryAuthority::seeded(clock.clone()))
        },
    };

    let environment = ScanEnvironment::new(authority, session, clock)
        .with_extractor(Extractor::new(&config.extractor)?)
        .with_settle_delay(config.settle_delay);
    let store: ScanStore = ScanStore::new(ScanState::new(), ScanReducer::new(), environment);

    let (device, scanner) = ChannelDevice::new(16);
    let (stop, stopped) = oneshot::channel::<()>();
    let driver = ScanDriver::new(store.clone(), Arc::new(device));
    let driver = tokio::spawn(async move {
        driver
            .run_until(async {
                let _ = stopped.await;
            })
            .await
    });

    let console = Console::new(store.clone(), scanner);
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    console.run(input, tokio::io::stdout()).await?;

    let _ = stop.send(());
    match driver.await? {
        DriverExit::Shutdown => {},
        DriverExit::DeviceFault(fault) => warn!(%fault, "Scanner was unavailable"),
        DriverExit::DeviceClosed => warn!("Scanner input closed"),
    }

    if let Err(error) = store.shutdown(SHUTDOWN_TIMEOUT).await {
        warn!(%error, "Pending verifications abandoned");
    }
    info!("Scanner stopped");
    Ok(())
}

/// Establish the organizer session: a configured token, else a password login
async fn sign_in(config: &Config, session: &SessionStore) {
    let login = match LoginClient::new(config.api_base_url.clone(), config.request_timeout) {
        Ok(login) => login,
        Err(error) => {
            warn!(%error, "Could not build the login client");
            return;
        },
    };

    if let Some(token) = &config.token {
        let credential = Credential::new(token.clone());
        match login.verify(&credential).await {
            Ok(true) => info!("Configured token accepted"),
            Ok(false) => warn!("Configured token was rejected; scans will fail until it is replaced"),
            Err(error) => warn!(%error, "Could not verify the configured token"),
        }
        session.set(credential);
        return;
    }

    let (Some(email), Some(password)) = (&config.email, &config.password) else {
        warn!("No token or organizer login configured; scans will report a signed-out session");
        return;
    };

    match login.login(email, password).await {
        Ok(signed_in) => {
            info!(username = %signed_in.username, role = %signed_in.role, "Signed in");
            session.set(signed_in.credential());
        },
        Err(error) => warn!(%error, "Organizer login failed"),
    }
}
