pub mod ansi;
pub mod console;
pub mod port;
pub mod report;
pub mod script;
pub mod session;

pub use console::{Console, SerialConsole};
pub use report::SessionReport;
pub use script::{CommandStep, ProbeScript};
pub use session::{Exchange, ExchangeKind, Finding, Session, SessionOptions};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Cannot open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
        /// Ports that could be used instead
        available: Vec<String>,
    },
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid probe script: {0}")]
    Script(#[from] toml::de::Error),
}

/// Run a script against a console and collect the outcome
pub fn run_session<C: Console>(
    console: C,
    port: impl Into<String>,
    script: &ProbeScript,
    options: SessionOptions,
) -> SessionReport {
    let started_at = chrono::Utc::now();
    log::info!("Running {} script", script.name);

    let mut session = Session::new(console, options);
    let findings = session.run_script(script);
    for finding in &findings {
        log::warn!("{finding}");
    }

    SessionReport {
        script: script.name.clone(),
        port: port.into(),
        started_at,
        exchanges: session.into_exchanges(),
        findings,
    }
}
