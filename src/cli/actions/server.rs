use crate::{
    api::{
        self,
        handlers::{
            auth::{AuthConfig, AuthState},
            records::RecordsState,
        },
    },
    cli::telemetry,
    records::{MemoryRecordStore, RecordStore},
};
use anyhow::Result;
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub secret_code: Option<SecretString>,
    pub session_key: Option<SecretString>,
    pub session_ttl_seconds: u64,
    pub max_attempts: u32,
    pub lockout_seconds: u64,
    pub production: bool,
    pub records_file: Option<PathBuf>,
    pub followup_contacts: Vec<String>,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new()
            .with_secret_code(self.secret_code.clone())
            .with_session_key(self.session_key.clone())
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_session_cookie_secure(self.production)
            .with_max_attempts(self.max_attempts)
            .with_lockout_seconds(self.lockout_seconds)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the records file cannot be loaded or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_state = Arc::new(AuthState::new(args.auth_config())?);

    let store: Arc<dyn RecordStore> = match &args.records_file {
        Some(path) => Arc::new(MemoryRecordStore::from_json_file(path)?),
        None => {
            info!("No records file configured, starting with an empty record store");
            Arc::new(MemoryRecordStore::default())
        }
    };
    let records_state = Arc::new(RecordsState::new(store, args.followup_contacts));

    debug!(
        "Lockout after {} failures for {}s, sessions last {}s",
        args.max_attempts, args.lockout_seconds, args.session_ttl_seconds
    );

    let result = api::new(args.port, auth_state, records_state).await;

    telemetry::shutdown_tracer();

    result
}
