pub mod auth;
pub mod config;
pub mod group;
pub mod habit;

use serde::Serialize;
use tracing::debug;
use wellness_core::{
    bearer_token, AuthError, Config, CoreError, Database, IdentityClaims, SignedTokenVerifier,
    WellnessService,
};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open database, configuration and token verifier for one command.
pub struct Session {
    pub db: Database,
    pub config: Config,
    pub verifier: SignedTokenVerifier,
}

impl Session {
    pub fn open() -> Result<Self, CoreError> {
        let config = Config::load()?;
        let verifier = SignedTokenVerifier::new(&config.auth.signing_secret);
        let db = Database::open()?;
        debug!("session opened");
        Ok(Self {
            db,
            config,
            verifier,
        })
    }

    /// Close the database handle.
    pub fn close(self) -> Result<(), CoreError> {
        self.db.close()
    }

    pub fn service(&self) -> WellnessService<'_, SignedTokenVerifier> {
        WellnessService::new(&self.db, &self.verifier, &self.config)
    }

    /// Verify the token passed on the command line.
    pub fn claims(&self, token: Option<&str>) -> Result<IdentityClaims, CoreError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let raw = match token {
            Some(t) if t.starts_with("Bearer ") => bearer_token(Some(t))?,
            Some(t) => t,
            None => return Err(AuthError::MissingBearer.into()),
        };
        self.service().authenticate(raw)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
