use chrono::{Duration, Utc};
use clap::Subcommand;
use wellness_core::IdentityClaims;

use super::{print_json, CommandResult, Session};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Issue a signed identity token
    Issue {
        /// User id carried by the token
        uid: String,
        #[arg(long)]
        email: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Profile photo URL
        #[arg(long)]
        picture: Option<String>,
        /// Lifetime in hours (defaults to auth.token_ttl_hours)
        #[arg(long)]
        ttl_hours: Option<u32>,
    },
    /// Verify the token and store the caller's profile
    Verify,
    /// Show the caller's profile
    Me,
}

pub fn run(action: AuthAction, token: Option<&str>) -> CommandResult {
    let session = Session::open()?;

    match action {
        AuthAction::Issue {
            uid,
            email,
            name,
            picture,
            ttl_hours,
        } => {
            let ttl = ttl_hours.unwrap_or(session.config.auth.token_ttl_hours);
            let mut claims = IdentityClaims::new(uid, Utc::now(), Duration::hours(i64::from(ttl)));
            if let Some(email) = email {
                claims = claims.with_email(email);
            }
            if let Some(name) = name {
                claims = claims.with_name(name);
            }
            if let Some(picture) = picture {
                claims = claims.with_picture(picture);
            }
            println!("{}", session.verifier.issue(&claims)?);
        }
        AuthAction::Verify => {
            let claims = session.claims(token)?;
            let user = session.service().verify_user(&claims)?;
            print_json(&user)?;
        }
        AuthAction::Me => {
            let claims = session.claims(token)?;
            let user = session.service().current_user(&claims)?;
            print_json(&user)?;
        }
    }
    session.close()?;
    Ok(())
}
