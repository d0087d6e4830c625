use clap::Subcommand;
use wellness_core::NewGroup;

use super::{print_json, CommandResult, Session};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a group and print its join code
    Create { name: String },
    /// Join a group by its six-character code
    Join { code: String },
    /// List groups the caller belongs to
    List,
    /// Rank a group's members by weekly consistency
    Leaderboard { group_id: String },
}

pub fn run(action: GroupAction, token: Option<&str>) -> CommandResult {
    let session = Session::open()?;
    let claims = session.claims(token)?;
    let service = session.service();

    match action {
        GroupAction::Create { name } => {
            print_json(&service.create_group(&claims, NewGroup::new(name))?)?;
        }
        GroupAction::Join { code } => {
            print_json(&service.join_group(&claims, &code)?)?;
        }
        GroupAction::List => {
            print_json(&service.my_groups(&claims)?)?;
        }
        GroupAction::Leaderboard { group_id } => {
            print_json(&service.leaderboard(&claims, &group_id)?)?;
        }
    }
    session.close()?;
    Ok(())
}
