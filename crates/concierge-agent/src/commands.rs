// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner commands in the direct bot chat.

use concierge_access::AccessControl;
use concierge_core::UserId;
use tracing::warn;

pub const HELP_TEXT: &str = "Available commands:\n\
/add_admin <user_id> - add admin\n\
/list_admins - list admins\n\
/remove_admin <user_id> - remove admin";

/// A recognized owner command. An argument that is not a user id parses
/// as `None` so the caller can answer with a usage line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerCommand {
    Start,
    AddAdmin(Option<UserId>),
    ListAdmins,
    RemoveAdmin(Option<UserId>),
}

impl OwnerCommand {
    /// Parses `/command[@bot] [arg]`. Unknown commands and plain text give `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split_whitespace();
        let head = parts.next()?;
        if !head.starts_with('/') {
            return None;
        }
        let command = head.split('@').next().unwrap_or(head);
        let arg = parts.next().and_then(parse_user_id);

        match command {
            "/start" => Some(Self::Start),
            "/add_admin" => Some(Self::AddAdmin(arg)),
            "/list_admins" => Some(Self::ListAdmins),
            "/remove_admin" => Some(Self::RemoveAdmin(arg)),
            _ => None,
        }
    }
}

fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.parse::<u64>().ok().filter(|id| *id > 0).map(UserId)
}

/// Runs `command` and returns the reply text.
pub async fn execute(command: OwnerCommand, access: &mut AccessControl) -> String {
    match command {
        OwnerCommand::Start => HELP_TEXT.to_string(),
        OwnerCommand::AddAdmin(None) => "Usage: /add_admin <user_id>".to_string(),
        OwnerCommand::AddAdmin(Some(user)) => match access.add_admin(user).await {
            Ok(()) => format!("Admin added: {user}"),
            Err(e) => {
                warn!(user_id = %user, error = %e, "failed to add admin");
                format!("Failed to add admin: {user}")
            }
        },
        OwnerCommand::ListAdmins => match access.list_admins().await {
            Ok(admins) if admins.is_empty() => "Admin list is empty".to_string(),
            Ok(admins) => admins
                .iter()
                .map(UserId::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!(error = %e, "failed to list admins");
                "Admin list is empty".to_string()
            }
        },
        OwnerCommand::RemoveAdmin(None) => "Usage: /remove_admin <user_id>".to_string(),
        OwnerCommand::RemoveAdmin(Some(user)) => match access.remove_admin(user).await {
            Ok(true) => format!("Admin removed: {user}"),
            Ok(false) => format!("Admin not found: {user}"),
            Err(e) => {
                warn!(user_id = %user, error = %e, "failed to remove admin");
                format!("Admin not found: {user}")
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use concierge_access::{ConnectionTrustResolver, MemoryAdminDirectory};

    use super::*;

    fn access() -> AccessControl {
        AccessControl::new(
            ConnectionTrustResolver::new(vec![UserId(1)], true, Duration::from_secs(1)),
            Arc::new(MemoryAdminDirectory::default()),
        )
    }

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(OwnerCommand::parse("/start"), Some(OwnerCommand::Start));
        assert_eq!(OwnerCommand::parse("/start@salon_bot"), Some(OwnerCommand::Start));
        assert_eq!(
            OwnerCommand::parse("  /add_admin 42 "),
            Some(OwnerCommand::AddAdmin(Some(UserId(42))))
        );
        assert_eq!(
            OwnerCommand::parse("/remove_admin abc"),
            Some(OwnerCommand::RemoveAdmin(None))
        );
        assert_eq!(OwnerCommand::parse("/add_admin 0"), Some(OwnerCommand::AddAdmin(None)));
        assert_eq!(OwnerCommand::parse("/list_admins"), Some(OwnerCommand::ListAdmins));
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert_eq!(OwnerCommand::parse("hello"), None);
        assert_eq!(OwnerCommand::parse("/unknown"), None);
        assert_eq!(OwnerCommand::parse(""), None);
    }

    #[tokio::test]
    async fn admin_lifecycle_replies() {
        let mut access = access();
        assert_eq!(
            execute(OwnerCommand::ListAdmins, &mut access).await,
            "Admin list is empty"
        );
        assert_eq!(
            execute(OwnerCommand::AddAdmin(Some(UserId(9))), &mut access).await,
            "Admin added: 9"
        );
        assert_eq!(
            execute(OwnerCommand::AddAdmin(Some(UserId(3))), &mut access).await,
            "Admin added: 3"
        );
        assert_eq!(execute(OwnerCommand::ListAdmins, &mut access).await, "3\n9");
        assert_eq!(
            execute(OwnerCommand::RemoveAdmin(Some(UserId(9))), &mut access).await,
            "Admin removed: 9"
        );
        assert_eq!(
            execute(OwnerCommand::RemoveAdmin(Some(UserId(9))), &mut access).await,
            "Admin not found: 9"
        );
    }

    #[tokio::test]
    async fn missing_argument_gives_usage() {
        let mut access = access();
        assert_eq!(
            execute(OwnerCommand::AddAdmin(None), &mut access).await,
            "Usage: /add_admin <user_id>"
        );
        assert_eq!(
            execute(OwnerCommand::RemoveAdmin(None), &mut access).await,
            "Usage: /remove_admin <user_id>"
        );
    }

    #[tokio::test]
    async fn start_lists_commands() {
        let reply = execute(OwnerCommand::Start, &mut access()).await;
        assert!(reply.starts_with("Available commands:"));
        assert!(reply.contains("/remove_admin <user_id>"));
    }
}
