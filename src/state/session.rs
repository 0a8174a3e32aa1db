use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tennis_api::{Login, RefereeId, TeamId, UserType};

/// Who is using the client. Passed explicitly to everything role-dependent;
/// a missing or unreadable session file means `Guest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Guest,
    Team {
        email: String,
        team_id: TeamId,
    },
    Referee {
        email: String,
        referee_id: Option<RefereeId>,
    },
    Admin {
        email: String,
    },
}

impl Session {
    /// A team login is only usable when the server says which team it is.
    pub fn from_login(login: Login) -> Result<Self, String> {
        match login.user_type {
            UserType::Team => login
                .team_id
                .map(|team_id| Session::Team { email: login.email.clone(), team_id })
                .ok_or_else(|| "The server did not return a team id for this account".to_string()),
            UserType::Referee => Ok(Session::Referee {
                email: login.email,
                referee_id: login.referee_id,
            }),
            UserType::Admin => Ok(Session::Admin { email: login.email }),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Session::Guest => "guest".to_string(),
            Session::Team { email, team_id } => format!("team #{team_id} ({email})"),
            Session::Referee { email, .. } => format!("referee ({email})"),
            Session::Admin { email } => format!("admin ({email})"),
        }
    }

    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            Session::Team { team_id, .. } => Some(*team_id),
            _ => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Session::Guest)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Session::Admin { .. })
    }

    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Session::Guest;
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring unreadable session file {}: {e}", path.display());
            Session::Guest
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {e}"))?;
        }
        let payload = serde_json::to_string_pretty(self)
            .map_err(|e| format!("serialize session failed: {e}"))?;
        std::fs::write(path, payload).map_err(|e| format!("write session failed: {e}"))
    }

    pub fn clear(path: &Path) -> Result<(), String> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("remove session failed: {e}")),
        }
    }
}

pub fn default_session_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return PathBuf::from(config_dir).join("tennis-hub").join("session.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home)
            .join(".config")
            .join("tennis-hub")
            .join("session.json");
    }
    PathBuf::from("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(user_type: UserType, team_id: Option<TeamId>) -> Login {
        Login {
            user_type,
            email: "someone@club.it".into(),
            team_id,
            ..Default::default()
        }
    }

    #[test]
    fn team_login_requires_team_id() {
        assert!(Session::from_login(login(UserType::Team, None)).is_err());
        let session = Session::from_login(login(UserType::Team, Some(4))).unwrap();
        assert_eq!(session.team_id(), Some(4));
    }

    #[test]
    fn admin_and_referee_logins_map_to_roles() {
        assert!(Session::from_login(login(UserType::Admin, None)).unwrap().is_admin());
        let referee = Session::from_login(login(UserType::Referee, None)).unwrap();
        assert!(matches!(referee, Session::Referee { .. }));
        assert_eq!(referee.team_id(), None);
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("tennis-hub-session-{}", std::process::id()));
        let path = dir.join("session.json");
        let session = Session::Team { email: "a@b.it".into(), team_id: 9 };
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path), session);
        Session::clear(&path).unwrap();
        assert_eq!(Session::load(&path), Session::Guest);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_session_file_means_guest() {
        let path = std::env::temp_dir().join(format!("tennis-hub-corrupt-{}.json", std::process::id()));
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Session::load(&path), Session::Guest);
        let _ = std::fs::remove_file(path);
    }
}
