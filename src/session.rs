use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Profile, ProfileUpdate};
use crate::store::{StoreError, TournamentStore};

pub const SESSION_TTL_DAYS: i64 = 30;

/// Login is a shared secret word per player, nothing more. The word is
/// stored in plaintext and claimed by whoever logs in first, which is
/// exactly the level of security a group of friends needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub player_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(player_id: Uuid) -> Self {
        Session {
            player_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > Duration::days(SESSION_TTL_DAYS)
    }
}

/// A session together with the profile it belongs to.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    pub player: Profile,
}

impl Authenticated {
    pub fn is_admin(&self) -> bool {
        self.player.is_admin()
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("jugador no encontrado")]
    PlayerNotFound,

    #[error("palabra secreta incorrecta")]
    WrongSecretWord,

    #[error("sesión caducada")]
    SessionExpired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Authenticator {
    store: Arc<dyn TournamentStore>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn TournamentStore>) -> Self {
        Authenticator { store }
    }

    /// A profile with no secret word (or an empty one) is unclaimed; the
    /// first login sets the word. After that the word has to match.
    pub async fn login(&self, player_id: Uuid, secret_word: &str) -> Result<Authenticated, AuthError> {
        let profile = self
            .store
            .fetch_profile(player_id)
            .await?
            .ok_or(AuthError::PlayerNotFound)?;

        match profile.secret_word.as_deref() {
            None | Some("") => {
                self.store.set_secret_word(player_id, secret_word).await?;
            }
            Some(stored) => {
                if stored != secret_word {
                    return Err(AuthError::WrongSecretWord);
                }
            }
        }

        let player = self
            .store
            .fetch_profile(player_id)
            .await?
            .ok_or(AuthError::PlayerNotFound)?;
        Ok(Authenticated {
            session: Session::new(player_id),
            player,
        })
    }

    /// Picks a stored session back up, refetching the profile so role and
    /// team changes made since the login are seen.
    pub async fn restore(&self, session: &Session) -> Result<Authenticated, AuthError> {
        if session.is_expired(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }
        let player = self
            .store
            .fetch_profile(session.player_id)
            .await?
            .ok_or(AuthError::PlayerNotFound)?;
        Ok(Authenticated {
            session: session.clone(),
            player,
        })
    }

    /// Everyone who can be picked on the login screen, by display name.
    pub async fn available_players(&self) -> Result<Vec<Profile>, AuthError> {
        let mut players = self.store.fetch_profiles().await?;
        players.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(players)
    }

    pub async fn update_profile(
        &self,
        player_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, AuthError> {
        self.store.update_profile(player_id, update).await?;
        self.store
            .fetch_profile(player_id)
            .await?
            .ok_or(AuthError::PlayerNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::store::MemoryStore;

    fn player(name: &str, secret_word: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            nickname: None,
            avatar_url: None,
            bio: None,
            role: UserRole::Player,
            team_id: None,
            secret_word: secret_word.map(str::to_string),
            handicap: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn authenticator_with(profiles: Vec<Profile>) -> (Arc<MemoryStore>, Authenticator) {
        let store = Arc::new(MemoryStore::new());
        for profile in profiles {
            store.seed_profile(profile);
        }
        let auth = Authenticator::new(store.clone() as Arc<dyn TournamentStore>);
        (store, auth)
    }

    #[tokio::test]
    async fn test_first_login_claims_the_secret_word() {
        let jorge = player("Jorge", None);
        let id = jorge.id;
        let (store, auth) = authenticator_with(vec![jorge]);

        let authed = auth.login(id, "valdecañas").await.unwrap();
        assert_eq!(authed.player.id, id);
        assert_eq!(
            store.fetch_profile(id).await.unwrap().unwrap().secret_word,
            Some("valdecañas".to_string()),
            "first login should store the word"
        );

        // Second login must now match it.
        assert!(matches!(
            auth.login(id, "otra").await,
            Err(AuthError::WrongSecretWord)
        ));
        assert!(auth.login(id, "valdecañas").await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_stored_word_counts_as_unclaimed() {
        let yago = player("Yago", Some(""));
        let id = yago.id;
        let (_, auth) = authenticator_with(vec![yago]);

        let authed = auth.login(id, "birdie").await.unwrap();
        assert_eq!(authed.player.secret_word, Some("birdie".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_player_cannot_login() {
        let (_, auth) = authenticator_with(vec![]);
        assert!(matches!(
            auth.login(Uuid::new_v4(), "hola").await,
            Err(AuthError::PlayerNotFound)
        ));
    }

    #[tokio::test]
    async fn test_session_expires_after_thirty_days() {
        let session = Session::new(Uuid::new_v4());
        let now = session.created_at;

        assert!(!session.is_expired(now + Duration::days(29)));
        assert!(
            !session.is_expired(now + Duration::days(30)),
            "expiry is strict, the thirtieth day still counts"
        );
        assert!(session.is_expired(now + Duration::days(30) + Duration::seconds(1)));
    }

    #[tokio::test]
    async fn test_restore_rejects_expired_sessions() {
        let ana = player("Ana", Some("palabra"));
        let id = ana.id;
        let (_, auth) = authenticator_with(vec![ana]);

        let stale = Session {
            player_id: id,
            created_at: Utc::now() - Duration::days(31),
        };
        assert!(matches!(
            auth.restore(&stale).await,
            Err(AuthError::SessionExpired)
        ));

        let fresh = Session::new(id);
        let authed = auth.restore(&fresh).await.unwrap();
        assert_eq!(authed.player.display_name, "Ana");
        assert!(!authed.is_admin());
    }

    #[tokio::test]
    async fn test_available_players_sorted_by_display_name() {
        let (_, auth) = authenticator_with(vec![
            player("Yago", None),
            player("Ana", None),
            player("Jorge", None),
        ]);
        let names: Vec<String> = auth
            .available_players()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, vec!["Ana", "Jorge", "Yago"]);
    }

    #[tokio::test]
    async fn test_update_profile_returns_the_fresh_row() {
        let carlos = player("Carlos", Some("palabra"));
        let id = carlos.id;
        let (_, auth) = authenticator_with(vec![carlos]);

        let updated = auth
            .update_profile(
                id,
                ProfileUpdate {
                    nickname: Some("Charly".to_string()),
                    handicap: Some(18.2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("Charly"));
        assert_eq!(updated.handicap, Some(18.2));
    }
}
