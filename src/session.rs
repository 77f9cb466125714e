use crate::api::models::User;
use crate::error::Result;
use crate::store::{keys, LocalStore};

/// The single, process-wide login. Lives in the local store so a restart
/// resumes it.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

pub fn load(store: &LocalStore) -> Option<Session> {
    let token = token(store)?;
    Some(Session {
        token,
        user: current_user(store),
    })
}

pub fn save(store: &LocalStore, token: &str, user: &User) -> Result<()> {
    store.set(keys::TOKEN, token)?;
    store.set_json(keys::USER, user)
}

pub fn set_user(store: &LocalStore, user: &User) -> Result<()> {
    store.set_json(keys::USER, user)
}

pub fn clear(store: &LocalStore) -> Result<()> {
    store.remove(keys::TOKEN)?;
    store.remove(keys::USER)
}

pub fn token(store: &LocalStore) -> Option<String> {
    store.get(keys::TOKEN).filter(|t| !t.is_empty())
}

pub fn current_user(store: &LocalStore) -> Option<User> {
    store.get_json(keys::USER)
}

pub fn is_logged_in(store: &LocalStore) -> bool {
    token(store).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let store = LocalStore::in_memory();
        assert!(load(&store).is_none());

        let user = User {
            id: 1,
            username: "alice".into(),
            xp: 150,
            ..User::default()
        };
        save(&store, "t1", &user).unwrap();
        let session = load(&store).unwrap();
        assert_eq!(session.token, "t1");
        assert_eq!(session.user.unwrap().xp, 150);

        clear(&store).unwrap();
        assert!(!is_logged_in(&store));
        assert!(current_user(&store).is_none());
    }

    #[test]
    fn empty_token_is_logged_out() {
        let store = LocalStore::in_memory();
        store.set(keys::TOKEN, "").unwrap();
        assert!(!is_logged_in(&store));
    }
}
