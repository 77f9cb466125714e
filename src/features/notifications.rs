use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::api::models::User;
use crate::error::Result;
use crate::store::{keys, LocalStore};

pub const NOTIFICATIONS_CAP: usize = 30;
const STREAK_WARNED: &str = "akyl_streak_warned";
const STREAK_WARN_HOUR: u32 = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub icon: String,
    pub text: String,
    /// RFC 3339
    pub ts: String,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    fn local_day(&self) -> Option<chrono::NaiveDate> {
        DateTime::parse_from_rfc3339(&self.ts)
            .ok()
            .map(|t| t.with_timezone(&Local).date_naive())
    }
}

pub fn list(store: &LocalStore) -> Vec<Notification> {
    store.get_json(keys::NOTIFICATIONS).unwrap_or_default()
}

fn save(store: &LocalStore, mut items: Vec<Notification>) -> Result<()> {
    items.truncate(NOTIFICATIONS_CAP);
    store.set_json(keys::NOTIFICATIONS, &items)
}

/// Prepend a notification. The same text is only pushed once per local
/// day; returns whether it was added.
pub fn push(store: &LocalStore, icon: &str, text: &str, now: DateTime<Local>) -> Result<bool> {
    let mut items = list(store);
    let today = now.date_naive();
    if items.iter().any(|n| n.text == text && n.local_day() == Some(today)) {
        return Ok(false);
    }
    let last = items.iter().map(|n| n.id).max().unwrap_or(0);
    items.insert(
        0,
        Notification {
            id: now.timestamp_millis().max(last + 1),
            icon: icon.to_string(),
            text: text.to_string(),
            ts: now.to_rfc3339(),
            read: false,
        },
    );
    save(store, items)?;
    Ok(true)
}

pub fn unread_count(store: &LocalStore) -> usize {
    list(store).iter().filter(|n| !n.read).count()
}

pub fn mark_read(store: &LocalStore, id: i64) -> Result<()> {
    let items = list(store)
        .into_iter()
        .map(|n| if n.id == id { Notification { read: true, ..n } } else { n })
        .collect();
    save(store, items)
}

/// Opening the panel reads everything.
pub fn mark_all_read(store: &LocalStore) -> Result<()> {
    let items = list(store)
        .into_iter()
        .map(|n| Notification { read: true, ..n })
        .collect();
    save(store, items)
}

pub fn clear(store: &LocalStore) -> Result<()> {
    save(store, Vec::new())
}

/// Daily reminders raised on startup: the challenge of the day, the evening
/// streak warning, and a one-time welcome per user.
pub fn check_auto(store: &LocalStore, user: Option<&User>, now: DateTime<Local>) -> Result<()> {
    let today = now.date_naive().to_string();

    if store.get(keys::CHALLENGE_NOTIF_DAY).as_deref() != Some(today.as_str()) {
        push(store, "⚡", "Today's challenge is ready! Complete it to earn XP.", now)?;
        store.set(keys::CHALLENGE_NOTIF_DAY, today.clone())?;
    }

    if now.hour() >= STREAK_WARN_HOUR && store.get(STREAK_WARNED).as_deref() != Some(today.as_str()) {
        push(store, "🔥", "Your streak is at risk! Finish today's challenge before midnight.", now)?;
        store.set(STREAK_WARNED, today)?;
    }

    if let Some(user) = user {
        let key = format!("akyl_welcome_{}", user.username);
        if !store.contains(&key) {
            let name = user.full_name.as_deref().unwrap_or(&user.username);
            push(store, "👋", &format!("Welcome, {name}! Start with the daily challenge."), now)?;
            store.set(&key, "1")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, h, 0, 0).unwrap()
    }

    #[test]
    fn dedupes_same_text_per_day() {
        let store = LocalStore::in_memory();
        assert!(push(&store, "⏰", "Deadline soon", at(9)).unwrap());
        assert!(!push(&store, "⏰", "Deadline soon", at(15)).unwrap());
        assert!(push(&store, "⏰", "Deadline soon", at(9) + Duration::days(1)).unwrap());
        assert_eq!(list(&store).len(), 2);
    }

    #[test]
    fn capped_newest_first() {
        let store = LocalStore::in_memory();
        for i in 0..35 {
            push(&store, "i", &format!("n{i}"), at(10)).unwrap();
        }
        let items = list(&store);
        assert_eq!(items.len(), NOTIFICATIONS_CAP);
        assert_eq!(items[0].text, "n34");
    }

    #[test]
    fn read_state() {
        let store = LocalStore::in_memory();
        push(&store, "a", "one", at(10)).unwrap();
        push(&store, "b", "two", at(10)).unwrap();
        assert_eq!(unread_count(&store), 2);

        let first = list(&store)[0].id;
        mark_read(&store, first).unwrap();
        assert_eq!(unread_count(&store), 1);

        mark_all_read(&store).unwrap();
        assert_eq!(unread_count(&store), 0);

        clear(&store).unwrap();
        assert!(list(&store).is_empty());
    }

    #[test]
    fn auto_notifications_once_per_day() {
        let store = LocalStore::in_memory();
        let user = User {
            id: 1,
            username: "alice".into(),
            ..User::default()
        };
        check_auto(&store, Some(&user), at(21)).unwrap();
        assert_eq!(list(&store).len(), 3);
        check_auto(&store, Some(&user), at(22)).unwrap();
        assert_eq!(list(&store).len(), 3);

        let next_morning = at(8) + Duration::days(1);
        check_auto(&store, Some(&user), next_morning).unwrap();
        assert_eq!(list(&store).len(), 4);
        assert_eq!(list(&store)[0].icon, "⚡");
    }
}
