use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use huddle_types::models::{DataStore, MessageId};

use crate::{Database, Store};

const USERS: &str = "users";
const CHANNELS: &str = "channels";
const DMS: &str = "dms";
const META: &str = "meta";

/// Store-wide counters that don't belong to any collection.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Meta {
    last_message_id: MessageId,
}

impl Store for Database {
    fn load(&self) -> Result<DataStore> {
        self.with_conn(|conn| {
            let meta: Meta = read_collection(conn, META)?.unwrap_or_default();
            Ok(DataStore {
                users: read_collection(conn, USERS)?.unwrap_or_default(),
                channels: read_collection(conn, CHANNELS)?.unwrap_or_default(),
                dms: read_collection(conn, DMS)?.unwrap_or_default(),
                last_message_id: meta.last_message_id,
            })
        })
    }

    /// Writes all collections in one transaction so readers never observe a
    /// half-saved state.
    fn save(&self, data: &DataStore) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            write_collection(&tx, USERS, &data.users)?;
            write_collection(&tx, CHANNELS, &data.channels)?;
            write_collection(&tx, DMS, &data.dms)?;
            write_collection(
                &tx,
                META,
                &Meta {
                    last_message_id: data.last_message_id,
                },
            )?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn read_collection<T: DeserializeOwned>(conn: &Connection, name: &str) -> Result<Option<T>> {
    let body: Option<String> = conn
        .query_row("SELECT body FROM collections WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
}

fn write_collection<T: Serialize>(conn: &Connection, name: &str, value: &T) -> Result<()> {
    let body = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO collections (name, body, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        (name, body),
    )?;
    Ok(())
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_types::models::{Channel, Container, Message, Permission, User};

    fn sample() -> DataStore {
        let mut channel = Channel {
            id: 1,
            name: "general".into(),
            is_public: true,
            owner_ids: vec![1],
            member_ids: vec![1],
            messages: Vec::new(),
        };
        channel.prepend(Message::new(4, 1, "hello".into(), 1_700_000_000));

        DataStore {
            users: vec![User {
                id: 1,
                email: "ada@example.com".into(),
                password_hash: "x".into(),
                name_first: "Ada".into(),
                name_last: "Lovelace".into(),
                handle: "adalovelace".into(),
                permission: Permission::Owner,
                notifications: Vec::new(),
                removed: false,
            }],
            channels: vec![channel],
            dms: Vec::new(),
            last_message_id: 9,
        }
    }

    #[test]
    fn empty_database_loads_default_state() {
        let db = Database::open_in_memory().unwrap();
        let data = db.load().unwrap();
        assert!(data.users.is_empty());
        assert!(data.channels.is_empty());
        assert_eq!(data.last_message_id, 0);
    }

    #[test]
    fn saved_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huddle.db");

        {
            let db = Database::open(&path).unwrap();
            db.save(&sample()).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let data = db.load().unwrap();
        assert_eq!(data.users[0].handle, "adalovelace");
        assert_eq!(data.channels[0].messages[0].body, "hello");
        assert_eq!(data.last_message_id, 9);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let db = Database::open_in_memory().unwrap();
        let mut data = sample();
        db.save(&data).unwrap();

        data.channels[0].remove_message(4);
        data.last_message_id = 12;
        db.save(&data).unwrap();

        let loaded = db.load().unwrap();
        assert!(loaded.channels[0].messages.is_empty());
        assert_eq!(loaded.last_message_id, 12);
    }
}
