use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A client registered at the desk.
///
/// Serialized with the desk's wire names (`nom`, `telephone`, `cb`, ...).
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Client {
    pub id: i32,
    #[serde(rename = "nom")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telephone")]
    pub phone: String,
    pub checkin: String,
    pub checkout: String,
    #[serde(rename = "cb")]
    pub card_info: String,
    pub signed: bool,
    pub active: bool,
    pub created_on: DateTime<Utc>,
}

/// Editable fields of a client, as submitted to insert and modify.
///
/// Every field is optional on the wire and no value is ever rejected: absent
/// or `null` fields become empty strings, strings are stored verbatim and any
/// other JSON value is stored as its JSON text (`612345678`, `true`).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ClientFields {
    #[serde(rename = "nom", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "telephone", deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub checkin: String,
    #[serde(deserialize_with = "lenient_string")]
    pub checkout: String,
    #[serde(rename = "cb", deserialize_with = "lenient_string")]
    pub card_info: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
