use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{id_string, json_array, json_at, json_path, json_str};
use crate::error::{Error, Result};

/// Offset of the platform's own clock (UTC+8), used when rendering unix timestamps.
const PLATFORM_OFFSET_SECS: i32 = 8 * 3600;

/// Pinned entry at the top of the trending board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotGov {
    pub mid: String,
    pub word: String,
    pub url: String,
}

/// One ranked entry of the trending board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandEntry {
    pub word: String,
    pub category: String,
    pub num: u64,
    pub mid: String,
    pub onboard_time: String,
}

/// Trending board: optional pinned entry plus ranked entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotBand {
    pub hotgov: Option<HotGov>,
    pub band_list: Vec<BandEntry>,
}

/// One entry of the topic board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub topic: String,
    pub mention: u64,
    pub read: u64,
    pub category: String,
}

/// Identifiers needed to page through a group's hot timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub gid: String,
    pub containerid: String,
}

/// Parse the `hot_band` response.
///
/// Entries without a `category` are promotions and are skipped.
///
/// # Errors
///
/// Returns an error if `data.band_list` is missing or a ranked entry lacks a required field.
pub fn parse_hot_band(response: &Value) -> Result<HotBand> {
    let data = json_path(response, "data")?;

    let hotgov = match data.get("hotgov") {
        Some(gov) if !gov.is_null() => Some(HotGov {
            mid: id_of(gov, "mid")?,
            word: json_str(gov, "word")?.to_string(),
            url: json_str(gov, "url")?.to_string(),
        }),
        _ => None,
    };

    let band_list = json_array(data, "band_list")?
        .iter()
        .filter(|item| item.get("category").is_some())
        .map(parse_band_entry)
        .collect::<Result<Vec<_>>>()?;

    Ok(HotBand { hotgov, band_list })
}

fn parse_band_entry(item: &Value) -> Result<BandEntry> {
    let onboard = json_path(item, "onboard_time")?
        .as_i64()
        .ok_or_else(|| Error::invalid("onboard_time", "expected a unix timestamp"))?;

    Ok(BandEntry {
        word: json_str(item, "word")?.to_string(),
        category: json_str(item, "category")?.to_string(),
        num: json_path(item, "num")?
            .as_u64()
            .ok_or_else(|| Error::invalid("num", "expected a count"))?,
        mid: id_of(item, "mid")?,
        onboard_time: platform_time(onboard)?,
    })
}

/// Parse the `topic_band` response.
///
/// # Errors
///
/// Returns an error if `data.statuses` is missing or an entry lacks a required field.
pub fn parse_topic_band(response: &Value) -> Result<Vec<TopicEntry>> {
    json_at(response, "data.statuses")
}

/// Parse the `allGroups` response into `title -> group`.
///
/// The first three groups are the user's own lists; the next two are the category groups and
/// the board groups. Category titles win when both define the same title.
///
/// # Errors
///
/// Returns an error if the two expected group lists are missing or malformed.
pub fn parse_groups(response: &Value) -> Result<BTreeMap<String, Group>> {
    let groups = json_array(response, "groups")?;
    let category = groups
        .get(3)
        .ok_or_else(|| Error::missing("groups[3]"))?;
    let band = groups
        .get(4)
        .ok_or_else(|| Error::missing("groups[4]"))?;

    let mut merged = BTreeMap::new();
    for list in [band, category] {
        for item in json_array(list, "group")? {
            let title = json_str(&item, "title")?.to_string();
            let group = Group {
                gid: id_of(&item, "gid")?,
                containerid: id_of(&item, "containerid")?,
            };
            merged.insert(title, group);
        }
    }
    Ok(merged)
}

fn id_of(value: &Value, key: &str) -> Result<String> {
    id_string(json_path(value, key)?).ok_or_else(|| Error::invalid(key, "expected an identifier"))
}

fn platform_time(timestamp: i64) -> Result<String> {
    let offset = FixedOffset::east_opt(PLATFORM_OFFSET_SECS)
        .ok_or_else(|| Error::invalid("onboard_time", "invalid offset"))?;
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(&offset).to_rfc3339())
        .ok_or_else(|| Error::invalid("onboard_time", format!("out of range: {timestamp}")))
}
