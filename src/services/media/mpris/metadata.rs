use std::{collections::HashMap, time::Duration};

use zbus::zvariant::OwnedValue;

/// Track fields read from an MPRIS metadata map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    /// `xesam:title`
    pub title: String,

    /// `xesam:artist`, joined with ", "
    pub artist: String,

    /// `xesam:album`
    pub album: String,

    /// `xesam:albumArtist`, used as the secondary line
    pub album_artist: String,

    /// `mpris:artUrl`
    pub art_url: Option<String>,

    /// `mpris:length`
    pub length: Option<Duration>,
}

fn string_list(value: &OwnedValue) -> Option<String> {
    if let Ok(array) = <&zbus::zvariant::Array>::try_from(value) {
        let items: Vec<String> = array
            .iter()
            .filter_map(|item| {
                if let Ok(s) = item.downcast_ref::<String>() {
                    Some(s.clone())
                } else if let Ok(s) = item.downcast_ref::<&str>() {
                    Some(s.to_string())
                } else {
                    None
                }
            })
            .collect();

        return (!items.is_empty()).then(|| items.join(", "));
    }

    if let Ok(s) = value.downcast_ref::<String>() {
        Some(s.clone())
    } else if let Ok(s) = value.downcast_ref::<&str>() {
        Some(s.to_string())
    } else {
        None
    }
}

fn string_value(value: &OwnedValue) -> Option<String> {
    String::try_from(value.clone()).ok()
}

fn length_value(value: &OwnedValue) -> Option<Duration> {
    let micros = i64::try_from(value.clone())
        .ok()
        .or_else(|| u64::try_from(value.clone()).ok().map(|v| v as i64))?;

    (micros > 0).then(|| Duration::from_micros(micros as u64))
}

impl From<HashMap<String, OwnedValue>> for TrackMetadata {
    fn from(metadata: HashMap<String, OwnedValue>) -> Self {
        let mut track = Self::default();

        if let Some(title) = metadata.get("xesam:title").and_then(string_value) {
            track.title = title;
        }

        if let Some(artist) = metadata.get("xesam:artist").and_then(string_list) {
            track.artist = artist;
        }

        if let Some(album) = metadata.get("xesam:album").and_then(string_value) {
            track.album = album;
        }

        if let Some(album_artist) = metadata.get("xesam:albumArtist").and_then(string_list) {
            track.album_artist = album_artist;
        }

        track.art_url = metadata
            .get("mpris:artUrl")
            .and_then(string_value)
            .filter(|url| !url.is_empty());

        track.length = metadata.get("mpris:length").and_then(length_value);

        track
    }
}
