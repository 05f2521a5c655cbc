//! The event wire shape (spec §6): a tagged record describing one action
//! against one track URL within one session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Play,
    Stop,
    Pause,
    Resume,
    Volume,
    Seek,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "recordId")]
    pub record_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "assetUrl")]
    pub asset_url: String,
    #[serde(rename = "loop", default)]
    pub loop_: bool,
    #[serde(rename = "volumeDeltaDb", default)]
    pub volume_delta_db: f64,
    #[serde(rename = "seekPositionSec", default)]
    pub seek_position_sec: i32,
}
