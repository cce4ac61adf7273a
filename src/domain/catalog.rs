// ==========================================
// 独立音乐人收入看板 - 作品目录领域模型
// ==========================================
// 对齐: artists / albums / tracks / campaigns 表
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Artist - 艺人
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistInput {
    pub name: String,
}

// ==========================================
// Album - 专辑
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub album_id: String,
    pub artist_id: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub upc: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumInput {
    pub artist_id: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub upc: Option<String>,
}

// ==========================================
// Track - 曲目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub track_id: String,
    pub artist_id: String,
    pub album_id: Option<String>,
    pub title: String,
    pub isrc: Option<String>,
    pub duration_secs: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInput {
    pub artist_id: String,
    pub album_id: Option<String>,
    pub title: String,
    pub isrc: Option<String>,
    pub duration_secs: Option<i64>,
}

// ==========================================
// Campaign - 推广活动
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: String,
    pub artist_id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignInput {
    pub artist_id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: f64,
}
