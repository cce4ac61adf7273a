// ==========================================
// 独立音乐人收入看板 - 作品目录仓储
// ==========================================
// 职责: artists / albums / tracks / campaigns 表的 CRUD
// 红线: 只做数据读写，输入校验在 API 层完成
// ==========================================

use crate::db::{ensure_schema, now_timestamp};
use crate::domain::catalog::{
    Album, AlbumInput, Artist, ArtistInput, Campaign, CampaignInput, Track, TrackInput,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn map_artist(row: &Row<'_>) -> SqliteResult<Artist> {
    Ok(Artist {
        artist_id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_album(row: &Row<'_>) -> SqliteResult<Album> {
    Ok(Album {
        album_id: row.get(0)?,
        artist_id: row.get(1)?,
        title: row.get(2)?,
        release_date: row.get(3)?,
        upc: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_track(row: &Row<'_>) -> SqliteResult<Track> {
    Ok(Track {
        track_id: row.get(0)?,
        artist_id: row.get(1)?,
        album_id: row.get(2)?,
        title: row.get(3)?,
        isrc: row.get(4)?,
        duration_secs: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_campaign(row: &Row<'_>) -> SqliteResult<Campaign> {
    Ok(Campaign {
        campaign_id: row.get(0)?,
        artist_id: row.get(1)?,
        name: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        budget: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const ARTIST_SELECT: &str = "SELECT artist_id, name, created_at FROM artists";
const ALBUM_SELECT: &str =
    "SELECT album_id, artist_id, title, release_date, upc, created_at FROM albums";
const TRACK_SELECT: &str =
    "SELECT track_id, artist_id, album_id, title, isrc, duration_secs, created_at FROM tracks";
const CAMPAIGN_SELECT: &str =
    "SELECT campaign_id, artist_id, name, start_date, end_date, budget, created_at FROM campaigns";

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        ensure_schema(&*repo.get_conn()?)?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按主键删除
    fn delete_by_id(&self, table: &str, key: &str, id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", table, key),
            params![id],
        )?;
        Ok(affected > 0)
    }

    // ===== Artist =====

    pub fn list_artists(&self) -> RepositoryResult<Vec<Artist>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY name ASC", ARTIST_SELECT))?;
        let rows = stmt
            .query_map([], map_artist)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_artist(&self, artist_id: &str) -> RepositoryResult<Option<Artist>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                &format!("{} WHERE artist_id = ?1", ARTIST_SELECT),
                params![artist_id],
                map_artist,
            )
            .optional()?)
    }

    pub fn create_artist(&self, input: &ArtistInput) -> RepositoryResult<Artist> {
        let artist = Artist {
            artist_id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            created_at: now_timestamp(),
        };
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO artists (artist_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![artist.artist_id, artist.name, artist.created_at],
        )?;
        Ok(artist)
    }

    pub fn update_artist(&self, artist_id: &str, input: &ArtistInput) -> RepositoryResult<Artist> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute(
                "UPDATE artists SET name = ?1 WHERE artist_id = ?2",
                params![input.name.trim(), artist_id],
            )?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Artist", artist_id));
            }
        }
        self.find_artist(artist_id)?
            .ok_or_else(|| RepositoryError::not_found("Artist", artist_id))
    }

    /// 删除艺人（专辑 / 曲目 / 活动级联删除）
    pub fn delete_artist(&self, artist_id: &str) -> RepositoryResult<bool> {
        self.delete_by_id("artists", "artist_id", artist_id)
    }

    // ===== Album =====

    pub fn list_albums(&self, artist_id: Option<&str>) -> RepositoryResult<Vec<Album>> {
        let conn = self.get_conn()?;
        let rows = match artist_id {
            Some(id) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE artist_id = ?1 ORDER BY release_date DESC, title ASC",
                    ALBUM_SELECT
                ))?;
                let rows = stmt
                    .query_map(params![id], map_album)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "{} ORDER BY release_date DESC, title ASC",
                    ALBUM_SELECT
                ))?;
                let rows = stmt
                    .query_map([], map_album)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn find_album(&self, album_id: &str) -> RepositoryResult<Option<Album>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                &format!("{} WHERE album_id = ?1", ALBUM_SELECT),
                params![album_id],
                map_album,
            )
            .optional()?)
    }

    pub fn create_album(&self, input: &AlbumInput) -> RepositoryResult<Album> {
        let album = Album {
            album_id: Uuid::new_v4().to_string(),
            artist_id: input.artist_id.clone(),
            title: input.title.trim().to_string(),
            release_date: input.release_date,
            upc: input.upc.clone(),
            created_at: now_timestamp(),
        };
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO albums (album_id, artist_id, title, release_date, upc, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                album.album_id,
                album.artist_id,
                album.title,
                album.release_date,
                album.upc,
                album.created_at,
            ],
        )?;
        Ok(album)
    }

    pub fn update_album(&self, album_id: &str, input: &AlbumInput) -> RepositoryResult<Album> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute(
                r#"
                UPDATE albums SET artist_id = ?1, title = ?2, release_date = ?3, upc = ?4
                WHERE album_id = ?5
                "#,
                params![
                    input.artist_id,
                    input.title.trim(),
                    input.release_date,
                    input.upc,
                    album_id,
                ],
            )?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Album", album_id));
            }
        }
        self.find_album(album_id)?
            .ok_or_else(|| RepositoryError::not_found("Album", album_id))
    }

    pub fn delete_album(&self, album_id: &str) -> RepositoryResult<bool> {
        self.delete_by_id("albums", "album_id", album_id)
    }

    // ===== Track =====

    pub fn list_tracks(&self, album_id: Option<&str>) -> RepositoryResult<Vec<Track>> {
        let conn = self.get_conn()?;
        let rows = match album_id {
            Some(id) => {
                let mut stmt =
                    conn.prepare(&format!("{} WHERE album_id = ?1 ORDER BY title ASC", TRACK_SELECT))?;
                let rows = stmt
                    .query_map(params![id], map_track)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{} ORDER BY title ASC", TRACK_SELECT))?;
                let rows = stmt
                    .query_map([], map_track)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn find_track(&self, track_id: &str) -> RepositoryResult<Option<Track>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                &format!("{} WHERE track_id = ?1", TRACK_SELECT),
                params![track_id],
                map_track,
            )
            .optional()?)
    }

    pub fn create_track(&self, input: &TrackInput) -> RepositoryResult<Track> {
        let track = Track {
            track_id: Uuid::new_v4().to_string(),
            artist_id: input.artist_id.clone(),
            album_id: input.album_id.clone(),
            title: input.title.trim().to_string(),
            isrc: input.isrc.clone(),
            duration_secs: input.duration_secs,
            created_at: now_timestamp(),
        };
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO tracks (track_id, artist_id, album_id, title, isrc, duration_secs, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                track.track_id,
                track.artist_id,
                track.album_id,
                track.title,
                track.isrc,
                track.duration_secs,
                track.created_at,
            ],
        )?;
        Ok(track)
    }

    pub fn update_track(&self, track_id: &str, input: &TrackInput) -> RepositoryResult<Track> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute(
                r#"
                UPDATE tracks SET artist_id = ?1, album_id = ?2, title = ?3, isrc = ?4, duration_secs = ?5
                WHERE track_id = ?6
                "#,
                params![
                    input.artist_id,
                    input.album_id,
                    input.title.trim(),
                    input.isrc,
                    input.duration_secs,
                    track_id,
                ],
            )?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Track", track_id));
            }
        }
        self.find_track(track_id)?
            .ok_or_else(|| RepositoryError::not_found("Track", track_id))
    }

    pub fn delete_track(&self, track_id: &str) -> RepositoryResult<bool> {
        self.delete_by_id("tracks", "track_id", track_id)
    }

    // ===== Campaign =====

    pub fn list_campaigns(&self, artist_id: Option<&str>) -> RepositoryResult<Vec<Campaign>> {
        let conn = self.get_conn()?;
        let rows = match artist_id {
            Some(id) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE artist_id = ?1 ORDER BY start_date DESC, name ASC",
                    CAMPAIGN_SELECT
                ))?;
                let rows = stmt
                    .query_map(params![id], map_campaign)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "{} ORDER BY start_date DESC, name ASC",
                    CAMPAIGN_SELECT
                ))?;
                let rows = stmt
                    .query_map([], map_campaign)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn find_campaign(&self, campaign_id: &str) -> RepositoryResult<Option<Campaign>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                &format!("{} WHERE campaign_id = ?1", CAMPAIGN_SELECT),
                params![campaign_id],
                map_campaign,
            )
            .optional()?)
    }

    pub fn create_campaign(&self, input: &CampaignInput) -> RepositoryResult<Campaign> {
        let campaign = Campaign {
            campaign_id: Uuid::new_v4().to_string(),
            artist_id: input.artist_id.clone(),
            name: input.name.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            budget: input.budget,
            created_at: now_timestamp(),
        };
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO campaigns (campaign_id, artist_id, name, start_date, end_date, budget, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                campaign.campaign_id,
                campaign.artist_id,
                campaign.name,
                campaign.start_date,
                campaign.end_date,
                campaign.budget,
                campaign.created_at,
            ],
        )?;
        Ok(campaign)
    }

    pub fn update_campaign(
        &self,
        campaign_id: &str,
        input: &CampaignInput,
    ) -> RepositoryResult<Campaign> {
        {
            let conn = self.get_conn()?;
            let affected = conn.execute(
                r#"
                UPDATE campaigns SET artist_id = ?1, name = ?2, start_date = ?3, end_date = ?4, budget = ?5
                WHERE campaign_id = ?6
                "#,
                params![
                    input.artist_id,
                    input.name.trim(),
                    input.start_date,
                    input.end_date,
                    input.budget,
                    campaign_id,
                ],
            )?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Campaign", campaign_id));
            }
        }
        self.find_campaign(campaign_id)?
            .ok_or_else(|| RepositoryError::not_found("Campaign", campaign_id))
    }

    pub fn delete_campaign(&self, campaign_id: &str) -> RepositoryResult<bool> {
        self.delete_by_id("campaigns", "campaign_id", campaign_id)
    }
}
