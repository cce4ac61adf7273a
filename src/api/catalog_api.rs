// ==========================================
// 独立音乐人收入看板 - 作品目录 API
// ==========================================
// 职责: 艺人 / 专辑 / 曲目 / 推广活动的增删改查与字段校验
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    require_non_empty, validate_date_range, validate_non_negative,
};
use crate::domain::catalog::{
    Album, AlbumInput, Artist, ArtistInput, Campaign, CampaignInput, Track, TrackInput,
};
use crate::repository::catalog_repo::CatalogRepository;

pub struct CatalogApi {
    catalog_repo: Arc<CatalogRepository>,
}

impl CatalogApi {
    pub fn new(catalog_repo: Arc<CatalogRepository>) -> Self {
        Self { catalog_repo }
    }

    // ==========================================
    // Artist
    // ==========================================

    pub fn list_artists(&self) -> ApiResult<Vec<Artist>> {
        Ok(self.catalog_repo.list_artists()?)
    }

    pub fn get_artist(&self, artist_id: &str) -> ApiResult<Artist> {
        self.catalog_repo
            .find_artist(artist_id)?
            .ok_or_else(|| ApiError::not_found("Artist", artist_id))
    }

    pub fn create_artist(&self, input: ArtistInput) -> ApiResult<Artist> {
        let input = ArtistInput {
            name: require_non_empty("艺人名称", &input.name)?,
        };
        let artist = self.catalog_repo.create_artist(&input)?;
        info!(artist_id = %artist.artist_id, name = %artist.name, "艺人已创建");
        Ok(artist)
    }

    pub fn update_artist(&self, artist_id: &str, input: ArtistInput) -> ApiResult<Artist> {
        let input = ArtistInput {
            name: require_non_empty("艺人名称", &input.name)?,
        };
        Ok(self.catalog_repo.update_artist(artist_id, &input)?)
    }

    /// 删除艺人（其专辑 / 曲目 / 活动一并删除）
    pub fn delete_artist(&self, artist_id: &str) -> ApiResult<()> {
        if !self.catalog_repo.delete_artist(artist_id)? {
            return Err(ApiError::not_found("Artist", artist_id));
        }
        info!(artist_id = %artist_id, "艺人已删除");
        Ok(())
    }

    // ==========================================
    // Album
    // ==========================================

    pub fn list_albums(&self, artist_id: Option<&str>) -> ApiResult<Vec<Album>> {
        Ok(self.catalog_repo.list_albums(artist_id)?)
    }

    pub fn get_album(&self, album_id: &str) -> ApiResult<Album> {
        self.catalog_repo
            .find_album(album_id)?
            .ok_or_else(|| ApiError::not_found("Album", album_id))
    }

    pub fn create_album(&self, input: AlbumInput) -> ApiResult<Album> {
        let input = self.checked_album(input)?;
        Ok(self.catalog_repo.create_album(&input)?)
    }

    pub fn update_album(&self, album_id: &str, input: AlbumInput) -> ApiResult<Album> {
        let input = self.checked_album(input)?;
        Ok(self.catalog_repo.update_album(album_id, &input)?)
    }

    pub fn delete_album(&self, album_id: &str) -> ApiResult<()> {
        if !self.catalog_repo.delete_album(album_id)? {
            return Err(ApiError::not_found("Album", album_id));
        }
        Ok(())
    }

    fn checked_album(&self, input: AlbumInput) -> ApiResult<AlbumInput> {
        Ok(AlbumInput {
            title: require_non_empty("专辑标题", &input.title)?,
            ..input
        })
    }

    // ==========================================
    // Track
    // ==========================================

    pub fn list_tracks(&self, album_id: Option<&str>) -> ApiResult<Vec<Track>> {
        Ok(self.catalog_repo.list_tracks(album_id)?)
    }

    pub fn get_track(&self, track_id: &str) -> ApiResult<Track> {
        self.catalog_repo
            .find_track(track_id)?
            .ok_or_else(|| ApiError::not_found("Track", track_id))
    }

    pub fn create_track(&self, input: TrackInput) -> ApiResult<Track> {
        let input = self.checked_track(input)?;
        Ok(self.catalog_repo.create_track(&input)?)
    }

    pub fn update_track(&self, track_id: &str, input: TrackInput) -> ApiResult<Track> {
        let input = self.checked_track(input)?;
        Ok(self.catalog_repo.update_track(track_id, &input)?)
    }

    pub fn delete_track(&self, track_id: &str) -> ApiResult<()> {
        if !self.catalog_repo.delete_track(track_id)? {
            return Err(ApiError::not_found("Track", track_id));
        }
        Ok(())
    }

    fn checked_track(&self, input: TrackInput) -> ApiResult<TrackInput> {
        if let Some(secs) = input.duration_secs {
            if secs < 0 {
                return Err(ApiError::InvalidInput(format!("时长不能为负数: {}", secs)));
            }
        }
        Ok(TrackInput {
            title: require_non_empty("曲目标题", &input.title)?,
            ..input
        })
    }

    // ==========================================
    // Campaign
    // ==========================================

    pub fn list_campaigns(&self, artist_id: Option<&str>) -> ApiResult<Vec<Campaign>> {
        Ok(self.catalog_repo.list_campaigns(artist_id)?)
    }

    pub fn get_campaign(&self, campaign_id: &str) -> ApiResult<Campaign> {
        self.catalog_repo
            .find_campaign(campaign_id)?
            .ok_or_else(|| ApiError::not_found("Campaign", campaign_id))
    }

    pub fn create_campaign(&self, input: CampaignInput) -> ApiResult<Campaign> {
        let input = self.checked_campaign(input)?;
        Ok(self.catalog_repo.create_campaign(&input)?)
    }

    pub fn update_campaign(&self, campaign_id: &str, input: CampaignInput) -> ApiResult<Campaign> {
        let input = self.checked_campaign(input)?;
        Ok(self.catalog_repo.update_campaign(campaign_id, &input)?)
    }

    pub fn delete_campaign(&self, campaign_id: &str) -> ApiResult<()> {
        if !self.catalog_repo.delete_campaign(campaign_id)? {
            return Err(ApiError::not_found("Campaign", campaign_id));
        }
        Ok(())
    }

    fn checked_campaign(&self, input: CampaignInput) -> ApiResult<CampaignInput> {
        validate_date_range(input.start_date, input.end_date)?;
        validate_non_negative("预算", input.budget)?;
        Ok(CampaignInput {
            name: require_non_empty("活动名称", &input.name)?,
            ..input
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> CatalogApi {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let repo = CatalogRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        CatalogApi::new(Arc::new(repo))
    }

    #[test]
    fn test_artist_name_is_trimmed_and_required() {
        let api = setup();
        let artist = api
            .create_artist(ArtistInput {
                name: "  Nova Lane ".to_string(),
            })
            .unwrap();
        assert_eq!(artist.name, "Nova Lane");

        let err = api
            .create_artist(ArtistInput {
                name: " ".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_campaign_end_before_start_rejected() {
        let api = setup();
        let artist = api
            .create_artist(ArtistInput {
                name: "Nova".to_string(),
            })
            .unwrap();

        let err = api
            .create_campaign(CampaignInput {
                artist_id: artist.artist_id.clone(),
                name: "Spring push".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                budget: 100.0,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let ok = api
            .create_campaign(CampaignInput {
                artist_id: artist.artist_id,
                name: "Spring push".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
                budget: 100.0,
            })
            .unwrap();
        assert_eq!(api.get_campaign(&ok.campaign_id).unwrap().name, "Spring push");
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let api = setup();
        assert!(matches!(api.get_album("nope"), Err(ApiError::NotFound(_))));
        assert!(matches!(api.delete_track("nope"), Err(ApiError::NotFound(_))));
        assert!(matches!(
            api.update_artist(
                "nope",
                ArtistInput {
                    name: "X".to_string()
                }
            ),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_album_for_unknown_artist_violates_foreign_key() {
        let api = setup();
        let err = api
            .create_album(AlbumInput {
                artist_id: "ghost".to_string(),
                title: "Debut".to_string(),
                release_date: None,
                upc: None,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }
}
