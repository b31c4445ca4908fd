//! Wire shapes shared by the RPC and directory endpoints.

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{
    ContactMethod, CreatorProfile, CreatorStatus, MarketplaceUser, Role, SponsorProfile,
    SponsorStatus,
};
use crate::marketplace::{
    decode_categories, format_number, format_price_range, Category, CategoryInfo,
};
use crate::services::directory::estimated_visits_for;

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSection {
    pub status: Option<CreatorStatus>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub categories: Vec<Category>,
    pub looking_for: Option<String>,
    pub contact_method: Option<ContactMethod>,
    pub contact_value: Option<String>,
}

impl From<&CreatorProfile> for CreatorSection {
    fn from(p: &CreatorProfile) -> Self {
        Self {
            status: p.status,
            price_min: p.price_min,
            price_max: p.price_max,
            categories: decode_categories(p.categories.as_deref()),
            looking_for: p.looking_for.clone(),
            contact_method: p.contact_method,
            contact_value: p.contact_value.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsorSection {
    pub status: Option<SponsorStatus>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub industry: Option<String>,
    pub categories: Vec<Category>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub looking_for: Option<String>,
}

impl From<&SponsorProfile> for SponsorSection {
    fn from(p: &SponsorProfile) -> Self {
        Self {
            status: p.status,
            company_name: p.company_name.clone(),
            company_website: p.company_website.clone(),
            industry: p.industry.clone(),
            categories: decode_categories(p.categories.as_deref()),
            budget_min: p.budget_min,
            budget_max: p.budget_max,
            looking_for: p.looking_for.clone(),
        }
    }
}

/// Public view of a connected user. Email and credentials are never exposed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceUserResponse {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub twitter_id: Option<String>,
    pub twitter_username: Option<String>,
    pub twitter_bio: Option<String>,
    pub twitter_location: Option<String>,
    pub twitter_url: Option<String>,
    pub twitter_banner_url: Option<String>,
    pub twitter_verified: bool,
    pub twitter_verified_type: Option<String>,
    pub twitter_created_at: Option<NaiveDateTime>,
    pub twitter_followers: i64,
    pub twitter_following: i64,
    pub twitter_tweet_count: i64,
    pub twitter_listed_count: i64,
    pub twitter_verified_followers: i64,
    pub twitter_synced_at: Option<NaiveDateTime>,
    pub role: Option<Role>,
    pub onboarding_completed: bool,
    pub created_at: NaiveDateTime,
    pub creator: Option<CreatorSection>,
    pub sponsor: Option<SponsorSection>,
}

impl From<&MarketplaceUser> for MarketplaceUserResponse {
    fn from(entry: &MarketplaceUser) -> Self {
        let u = &entry.user;
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            image: u.image.clone(),
            twitter_id: u.twitter_id.clone(),
            twitter_username: u.twitter_username.clone(),
            twitter_bio: u.twitter_bio.clone(),
            twitter_location: u.twitter_location.clone(),
            twitter_url: u.twitter_url.clone(),
            twitter_banner_url: u.twitter_banner_url.clone(),
            twitter_verified: u.twitter_verified,
            twitter_verified_type: u.twitter_verified_type.clone(),
            twitter_created_at: u.twitter_created_at,
            twitter_followers: u.twitter_followers,
            twitter_following: u.twitter_following,
            twitter_tweet_count: u.twitter_tweet_count,
            twitter_listed_count: u.twitter_listed_count,
            twitter_verified_followers: u.twitter_verified_followers,
            twitter_synced_at: u.twitter_synced_at,
            role: u.role,
            onboarding_completed: u.onboarding_completed,
            created_at: u.created_at,
            creator: entry.creator.as_ref().map(CreatorSection::from),
            sponsor: entry.sponsor.as_ref().map(SponsorSection::from),
        }
    }
}

/// Which side of the marketplace a directory card is rendered for.
#[derive(Debug, Clone, Copy)]
pub enum DirectorySide {
    Creators,
    Sponsors,
}

/// A directory card: the public user view plus display-ready figures.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    #[serde(flatten)]
    pub user: MarketplaceUserResponse,
    pub estimated_monthly_visits: i64,
    pub followers_display: String,
    pub estimated_visits_display: String,
    /// Weekly price range for creators, budget range for sponsors
    pub price_display: Option<String>,
    pub category_labels: Vec<CategoryInfo>,
}

impl DirectoryEntry {
    pub fn new(entry: &MarketplaceUser, side: DirectorySide) -> Self {
        let visits = estimated_visits_for(&entry.user);
        let (range, categories) = match side {
            DirectorySide::Creators => entry
                .creator
                .as_ref()
                .map(|c| ((c.price_min, c.price_max), c.categories.as_deref()))
                .unwrap_or(((None, None), None)),
            DirectorySide::Sponsors => entry
                .sponsor
                .as_ref()
                .map(|s| ((s.budget_min, s.budget_max), s.categories.as_deref()))
                .unwrap_or(((None, None), None)),
        };

        Self {
            user: MarketplaceUserResponse::from(entry),
            estimated_monthly_visits: visits,
            followers_display: format_number(Some(entry.user.twitter_followers)),
            estimated_visits_display: format_number(Some(visits)),
            price_display: format_price_range(range.0, range.1),
            category_labels: decode_categories(categories)
                .into_iter()
                .map(CategoryInfo::from)
                .collect(),
        }
    }
}
