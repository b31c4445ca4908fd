//! Directory filtering, sorting and reach estimation over connected users.
//!
//! Everything here is pure: callers load the full listing once and pass it in.

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::{CreatorStatus, MarketplaceUser, SponsorStatus, User};
use crate::marketplace::{decode_categories, Category};

const BASE_VISIT_MULTIPLIER: f64 = 1.67;
const LISTED_THRESHOLD: i64 = 100;
const LISTED_MULTIPLIER: f64 = 1.2;
const TWEET_THRESHOLD: i64 = 10_000;
const TWEET_MULTIPLIER: f64 = 1.1;
const VERIFIED_MULTIPLIER: f64 = 1.15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySort {
    /// Most followers first
    #[default]
    Followers,
    /// Highest estimated monthly visits first
    Visits,
    /// Cheapest first, by the lower bound of the price or budget range
    Price,
    /// Most recently joined first
    Newest,
}

/// Directory filter state. Omitted fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct FilterCriteria {
    /// Case-insensitive match against name, handle and bio
    pub search: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_number")]
    pub min_followers: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_number")]
    pub min_price: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_number")]
    pub max_price: Option<i64>,
    /// Comma-separated category codes in a query string, or a JSON array
    #[serde(deserialize_with = "deserialize_category_list")]
    #[param(value_type = Option<String>)]
    pub categories: Vec<Category>,
    pub sort: DirectorySort,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberField {
    Number(i64),
    Text(String),
}

// Blank form fields (`minFollowers=`) mean no constraint.
fn deserialize_optional_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberField::Number(n)) => Ok(Some(n)),
        Some(NumberField::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: {}", text)))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryList {
    Joined(String),
    Items(Vec<String>),
}

// Unknown codes are dropped, matching how stored lists are decoded.
fn deserialize_category_list<'de, D>(deserializer: D) -> Result<Vec<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let codes: Vec<String> = match Option::<CategoryList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(CategoryList::Joined(s)) => s.split(',').map(|c| c.trim().to_string()).collect(),
        Some(CategoryList::Items(items)) => items,
    };

    let mut out = Vec::new();
    for category in codes.iter().filter_map(|c| Category::from_code(c)) {
        if !out.contains(&category) {
            out.push(category);
        }
    }
    Ok(out)
}

/// Estimated monthly profile visits from public reach signals.
pub fn estimate_monthly_visits(
    followers: i64,
    listed: i64,
    tweets: i64,
    verified: bool,
    verified_type: Option<&str>,
) -> i64 {
    let mut visits = followers as f64 * BASE_VISIT_MULTIPLIER;
    if listed > LISTED_THRESHOLD {
        visits *= LISTED_MULTIPLIER;
    }
    if tweets > TWEET_THRESHOLD {
        visits *= TWEET_MULTIPLIER;
    }
    if verified || verified_type.is_some() {
        visits *= VERIFIED_MULTIPLIER;
    }
    visits.round() as i64
}

pub fn estimated_visits_for(user: &User) -> i64 {
    estimate_monthly_visits(
        user.twitter_followers,
        user.twitter_listed_count,
        user.twitter_tweet_count,
        user.twitter_verified,
        user.twitter_verified_type.as_deref(),
    )
}

/// Listed as a creator: connected, creator role, available.
pub fn is_listed_creator(entry: &MarketplaceUser) -> bool {
    entry.user.is_connected()
        && entry.user.role.is_some_and(|r| r.is_creator())
        && entry
            .creator
            .as_ref()
            .is_some_and(|c| c.status == Some(CreatorStatus::Available))
}

/// Listed as a sponsor: connected, sponsor role, active.
pub fn is_listed_sponsor(entry: &MarketplaceUser) -> bool {
    entry.user.is_connected()
        && entry.user.role.is_some_and(|r| r.is_sponsor())
        && entry
            .sponsor
            .as_ref()
            .is_some_and(|s| s.status == Some(SponsorStatus::Active))
}

fn matches_search(user: &User, search: Option<&str>) -> bool {
    let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();

    [
        Some(user.name.as_str()),
        user.twitter_username.as_deref(),
        user.twitter_bio.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_range(min: Option<i64>, max: Option<i64>, criteria: &FilterCriteria) -> bool {
    if let Some(floor) = criteria.min_price {
        if max.unwrap_or(0) < floor {
            return false;
        }
    }
    if let Some(ceiling) = criteria.max_price {
        match min {
            Some(lo) if lo <= ceiling => {}
            _ => return false,
        }
    }
    true
}

/// An empty selection matches everyone; otherwise at least one category must overlap.
pub fn matches_categories(stored: Option<&str>, selected: &[Category]) -> bool {
    if selected.is_empty() {
        return true;
    }
    let wanted: HashSet<Category> = selected.iter().copied().collect();
    decode_categories(stored).iter().any(|c| wanted.contains(c))
}

fn matches_common(
    user: &User,
    range: (Option<i64>, Option<i64>),
    categories: Option<&str>,
    criteria: &FilterCriteria,
) -> bool {
    let min_followers = criteria.min_followers.unwrap_or(0);
    matches_search(user, criteria.search.as_deref())
        && (min_followers <= 0 || user.twitter_followers >= min_followers)
        && matches_range(range.0, range.1, criteria)
        && matches_categories(categories, &criteria.categories)
}

pub fn filter_creators<'a>(
    users: &'a [MarketplaceUser],
    criteria: &FilterCriteria,
) -> Vec<&'a MarketplaceUser> {
    let mut out: Vec<&MarketplaceUser> = users
        .iter()
        .filter(|u| is_listed_creator(u))
        .filter(|u| {
            let Some(c) = u.creator.as_ref() else {
                return false;
            };
            matches_common(
                &u.user,
                (c.price_min, c.price_max),
                c.categories.as_deref(),
                criteria,
            )
        })
        .collect();
    sort_entries(&mut out, criteria.sort, |u| u.creator.as_ref().and_then(|c| c.price_min));
    out
}

pub fn filter_sponsors<'a>(
    users: &'a [MarketplaceUser],
    criteria: &FilterCriteria,
) -> Vec<&'a MarketplaceUser> {
    let mut out: Vec<&MarketplaceUser> = users
        .iter()
        .filter(|u| is_listed_sponsor(u))
        .filter(|u| {
            let Some(s) = u.sponsor.as_ref() else {
                return false;
            };
            matches_common(
                &u.user,
                (s.budget_min, s.budget_max),
                s.categories.as_deref(),
                criteria,
            )
        })
        .collect();
    sort_entries(&mut out, criteria.sort, |u| u.sponsor.as_ref().and_then(|s| s.budget_min));
    out
}

/// Stable sort; entries without a price sort after priced ones.
fn sort_entries<F>(entries: &mut [&MarketplaceUser], sort: DirectorySort, price_of: F)
where
    F: Fn(&MarketplaceUser) -> Option<i64>,
{
    match sort {
        DirectorySort::Followers => entries.sort_by_key(|u| Reverse(u.user.twitter_followers)),
        DirectorySort::Visits => entries.sort_by_key(|u| Reverse(estimated_visits_for(&u.user))),
        DirectorySort::Price => entries.sort_by_key(|u| match price_of(u) {
            Some(p) => (false, p),
            None => (true, 0),
        }),
        DirectorySort::Newest => entries.sort_by_key(|u| Reverse(u.user.created_at)),
    }
}
