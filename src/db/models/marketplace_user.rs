use super::{CreatorProfile, SponsorProfile, User};

/// A connected user with both role sections, as listed by `users.getAll`.
#[derive(Debug, Clone)]
pub struct MarketplaceUser {
    pub user: User,
    pub creator: Option<CreatorProfile>,
    pub sponsor: Option<SponsorProfile>,
}
