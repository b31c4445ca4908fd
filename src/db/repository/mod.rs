pub mod account;
pub mod creator_profile;
pub mod session;
pub mod sponsor_profile;
pub mod user;
pub mod verification;

pub use account::AccountRepository;
pub use creator_profile::CreatorProfileRepository;
pub use session::SessionRepository;
pub use sponsor_profile::SponsorProfileRepository;
pub use user::UserRepository;
pub use verification::VerificationRepository;
