//! Publishing finished videos to social platforms.

mod instagram;
mod media;
mod pinterest;
mod social;
mod twitter;
mod types;
mod youtube;

pub use instagram::InstagramClient;
pub use pinterest::PinterestClient;
pub use social::SocialPublisher;
pub use twitter::{TwitterClient, TwitterCredentials};
pub use types::{truncate_chars, PublishError, PublishMetadata, Publisher};
pub use youtube::{YouTubeClient, YouTubeCredentials};
