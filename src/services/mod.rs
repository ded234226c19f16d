pub mod feed;
pub mod follow;
pub mod interactions;
pub mod mentions;
pub mod normalize;
pub mod notifications;
