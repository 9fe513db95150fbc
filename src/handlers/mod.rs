pub mod feed;
pub mod feedback;
pub mod health;
pub mod matches;
pub mod moods;
pub mod places;
pub mod users;
