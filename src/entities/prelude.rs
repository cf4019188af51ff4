pub use super::categories::Entity as Categories;
pub use super::connections::Entity as Connections;
pub use super::live_streams::Entity as LiveStreams;
pub use super::series::Entity as Series;
pub use super::users::Entity as Users;
pub use super::vod_streams::Entity as VodStreams;
