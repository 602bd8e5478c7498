pub mod cache;
pub mod geocode;
pub mod routing;
pub mod sharepoint;
