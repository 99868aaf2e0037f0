pub mod device;
pub mod evaluation;
pub mod geofence;
pub mod score;
pub mod shift;
