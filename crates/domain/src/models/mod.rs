//! Domain models for location sharing groups.

pub mod device;
pub mod group;
pub mod location;
pub mod message;

pub use device::{Device, DeviceProfile, NO_COLOR};
pub use group::{Group, GroupInfo, MAIN_GROUP_KEY};
pub use location::{LatLon, Location};
pub use message::Message;
