pub mod faults;
pub mod installations;
pub mod plants;
pub mod raw_strings;
pub mod readings;
pub mod sensor_brands;
pub mod sensor_types;
pub mod sensors;
pub mod sessions;
pub mod users;
