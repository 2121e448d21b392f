mod handlers;
mod types;

pub use handlers::{
    attach_sensor, delete_reading, delete_sensor, detach_sensor, get_sensor, list_faults,
    list_installations, list_readings, list_sensors, move_sensor, restore_sensor, update_sensor,
};
pub use types::{
    FaultResponse, InstallationResponse, MoveResponse, PlantRef, PlantTargetRequest,
    ReadingResponse, SensorDetailResponse, SensorResponse, SensorUpdateRequest,
};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_attach_sensor, __path_delete_reading, __path_delete_sensor, __path_detach_sensor,
    __path_get_sensor, __path_list_faults, __path_list_installations, __path_list_readings,
    __path_list_sensors, __path_move_sensor, __path_restore_sensor, __path_update_sensor,
};
