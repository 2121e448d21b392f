mod handlers;
mod types;

pub use handlers::{
    create_plant, create_plant_sensor, delete_plant, get_dashboard, get_plant,
    list_active_sensors, list_plants, list_retired_sensors, update_plant,
};
pub use types::{
    DashboardQuery, DashboardResponse, PlantCreateRequest, PlantResponse,
    PlantSensorCreateRequest, PlantUpdateRequest, SensorFaultCountResponse, TypeUsageResponse,
};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_create_plant, __path_create_plant_sensor, __path_delete_plant, __path_get_dashboard,
    __path_get_plant, __path_list_active_sensors, __path_list_plants, __path_list_retired_sensors,
    __path_update_plant,
};
