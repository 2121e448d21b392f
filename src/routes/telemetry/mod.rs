mod handlers;
mod types;

pub use handlers::{
    add_reading, import_stringhe, list_rilevazioni, list_sensori, show_rilevazione, show_sensore,
};
pub use types::{
    AddReadingRequest, ImportResponse, IngestStatus, RejectedLineResponse, RilevazioneQuery,
    RilevazioneResponse, SensoreQuery, SensoreResponse,
};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_add_reading, __path_import_stringhe, __path_list_rilevazioni, __path_list_sensori,
    __path_show_rilevazione, __path_show_sensore,
};
