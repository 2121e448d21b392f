use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of the ingestion call sent by field gateways
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddReadingRequest {
    /// Raw telemetry string, e.g. `S001 E(202401151230000042)Nessuno`
    pub stringa: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IngestStatus {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    #[must_use]
    pub fn fail() -> Self {
        Self {
            status: "fail".to_string(),
            message: None,
        }
    }

    #[must_use]
    pub fn bad_format() -> Self {
        Self {
            status: "fail".to_string(),
            message: Some("bad format".to_string()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensoreResponse {
    pub id_sensore: String,
    pub tipo: String,
    pub marca: String,
    pub codice_errore: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RilevazioneResponse {
    pub id_sensore: String,
    /// Timestamp in the telemetry timezone, RFC 3339
    pub dataora: String,
    pub valore: i64,
    pub messaggio: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SensoreQuery {
    pub id_sensore: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RilevazioneQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedLineResponse {
    pub line: usize,
    pub stringa: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResponse {
    pub accepted: usize,
    pub rejected: Vec<RejectedLineResponse>,
}
