use serde::{Deserialize, Serialize};

use crate::external::attachment::ProcessedFile;

/// Request body for the ticket proxy's creation endpoints.
#[derive(Debug, Serialize)]
pub struct TicketSubmission {
    #[serde(rename = "serviceDeskId")]
    pub service_desk_id: u32,
    #[serde(rename = "requestTypeId")]
    pub request_type_id: u32,
    #[serde(rename = "requestFieldValues")]
    pub request_field_values: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<ProcessedFile>>,
}

/// Success payload from the ticket proxy: `{"data": {"ticketKey", "ticketUrl"}}`.
#[derive(Debug, Deserialize)]
pub struct CreatedTicket {
    pub data: Option<CreatedTicketData>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTicketData {
    #[serde(rename = "ticketKey")]
    pub ticket_key: Option<String>,
    #[serde(rename = "ticketUrl")]
    pub ticket_url: Option<String>,
}

/// Error body shape some proxy failures carry.
#[derive(Debug, Deserialize)]
pub struct ProxyError {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Uniform outcome of a ticket submission. Exactly one of the success and
/// failure branches is populated.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TicketSubmissionResult {
    pub success: bool,
    #[serde(rename = "ticketKey", skip_serializing_if = "Option::is_none")]
    pub ticket_key: Option<String>,
    #[serde(rename = "ticketUrl", skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl TicketSubmissionResult {
    pub fn created(ticket_key: Option<String>, ticket_url: Option<String>) -> Self {
        Self {
            success: true,
            ticket_key,
            ticket_url,
            error: None,
            status: None,
        }
    }

    pub fn failed(status: Option<u16>, error: String) -> Self {
        Self {
            success: false,
            ticket_key: None,
            ticket_url: None,
            error: Some(error),
            status,
        }
    }
}

/// Answer payload from the metrics Q&A endpoint.
#[derive(Debug, Deserialize)]
pub struct MetricsAnswer {
    pub response: String,
}
