use super::dto::{CreatedTicket, ProxyError, TicketSubmission, TicketSubmissionResult};
use crate::external::attachment::{self, UploadedFile};
use crate::external::Services;

/// The closed set of ticket destinations. Unknown selections fall back to
/// general support.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TicketType {
    GeneralSupport,
    WebsiteLoginHelp,
    ResourceLoginHelp,
    SecurityIncident,
}

impl TicketType {
    /// JSM request type schema ids, fixed per destination queue.
    pub fn request_type_id(&self) -> u32 {
        match self {
            Self::GeneralSupport => 17,
            Self::WebsiteLoginHelp => 30,
            Self::ResourceLoginHelp => 31,
            Self::SecurityIncident => 26,
        }
    }

    pub fn service_desk_id(&self) -> u32 {
        match self {
            Self::SecurityIncident => 3,
            _ => 2,
        }
    }

    fn endpoint_path(&self) -> &'static str {
        match self {
            Self::SecurityIncident => "security-incidents",
            _ => "tickets",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "website-login-help" => Self::WebsiteLoginHelp,
            "resource-login-help" => Self::ResourceLoginHelp,
            "security-incident" => Self::SecurityIncident,
            "general-support" => Self::GeneralSupport,
            _ => Self::GeneralSupport,
        }
    }
}

/// Submits one ticket to the proxy. Network failures, rejected requests and
/// malformed responses are all folded into the returned result; this never
/// propagates an error to the flow graph.
pub async fn submit_ticket(
    services: &Services,
    fields: serde_json::Map<String, serde_json::Value>,
    ticket_type: TicketType,
    files: &[UploadedFile],
) -> TicketSubmissionResult {
    let attachments = if files.is_empty() {
        None
    } else {
        let processed =
            attachment::to_transport(files, services.settings.max_attachment_bytes());
        if processed.is_empty() {
            None
        } else {
            Some(processed)
        }
    };
    let body = TicketSubmission {
        service_desk_id: ticket_type.service_desk_id(),
        request_type_id: ticket_type.request_type_id(),
        request_field_values: fields,
        attachments,
    };
    let url = format!(
        "{}/api/v1/{}",
        services.settings.proxy_base_url,
        ticket_type.endpoint_path()
    );
    log::info!(
        "Submitting {:?} ticket (requestTypeId {}) to {}",
        ticket_type,
        body.request_type_id,
        &url
    );
    let res = match services.http.post(&url).json(&body).send().await {
        Ok(r) => r,
        Err(e) => {
            log::error!("Ticket submission transport failure: {:?}", e);
            return TicketSubmissionResult::failed(None, e.to_string());
        }
    };
    let status = res.status();
    if !status.is_success() {
        return TicketSubmissionResult::failed(
            Some(status.as_u16()),
            classify_failure(status, res.text().await.ok()),
        );
    }
    match res.json::<CreatedTicket>().await {
        Ok(created) => {
            let data = created.data;
            TicketSubmissionResult::created(
                data.as_ref().and_then(|d| d.ticket_key.clone()),
                data.as_ref().and_then(|d| d.ticket_url.clone()),
            )
        }
        Err(e) => {
            log::error!("Ticket proxy returned a malformed success body: {:?}", e);
            TicketSubmissionResult::failed(None, e.to_string())
        }
    }
}

/// Maps a non-success proxy status to a user-facing message. Common codes
/// get fixed wording, everything else falls back to whatever the body says.
fn classify_failure(status: reqwest::StatusCode, body: Option<String>) -> String {
    match status.as_u16() {
        401 => String::from("Authentication error with the ticket service. Please contact support."),
        403 => String::from(
            "The ticket service is temporarily unavailable. Please try again later or contact support directly.",
        ),
        404 => String::from("Ticket service not found. Please try again later."),
        500 => String::from("Server error. Please try again later."),
        _ => {
            if let Some(text) = body {
                if let Ok(parsed) = serde_json::from_str::<ProxyError>(&text) {
                    if let Some(m) = parsed.message.or(parsed.error) {
                        return m;
                    }
                }
                if !text.is_empty() {
                    return text;
                }
            }
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
        }
    }
}

/// Formats the terminal message shown after a submission attempt.
pub fn generate_success_message(
    result: Option<&TicketSubmissionResult>,
    ticket_type_label: &str,
) -> String {
    let Some(result) = result else {
        return format!(
            "We apologize, but there was an error submitting your {}.\n\nPlease try again or contact our support team directly.",
            ticket_type_label
        );
    };
    if !result.success {
        return format!(
            "We apologize, but there was an error submitting your {}: {}\n\nPlease try again or contact our support team directly.",
            ticket_type_label,
            result.error.as_deref().unwrap_or("Unknown error")
        );
    }
    if let (Some(url), Some(key)) = (&result.ticket_url, &result.ticket_key) {
        return format!(
            "Your {} has been submitted successfully.\n\nTicket: <a href=\"{}\" target=\"_blank\">{}</a>\n\nOur support team will review your request and respond accordingly. Thank you for contacting ACCESS.",
            ticket_type_label, url, key
        );
    }
    format!(
        "Your {} has been submitted successfully.\n\nOur support team will review your request and respond accordingly. Thank you for contacting ACCESS.",
        ticket_type_label
    )
}
