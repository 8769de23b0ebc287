//! Email dispatch handlers.
//!
//! Every endpoint inserts a pending notification row, hands the message to
//! the provider and settles the row to sent or failed. There is no retry.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{NotificationRecord, NotificationStatus};
use crate::services::metrics::record_email;
use crate::services::{EmailAttachment, EmailMessage, ProviderError};
use crate::startup::AppState;
use crate::templates;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(email(message = "Invalid email address"))]
    pub to: String,
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject: String,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub from_name: Option<String>,
    #[validate(email(message = "Invalid reply-to email address"))]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OfferEmailRequest {
    pub offer_id: Uuid,
    /// Storage URL of an already rendered PDF to attach.
    #[validate(url(message = "Invalid PDF URL"))]
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WelcomeEmailRequest {
    #[validate(email(message = "Invalid email address"))]
    pub to: String,
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    #[validate(length(min = 1, message = "Contact name is required"))]
    pub contact_name: String,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub notification_id: Uuid,
    pub status: String,
    pub channel: String,
}

fn accepted(
    record: &NotificationRecord,
    status: NotificationStatus,
) -> (StatusCode, Json<SendEmailResponse>) {
    (
        StatusCode::ACCEPTED,
        Json(SendEmailResponse {
            notification_id: record.notification_id,
            status: status.as_str().to_string(),
            channel: record.channel.clone(),
        }),
    )
}

/// Hand an already recorded message to the provider and settle its row.
async fn deliver(
    state: &AppState,
    record: &NotificationRecord,
    message: &EmailMessage,
) -> Result<NotificationStatus, AppError> {
    match state.email_provider.send(message).await {
        Ok(response) => {
            state
                .db
                .mark_notification_sent(record.notification_id, response.provider_id.as_deref())
                .await?;
            record_email(&record.template, "sent");
            tracing::info!(
                notification_id = %record.notification_id,
                template = %record.template,
                "Email sent"
            );
            Ok(NotificationStatus::Sent)
        }
        Err(ProviderError::NotEnabled(msg)) => {
            // Provider disabled environments still record the dispatch
            tracing::warn!(
                notification_id = %record.notification_id,
                "Email provider not enabled: {}. Marking as sent.",
                msg
            );
            state
                .db
                .mark_notification_sent(record.notification_id, Some("mock"))
                .await?;
            record_email(&record.template, "sent");
            Ok(NotificationStatus::Sent)
        }
        Err(e) => {
            let error_msg = e.to_string();
            state
                .db
                .mark_notification_failed(record.notification_id, &error_msg)
                .await?;
            record_email(&record.template, "failed");
            tracing::error!(
                notification_id = %record.notification_id,
                error = %error_msg,
                "Failed to send email"
            );
            Err(AppError::EmailError(error_msg))
        }
    }
}

/// Fetch the static PDF for an offer from its storage URL.
async fn fetch_pdf(
    client: &reqwest::Client,
    url: &str,
    offer_id: Uuid,
) -> Result<EmailAttachment, AppError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::EmailError(format!("Failed to fetch attachment: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::EmailError(format!(
            "Attachment fetch returned {}",
            response.status()
        )));
    }

    let data = response
        .bytes()
        .await
        .map_err(|e| AppError::EmailError(format!("Failed to read attachment: {}", e)))?
        .to_vec();

    Ok(EmailAttachment {
        filename: format!("offre-{}.pdf", offer_id),
        content_type: "application/pdf".to_string(),
        data,
    })
}

/// Generic transactional email with caller-supplied bodies.
#[tracing::instrument(skip(state, request))]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), AppError> {
    request.validate()?;

    if request.body_html.is_none() && request.body_text.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At least one of body_html or body_text must be provided"
        )));
    }

    let record =
        NotificationRecord::pending("generic", &request.to, &request.subject, None, false);
    state.db.insert_notification(&record).await?;

    let message = EmailMessage {
        to: request.to,
        subject: request.subject,
        body_text: request.body_text,
        body_html: request.body_html,
        from_name: request.from_name,
        reply_to: request.reply_to,
        attachment: None,
    };

    let status = deliver(&state, &record, &message).await?;
    Ok(accepted(&record, status))
}

/// Offer-ready mail: equipment list, totals and an optional PDF attachment.
#[tracing::instrument(skip(state, request), fields(offer_id = %request.offer_id))]
pub async fn send_offer_ready(
    State(state): State<AppState>,
    Json(request): Json<OfferEmailRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), AppError> {
    request.validate()?;

    let offer = state
        .db
        .get_offer_email(request.offer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;
    let lines = state.db.list_offer_equipment(offer.offer_id).await?;
    let rendered = templates::offer_ready(&offer, &lines);

    let record = NotificationRecord::pending(
        "offer_ready",
        &offer.client_email,
        &rendered.subject,
        Some(offer.offer_id),
        request.pdf_url.is_some(),
    );
    state.db.insert_notification(&record).await?;

    let attachment = match &request.pdf_url {
        Some(url) => match fetch_pdf(&state.http, url, offer.offer_id).await {
            Ok(attachment) => Some(attachment),
            Err(e) => {
                state
                    .db
                    .mark_notification_failed(record.notification_id, &e.to_string())
                    .await?;
                record_email(&record.template, "failed");
                return Err(e);
            }
        },
        None => None,
    };

    let message = EmailMessage {
        to: offer.client_email.clone(),
        subject: rendered.subject.clone(),
        body_text: Some(rendered.body_text),
        body_html: Some(rendered.body_html),
        from_name: None,
        reply_to: None,
        attachment,
    };

    let status = deliver(&state, &record, &message).await?;
    Ok(accepted(&record, status))
}

/// Signature confirmation mail. Only signed offers qualify.
#[tracing::instrument(skip(state, request), fields(offer_id = %request.offer_id))]
pub async fn send_offer_signed(
    State(state): State<AppState>,
    Json(request): Json<OfferEmailRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), AppError> {
    request.validate()?;

    let offer = state
        .db
        .get_offer_email(request.offer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Offer not found")))?;

    if !offer.is_signed() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Offer has not been signed"
        )));
    }

    let rendered = templates::offer_signed(&offer);

    let record = NotificationRecord::pending(
        "offer_signed",
        &offer.client_email,
        &rendered.subject,
        Some(offer.offer_id),
        false,
    );
    state.db.insert_notification(&record).await?;

    let message = EmailMessage {
        to: offer.client_email.clone(),
        subject: rendered.subject.clone(),
        body_text: Some(rendered.body_text),
        body_html: Some(rendered.body_html),
        from_name: None,
        reply_to: None,
        attachment: None,
    };

    let status = deliver(&state, &record, &message).await?;
    Ok(accepted(&record, status))
}

/// Company onboarding mail.
#[tracing::instrument(skip(state, request))]
pub async fn send_welcome(
    State(state): State<AppState>,
    Json(request): Json<WelcomeEmailRequest>,
) -> Result<(StatusCode, Json<SendEmailResponse>), AppError> {
    request.validate()?;

    let rendered = templates::welcome(&request.company_name, &request.contact_name);

    let record =
        NotificationRecord::pending("welcome", &request.to, &rendered.subject, None, false);
    state.db.insert_notification(&record).await?;

    let message = EmailMessage {
        to: request.to,
        subject: rendered.subject.clone(),
        body_text: Some(rendered.body_text),
        body_html: Some(rendered.body_html),
        from_name: None,
        reply_to: None,
        attachment: None,
    };

    let status = deliver(&state, &record, &message).await?;
    Ok(accepted(&record, status))
}
