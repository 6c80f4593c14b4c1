// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    modules::{
        error::{code::ErrorCode, MailwatchResult},
        smtp::composer::{BodyComposer, BodyType, InlineAttachment, MessageBody},
    },
    raise_error,
};

/// A send request as it arrives from the caller. Recipient fields are free
/// text: comma separated, possibly with stray whitespace or a trailing comma.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub reply_to: Option<String>,
    /// Sender address; the account's own address when unset.
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub html_body: Option<String>,
    /// `text` or `html`.
    pub body_type: Option<String>,
    #[serde(default)]
    pub attachments: Vec<MailAttachment>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    /// Set for inline attachments referenced from the HTML body by `cid:`.
    pub content_id: Option<String>,
}

impl From<InlineAttachment> for MailAttachment {
    fn from(inline: InlineAttachment) -> Self {
        Self {
            file_name: inline.file_name,
            mime_type: inline.content_type,
            content: inline.bytes,
            content_id: Some(inline.content_id),
        }
    }
}

/// Fully resolved message handed to the [`MailSender`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Vec<String>,
    pub subject: String,
    pub body: MessageBody,
    pub attachments: Vec<MailAttachment>,
}

/// What the caller gets back after a successful send.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct SendSummary {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub attachments: Vec<String>,
}

pub trait MailSender: Send + Sync {
    async fn send(&self, message: OutgoingMessage) -> MailwatchResult<()>;
}

/// `"a@x.com, b@y.com,"` → `["a@x.com", "b@y.com"]`.
pub fn normalize_recipients(recipients: Option<&str>) -> Vec<String> {
    recipients
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|recipient| !recipient.is_empty())
        .map(String::from)
        .collect()
}

/// Composes and sends `request` from `account_address`.
///
/// Inline images found in the HTML body are appended after the caller's
/// attachments; the summary only lists the caller's file names.
pub async fn send_email<S: MailSender>(
    request: SendEmailRequest,
    account_address: &str,
    sender: &S,
) -> MailwatchResult<SendSummary> {
    let to = normalize_recipients(request.to.as_deref());
    let cc = normalize_recipients(request.cc.as_deref());
    let bcc = normalize_recipients(request.bcc.as_deref());
    let reply_to = normalize_recipients(request.reply_to.as_deref());
    if to.is_empty() && cc.is_empty() && bcc.is_empty() {
        return Err(raise_error!(
            "Missing recipient: no 'to', 'cc' or 'bcc' address provided".into(),
            ErrorCode::InvalidParameter
        ));
    }

    let preference = request
        .body_type
        .as_deref()
        .map(str::parse::<BodyType>)
        .transpose()?;
    let (body, inline) = BodyComposer::compose(
        request.body.as_deref(),
        preference,
        request.html_body.as_deref(),
    );

    let from = request
        .from
        .filter(|from| !from.trim().is_empty())
        .unwrap_or_else(|| account_address.to_string());
    let subject = request.subject.unwrap_or_default();
    let file_names: Vec<String> = request
        .attachments
        .iter()
        .map(|attachment| attachment.file_name.clone())
        .collect();

    let mut attachments = request.attachments;
    attachments.extend(inline.into_iter().map(MailAttachment::from));

    sender
        .send(OutgoingMessage {
            from: from.clone(),
            to: to.clone(),
            cc,
            bcc,
            reply_to,
            subject: subject.clone(),
            body,
            attachments,
        })
        .await?;

    info!(
        from = %from,
        recipients = to.len(),
        attachments = file_names.len(),
        "Email sent"
    );
    Ok(SendSummary {
        from,
        to,
        subject,
        attachments: file_names,
    })
}
