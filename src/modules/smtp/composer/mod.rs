// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use tracing::warn;

use crate::{
    base64_decode, generate_token,
    modules::error::{code::ErrorCode, MailwatchError, MailwatchResult},
    raise_error,
};

pub static INLINE_IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src\s*=\s*"data:(image/[A-Za-z0-9.+-]+);base64,([^"]*)""#).unwrap()
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BodyType {
    Text,
    Html,
}

impl FromStr for BodyType {
    type Err = MailwatchError;

    fn from_str(s: &str) -> MailwatchResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(BodyType::Text),
            "html" => Ok(BodyType::Html),
            other => Err(raise_error!(
                format!("Unknown body type '{}', expected 'text' or 'html'", other),
                ErrorCode::InvalidParameter
            )),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessageBody {
    Plain(String),
    Html(String),
}

impl MessageBody {
    pub fn as_str(&self) -> &str {
        match self {
            MessageBody::Plain(body) | MessageBody::Html(body) => body,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, MessageBody::Html(_))
    }
}

/// An image lifted out of an HTML body, referenced from it by `cid:`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InlineAttachment {
    pub content_id: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct BodyComposer;

impl BodyComposer {
    /// Picks the body to send and extracts its embedded images.
    ///
    /// Without a preference, or with `html`, a non-empty HTML body wins and
    /// the plain body is the fallback. With `text`, a non-empty plain body
    /// wins, then a non-empty HTML body, then an empty plain body.
    pub fn compose(
        plain: Option<&str>,
        preference: Option<BodyType>,
        html: Option<&str>,
    ) -> (MessageBody, Vec<InlineAttachment>) {
        Self::compose_with(plain, preference, html, || generate_token!(96))
    }

    /// [`BodyComposer::compose`] with a caller-supplied token source for
    /// content identifiers.
    pub fn compose_with<T>(
        plain: Option<&str>,
        preference: Option<BodyType>,
        html: Option<&str>,
        token: T,
    ) -> (MessageBody, Vec<InlineAttachment>)
    where
        T: FnMut() -> String,
    {
        let plain = plain.filter(|body| !body.is_empty());
        let html = html.filter(|body| !body.is_empty());

        let chosen = match (preference, plain, html) {
            (Some(BodyType::Text), Some(plain), _) => MessageBody::Plain(plain.to_string()),
            (Some(BodyType::Text), None, Some(html)) => MessageBody::Html(html.to_string()),
            (None | Some(BodyType::Html), _, Some(html)) => MessageBody::Html(html.to_string()),
            (_, plain, _) => MessageBody::Plain(plain.unwrap_or_default().to_string()),
        };

        match chosen {
            MessageBody::Html(html) => {
                let (html, attachments) = Self::extract_inline_images(&html, token);
                (MessageBody::Html(html), attachments)
            }
            plain => (plain, Vec::new()),
        }
    }

    /// Replaces every `src="data:image/...;base64,..."` with a `cid:`
    /// reference. Images whose data does not decode stay inline.
    pub fn extract_inline_images<T>(html: &str, mut token: T) -> (String, Vec<InlineAttachment>)
    where
        T: FnMut() -> String,
    {
        let mut attachments = Vec::new();
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for caps in INLINE_IMAGE_PATTERN.captures_iter(html) {
            let (Some(whole), Some(content_type), Some(data)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let data: String = data
                .as_str()
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = match base64_decode!(&data) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        "Leaving inline {} image in place, its data is not valid base64: {}",
                        content_type.as_str(),
                        e
                    );
                    continue;
                }
            };

            let index = attachments.len();
            let fresh = token();
            let content_id = format!("image{}_{}_{}", index, fresh, fresh);
            out.push_str(&html[last..whole.start()]);
            out.push_str(&format!(r#"src="cid:{}""#, content_id));
            last = whole.end();

            attachments.push(InlineAttachment {
                file_name: format!("image{}.{}", index, extension_for(content_type.as_str())),
                content_type: content_type.as_str().to_string(),
                content_id,
                bytes,
            });
        }
        out.push_str(&html[last..]);
        (out, attachments)
    }
}

fn extension_for(content_type: &str) -> String {
    let subtype = content_type.split('/').nth(1).unwrap_or("bin");
    match mime_guess::get_mime_extensions_str(content_type) {
        Some(extensions) if extensions.contains(&subtype) => subtype.to_string(),
        Some(extensions) => extensions
            .first()
            .map(|extension| extension.to_string())
            .unwrap_or_else(|| subtype.to_string()),
        None => subtype.to_string(),
    }
}
