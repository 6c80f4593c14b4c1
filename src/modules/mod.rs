// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

pub mod cursor;
pub mod database;
pub mod error;
pub mod folder;
pub mod ingest;
pub mod logger;
pub mod mapper;
pub mod message;
pub mod settings;
pub mod smtp;
pub mod utils;
