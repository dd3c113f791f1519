#![no_main]

//! Fuzz target for upload naming.
//!
//! Client-supplied file names end up as paths on disk, so the sanitized name
//! must never escape the upload directory whatever bytes arrive.

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use civicone::upload::{public_path, sanitize_file_name, upload_file_name};

#[derive(Arbitrary, Debug)]
struct UploadNameInput {
    /// Original file name as sent in the multipart part
    file_name: String,
    /// Milliseconds since the epoch when the upload arrived
    millis: u32,
    /// Collision counter
    attempt: u8,
}

fuzz_target!(|input: UploadNameInput| {
    let clean = sanitize_file_name(&input.file_name);
    assert!(!clean.is_empty());
    assert!(!clean.starts_with('.'));
    assert!(!clean.contains('/') && !clean.contains('\\'));

    let at = match Utc.timestamp_millis_opt(i64::from(input.millis)).single() {
        Some(at) => at,
        None => return,
    };
    let name = upload_file_name(at, &input.file_name, u32::from(input.attempt));
    assert!(name.ends_with(&clean));
    assert!(name.starts_with(&input.millis.to_string()));

    let path = public_path(&name);
    assert_eq!(path.matches('/').count(), 2);
});
