use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::services::probe::AspectRatio;

const RANDOM_NAME_BYTES: usize = 32;

/// Extension for a `type/subtype` media type, `.bin` when the type is malformed.
pub fn media_type_ext(media_type: &str) -> String {
    match media_type.split('/').collect::<Vec<_>>().as_slice() {
        [_, subtype] => format!(".{}", subtype),
        _ => ".bin".to_string(),
    }
}

/// Unguessable relative asset path: 32 random bytes, URL-safe base64, plus the extension.
///
/// No uniqueness check is made against the store.
pub fn asset_path(media_type: &str) -> String {
    let mut random_key = [0u8; RANDOM_NAME_BYTES];
    OsRng.fill_bytes(&mut random_key);
    let random_name = URL_SAFE_NO_PAD.encode(random_key);

    format!("{}{}", random_name, media_type_ext(media_type))
}

/// Object key namespaced by classification: `{landscape|portrait|other}/{random}{ext}`.
pub fn video_key(aspect_ratio: AspectRatio, media_type: &str) -> String {
    format!("{}/{}", aspect_ratio.classification(), asset_path(media_type))
}
