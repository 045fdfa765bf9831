/// Gallery ids used by the CLI, the registry files and the adapter factory.
pub const INSA_ART: &str = "insa_art";
pub const GALLERY_MEME: &str = "gallery_meme";
pub const RO_GALLERY: &str = "ro_gallery";
pub const SEOUL_NOIN: &str = "seoul_noin";
pub const INSA1010: &str = "insa1010";
pub const GALLERY_EUN: &str = "gallery_eun";

// Display names as stored in the `gallery_name` column
pub const INSA_ART_NAME: &str = "인사아트센터";
pub const GALLERY_MEME_NAME: &str = "갤러리밈";
pub const RO_GALLERY_NAME: &str = "노화랑";
pub const SEOUL_NOIN_NAME: &str = "서울노인복지센터 탑골미술관";
pub const INSA1010_NAME: &str = "인사1010";
pub const GALLERY_EUN_NAME: &str = "갤러리은";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Get all supported gallery ids
pub fn get_supported_galleries() -> Vec<&'static str> {
    vec![INSA_ART, GALLERY_MEME, RO_GALLERY, SEOUL_NOIN, INSA1010, GALLERY_EUN]
}

/// Display name for a gallery id, if known
pub fn gallery_display_name(gallery_id: &str) -> Option<&'static str> {
    match gallery_id {
        INSA_ART => Some(INSA_ART_NAME),
        GALLERY_MEME => Some(GALLERY_MEME_NAME),
        RO_GALLERY => Some(RO_GALLERY_NAME),
        SEOUL_NOIN => Some(SEOUL_NOIN_NAME),
        INSA1010 => Some(INSA1010_NAME),
        GALLERY_EUN => Some(GALLERY_EUN_NAME),
        _ => None,
    }
}
