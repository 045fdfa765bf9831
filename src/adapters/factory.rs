use super::gallery_eun::GalleryEunAdapter;
use super::gallery_meme::GalleryMemeAdapter;
use super::insa1010::Insa1010Adapter;
use super::insa_art::InsaArtAdapter;
use super::ro_gallery::RoGalleryAdapter;
use super::seoul_noin::SeoulNoinAdapter;
use super::GalleryAdapter;
use crate::constants::*;

/// Adapter for a gallery id, if one exists
pub fn create_adapter(gallery_id: &str) -> Option<Box<dyn GalleryAdapter>> {
    match gallery_id {
        INSA_ART => Some(Box::new(InsaArtAdapter::new())),
        GALLERY_MEME => Some(Box::new(GalleryMemeAdapter::new())),
        RO_GALLERY => Some(Box::new(RoGalleryAdapter::new())),
        SEOUL_NOIN => Some(Box::new(SeoulNoinAdapter::new())),
        INSA1010 => Some(Box::new(Insa1010Adapter::new())),
        GALLERY_EUN => Some(Box::new(GalleryEunAdapter::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_gallery_has_an_adapter() {
        for id in get_supported_galleries() {
            let adapter = create_adapter(id).expect("adapter");
            assert_eq!(adapter.gallery_id(), id);
        }
        assert!(create_adapter("unknown").is_none());
    }
}
