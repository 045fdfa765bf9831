#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use gallery_scraper::fetcher::{Fetchers, FixtureFetcher};
    use gallery_scraper::pipeline::Pipeline;
    use gallery_scraper::registry::GalleryRegistry;
    use gallery_scraper::storage::InMemoryStore;
    use gallery_scraper::types::ListingEntry;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    fn registry() -> GalleryRegistry {
        GalleryRegistry::load_from_directory(root().join("registry/galleries")).unwrap()
    }

    fn pipeline() -> Pipeline {
        let fixtures = FixtureFetcher::from_dir(root().join("tests/fixtures")).unwrap();
        Pipeline::new(
            Fetchers::single(Arc::new(fixtures)),
            Arc::new(InMemoryStore::new()),
        )
    }

    async fn collect(gallery_id: &str) -> Vec<ListingEntry> {
        let registry = registry();
        let gallery = registry.get(gallery_id).unwrap();
        pipeline().collect_entries(gallery).await.unwrap().entries
    }

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn registry_covers_every_adapter() {
        let registry = registry();
        for id in gallery_scraper::constants::get_supported_galleries() {
            let gallery = registry.get(id).unwrap();
            assert_eq!(
                Some(gallery.name.as_str()),
                gallery_scraper::constants::gallery_display_name(id)
            );
        }
    }

    #[tokio::test]
    async fn fixture_output_is_deterministic_for_every_gallery() {
        let registry = registry();
        for gallery in registry.all() {
            let first = pipeline().collect_entries(gallery).await.unwrap();
            let second = pipeline().collect_entries(gallery).await.unwrap();
            assert!(!first.entries.is_empty(), "{} produced no entries", gallery.gallery_id);
            assert_eq!(first.entries, second.entries, "{} is not deterministic", gallery.gallery_id);
        }
    }

    #[tokio::test]
    async fn insa_art_keeps_list_data_when_detail_is_missing() {
        let registry = registry();
        let gallery = registry.get("insa_art").unwrap();
        let collected = pipeline().collect_entries(gallery).await.unwrap();

        // The repeated card is dropped
        assert_eq!(collected.entries.len(), 2);
        assert_eq!(collected.detail_errors.len(), 1);

        let first = &collected.entries[0];
        assert_eq!(first.title, "김철수 개인전: 빛의 정원");
        assert_eq!(first.start_date, ymd(2025, 11, 26));
        assert_eq!(first.end_date, ymd(2025, 12, 15));
        assert_eq!(first.location.as_deref(), Some("1층 A관"));
        assert_eq!(first.artists, vec!["김철수", "이영희"]);
        assert_eq!(
            first.raw_description,
            "빛과 그림자를 탐구해 온 김철수의 신작 20여 점을 소개합니다.\n작가는 정원의 하루를 색면으로 기록합니다."
        );
        assert_eq!(
            first.image_urls,
            vec![
                "https://www.insaartcenter.com/data/file/exhibition_current/101_a.jpg",
                "https://www.insaartcenter.com/data/file/exhibition_current/101_b.jpg",
            ]
        );
        assert_eq!(first.open_time, NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(first.close_time, NaiveTime::from_hms_opt(19, 0, 0));

        let second = &collected.entries[1];
        assert_eq!(
            second.source_url,
            "https://www.insaartcenter.com/bbs/board.php?bo_table=exhibition_current&wr_id=102"
        );
        assert_eq!(second.title, "봄의 소리");
        assert_eq!(second.start_date, ymd(2025, 12, 3));
        assert_eq!(second.end_date, ymd(2025, 12, 8));
        assert!(second.raw_description.is_empty());
    }

    #[tokio::test]
    async fn gallery_meme_detail_replaces_artists_and_cuts_cv() {
        let entries = collect("gallery_meme").await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.source_url, "http://www.gallerymeme.com/web/exbView.html?idx=55");
        assert_eq!(entry.title, "숲의 기억");
        assert_eq!(entry.artists, vec!["박민수", "정하늘"]);
        assert_eq!(entry.location.as_deref(), Some("갤러리밈 3층"));
        assert_eq!(entry.end_date, ymd(2025, 12, 21));
        assert_eq!(
            entry.raw_description,
            "숲을 걸으며 수집한 기억의 조각들.\n두 작가는 같은 숲을 서로 다른 계절에 기록했다."
        );
        assert_eq!(
            entry.image_urls,
            vec![
                "http://www.gallerymeme.com/upload/exb/55_thumb.jpg",
                "http://www.gallerymeme.com/upload/exb/55_1.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn ro_gallery_uses_longest_text_block() {
        let entries = collect("ro_gallery").await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title, "이지원");
        assert_eq!(entry.artists, vec!["이지원"]);
        assert_eq!(entry.start_date, ymd(2025, 11, 12));
        assert_eq!(entry.end_date, ymd(2025, 12, 2));
        assert!(entry.raw_description.starts_with("이지원 작가는 일상의 풍경을"));
        assert!(entry.raw_description.ends_with("15점을 선보인다."));
        assert_eq!(entry.image_urls[0], "https://rhogallery.com/wp-content/uploads/2025/11/lee1.jpg");
        assert_eq!(entry.location.as_deref(), Some("서울 종로구 인사동길 54 노화랑"));
    }

    #[tokio::test]
    async fn seoul_noin_reads_the_single_page() {
        let entries = collect("seoul_noin").await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.source_url, "https://seoulnoin.or.kr/senior/space2.asp#2025-12-01");
        assert_eq!(entry.title, "탑골 사진전 「기억의 골목」");
        assert_eq!(entry.start_date, ymd(2025, 12, 1));
        assert_eq!(entry.end_date, ymd(2025, 12, 31));
        assert_eq!(
            entry.raw_description,
            "골목의 오래된 풍경을 담은 사진 40점.\n\n어르신 작가들의 시선으로 본 종로."
        );
        assert_eq!(entry.image_urls, vec!["https://seoulnoin.or.kr/upload/exhibit/2025_12.jpg"]);
    }

    #[tokio::test]
    async fn insa1010_collects_text_for_extraction() {
        let entries = collect("insa1010").await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.source_url, "https://www.insa1010.com/28/?bmode=view&idx=4001");
        assert_eq!(entry.title, "겨울 정원");
        assert_eq!(entry.artists, vec!["한지민"]);
        assert!(entry.raw_description.contains("2025.12.10 ~ 2026.01.10"));
        assert_eq!(entry.end_date, None);
        assert_eq!(entry.image_urls, vec!["https://cdn.imweb.me/upload/S2025/winter1.jpg"]);
        assert_eq!(entry.open_time, NaiveTime::from_hms_opt(11, 0, 0));
    }

    #[tokio::test]
    async fn gallery_eun_skips_cloned_slides() {
        let entries = collect("gallery_eun").await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(
            entry.source_url,
            "https://galleryeun.com/index.php?module=Board&action=SiteBoard&sMode=VIEW_FORM&iBrdContNo=120"
        );
        assert_eq!(entry.title, "김명주 개인전");
        assert_eq!(entry.start_date, ymd(2025, 11, 26));
        assert_eq!(entry.end_date, ymd(2025, 12, 15));
        assert_eq!(entry.artists, vec!["김명주", "이수진"]);
        assert_eq!(
            entry.raw_description,
            "김명주 개인전\n책가도를 통해 사유의 공간을 펼칩니다."
        );
        assert_eq!(entry.location.as_deref(), Some("서울 종로구 인사동길 45-1 2층"));
        assert_eq!(
            entry.image_urls,
            vec![
                "https://galleryeun.com/data/board/120_main.jpg",
                "https://galleryeun.com/data/board/120_w1.jpg",
            ]
        );
        assert_eq!(entry.open_time, NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(entry.close_time, NaiveTime::from_hms_opt(18, 30, 0));
    }
}
