use std::time::Duration;
use yomu::config::{DEFAULT_MAX_SEGMENT_HEIGHT, ReaderConfigBuilder};
use yomu::prelude::*;
use yomu::reader::{PLACEHOLDER_HEIGHT, plan, try_plan};

#[cfg(test)]
mod tests {
    use super::*;

    fn heights(plan: &SegmentPlan) -> Vec<f64> {
        plan.segments().iter().map(|s| s.height).collect()
    }

    #[test]
    fn test_short_page_is_single_fit_segment() {
        let plan = plan(900.0, 2048.0);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.segments()[0].offset_y, 0.0);
        assert_eq!(plan.segments()[0].height, 900.0);
        assert_eq!(plan.mode(), RenderMode::Fit);
    }

    #[test]
    fn test_page_at_limit_is_not_split() {
        let plan = plan(2048.0, 2048.0);
        assert_eq!(heights(&plan), vec![2048.0]);
    }

    #[test]
    fn test_tall_strip_is_split_with_remainder_last() {
        let plan = plan(6100.0, 2048.0);

        assert_eq!(heights(&plan), vec![2048.0, 2048.0, 2004.0]);
        let offsets: Vec<f64> = plan.segments().iter().map(|s| s.offset_y).collect();
        assert_eq!(offsets, vec![0.0, -2048.0, -4096.0]);
        assert_eq!(plan.mode(), RenderMode::Crop);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let plan = plan(4096.0, 2048.0);
        assert_eq!(heights(&plan), vec![2048.0, 2048.0]);
    }

    #[test]
    fn test_segments_cover_display_height_without_gaps() {
        for display in [1.0, 2047.5, 2048.5, 5000.25, 12_345.0, 40_000.0] {
            let plan = plan(display, 2048.0);
            let mut top = 0.0;
            for segment in &plan {
                assert_eq!(segment.offset_y, -top);
                assert!(segment.height > 0.0);
                assert!(segment.height <= 2048.0);
                top += segment.height;
            }
            assert!((top - display).abs() < 1e-9, "{display}: covered {top}");
        }
    }

    #[test]
    fn test_render_instructions_carry_full_image_height() {
        let plan = plan(5000.0, 2048.0);
        let instructions = plan.render_instructions();

        assert_eq!(instructions.len(), 3);
        assert!(instructions.iter().all(|i| i.image_height == 5000.0));
        assert!(instructions.iter().all(|i| i.mode == RenderMode::Crop));
        assert_eq!(instructions[2].segment.height, 904.0);
    }

    #[test]
    fn test_try_plan_rejects_bad_heights() {
        assert!(matches!(try_plan(0.0, 2048.0), Err(Error::InvalidInput(_))));
        assert!(matches!(try_plan(100.0, -1.0), Err(Error::InvalidInput(_))));
        assert!(matches!(try_plan(f64::NAN, 2048.0), Err(Error::InvalidInput(_))));
        assert!(try_plan(100.0, 2048.0).is_ok());
    }

    #[test]
    fn test_resolved_aspect_fallback() {
        assert_eq!(ResolvedAspect::FALLBACK.ratio(), 1.0);
        assert!(!ResolvedAspect::FALLBACK.is_measured());
        assert_eq!(PLACEHOLDER_HEIGHT, 300.0);
    }

    #[test]
    fn test_reader_config_builder() {
        let config = ReaderConfigBuilder::default()
            .max_segment_height(1024.0)
            .build()
            .unwrap();

        assert_eq!(config.max_segment_height, 1024.0);
        assert_eq!(config.metrics_timeout, Some(Duration::from_secs(15)));
        assert_eq!(ReaderConfig::default().max_segment_height, DEFAULT_MAX_SEGMENT_HEIGHT);
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [catalog]
            base_url = "http://localhost:8080"

            [network]
            rate_limit_ms = 0
            max_retries = 1

            [reader]
            max_segment_height = 4096.0
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog.base_url, "http://localhost:8080");
        assert_eq!(config.network.rate_limit_ms, 0);
        assert_eq!(config.network.max_retries, 1);
        assert_eq!(config.network.timeout_secs, 30);
        assert_eq!(config.reader.max_segment_height, 4096.0);
    }

    #[test]
    fn test_catalog_endpoints() {
        let catalog = HttpCatalog::new("http://localhost:8080/").unwrap();
        assert_eq!(catalog.base_url(), "http://localhost:8080");
        assert_eq!(
            catalog.endpoint(&["search"], &[("q", "tower of god".to_string())]),
            "http://localhost:8080/api/search?q=tower%20of%20god"
        );
        assert!(HttpCatalog::new("not a url").is_err());
    }

    #[test]
    fn test_browse_kind_parsing() {
        assert_eq!("Manhwa".parse::<BrowseKind>().unwrap(), BrowseKind::Manhwa);
        assert_eq!(BrowseKind::default(), BrowseKind::Manga);
        assert!("webtoon".parse::<BrowseKind>().is_err());
    }

    #[test]
    fn test_preferences_patch_merges() {
        let mut prefs = UserPreferences::default();
        let patch = PreferencesPatch {
            auto_scroll: Some(true),
            notifications: Some(false),
            brightness: Some(1.7),
            ..Default::default()
        };
        patch.apply_to(&mut prefs);

        assert!(prefs.auto_scroll);
        assert!(!prefs.notifications);
        assert_eq!(prefs.brightness, 1.0);
        assert!(prefs.page_sound);
    }
}
