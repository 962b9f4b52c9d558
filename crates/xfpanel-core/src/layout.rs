//! Entry height computation for the panel grid.

use crate::config::PanelConfig;

/// Fixed padding added to every auto-sized entry, in pixels.
pub const ENTRY_PADDING: u32 = 15;

/// Height in pixels of one entry.
///
/// With auto-resize off, this is the configured fixed height. Otherwise the
/// height is summed from the rows that will be shown and then clamped so the
/// large failure count, the icons and the timestamp block always fit.
pub fn compute_entry_height(config: &PanelConfig) -> u32 {
    let layout = &config.layout;
    if !layout.auto_resize {
        return layout.fixed_height;
    }

    let claims = &config.claims;
    let mut height = layout.job_font_size.saturating_add(layout.info_font_size);

    if claims.show_claim_info {
        let mut claim_rows = layout.claim_font_size;
        if claims.show_unstable_claim_info {
            claim_rows = claim_rows.saturating_mul(2);
        }
        if claims.replace_responsibles {
            claim_rows = claim_rows.saturating_sub(layout.info_font_size);
        }
        height = height.saturating_add(claim_rows);
    } else if config.show_responsibles() {
        height = height.saturating_add(layout.info_font_size);
    }

    if config.show_timestamp {
        height = height.saturating_add(layout.info_font_size);
    }

    height = height.max(layout.fail_font_size.max(layout.job_font_size));

    if config.show_warning_icon || claims.show_claim_info {
        height = height.max(layout.image_size);
    }

    if config.show_zero_test_counts && config.show_timestamp {
        let block = layout
            .job_font_size
            .saturating_add(layout.info_font_size.saturating_mul(3));
        height = height.max(block);
    }

    height.saturating_add(ENTRY_PADDING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlamePolicy, LayoutConfig};

    fn auto_config() -> PanelConfig {
        PanelConfig {
            show_zero_test_counts: false,
            blame: BlamePolicy::NotAtAll,
            layout: LayoutConfig {
                auto_resize: true,
                fixed_height: 999,
                job_font_size: 40,
                info_font_size: 10,
                fail_font_size: 20,
                claim_font_size: 12,
                image_size: 30,
            },
            ..PanelConfig::default()
        }
    }

    #[test]
    fn test_fixed_height_when_auto_resize_off() {
        let mut config = auto_config();
        config.layout.auto_resize = false;
        assert_eq!(compute_entry_height(&config), 999);
    }

    #[test]
    fn test_base_height() {
        // 40 + 10, above max(20, 40), plus padding.
        assert_eq!(compute_entry_height(&auto_config()), 65);
    }

    #[test]
    fn test_responsibles_row() {
        let mut config = auto_config();
        config.blame = BlamePolicy::EveryInvolved;
        assert_eq!(compute_entry_height(&config), 75);
    }

    #[test]
    fn test_claim_rows() {
        let mut config = auto_config();
        config.blame = BlamePolicy::EveryInvolved;
        config.claims.show_claim_info = true;
        assert_eq!(compute_entry_height(&config), 40 + 10 + 12 + 15);

        config.claims.show_unstable_claim_info = true;
        assert_eq!(compute_entry_height(&config), 40 + 10 + 24 + 15);

        config.claims.replace_responsibles = true;
        assert_eq!(compute_entry_height(&config), 40 + 10 + 14 + 15);
    }

    #[test]
    fn test_clamped_to_fail_font() {
        let mut config = auto_config();
        config.layout.fail_font_size = 120;
        assert_eq!(compute_entry_height(&config), 135);
    }

    #[test]
    fn test_clamped_to_icon() {
        let mut config = auto_config();
        config.layout.image_size = 90;
        config.show_warning_icon = true;
        assert_eq!(compute_entry_height(&config), 105);
    }

    #[test]
    fn test_oversized_fonts_saturate() {
        let mut config = auto_config();
        config.show_timestamp = true;
        config.show_zero_test_counts = true;
        config.layout.job_font_size = 80;
        config.layout.info_font_size = 1_500_000_000;
        assert!(config.validate().is_err());
        assert_eq!(compute_entry_height(&config), u32::MAX);
    }

    #[test]
    fn test_zero_counts_with_timestamp() {
        let mut config = auto_config();
        config.show_timestamp = true;
        config.show_zero_test_counts = true;
        // 40 + 10 + 10 = 60, clamped to 40 + 3 * 10 = 70.
        assert_eq!(compute_entry_height(&config), 85);
    }
}
