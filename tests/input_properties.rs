//! Property tests for input resolution.

use goatd_usb::error::ErrorKind;
use goatd_usb::orchestrator::phases::{resolve_source_image, resolve_target_device};
use proptest::prelude::*;

const PREFIX: &str = "/dev/disk";

proptest! {
    #[test]
    fn prop_identifier_without_prefix_is_invalid(raw in ".{0,24}") {
        prop_assume!(!raw.trim().starts_with(PREFIX));
        let err = resolve_target_device(&raw, PREFIX).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn prop_whole_disk_and_slice_identifiers_resolve(disk in 0u32..64, slice in proptest::option::of(1u32..8)) {
        let raw = match slice {
            Some(s) => format!("{}{}s{}", PREFIX, disk, s),
            None => format!("{}{}", PREFIX, disk),
        };
        let device = resolve_target_device(&raw, PREFIX).unwrap();
        prop_assert_eq!(device.as_str(), raw.as_str());
    }

    #[test]
    fn prop_surrounding_whitespace_is_ignored(disk in 0u32..64, pad in "[ \t]{0,3}") {
        let raw = format!("{pad}{PREFIX}{disk}{pad}\n");
        let device = resolve_target_device(&raw, PREFIX).unwrap();
        prop_assert_eq!(device.as_str(), format!("{PREFIX}{disk}"));
    }

    #[test]
    fn prop_non_iso_paths_are_invalid_before_existence(name in "[a-zA-Z0-9_]{1,12}", ext in "(img|dmg|wim|iso\\.bak|ISO)") {
        let raw = format!("/goatd-usb-nonexistent/{}.{}", name, ext);
        let err = resolve_source_image(&raw, "iso").unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn prop_missing_iso_is_not_found(name in "[a-zA-Z0-9_]{1,12}") {
        let raw = format!("/goatd-usb-nonexistent/{}.iso", name);
        let err = resolve_source_image(&raw, "iso").unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
