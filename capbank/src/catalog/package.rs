//! Package code normalization and footprint ordering.

use std::cmp::Ordering;

/// Nominal footprint area (mm²) of the standard EIA chip sizes.
const PACKAGE_AREAS: &[(&str, f64)] = &[
    ("008004", 0.03125),
    ("01005", 0.08),
    ("0201", 0.18),
    ("0204", 0.50),
    ("0402", 0.50),
    ("0306", 1.28),
    ("0603", 1.28),
    ("0508", 2.50),
    ("0805", 2.50),
    ("1111", 7.84),
    ("0612", 5.12),
    ("1206", 5.12),
    ("1210", 8.00),
    ("1808", 9.00),
    ("1812", 14.40),
    ("2211", 15.96),
    ("2220", 28.50),
];

const UNKNOWN_AREA: f64 = 999.0;

/// Trim a package code and left-pad numeric codes to four digits.
///
/// `"402"` becomes `"0402"`; `"01005"` and non-numeric codes are kept as-is.
pub fn normalize_package(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.len() < 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>4}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Footprint area used to order packages; unknown codes sort last.
pub fn package_area(package: &str) -> f64 {
    PACKAGE_AREAS
        .iter()
        .find(|(name, _)| *name == package)
        .map(|(_, area)| *area)
        .unwrap_or(UNKNOWN_AREA)
}

/// Smallest footprint first, then by name.
pub fn compare_packages(a: &str, b: &str) -> Ordering {
    package_area(a)
        .total_cmp(&package_area(b))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_package() {
        assert_eq!(normalize_package(" 402 "), "0402");
        assert_eq!(normalize_package("0805"), "0805");
        assert_eq!(normalize_package("01005"), "01005");
        assert_eq!(normalize_package("CASE-A"), "CASE-A");
        assert_eq!(normalize_package(""), "");
    }

    #[test]
    fn test_package_order() {
        let mut pkgs = vec!["1206", "CUSTOM", "0402", "0201", "0603"];
        pkgs.sort_by(|a, b| compare_packages(a, b));
        assert_eq!(pkgs, vec!["0201", "0402", "0603", "1206", "CUSTOM"]);
    }

    #[test]
    fn test_equal_area_falls_back_to_name() {
        assert_eq!(compare_packages("0204", "0402"), Ordering::Less);
        assert_eq!(compare_packages("0805", "0508"), Ordering::Greater);
    }
}
