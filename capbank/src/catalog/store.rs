use std::collections::{BTreeSet, HashSet};

use crate::core::CapBankError;

use super::builtin;
use super::package::{compare_packages, normalize_package};
use super::schema::CapacitorPart;

/// Immutable set of catalog parts shared by every request.
///
/// Built once at startup and handed to the service behind an `Arc`; all
/// accessors take `&self`, so concurrent reads need no locking.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    parts: Vec<CapacitorPart>,
    packages: Vec<String>,
}

impl CatalogStore {
    /// Validate and index a list of parts.
    ///
    /// Fails on the first malformed part or on a duplicated identifier.
    pub fn new(parts: Vec<CapacitorPart>) -> Result<Self, CapBankError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(parts.len());

        for part in parts {
            let part = part.normalized();
            part.check().map_err(CapBankError::Catalog)?;
            if !seen.insert(part.id.clone()) {
                return Err(CapBankError::Catalog(format!(
                    "duplicate part identifier {}",
                    part.id
                )));
            }
            normalized.push(part);
        }

        normalized.sort_by(|a, b| a.id.cmp(&b.id));

        let mut packages: Vec<String> = normalized
            .iter()
            .map(|p| p.package.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        packages.sort_by(|a, b| compare_packages(a, b));

        tracing::info!(
            "Catalog loaded: {} parts in {} packages",
            normalized.len(),
            packages.len()
        );

        Ok(Self {
            parts: normalized,
            packages,
        })
    }

    /// The catalog compiled into the library.
    pub fn builtin() -> Result<Self, CapBankError> {
        Self::new(builtin::builtin_parts()?)
    }

    /// Package identifiers present in the catalog, smallest footprint first.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p == package)
    }

    /// Parts whose package is in `allowed`, ordered by identifier.
    pub fn parts<'a, 'b>(
        &'a self,
        allowed: &'b BTreeSet<String>,
    ) -> impl Iterator<Item = &'a CapacitorPart> + 'b
    where
        'a: 'b,
    {
        self.parts
            .iter()
            .filter(move |p| allowed.contains(&p.package))
    }

    pub fn get(&self, id: &str) -> Option<&CapacitorPart> {
        self.parts
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.parts[idx])
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Normalize requested package codes and keep only those the catalog has.
    pub fn intersect_packages<'a, I>(&self, requested: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        requested
            .into_iter()
            .map(|p| normalize_package(p))
            .filter(|p| self.has_package(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: &str, package: &str) -> CapacitorPart {
        CapacitorPart {
            id: id.to_string(),
            manufacturer: None,
            capacitance: 1e-6,
            tolerance_pct: 10.0,
            rated_voltage: 25.0,
            rated_temp: 85.0,
            package: package.to_string(),
            volume_mm3: 1.0,
            esr_ohm: None,
            length_mm: None,
            width_mm: None,
            thickness_mm: None,
        }
    }

    #[test]
    fn test_packages_sorted_by_area() {
        let store = CatalogStore::new(vec![
            part("A", "1206"),
            part("B", "402"),
            part("C", "0603"),
            part("D", "0402"),
        ])
        .unwrap();
        assert_eq!(store.packages(), &["0402", "0603", "1206"]);
    }

    #[test]
    fn test_parts_filtered_by_package() {
        let store = CatalogStore::new(vec![part("A", "0805"), part("B", "0402")]).unwrap();
        let allowed: BTreeSet<String> = ["0805".to_string()].into_iter().collect();
        let ids: Vec<_> = store.parts(&allowed).map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
    }

    #[test]
    fn test_parts_outlive_filter_set() {
        let store = CatalogStore::new(vec![part("A", "0805"), part("B", "0402")]).unwrap();
        let picked: Vec<&CapacitorPart> = {
            let allowed = BTreeSet::from(["0402".to_string()]);
            store.parts(&allowed).collect()
        };
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "B");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = CatalogStore::new(vec![part("A", "0805"), part(" A", "0402")]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_invalid_part_rejected() {
        let mut bad = part("A", "0805");
        bad.capacitance = -1.0;
        assert!(matches!(
            CatalogStore::new(vec![bad]),
            Err(CapBankError::Catalog(_))
        ));
    }

    #[test]
    fn test_get_and_intersect() {
        let store = CatalogStore::new(vec![part("B", "0805"), part("A", "0402")]).unwrap();
        assert_eq!(store.get("B").map(|p| p.package.as_str()), Some("0805"));
        assert!(store.get("Z").is_none());

        let requested = vec!["402".to_string(), "1210".to_string()];
        let allowed = store.intersect_packages(&requested);
        assert_eq!(allowed.into_iter().collect::<Vec<_>>(), vec!["0402"]);
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let store = CatalogStore::builtin().unwrap();
        assert!(!store.is_empty());
        assert!(store.has_package("0805"));
    }
}
