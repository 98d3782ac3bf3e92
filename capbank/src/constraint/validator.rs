use crate::catalog::CatalogStore;

use super::{Constraint, ConnectionType, ConstraintError, OptimizeRequest};

/// Request well-formedness checks run before any search.
pub struct ConstraintValidator;

impl ConstraintValidator {
    /// Turn a raw request into a [`Constraint`], or report the first problem.
    pub fn validate(
        request: &OptimizeRequest,
        catalog: &CatalogStore,
    ) -> Result<Constraint, ConstraintError> {
        Self::check_finite(request)?;

        if request.target_cap <= 0.0 {
            return Err(ConstraintError::NonPositiveTarget(request.target_cap));
        }
        if request.tolerance <= 0.0 {
            return Err(ConstraintError::NonPositiveTolerance(request.tolerance));
        }
        if request.max_count < 1 {
            return Err(ConstraintError::MaxCountTooSmall(request.max_count));
        }
        let max_count = u32::try_from(request.max_count)
            .map_err(|_| ConstraintError::MaxCountTooLarge(request.max_count))?;

        let conn_type = ConnectionType::try_from(request.conn_type)?;

        if !(0.0..1.0).contains(&request.dc_bias) {
            return Err(ConstraintError::DcBiasOutOfRange(request.dc_bias));
        }

        if let Some(esr) = request.max_esr {
            if esr <= 0.0 {
                return Err(ConstraintError::NonPositiveEsr(esr));
            }
        }

        let packages = catalog.intersect_packages(&request.packages);
        if packages.is_empty() {
            return Err(ConstraintError::NoUsablePackages);
        }

        Ok(Constraint {
            target_cap: request.target_cap,
            tolerance: request.tolerance,
            dc_bias: request.dc_bias,
            max_count,
            min_rated_volt: request.min_rated_volt,
            min_temp: request.min_temp,
            conn_type,
            packages,
            max_esr: request.max_esr,
        })
    }

    fn check_finite(request: &OptimizeRequest) -> Result<(), ConstraintError> {
        let fields = [
            ("target_cap", request.target_cap),
            ("tolerance", request.tolerance),
            ("dc_bias", request.dc_bias),
            ("min_rated_volt", request.min_rated_volt),
            ("min_temp", request.min_temp),
            ("max_esr", request.max_esr.unwrap_or(1.0)),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, _)) => Err(ConstraintError::NotFinite(*name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CapacitorPart;

    fn catalog() -> CatalogStore {
        CatalogStore::new(vec![CapacitorPart {
            id: "P1".to_string(),
            manufacturer: None,
            capacitance: 1e-6,
            tolerance_pct: 10.0,
            rated_voltage: 50.0,
            rated_temp: 105.0,
            package: "0805".to_string(),
            volume_mm3: 3.125,
            esr_ohm: None,
            length_mm: None,
            width_mm: None,
            thickness_mm: None,
        }])
        .unwrap()
    }

    fn request() -> OptimizeRequest {
        OptimizeRequest {
            target_cap: 1e-6,
            tolerance: 0.1,
            dc_bias: 0.0,
            max_count: 3,
            min_rated_volt: 25.0,
            min_temp: 85.0,
            conn_type: 0,
            packages: vec!["0805".to_string()],
            max_esr: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let c = ConstraintValidator::validate(&request(), &catalog()).unwrap();
        assert_eq!(c.conn_type, ConnectionType::Any);
        assert_eq!(c.max_count, 3);
        assert!(c.packages.contains("0805"));
        let (lo, hi) = c.window();
        assert!((lo - 0.9e-6).abs() < 1e-15 && (hi - 1.1e-6).abs() < 1e-15);
    }

    fn rejected(mutate: impl Fn(&mut OptimizeRequest)) -> ConstraintError {
        let mut req = request();
        mutate(&mut req);
        ConstraintValidator::validate(&req, &catalog()).unwrap_err()
    }

    #[test]
    fn test_rejections() {
        assert_eq!(rejected(|r| r.target_cap = 0.0), ConstraintError::NonPositiveTarget(0.0));
        assert_eq!(rejected(|r| r.tolerance = -0.1), ConstraintError::NonPositiveTolerance(-0.1));
        assert_eq!(rejected(|r| r.max_count = 0), ConstraintError::MaxCountTooSmall(0));
        assert_eq!(
            rejected(|r| r.max_count = i64::MAX),
            ConstraintError::MaxCountTooLarge(i64::MAX)
        );
        assert_eq!(rejected(|r| r.conn_type = 7), ConstraintError::UnknownConnectionType(7));
        assert_eq!(rejected(|r| r.dc_bias = 1.0), ConstraintError::DcBiasOutOfRange(1.0));
        assert_eq!(rejected(|r| r.dc_bias = -0.2), ConstraintError::DcBiasOutOfRange(-0.2));
        assert_eq!(rejected(|r| r.max_esr = Some(0.0)), ConstraintError::NonPositiveEsr(0.0));
        assert_eq!(
            rejected(|r| r.packages = vec!["1210".to_string()]),
            ConstraintError::NoUsablePackages
        );
        assert_eq!(rejected(|r| r.packages.clear()), ConstraintError::NoUsablePackages);
        assert_eq!(
            rejected(|r| r.target_cap = f64::NAN),
            ConstraintError::NotFinite("target_cap")
        );
    }

    #[test]
    fn test_packages_are_normalized() {
        let mut req = request();
        req.packages = vec![" 805".to_string(), "9999".to_string()];
        let c = ConstraintValidator::validate(&req, &catalog()).unwrap();
        assert_eq!(c.packages.len(), 1);
        assert!(c.packages.contains("0805"));
    }
}
