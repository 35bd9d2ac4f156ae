use crate::models::{LicenseRisk, NormalizedLicense};

/// Overall risk of a dependency's normalized licenses.
///
/// Candidates combine conservatively (every option must be honoured), so the
/// most restrictive risk wins. Unresolved strings mentioning "proprietary" or
/// "commercial" count as [`LicenseRisk::Proprietary`]; other unresolved
/// strings and an empty list are [`LicenseRisk::Unknown`].
pub fn classify(licenses: &[NormalizedLicense]) -> LicenseRisk {
    let risks: Vec<LicenseRisk> = licenses.iter().map(classify_single).collect();
    most_restrictive(&risks)
}

fn classify_single(license: &NormalizedLicense) -> LicenseRisk {
    match license {
        NormalizedLicense::Resolved(canonical) => canonical.risk,
        NormalizedLicense::Unresolved { raw } => {
            let lower = raw.to_lowercase();
            if lower.contains("proprietary") || lower.contains("commercial") {
                LicenseRisk::Proprietary
            } else {
                LicenseRisk::Unknown
            }
        }
    }
}

fn most_restrictive(risks: &[LicenseRisk]) -> LicenseRisk {
    if risks.contains(&LicenseRisk::Proprietary) {
        return LicenseRisk::Proprietary;
    }
    if risks.contains(&LicenseRisk::StrongCopyleft) {
        return LicenseRisk::StrongCopyleft;
    }
    if risks.contains(&LicenseRisk::WeakCopyleft) {
        return LicenseRisk::WeakCopyleft;
    }
    if risks.contains(&LicenseRisk::Unknown) || risks.is_empty() {
        return LicenseRisk::Unknown;
    }
    LicenseRisk::Permissive
}
