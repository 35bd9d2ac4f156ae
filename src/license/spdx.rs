use crate::models::{CanonicalLicense, LicenseRisk};

/// Fixed registry of canonical licenses: `(SPDX id, full name, risk)`.
///
/// Deprecated bare GPL/LGPL/AGPL identifiers are kept because build tools
/// still emit them.
const REGISTRY: &[(&str, &str, LicenseRisk)] = &[
    // Permissive
    ("MIT", "MIT License", LicenseRisk::Permissive),
    ("MIT-0", "MIT No Attribution", LicenseRisk::Permissive),
    ("Apache-1.1", "Apache License 1.1", LicenseRisk::Permissive),
    ("Apache-2.0", "Apache License 2.0", LicenseRisk::Permissive),
    ("BSD-2-Clause", "BSD 2-Clause \"Simplified\" License", LicenseRisk::Permissive),
    ("BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License", LicenseRisk::Permissive),
    ("BSD-4-Clause", "BSD 4-Clause \"Original\" or \"Old\" License", LicenseRisk::Permissive),
    ("ISC", "ISC License", LicenseRisk::Permissive),
    ("0BSD", "BSD Zero Clause License", LicenseRisk::Permissive),
    ("Unlicense", "The Unlicense", LicenseRisk::Permissive),
    ("Zlib", "zlib License", LicenseRisk::Permissive),
    ("CC0-1.0", "Creative Commons Zero v1.0 Universal", LicenseRisk::Permissive),
    ("CC-BY-3.0", "Creative Commons Attribution 3.0 Unported", LicenseRisk::Permissive),
    ("CC-BY-4.0", "Creative Commons Attribution 4.0 International", LicenseRisk::Permissive),
    ("WTFPL", "Do What The F*ck You Want To Public License", LicenseRisk::Permissive),
    ("PSF-2.0", "Python Software Foundation License 2.0", LicenseRisk::Permissive),
    ("Python-2.0", "Python License 2.0", LicenseRisk::Permissive),
    ("BlueOak-1.0.0", "Blue Oak Model License 1.0.0", LicenseRisk::Permissive),
    ("Artistic-2.0", "Artistic License 2.0", LicenseRisk::Permissive),
    ("BSL-1.0", "Boost Software License 1.0", LicenseRisk::Permissive),
    ("EDL-1.0", "Eclipse Distribution License - v 1.0", LicenseRisk::Permissive),
    // Weak copyleft
    ("LGPL-2.0", "GNU Library General Public License v2", LicenseRisk::WeakCopyleft),
    ("LGPL-2.0-only", "GNU Library General Public License v2 only", LicenseRisk::WeakCopyleft),
    ("LGPL-2.0-or-later", "GNU Library General Public License v2 or later", LicenseRisk::WeakCopyleft),
    ("LGPL-2.1", "GNU Lesser General Public License v2.1", LicenseRisk::WeakCopyleft),
    ("LGPL-2.1-only", "GNU Lesser General Public License v2.1 only", LicenseRisk::WeakCopyleft),
    ("LGPL-2.1-or-later", "GNU Lesser General Public License v2.1 or later", LicenseRisk::WeakCopyleft),
    ("LGPL-3.0", "GNU Lesser General Public License v3.0", LicenseRisk::WeakCopyleft),
    ("LGPL-3.0-only", "GNU Lesser General Public License v3.0 only", LicenseRisk::WeakCopyleft),
    ("LGPL-3.0-or-later", "GNU Lesser General Public License v3.0 or later", LicenseRisk::WeakCopyleft),
    ("MPL-1.1", "Mozilla Public License 1.1", LicenseRisk::WeakCopyleft),
    ("MPL-2.0", "Mozilla Public License 2.0", LicenseRisk::WeakCopyleft),
    ("EUPL-1.2", "European Union Public License 1.2", LicenseRisk::WeakCopyleft),
    ("CDDL-1.0", "Common Development and Distribution License 1.0", LicenseRisk::WeakCopyleft),
    ("CDDL-1.1", "Common Development and Distribution License 1.1", LicenseRisk::WeakCopyleft),
    ("EPL-1.0", "Eclipse Public License 1.0", LicenseRisk::WeakCopyleft),
    ("EPL-2.0", "Eclipse Public License 2.0", LicenseRisk::WeakCopyleft),
    ("APSL-2.0", "Apple Public Source License 2.0", LicenseRisk::WeakCopyleft),
    ("OSL-3.0", "Open Software License 3.0", LicenseRisk::WeakCopyleft),
    // Strong copyleft
    ("GPL-2.0", "GNU General Public License v2.0", LicenseRisk::StrongCopyleft),
    ("GPL-2.0-only", "GNU General Public License v2.0 only", LicenseRisk::StrongCopyleft),
    ("GPL-2.0-or-later", "GNU General Public License v2.0 or later", LicenseRisk::StrongCopyleft),
    ("GPL-3.0", "GNU General Public License v3.0", LicenseRisk::StrongCopyleft),
    ("GPL-3.0-only", "GNU General Public License v3.0 only", LicenseRisk::StrongCopyleft),
    ("GPL-3.0-or-later", "GNU General Public License v3.0 or later", LicenseRisk::StrongCopyleft),
    ("AGPL-3.0", "GNU Affero General Public License v3.0", LicenseRisk::StrongCopyleft),
    ("AGPL-3.0-only", "GNU Affero General Public License v3.0 only", LicenseRisk::StrongCopyleft),
    ("AGPL-3.0-or-later", "GNU Affero General Public License v3.0 or later", LicenseRisk::StrongCopyleft),
    ("EUPL-1.1", "European Union Public License 1.1", LicenseRisk::StrongCopyleft),
];

/// Look up a canonical license by its exact SPDX identifier.
pub fn lookup(id: &str) -> Option<CanonicalLicense> {
    REGISTRY
        .iter()
        .find(|(spdx, _, _)| *spdx == id.trim())
        .map(|&(spdx, name, risk)| canonical(spdx, name, risk))
}

/// Every registered license, in registry order.
pub fn all() -> Vec<CanonicalLicense> {
    REGISTRY
        .iter()
        .map(|&(spdx, name, risk)| canonical(spdx, name, risk))
        .collect()
}

fn canonical(id: &str, name: &str, risk: LicenseRisk) -> CanonicalLicense {
    CanonicalLicense {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("https://spdx.org/licenses/{}.html", id),
        risk,
    }
}
