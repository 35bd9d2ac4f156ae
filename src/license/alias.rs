use std::collections::{BTreeMap, HashMap};

use crate::license::spdx;
use crate::models::CanonicalLicense;

/// License strings commonly found in POMs, package manifests and imported
/// reports, mapped to their SPDX identifier.
const BUNDLED_ALIASES: &[(&str, &str)] = &[
    ("Apache 2", "Apache-2.0"),
    ("Apache 2.0", "Apache-2.0"),
    ("Apache-2", "Apache-2.0"),
    ("ASL 2.0", "Apache-2.0"),
    ("Apache License 2.0", "Apache-2.0"),
    ("Apache License, Version 2.0", "Apache-2.0"),
    ("The Apache License, Version 2.0", "Apache-2.0"),
    ("The Apache Software License, Version 2.0", "Apache-2.0"),
    ("Apache Software License - Version 2.0", "Apache-2.0"),
    ("Apache License Version 2.0", "Apache-2.0"),
    ("MIT License", "MIT"),
    ("The MIT License", "MIT"),
    ("The MIT License (MIT)", "MIT"),
    ("MIT-style", "MIT"),
    ("BSD", "BSD-3-Clause"),
    ("BSD License", "BSD-3-Clause"),
    ("The BSD License", "BSD-3-Clause"),
    ("BSD 3-Clause", "BSD-3-Clause"),
    ("BSD-3-Clause License", "BSD-3-Clause"),
    ("New BSD", "BSD-3-Clause"),
    ("New BSD License", "BSD-3-Clause"),
    ("Modified BSD", "BSD-3-Clause"),
    ("Revised BSD", "BSD-3-Clause"),
    ("BSD 2-Clause", "BSD-2-Clause"),
    ("Simplified BSD", "BSD-2-Clause"),
    ("The BSD 2-Clause License", "BSD-2-Clause"),
    ("GNU GPL v2", "GPL-2.0"),
    ("GNU General Public License v2", "GPL-2.0"),
    ("GNU General Public License, version 2", "GPL-2.0"),
    ("GPL v2", "GPL-2.0"),
    ("GPLv2", "GPL-2.0"),
    ("GNU GPL v3", "GPL-3.0"),
    ("GNU General Public License v3", "GPL-3.0"),
    ("GNU General Public License, version 3", "GPL-3.0"),
    ("GPL v3", "GPL-3.0"),
    ("GPLv3", "GPL-3.0"),
    ("GNU LGPL v2.1", "LGPL-2.1"),
    ("LGPL v2.1", "LGPL-2.1"),
    ("LGPLv2.1", "LGPL-2.1"),
    ("GNU Lesser General Public License, version 2.1", "LGPL-2.1"),
    ("GNU LGPL v3", "LGPL-3.0"),
    ("LGPL v3", "LGPL-3.0"),
    ("LGPLv3", "LGPL-3.0"),
    ("AGPL v3", "AGPL-3.0"),
    ("AGPLv3", "AGPL-3.0"),
    ("GNU AGPL v3", "AGPL-3.0"),
    ("Mozilla Public License 2.0", "MPL-2.0"),
    ("Mozilla Public License, Version 2.0", "MPL-2.0"),
    ("MPL 2.0", "MPL-2.0"),
    ("MPLv2", "MPL-2.0"),
    ("Eclipse Public License - v 1.0", "EPL-1.0"),
    ("Eclipse Public License 1.0", "EPL-1.0"),
    ("EPL 1.0", "EPL-1.0"),
    ("Eclipse Public License - v 2.0", "EPL-2.0"),
    ("Eclipse Public License v2.0", "EPL-2.0"),
    ("EPL 2.0", "EPL-2.0"),
    ("Eclipse Distribution License - v 1.0", "EDL-1.0"),
    ("CDDL 1.0", "CDDL-1.0"),
    ("CDDL 1.1", "CDDL-1.1"),
    ("ISC License", "ISC"),
    ("CC0", "CC0-1.0"),
    ("CC0 1.0 Universal", "CC0-1.0"),
    ("Public Domain", "CC0-1.0"),
];

/// Free-text license string → canonical license.
///
/// Built once per run ([`AliasTable::bundled`] plus configured overrides) and
/// only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    exact: HashMap<String, CanonicalLicense>,
    folded: HashMap<String, CanonicalLicense>,
}

impl AliasTable {
    /// Registry IDs, registry names, and the bundled aliases.
    pub fn bundled() -> Self {
        let mut table = AliasTable::default();
        for license in spdx::all() {
            let name = license.name.clone();
            table.insert(&license.id, license.clone());
            table.insert(&name, license);
        }
        for (alias, id) in BUNDLED_ALIASES {
            if let Some(license) = spdx::lookup(id) {
                table.insert(alias, license);
            }
        }
        table
    }

    /// Apply configured `alias = "SPDX-ID"` overrides on top of this table.
    ///
    /// Returns the rebuilt table and one warning per override whose target is
    /// not a registered license; those overrides are skipped.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> (Self, Vec<String>) {
        let mut rejected = Vec::new();
        for (alias, id) in overrides {
            match spdx::lookup(id) {
                Some(license) => self.insert(alias, license),
                None => rejected.push(format!(
                    "alias '{}' points at unregistered license '{}'; ignored",
                    alias, id
                )),
            }
        }
        (self, rejected)
    }

    /// Exact match first, then a case/whitespace-insensitive fallback.
    pub fn lookup(&self, raw: &str) -> Option<&CanonicalLicense> {
        self.exact.get(raw).or_else(|| self.folded.get(&fold(raw)))
    }

    fn insert(&mut self, alias: &str, license: CanonicalLicense) {
        self.folded.insert(fold(alias), license.clone());
        self.exact.insert(alias.to_string(), license);
    }
}

/// Lowercase and collapse runs of whitespace to a single space.
fn fold(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
