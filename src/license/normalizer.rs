use crate::license::alias::AliasTable;
use crate::models::{Dependency, NormalizedLicense};

/// Map every declared license string of `dep` to canonical licenses.
///
/// Never fails and never drops a string: anything the alias table cannot
/// resolve comes back as [`NormalizedLicense::Unresolved`]. A dependency
/// without license strings yields an empty vector. The same canonical license
/// is reported once even if several strings resolve to it.
pub fn normalize(dep: &Dependency, table: &AliasTable) -> Vec<NormalizedLicense> {
    let mut out: Vec<NormalizedLicense> = Vec::new();
    for raw in &dep.licenses {
        for license in normalize_str(raw, table) {
            if !out.contains(&license) {
                out.push(license);
            }
        }
    }
    out
}

/// Normalize a single raw license string.
///
/// The whole string is tried against the alias table first. Only when that
/// fails and the string looks like an SPDX expression (`OR`, `AND`, `WITH`,
/// or a `/` shorthand) is each operand looked up on its own; `WITH`
/// exceptions are dropped and the base license kept. A split in which no
/// operand resolves is undone and the string kept whole.
pub fn normalize_str(raw: &str, table: &AliasTable) -> Vec<NormalizedLicense> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Some(license) = table.lookup(raw) {
        return vec![NormalizedLicense::Resolved(license.clone())];
    }

    if !is_expression(trimmed) {
        return vec![unresolved(trimmed)];
    }

    let operands: Vec<NormalizedLicense> = split_operands(trimmed)
        .into_iter()
        .map(|operand| match table.lookup(&operand) {
            Some(license) => NormalizedLicense::Resolved(license.clone()),
            None => unresolved(&operand),
        })
        .collect();

    // A split that resolves nothing is just a license name with a slash in it.
    if operands.iter().all(|l| l.canonical().is_none()) {
        return vec![unresolved(trimmed)];
    }
    operands
}

fn unresolved(raw: &str) -> NormalizedLicense {
    NormalizedLicense::Unresolved {
        raw: raw.to_string(),
    }
}

fn is_expression(s: &str) -> bool {
    let has_operator = s
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .any(|word| matches!(word, "OR" | "AND" | "WITH"));
    has_operator || slash_shorthand(s)
}

/// `MIT/GPL-3.0` style alternatives. URLs and `w/` ("with") are text.
fn slash_shorthand(s: &str) -> bool {
    s.contains('/')
        && !s.contains("://")
        && !s
            .split_whitespace()
            .any(|word| word.get(..2).is_some_and(|head| head.eq_ignore_ascii_case("w/")))
}

/// Split an SPDX-style expression into its license operands.
///
/// Operands may contain spaces (`Apache License 2.0 OR MIT`), so words are
/// accumulated until an operator or parenthesis closes the operand.
fn split_operands(expr: &str) -> Vec<String> {
    let spaced = if slash_shorthand(expr) {
        expr.replace('/', " OR ")
    } else {
        expr.to_string()
    };
    let spaced = spaced.replace('(', " ( ").replace(')', " ) ");

    let mut operands = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut skip_exception = false;

    let mut flush = |current: &mut Vec<&str>, skip: &mut bool| {
        if !current.is_empty() {
            if !*skip {
                operands.push(current.join(" "));
            }
            current.clear();
        }
        *skip = false;
    };

    for word in spaced.split_whitespace() {
        match word {
            "AND" | "OR" | "(" | ")" => flush(&mut current, &mut skip_exception),
            "WITH" => {
                flush(&mut current, &mut skip_exception);
                skip_exception = true;
            }
            _ => current.push(word),
        }
    }
    flush(&mut current, &mut skip_exception);

    operands
}
