use anyhow::{bail, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// How many `<parent>` POMs are followed before giving up.
const MAX_PARENT_DEPTH: usize = 5;

/// Maven coordinates of a POM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Coordinates {
    group: String,
    artifact: String,
    version: String,
}

impl Coordinates {
    fn is_complete(&self) -> bool {
        !self.group.is_empty() && !self.artifact.is_empty() && !self.version.is_empty()
    }
}

/// The parts of a POM the license lookup cares about.
#[derive(Debug, Default, PartialEq, Eq)]
struct PomInfo {
    licenses: Vec<String>,
    parent: Option<Coordinates>,
}

/// Fetch the declared licenses for a Maven artifact from Maven Central.
///
/// A POM without `<licenses>` inherits them from its `<parent>`, so the parent
/// chain is walked up to [`MAX_PARENT_DEPTH`] levels. Returns an empty vector
/// when no POM on the chain declares a license or a POM is missing. A POM
/// that fails to parse is an error.
pub async fn fetch_licenses(client: &Client, group: &str, artifact: &str, version: &str) -> Result<Vec<String>> {
    let mut coords = Coordinates {
        group: group.to_string(),
        artifact: artifact.to_string(),
        version: version.to_string(),
    };

    for depth in 0..=MAX_PARENT_DEPTH {
        if !coords.is_complete() {
            break;
        }
        let Some(pom) = fetch_pom(client, &coords).await? else {
            break;
        };
        if !pom.licenses.is_empty() {
            return Ok(pom.licenses);
        }
        match pom.parent {
            Some(parent) if depth < MAX_PARENT_DEPTH => {
                tracing::debug!(
                    parent = %format!("{}:{}:{}", parent.group, parent.artifact, parent.version),
                    "no licenses in POM; trying parent"
                );
                coords = parent;
            }
            _ => break,
        }
    }

    Ok(Vec::new())
}

/// `None` when Maven Central has no POM at these coordinates.
async fn fetch_pom(client: &Client, coords: &Coordinates) -> Result<Option<PomInfo>> {
    let response = client
        .get(pom_url(&coords.group, &coords.artifact, &coords.version))
        .header("User-Agent", concat!("dep-license-report/", env!("CARGO_PKG_VERSION")))
        .send()
        .await?;

    if !response.status().is_success() {
        return Ok(None);
    }

    let pom_xml = response.text().await?;
    parse_pom(&pom_xml).map(Some)
}

fn pom_url(group: &str, artifact: &str, version: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}-{}.pom",
        MAVEN_CENTRAL,
        group.replace('.', "/"),
        artifact,
        version,
        artifact,
        version
    )
}

/// Read `<project><licenses><license><name>` and `<project><parent>` from a POM.
fn parse_pom(xml: &str) -> Result<PomInfo> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut info = PomInfo::default();
    let mut parent = Coordinates::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                path.push(tag);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape()?;
                let text = text.trim();
                if text.is_empty() {
                    buf.clear();
                    continue;
                }
                let path: Vec<&str> = path.iter().map(String::as_str).collect();
                match path.as_slice() {
                    [_, "licenses", "license", "name"] => info.licenses.push(text.to_string()),
                    [_, "parent", "groupId"] => parent.group = text.to_string(),
                    [_, "parent", "artifactId"] => parent.artifact = text.to_string(),
                    [_, "parent", "version"] => parent.version = text.to_string(),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed POM at byte {}: {}", reader.buffer_position(), e),
            _ => {}
        }
        buf.clear();
    }

    if parent.is_complete() {
        info.parent = Some(parent);
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_license_from_pom() {
        let pom = r#"<?xml version="1.0"?>
<project>
  <name>Spring Transaction</name>
  <licenses>
    <license>
      <name>Apache License, Version 2.0</name>
      <url>https://www.apache.org/licenses/LICENSE-2.0</url>
    </license>
  </licenses>
</project>"#;
        assert_eq!(parse_pom(pom).unwrap().licenses, vec!["Apache License, Version 2.0"]);
    }

    #[test]
    fn test_extract_dual_licensed_pom() {
        let pom = r#"<project>
  <licenses>
    <license><name>CDDL 1.1</name></license>
    <license><name>GPL2 w/ CPE</name></license>
  </licenses>
</project>"#;
        assert_eq!(parse_pom(pom).unwrap().licenses, vec!["CDDL 1.1", "GPL2 w/ CPE"]);
    }

    #[test]
    fn test_pom_without_licenses() {
        assert_eq!(parse_pom("<project><name>x</name></project>").unwrap(), PomInfo::default());
    }

    #[test]
    fn test_parent_coordinates() {
        let pom = r#"<project>
  <parent>
    <groupId>org.springframework</groupId>
    <artifactId>spring-framework-bom</artifactId>
    <version>6.1.2</version>
    <relativePath/>
  </parent>
  <artifactId>spring-tx</artifactId>
  <dependencies>
    <dependency><groupId>ignored</groupId><artifactId>x</artifactId><version>1</version></dependency>
  </dependencies>
</project>"#;
        let info = parse_pom(pom).unwrap();
        assert!(info.licenses.is_empty());
        assert_eq!(
            info.parent,
            Some(Coordinates {
                group: "org.springframework".to_string(),
                artifact: "spring-framework-bom".to_string(),
                version: "6.1.2".to_string(),
            })
        );
    }

    #[test]
    fn test_license_names_outside_licenses_are_ignored() {
        let pom = r#"<project>
  <name>Spring Transaction</name>
  <organization><name>VMware</name></organization>
  <licenses><license><name>MIT</name></license></licenses>
</project>"#;
        let info = parse_pom(pom).unwrap();
        assert_eq!(info.licenses, vec!["MIT"]);
        assert_eq!(info.parent, None);
    }

    #[test]
    fn test_incomplete_parent_is_dropped() {
        let pom = "<project><parent><groupId>g</groupId></parent></project>";
        assert_eq!(parse_pom(pom).unwrap().parent, None);
    }

    #[test]
    fn test_malformed_pom_is_an_error() {
        let pom = "<project><licenses><license><name>MIT</licence></licenses></project>";
        assert!(parse_pom(pom).is_err());
    }

    #[test]
    fn test_pom_url() {
        assert_eq!(
            pom_url("com.sun.mail", "javax.mail", "1.5.4"),
            "https://repo1.maven.org/maven2/com/sun/mail/javax.mail/1.5.4/javax.mail-1.5.4.pom"
        );
    }
}
