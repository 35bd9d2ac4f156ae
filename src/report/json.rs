use std::path::{Path, PathBuf};

use crate::error::RenderError;

use super::{write_artifact, Artifact, Renderer, Report};

/// Serializes the whole [`Report`] for downstream tooling.
pub struct JsonRenderer {
    output: PathBuf,
    pretty: bool,
}

impl JsonRenderer {
    pub fn new(output: &Path, pretty: bool) -> Self {
        JsonRenderer {
            output: output.to_path_buf(),
            pretty,
        }
    }
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, report: &Report) -> Result<Artifact, RenderError> {
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(report)?
        } else {
            serde_json::to_vec(report)?
        };
        bytes.push(b'\n');
        write_artifact(self.name(), &self.output, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;
    use serde_json::Value;
    use tempfile::tempdir;

    fn render(pretty: bool) -> Value {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.json");
        JsonRenderer::new(&output, pretty).render(&sample_report()).unwrap();
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap()
    }

    #[test]
    fn test_report_shape() {
        let json = render(true);
        assert_eq!(json["metadata"]["project"], "Backend");
        assert_eq!(json["summary"]["violations"], 1);
        assert_eq!(json["sections"][0]["scope"], "runtimeClasspath");

        let first = &json["sections"][0]["verdicts"][0];
        assert_eq!(first["dependency"]["name"], "foo");
        assert_eq!(first["dependency"]["origin"], "local");
        assert_eq!(first["outcome"], "allowed");
        assert_eq!(first["licenses"][0]["status"], "resolved");
        assert_eq!(first["licenses"][0]["id"], "MIT");
    }

    #[test]
    fn test_violation_carries_license_and_reason() {
        let json = render(false);
        let gpl = &json["sections"][1]["verdicts"][0];
        assert_eq!(gpl["outcome"], "violation");
        assert_eq!(gpl["license"], "GPL-3.0");
        assert!(gpl["reason"].as_str().unwrap().contains("GPL-3.0"));
    }

    #[test]
    fn test_compact_output_is_single_line() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.json");
        JsonRenderer::new(&output, false).render(&sample_report()).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.trim_end().lines().count(), 1);
    }
}
