//! Runtime support files shared by every generated stub

use serde::Serialize;
use std::path::PathBuf;

use super::config::{GeneratorOptions, ServiceFlavor};
use super::renderer::StubRenderer;
use super::{Artifact, ArtifactKind, GenerationError};

/// Directory below the output root that holds the support files
pub const SUPPORT_DIR: &str = "support";

const DIRECT_SERVICE: &str = "support/QueryService.direct.ts";
const NETWORK_SERVICE: &str = "support/QueryService.network.ts";

/// (template, output path below the output root)
const SHARED_FILES: [(&str, &str); 3] = [
    ("support/ResponseType.ts", "support/ResponseType.ts"),
    (
        "support/ResponseValueConverter.ts",
        "support/ResponseValueConverter.ts",
    ),
    ("support/bridge.d.ts", "support/types/bridge.d.ts"),
];

#[derive(Serialize)]
struct SupportContext<'a> {
    backend_uri: &'a str,
}

/// Renders the support files for the configured stub flavor
pub fn support_artifacts(
    renderer: &StubRenderer,
    options: &GeneratorOptions,
) -> Result<Vec<Artifact>, GenerationError> {
    let service_template = match options.flavor {
        ServiceFlavor::Query => DIRECT_SERVICE,
        ServiceFlavor::Network { .. } => NETWORK_SERVICE,
    };
    let context = SupportContext {
        backend_uri: options.flavor.backend_uri().unwrap_or_default(),
    };

    let files = std::iter::once((service_template, "support/QueryService.ts")).chain(SHARED_FILES);

    files
        .map(|(template, output)| {
            Ok(Artifact {
                path: PathBuf::from(output),
                content: renderer.render(template, &context)?,
                kind: ArtifactKind::Support,
                source: template.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::config::StubStyle;
    use crate::infrastructure::templates::EmbeddedTemplateSource;
    use url::Url;

    fn renderer() -> StubRenderer {
        StubRenderer::new(&EmbeddedTemplateSource::new()).unwrap()
    }

    fn paths(artifacts: &[Artifact]) -> Vec<String> {
        artifacts
            .iter()
            .map(|a| a.path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_direct_query_support_files() {
        let artifacts = support_artifacts(&renderer(), &GeneratorOptions::query("out")).unwrap();

        assert_eq!(
            paths(&artifacts),
            [
                "support/QueryService.ts",
                "support/ResponseType.ts",
                "support/ResponseValueConverter.ts",
                "support/types/bridge.d.ts",
            ]
        );
        assert!(artifacts.iter().all(|a| a.kind == ArtifactKind::Support));
        assert!(artifacts[0].content.contains("window.hostQuery"));
        assert!(artifacts[0].content.contains("JSON.stringify({ route, payload })"));
        assert!(!artifacts[0].content.contains("fetch("));
    }

    #[test]
    fn test_network_support_files_embed_backend() {
        let options = GeneratorOptions {
            output_path: "out".into(),
            flavor: ServiceFlavor::Network {
                backend_uri: Url::parse("http://example.com:9000/api").unwrap(),
            },
            style: StubStyle::Route,
        };
        let artifacts = support_artifacts(&renderer(), &options).unwrap();

        let service = &artifacts[0].content;
        assert!(service.contains("'http://example.com:9000/api'"));
        assert!(service.contains("fetch("));
        assert!(service.contains("`${BACKEND_URI}/query`"));
        assert!(service.contains("`${BACKEND_URI}/invoke`"));
        assert!(!service.contains("backend_uri"));
        assert_eq!(artifacts.len(), 4);
    }
}
