//! Generation orchestration - coordinates one stub generation run

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::config::GeneratorOptions;
use super::renderer::StubRenderer;
use super::scanner::ModelScanner;
use super::support::support_artifacts;
use super::{Artifact, ArtifactWriter, Diagnostic, GenerationError, GenerationReport, TemplateSource};
use crate::core::descriptors::{HandlerGroupDescriptor, HandlerManifest, OperationDescriptor};
use crate::routing::route::{RoutePattern, build_route};

/// Turns a handler manifest into TypeScript stubs
pub struct StubGenerator {
    templates: Arc<dyn TemplateSource>,
    writer: Arc<dyn ArtifactWriter>,
}

impl StubGenerator {
    pub fn new(templates: Arc<dyn TemplateSource>, writer: Arc<dyn ArtifactWriter>) -> Self {
        Self { templates, writer }
    }

    /// Runs the generation workflow.
    ///
    /// Problems with single declarations are collected as diagnostics and do
    /// not stop the run; an invalid manifest or a broken template set does.
    pub async fn generate(
        &self,
        manifest: &HandlerManifest,
        options: &GeneratorOptions,
    ) -> Result<GenerationReport, GenerationError> {
        // 1. Validate input and prepare templates
        manifest.validate()?;
        let renderer = StubRenderer::new(self.templates.as_ref())?;
        let catalog = manifest.catalog();
        let mut report = GenerationReport::default();

        info!(
            groups = manifest.groups.len(),
            types = catalog.len(),
            output = %options.output_path.display(),
            "Starting stub generation"
        );

        // 2. Discover every reachable type
        let model = ModelScanner::new(&catalog).scan(manifest);
        for diagnostic in model.diagnostics {
            report.push(diagnostic);
        }

        // 3. Render services, types and support files
        let mut artifacts = Vec::new();
        for group in &manifest.groups {
            let operations = stub_operations(group, &mut report);
            match renderer.render_service(group, &operations, &catalog, options.style) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => report.push(Diagnostic::error(&group.name, e.to_string())),
            }
        }
        for declaration in &model.types {
            match renderer.render_type(declaration, &catalog) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => report.push(Diagnostic::error(&declaration.name, e.to_string())),
            }
        }
        artifacts.extend(support_artifacts(&renderer, options)?);

        // 4. Write everything that was rendered
        self.write_all(artifacts, options, &mut report).await;

        info!(
            written = report.written.len(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "Stub generation finished"
        );
        Ok(report)
    }

    async fn write_all(
        &self,
        artifacts: Vec<Artifact>,
        options: &GeneratorOptions,
        report: &mut GenerationReport,
    ) {
        let mut claimed = HashSet::new();

        for artifact in artifacts {
            if !claimed.insert(artifact.path.clone()) {
                report.push(Diagnostic::error(
                    &artifact.source,
                    format!(
                        "{} is already generated for another declaration",
                        artifact.path.display()
                    ),
                ));
                continue;
            }

            match self.writer.write(&options.output_path, &artifact).await {
                Ok(_) => report.written.push(artifact.path),
                Err(e) => report.push(Diagnostic::error(&artifact.source, e.to_string())),
            }
        }
    }
}

/// Operations of `group` that get a stub method. An operation whose route
/// does not compile, or that takes more than one payload parameter, is
/// reported and left out.
fn stub_operations<'a>(
    group: &'a HandlerGroupDescriptor,
    report: &mut GenerationReport,
) -> Vec<&'a OperationDescriptor> {
    let mut operations = Vec::with_capacity(group.operations.len());

    for op in &group.operations {
        let subject = format!("{}.{}", group.name, op.name);
        let route = build_route(&group.route, &op.route);

        let pattern = match RoutePattern::compile(&route) {
            Ok(pattern) => pattern,
            Err(e) => {
                report.push(Diagnostic::error(subject, e.to_string()));
                continue;
            }
        };

        let payload: Vec<&str> = op
            .parameters
            .iter()
            .filter(|p| !pattern.has_param(&p.name))
            .map(|p| p.name.as_str())
            .collect();
        if payload.len() > 1 {
            report.push(Diagnostic::error(
                subject,
                format!(
                    "route '{route}' has more than one payload parameter ({}); no stub is generated",
                    payload.join(", ")
                ),
            ));
            continue;
        }

        debug!(operation = %subject, route = %route, "Generating stub method");
        operations.push(op);
    }
    operations
}
