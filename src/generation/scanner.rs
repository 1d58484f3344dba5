//! Model scanner
//!
//! Collects every declared type reachable from the operations and explicit
//! DTO roots of a manifest. A type is marked processed before its fields are
//! visited, so cyclic and diamond-shaped graphs are walked exactly once.

use std::collections::HashSet;

use super::types::Diagnostic;
use crate::core::descriptors::HandlerManifest;
use crate::core::types::{TypeCatalog, TypeDeclaration, TypeKind, TypeRef};

/// Declarations reached by a scan, in discovery order
#[derive(Debug, Default)]
pub struct ScannedModel<'a> {
    pub types: Vec<&'a TypeDeclaration>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ModelScanner<'a> {
    catalog: &'a TypeCatalog,
    processed: HashSet<String>,
    model: ScannedModel<'a>,
}

impl<'a> ModelScanner<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self {
            catalog,
            processed: HashSet::new(),
            model: ScannedModel::default(),
        }
    }

    /// Scans every operation of every group, then the explicit DTO roots
    pub fn scan(mut self, manifest: &HandlerManifest) -> ScannedModel<'a> {
        for group in &manifest.groups {
            for op in &group.operations {
                let referrer = format!("{}.{}", group.name, op.name);
                for ty in op.types() {
                    self.visit(ty, &referrer);
                }
            }
        }
        for root in &manifest.dtos {
            self.visit_named(root, "dtos");
        }
        self.finish()
    }

    /// Visits every named type inside `ty`
    pub fn visit(&mut self, ty: &TypeRef, referrer: &str) {
        let mut names = Vec::new();
        ty.collect_named(&mut names);
        for name in names {
            self.visit_named(name, referrer);
        }
    }

    fn visit_named(&mut self, name: &str, referrer: &str) {
        if !self.processed.insert(name.to_string()) {
            return;
        }

        let catalog = self.catalog;
        let Some(declaration) = catalog.get(name) else {
            self.model.diagnostics.push(Diagnostic::warning(
                referrer,
                format!("type '{name}' is not declared; no artifact is generated for it"),
            ));
            return;
        };

        tracing::debug!(name = %name, referrer = %referrer, "Discovered type");
        self.model.types.push(declaration);

        if let TypeKind::Struct { fields } = &declaration.kind {
            for field in fields {
                self.visit(&field.ty, &declaration.name);
            }
        }
    }

    pub fn finish(self) -> ScannedModel<'a> {
        self.model
    }
}
