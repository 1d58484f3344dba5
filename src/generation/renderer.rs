//! Tera-based stub renderer

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tera::Tera;

use super::config::StubStyle;
use super::paths::{import_path, output_dir, relative_path};
use super::support::SUPPORT_DIR;
use super::type_mapper::{ResponseKind, response_kind, to_typescript};
use super::{Artifact, ArtifactKind, GenerationError, TemplateSource};
use crate::core::descriptors::{HandlerGroupDescriptor, OperationDescriptor};
use crate::core::types::{TypeCatalog, TypeDeclaration, TypeKind, TypeRef};
use crate::routing::route::{RoutePattern, build_route};

pub const INTERFACE_TEMPLATE: &str = "typescript/interface.ts.tera";
pub const ENUM_TEMPLATE: &str = "typescript/enum.ts.tera";
pub const SERVICE_TEMPLATE: &str = "typescript/service.ts.tera";

#[derive(Debug, Serialize)]
struct ImportContext {
    name: String,
    path: String,
}

#[derive(Debug, Serialize)]
struct FieldContext {
    name: String,
    ty: String,
    optional: bool,
}

#[derive(Debug, Serialize)]
struct InterfaceContext {
    name: String,
    imports: Vec<ImportContext>,
    fields: Vec<FieldContext>,
}

#[derive(Debug, Serialize)]
struct EnumMemberContext {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct EnumContext<'a> {
    name: &'a str,
    members: Vec<EnumMemberContext>,
}

#[derive(Debug, Serialize)]
struct MethodContext {
    name: String,
    route_comment: String,
    route_expr: String,
    payload: String,
    signature: String,
    arguments: String,
    return_type: String,
    response_kind: ResponseKind,
    is_void: bool,
}

#[derive(Debug, Serialize)]
struct ServiceContext {
    class_name: String,
    qualified_name: String,
    route_style: bool,
    support_path: String,
    imports: Vec<ImportContext>,
    methods: Vec<MethodContext>,
}

/// Renders stub artifacts from the templates of a [`TemplateSource`]
pub struct StubRenderer {
    tera: Tera,
}

impl StubRenderer {
    pub fn new(source: &dyn TemplateSource) -> Result<Self, GenerationError> {
        let mut tera = Tera::default();
        for name in source.names() {
            let content = source
                .get(&name)
                .ok_or_else(|| GenerationError::TemplateNotFound(name.clone()))?;
            tera.add_raw_template(&name, &content)?;
        }

        for required in [INTERFACE_TEMPLATE, ENUM_TEMPLATE, SERVICE_TEMPLATE] {
            if !tera.get_template_names().any(|n| n == required) {
                return Err(GenerationError::TemplateNotFound(required.to_string()));
            }
        }
        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Renders a named template with a serializable context
    pub fn render<C: Serialize>(&self, template: &str, context: &C) -> Result<String, GenerationError> {
        if !self.has_template(template) {
            return Err(GenerationError::TemplateNotFound(template.to_string()));
        }
        let context = tera::Context::from_serialize(context)?;
        Ok(self.tera.render(template, &context)?)
    }

    /// Interface or enum declaration for a type
    pub fn render_type(
        &self,
        declaration: &TypeDeclaration,
        catalog: &TypeCatalog,
    ) -> Result<Artifact, GenerationError> {
        let dir = output_dir(&declaration.name, declaration.path.as_deref());
        let name = declaration.simple_name();

        let (kind, content) = match &declaration.kind {
            TypeKind::Enum { values } => {
                let members = values
                    .iter()
                    .map(|value| EnumMemberContext {
                        key: property_name(value),
                        value: string_literal(value),
                    })
                    .collect();
                (
                    ArtifactKind::Enum,
                    self.render(ENUM_TEMPLATE, &EnumContext { name, members })?,
                )
            }
            TypeKind::Struct { fields } => {
                let referenced = fields.iter().map(|f| &f.ty);
                let context = InterfaceContext {
                    name: name.to_string(),
                    imports: imports(&dir, referenced, &declaration.name, catalog),
                    fields: fields
                        .iter()
                        .map(|f| FieldContext {
                            name: property_name(&f.name),
                            ty: to_typescript(&f.ty),
                            optional: f.optional,
                        })
                        .collect(),
                };
                (
                    ArtifactKind::Interface,
                    self.render(INTERFACE_TEMPLATE, &context)?,
                )
            }
        };

        Ok(Artifact {
            path: artifact_path(&dir, name),
            content,
            kind,
            source: declaration.name.clone(),
        })
    }

    /// Client class exposing `operations` of a handler group. With
    /// [`StubStyle::Route`] each method sends a route envelope; otherwise it
    /// sends a method invocation.
    pub fn render_service(
        &self,
        group: &HandlerGroupDescriptor,
        operations: &[&OperationDescriptor],
        catalog: &TypeCatalog,
        style: StubStyle,
    ) -> Result<Artifact, GenerationError> {
        let dir = output_dir(&group.name, group.path.as_deref());

        let referenced = operations
            .iter()
            .copied()
            .flat_map(OperationDescriptor::types);
        let methods = operations
            .iter()
            .map(|op| method_context(group, op, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let context = ServiceContext {
            class_name: group.simple_name().to_string(),
            qualified_name: group.name.clone(),
            route_style: style == StubStyle::Route,
            support_path: relative_path(&dir, SUPPORT_DIR),
            imports: imports(&dir, referenced, &group.name, catalog),
            methods,
        };

        Ok(Artifact {
            path: artifact_path(&dir, group.simple_name()),
            content: self.render(SERVICE_TEMPLATE, &context)?,
            kind: ArtifactKind::Service,
            source: group.name.clone(),
        })
    }
}

fn method_context(
    group: &HandlerGroupDescriptor,
    op: &OperationDescriptor,
    catalog: &TypeCatalog,
) -> Result<MethodContext, GenerationError> {
    let route = build_route(&group.route, &op.route);
    let pattern = RoutePattern::compile(&route)?;

    let signature = op
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, to_typescript(&p.ty)))
        .collect::<Vec<_>>()
        .join(", ");

    let arguments = if op.parameters.is_empty() {
        "{}".to_string()
    } else {
        let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{{ {} }}", names.join(", "))
    };

    // Parameters not captured by the route travel as the payload
    let payload = op
        .parameters
        .iter()
        .find(|p| !pattern.has_param(&p.name))
        .map_or_else(|| "null".to_string(), |p| p.name.clone());

    Ok(MethodContext {
        name: op.name.clone(),
        route_comment: route.replace("*/", "*\\/"),
        route_expr: route_expression(&route, pattern.params()),
        payload,
        signature,
        arguments,
        return_type: to_typescript(&op.returns),
        response_kind: response_kind(&op.returns, catalog),
        is_void: op.returns.is_void(),
    })
}

/// Route as a TypeScript expression. Placeholders become template literal
/// substitutions of the parameters of the same name.
fn route_expression(route: &str, params: &[String]) -> String {
    if params.is_empty() {
        return string_literal(route);
    }

    let mut expr = String::from("`");
    let mut rest = route;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        push_template_text(&mut expr, &rest[..start]);
        if params.iter().any(|p| p == name) {
            expr.push_str("${");
            expr.push_str(name);
            expr.push('}');
        } else {
            push_template_text(&mut expr, &rest[start..=start + len]);
        }
        rest = &rest[start + len + 1..];
    }
    push_template_text(&mut expr, rest);
    expr.push('`');
    expr
}

fn push_template_text(out: &mut String, text: &str) {
    for c in text.chars() {
        if matches!(c, '\\' | '`' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Single-quoted TypeScript string literal
fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' | '\'' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Member or property name, quoted unless it is a plain identifier
fn property_name(name: &str) -> String {
    let mut chars = name.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// Type-only imports for every declared type referenced from a file in `dir`
fn imports<'t, I>(dir: &str, types: I, self_name: &str, catalog: &TypeCatalog) -> Vec<ImportContext>
where
    I: IntoIterator<Item = &'t TypeRef>,
{
    let mut names = Vec::new();
    for ty in types {
        ty.collect_named(&mut names);
    }
    let unique: BTreeSet<&str> = names.into_iter().filter(|n| *n != self_name).collect();

    unique
        .into_iter()
        .filter_map(|name| catalog.get(name))
        .map(|declaration| ImportContext {
            name: declaration.simple_name().to_string(),
            path: import_path(
                dir,
                &output_dir(&declaration.name, declaration.path.as_deref()),
                declaration.simple_name(),
            ),
        })
        .collect()
}

fn artifact_path(dir: &str, simple_name: &str) -> PathBuf {
    PathBuf::from(dir).join(format!("{simple_name}.ts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FieldDescriptor, PrimitiveKind};
    use crate::infrastructure::templates::EmbeddedTemplateSource;

    fn renderer() -> StubRenderer {
        StubRenderer::new(&EmbeddedTemplateSource::new()).unwrap()
    }

    fn catalog() -> TypeCatalog {
        [
            TypeDeclaration::structure(
                "com.example.dto.Person",
                vec![
                    FieldDescriptor::new("name", TypeRef::String),
                    FieldDescriptor {
                        name: "age".into(),
                        ty: TypeRef::Boxed(PrimitiveKind::Int),
                        optional: true,
                    },
                    FieldDescriptor::new("address", TypeRef::named("com.example.geo.Address")),
                    FieldDescriptor::new("friends", TypeRef::list(TypeRef::named("com.example.dto.Person"))),
                ],
            ),
            TypeDeclaration::structure("com.example.geo.Address", vec![]).with_path("shared/geo"),
            TypeDeclaration::enumeration("com.example.dto.Color", &["RED", "GREEN"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_render_interface() {
        let catalog = catalog();
        let person = catalog.get("com.example.dto.Person").unwrap();
        let artifact = renderer().render_type(person, &catalog).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Interface);
        assert_eq!(artifact.path, PathBuf::from("com/example/dto/Person.ts"));
        assert!(
            artifact
                .content
                .contains("import type { Address } from '../../../shared/geo/Address';")
        );
        assert!(!artifact.content.contains("import type { Person }"));
        assert!(artifact.content.contains("export interface Person {"));
        assert!(artifact.content.contains("  name: string;"));
        assert!(artifact.content.contains("  age?: number;"));
        assert!(artifact.content.contains("  friends: Person[];"));
    }

    #[test]
    fn test_render_enum() {
        let catalog = catalog();
        let color = catalog.get("com.example.dto.Color").unwrap();
        let artifact = renderer().render_type(color, &catalog).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Enum);
        assert!(artifact.content.contains("export enum Color {"));
        assert!(artifact.content.contains("  RED = 'RED',"));
        assert!(artifact.content.contains("  GREEN = 'GREEN',"));
    }

    #[test]
    fn test_render_service() {
        let catalog = catalog();
        let mut group = HandlerGroupDescriptor::new("com.example.api.PersonService", "/persons");
        group.operations = vec![
            OperationDescriptor::new("find", "/{id}")
                .param("id", TypeRef::Primitive(PrimitiveKind::Long))
                .returns(TypeRef::named("com.example.dto.Person")),
            OperationDescriptor::new("count", "count").returns(TypeRef::Primitive(PrimitiveKind::Int)),
            OperationDescriptor::new("save", "/save")
                .param("person", TypeRef::named("com.example.dto.Person")),
        ];
        let operations: Vec<_> = group.operations.iter().collect();

        let artifact = renderer()
            .render_service(&group, &operations, &catalog, StubStyle::Invoke)
            .unwrap();
        let content = &artifact.content;

        assert_eq!(artifact.path, PathBuf::from("com/example/api/PersonService.ts"));
        assert!(content.contains("import type { Person } from '../dto/Person';"));
        assert!(content.contains("import { QueryService } from '../../../support/QueryService';"));
        assert!(content.contains("export class PersonService {"));
        assert!(content.contains("/** route: /persons/{id} */"));
        assert!(content.contains("static find(id: number): Promise<Person> {"));
        assert!(content.contains(
            "return QueryService.request<Person>('com.example.api.PersonService', 'find', { id }, 'object');"
        ));
        assert!(content.contains("/** route: /persons/count */"));
        assert!(content.contains("static count(): Promise<number> {"));
        assert!(content.contains("'count', {}, 'number');"));
        assert!(content.contains("static save(person: Person): void {"));
        assert!(!content.contains("return QueryService.request<void>"));
    }

    #[test]
    fn test_render_route_style_service() {
        let catalog = catalog();
        let mut group = HandlerGroupDescriptor::new("com.example.api.Greeter", "/greeter");
        group.operations = vec![
            OperationDescriptor::new("hello", "/hello/{name}")
                .param("name", TypeRef::String)
                .returns(TypeRef::String),
            OperationDescriptor::new("rename", "/{id}/rename")
                .param("id", TypeRef::Primitive(PrimitiveKind::Long))
                .param("person", TypeRef::named("com.example.dto.Person"))
                .returns(TypeRef::named("com.example.dto.Person")),
            OperationDescriptor::new("reset", "/reset"),
        ];
        let operations: Vec<_> = group.operations.iter().collect();

        let content = renderer()
            .render_service(&group, &operations, &catalog, StubStyle::Route)
            .unwrap()
            .content;

        assert!(content.contains(
            "return QueryService.query<string>(`/greeter/hello/${name}`, null, 'string');"
        ));
        assert!(content.contains(
            "return QueryService.query<Person>(`/greeter/${id}/rename`, person, 'object');"
        ));
        assert!(content.contains("    QueryService.query<void>('/greeter/reset', null, "));
        assert!(!content.contains("QueryService.request"));
    }

    #[test]
    fn test_route_expression_escapes_literal_text() {
        let params = vec!["id".to_string()];
        assert_eq!(route_expression("/a/{id}", &params), "`/a/${id}`");
        assert_eq!(route_expression("/cost$/{id}", &params), "`/cost\\$/${id}`");
        assert_eq!(route_expression("/it's", &[]), "'/it\\'s'");
    }

    #[test]
    fn test_route_comment_cannot_close_doc_comment() {
        let mut group = HandlerGroupDescriptor::new("com.example.api.Files", "/files");
        group.operations = vec![OperationDescriptor::new("any", "/*/x")];
        let operations: Vec<_> = group.operations.iter().collect();

        let content = renderer()
            .render_service(&group, &operations, &catalog(), StubStyle::Invoke)
            .unwrap()
            .content;
        assert!(content.contains("/** route: /files/*\\/x */"));
        assert_eq!(content.matches("*/").count(), 1);
    }

    #[test]
    fn test_render_enum_quotes_non_identifiers() {
        let catalog: TypeCatalog = [TypeDeclaration::enumeration(
            "com.example.dto.Stage",
            &["OPEN", "in-progress", "1ST"],
        )]
        .into_iter()
        .collect();
        let stage = catalog.get("com.example.dto.Stage").unwrap();
        let content = renderer().render_type(stage, &catalog).unwrap().content;

        assert!(content.contains("  OPEN = 'OPEN',"));
        assert!(content.contains("  'in-progress' = 'in-progress',"));
        assert!(content.contains("  '1ST' = '1ST',"));
    }

    #[test]
    fn test_missing_template() {
        struct Empty;
        impl TemplateSource for Empty {
            fn names(&self) -> Vec<String> {
                Vec::new()
            }
            fn get(&self, _name: &str) -> Option<String> {
                None
            }
        }

        let err = StubRenderer::new(&Empty).err().unwrap();
        assert!(matches!(err, GenerationError::TemplateNotFound(_)));
    }
}
