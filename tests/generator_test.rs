//! End-to-end tests for stub generation into a real output directory

use hostbridge::core::HandlerManifest;
use hostbridge::generation::config::options_from_toml;
use hostbridge::generation::{GeneratorOptions, StubGenerator, StubStyle};
use hostbridge::infrastructure::{EmbeddedTemplateSource, FileSystemArtifactWriter};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const MANIFEST: &str = r#"
groups:
  - name: shop.api.CartHandler
    route: /cart
    operations:
      - name: items
        route: /{cartId}/items
        parameters:
          - { name: cartId, type: string }
        returns: list<shop.model.Item>
      - name: add
        route: /{cartId}/add
        parameters:
          - { name: cartId, type: string }
          - { name: item, type: shop.model.Item }
        returns: boolean
      - name: clear
        route: /{cartId}/clear
        parameters:
          - { name: cartId, type: string }
types:
  - name: shop.model.Item
    kind: struct
    fields:
      - { name: sku, type: string }
      - { name: quantity, type: int }
      - { name: category, type: shop.model.Category }
      - { name: related, type: "shop.model.Item[]", optional: true }
  - name: shop.model.Category
    kind: enum
    values: [FOOD, TOOLS]
  - name: shop.model.Audit
    kind: struct
    path: audit
    fields:
      - { name: items, type: "map<string, shop.model.Item>" }
dtos:
  - shop.model.Audit
"#;

fn generator() -> StubGenerator {
    StubGenerator::new(
        Arc::new(EmbeddedTemplateSource::new()),
        Arc::new(FileSystemArtifactWriter::new()),
    )
}

fn read(root: &Path, path: &str) -> String {
    std::fs::read_to_string(root.join(path)).unwrap_or_else(|e| panic!("{path}: {e}"))
}

#[tokio::test]
async fn test_generate_query_stubs() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = HandlerManifest::from_yaml(MANIFEST).unwrap();

    let report = generator()
        .generate(&manifest, &GeneratorOptions::query(temp_dir.path()))
        .await
        .unwrap();
    assert!(!report.has_errors(), "{:?}", report.diagnostics);

    let root = temp_dir.path();
    let service = read(root, "shop/api/CartHandler.ts");
    assert!(service.contains("import type { Item } from '../model/Item';"));
    assert!(service.contains("import { QueryService } from '../../support/QueryService';"));
    assert!(service.contains("static items(cartId: string): Promise<Item[]> {"));
    assert!(service.contains("/** route: /cart/{cartId}/add */"));
    assert!(service.contains("static add(cartId: string, item: Item): Promise<boolean> {"));
    assert!(service.contains("'shop.api.CartHandler', 'add', { cartId, item }, 'boolean');"));
    assert!(service.contains("static clear(cartId: string): void {"));

    let item = read(root, "shop/model/Item.ts");
    assert!(item.contains("import type { Category } from './Category';"));
    assert!(item.contains("  quantity: number;"));
    assert!(item.contains("  related?: Item[];"));

    let category = read(root, "shop/model/Category.ts");
    assert!(category.contains("  FOOD = 'FOOD',"));

    let audit = read(root, "audit/Audit.ts");
    assert!(audit.contains("import type { Item } from '../shop/model/Item';"));
    assert!(audit.contains("  items: { [key: string]: Item };"));

    for support in [
        "support/QueryService.ts",
        "support/ResponseType.ts",
        "support/ResponseValueConverter.ts",
        "support/types/bridge.d.ts",
    ] {
        assert!(root.join(support).is_file(), "missing {support}");
    }
    assert!(read(root, "support/QueryService.ts").contains("window.hostQuery"));
    assert_eq!(report.written.len(), 8);
}

#[tokio::test]
async fn test_generate_network_stubs_from_options_file() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join("handlers.yaml");
    std::fs::write(&manifest_path, MANIFEST).unwrap();
    let manifest = HandlerManifest::from_file(&manifest_path).await.unwrap();

    let out = temp_dir.path().join("generated");
    let mut raw = options_from_toml(
        r#"
[output]
type = "network"

[web.backend]
host = "localhost"
port = 7070
"#,
    )
    .unwrap();
    raw.insert("output.path".into(), out.to_string_lossy().into_owned());
    let options = GeneratorOptions::from_map(&raw).unwrap();

    let report = generator().generate(&manifest, &options).await.unwrap();
    assert!(!report.has_errors());

    let service = read(&out, "support/QueryService.ts");
    assert!(service.contains("const BACKEND_URI = 'http://localhost:7070';"));
    assert!(service.contains("/invoke"));
    assert!(!service.contains("window.hostQuery"));
}

#[tokio::test]
async fn test_regeneration_overwrites_previous_output() {
    let temp_dir = TempDir::new().unwrap();
    let mut manifest = HandlerManifest::from_yaml(MANIFEST).unwrap();
    let options = GeneratorOptions::query(temp_dir.path());

    generator().generate(&manifest, &options).await.unwrap();
    manifest.groups[0].operations.retain(|op| op.name != "clear");
    generator().generate(&manifest, &options).await.unwrap();

    let service = read(temp_dir.path(), "shop/api/CartHandler.ts");
    assert!(!service.contains("clear"));
    assert!(service.contains("static items"));
}

#[tokio::test]
async fn test_generate_route_style_stubs() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = HandlerManifest::from_yaml(MANIFEST).unwrap();
    let options = GeneratorOptions::query(temp_dir.path()).with_style(StubStyle::Route);

    let report = generator().generate(&manifest, &options).await.unwrap();
    assert!(!report.has_errors(), "{:?}", report.diagnostics);

    let service = read(temp_dir.path(), "shop/api/CartHandler.ts");
    assert!(service.contains(
        "return QueryService.query<Item[]>(`/cart/${cartId}/items`, null, 'object');"
    ));
    assert!(service.contains(
        "return QueryService.query<boolean>(`/cart/${cartId}/add`, item, 'boolean');"
    ));
    assert!(service.contains("    QueryService.query<void>(`/cart/${cartId}/clear`, null, "));
    assert!(!service.contains("'shop.api.CartHandler'"));

    let support = read(temp_dir.path(), "support/QueryService.ts");
    assert!(support.contains("static query<T>(route: string, payload: unknown"));
}
