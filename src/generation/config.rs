//! Generator options
//!
//! Options are a flat map of dotted keys. They come from an optional TOML
//! file, whose nested tables are flattened (`[web.backend] port = 8080`
//! becomes `web.backend.port`), overlaid with `key=value` pairs from the
//! command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

use super::errors::GenerationError;

pub const OUTPUT_PATH: &str = "output.path";
pub const OUTPUT_TYPE: &str = "output.type";
pub const SERVICE_TYPE: &str = "service.type";
pub const BACKEND_HOST: &str = "web.backend.host";
pub const BACKEND_PORT: &str = "web.backend.port";
pub const BACKEND_URI: &str = "web.backend.uri";
pub const STUB_STYLE: &str = "stub.style";

const KNOWN_KEYS: [&str; 7] = [
    OUTPUT_PATH,
    OUTPUT_TYPE,
    SERVICE_TYPE,
    BACKEND_HOST,
    BACKEND_PORT,
    BACKEND_URI,
    STUB_STYLE,
];

/// Raw option values keyed by dotted name
pub type OptionMap = BTreeMap<String, String>;

/// How generated stubs reach the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFlavor {
    /// Through the query function injected into the page
    Query,
    /// Through HTTP requests to a backend
    Network { backend_uri: Url },
}

impl ServiceFlavor {
    /// Backend URI without a trailing slash
    pub fn backend_uri(&self) -> Option<&str> {
        match self {
            ServiceFlavor::Query => None,
            ServiceFlavor::Network { backend_uri } => {
                Some(backend_uri.as_str().trim_end_matches('/'))
            }
        }
    }
}

/// What a generated stub method sends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StubStyle {
    /// `{className, methodName, parameters}` messages
    #[default]
    Invoke,
    /// `{route, payload}` envelopes matched against the route table
    Route,
}

impl StubStyle {
    fn parse(value: Option<&str>) -> Result<Self, GenerationError> {
        match value.map(str::to_ascii_lowercase).as_deref() {
            None | Some("invoke") | Some("method") => Ok(StubStyle::Invoke),
            Some("route") => Ok(StubStyle::Route),
            Some(other) => Err(GenerationError::invalid_option(
                STUB_STYLE,
                format!("unknown stub style '{other}', expected 'invoke' or 'route'"),
            )),
        }
    }
}

/// Validated generator options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub output_path: PathBuf,
    pub flavor: ServiceFlavor,
    pub style: StubStyle,
}

impl GeneratorOptions {
    /// Options for direct-query stubs written to `output_path`
    pub fn query<P: Into<PathBuf>>(output_path: P) -> Self {
        Self {
            output_path: output_path.into(),
            flavor: ServiceFlavor::Query,
            style: StubStyle::Invoke,
        }
    }

    pub fn with_style(mut self, style: StubStyle) -> Self {
        self.style = style;
        self
    }

    pub fn from_map(options: &OptionMap) -> Result<Self, GenerationError> {
        for key in options.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "Ignoring unknown generator option");
            }
        }

        let output_path = non_empty(options, OUTPUT_PATH)
            .ok_or_else(|| GenerationError::MissingOption(OUTPUT_PATH.to_string()))?;

        let (type_key, flavor) = match non_empty(options, SERVICE_TYPE) {
            Some(value) => (SERVICE_TYPE, Some(value)),
            None => (OUTPUT_TYPE, non_empty(options, OUTPUT_TYPE)),
        };

        let flavor = match flavor.map(str::to_ascii_lowercase).as_deref() {
            None | Some("query") | Some("direct") | Some("cef") => ServiceFlavor::Query,
            Some("network") | Some("web") | Some("rest") | Some("http") => {
                ServiceFlavor::Network {
                    backend_uri: backend_uri(options)?,
                }
            }
            Some(other) => {
                return Err(GenerationError::invalid_option(
                    type_key,
                    format!("unknown stub flavor '{other}', expected 'query' or 'network'"),
                ));
            }
        };

        Ok(Self {
            output_path: PathBuf::from(output_path),
            flavor,
            style: StubStyle::parse(non_empty(options, STUB_STYLE))?,
        })
    }
}

fn non_empty<'a>(options: &'a OptionMap, key: &str) -> Option<&'a str> {
    options
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn backend_uri(options: &OptionMap) -> Result<Url, GenerationError> {
    if let Some(uri) = non_empty(options, BACKEND_URI) {
        return parse_backend_uri(BACKEND_URI, uri);
    }

    let host = non_empty(options, BACKEND_HOST)
        .ok_or_else(|| GenerationError::MissingOption(BACKEND_HOST.to_string()))?;
    let port = non_empty(options, BACKEND_PORT)
        .ok_or_else(|| GenerationError::MissingOption(BACKEND_PORT.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|e| GenerationError::invalid_option(BACKEND_PORT, format!("{e}")))?;

    let uri = if host.contains("://") {
        format!("{host}:{port}")
    } else {
        format!("http://{host}:{port}")
    };
    parse_backend_uri(BACKEND_HOST, &uri)
}

fn parse_backend_uri(key: &str, uri: &str) -> Result<Url, GenerationError> {
    let url = Url::parse(uri).map_err(|e| GenerationError::invalid_option(key, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(GenerationError::invalid_option(
            key,
            format!("unsupported scheme '{scheme}'"),
        )),
    }
}

/// Parses a `key=value` command-line option
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Flattens a TOML document into dotted keys
pub fn options_from_toml(content: &str) -> Result<OptionMap, GenerationError> {
    let table: toml::Table = content
        .parse()
        .map_err(|e: toml::de::Error| GenerationError::invalid_option("options file", e.to_string()))?;
    let mut options = OptionMap::new();
    flatten(None, &toml::Value::Table(table), &mut options);
    Ok(options)
}

/// Reads and flattens a TOML options file
pub async fn load_options_file(path: &Path) -> Result<OptionMap, GenerationError> {
    let content = tokio::fs::read_to_string(path).await?;
    options_from_toml(&content)
}

fn flatten(prefix: Option<&str>, value: &toml::Value, out: &mut OptionMap) {
    let key = |name: &str| match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    };

    match value {
        toml::Value::Table(table) => {
            for (name, value) in table {
                flatten(Some(&key(name)), value, out);
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix.unwrap_or_default().to_string(), s.clone());
        }
        other => {
            out.insert(prefix.unwrap_or_default().to_string(), other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_flavor_by_default() {
        let options = GeneratorOptions::from_map(&map(&[(OUTPUT_PATH, "out/ts")])).unwrap();
        assert_eq!(options, GeneratorOptions::query("out/ts"));
        assert!(options.flavor.backend_uri().is_none());
    }

    #[test]
    fn test_missing_output_path() {
        let err = GeneratorOptions::from_map(&map(&[(SERVICE_TYPE, "query")])).unwrap_err();
        assert!(matches!(err, GenerationError::MissingOption(ref k) if k == OUTPUT_PATH));
        assert_eq!(err.to_string(), "Missing required option 'output.path'");

        let err = GeneratorOptions::from_map(&map(&[(OUTPUT_PATH, "  ")])).unwrap_err();
        assert!(matches!(err, GenerationError::MissingOption(_)));
    }

    #[test]
    fn test_network_flavor_from_host_and_port() {
        let options = GeneratorOptions::from_map(&map(&[
            (OUTPUT_PATH, "out"),
            (OUTPUT_TYPE, "network"),
            (BACKEND_HOST, "localhost"),
            (BACKEND_PORT, "8080"),
        ]))
        .unwrap();
        assert_eq!(options.flavor.backend_uri(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_network_flavor_from_uri() {
        let options = GeneratorOptions::from_map(&map(&[
            (OUTPUT_PATH, "out"),
            (SERVICE_TYPE, "web"),
            (BACKEND_URI, "https://example.com/api/"),
        ]))
        .unwrap();
        assert_eq!(options.flavor.backend_uri(), Some("https://example.com/api"));
    }

    #[test]
    fn test_network_flavor_requires_backend() {
        let err = GeneratorOptions::from_map(&map(&[
            (OUTPUT_PATH, "out"),
            (SERVICE_TYPE, "network"),
            (BACKEND_HOST, "localhost"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GenerationError::MissingOption(ref k) if k == BACKEND_PORT));

        let err = GeneratorOptions::from_map(&map(&[
            (OUTPUT_PATH, "out"),
            (SERVICE_TYPE, "network"),
            (BACKEND_HOST, "localhost"),
            (BACKEND_PORT, "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidOption { .. }));

        let err = GeneratorOptions::from_map(&map(&[
            (OUTPUT_PATH, "out"),
            (SERVICE_TYPE, "network"),
            (BACKEND_URI, "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_service_type_wins_over_output_type() {
        let options = GeneratorOptions::from_map(&map(&[
            (OUTPUT_PATH, "out"),
            (OUTPUT_TYPE, "network"),
            (SERVICE_TYPE, "query"),
        ]))
        .unwrap();
        assert_eq!(options.flavor, ServiceFlavor::Query);
    }

    #[test]
    fn test_unknown_flavor() {
        let err = GeneratorOptions::from_map(&map(&[(OUTPUT_PATH, "out"), (OUTPUT_TYPE, "grpc")]))
            .unwrap_err();
        assert!(err.to_string().contains("output.type"));
    }

    #[test]
    fn test_stub_style() {
        let options = GeneratorOptions::from_map(&map(&[(OUTPUT_PATH, "out")])).unwrap();
        assert_eq!(options.style, StubStyle::Invoke);

        let options =
            GeneratorOptions::from_map(&map(&[(OUTPUT_PATH, "out"), (STUB_STYLE, "Route")])).unwrap();
        assert_eq!(options, GeneratorOptions::query("out").with_style(StubStyle::Route));

        let err = GeneratorOptions::from_map(&map(&[(OUTPUT_PATH, "out"), (STUB_STYLE, "rpc")]))
            .unwrap_err();
        assert!(err.to_string().contains("stub.style"));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("output.path = out/ts").unwrap(),
            ("output.path".to_string(), "out/ts".to_string())
        );
        assert_eq!(
            parse_assignment("web.backend.uri=http://h:1/?a=b").unwrap().1,
            "http://h:1/?a=b"
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_options_from_toml() {
        let options = options_from_toml(
            r#"
service.type = "network"

[output]
path = "frontend/src/generated"

[web.backend]
host = "localhost"
port = 8080
"#,
        )
        .unwrap();

        assert_eq!(options[OUTPUT_PATH], "frontend/src/generated");
        assert_eq!(options[SERVICE_TYPE], "network");
        assert_eq!(options[BACKEND_PORT], "8080");

        let parsed = GeneratorOptions::from_map(&options).unwrap();
        assert_eq!(parsed.flavor.backend_uri(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_options_from_invalid_toml() {
        assert!(options_from_toml("output.path = ").is_err());
    }
}
