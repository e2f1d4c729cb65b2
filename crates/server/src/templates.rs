//! Hypermedia document templates.
//!
//! Affordance descriptions are RESTdesc rules in N3; link documents come in
//! N3 and JSON-LD. Built-in templates can be overridden per name by files in
//! a configured directory.
//!
//! Placeholders use `{{name}}` so they never collide with N3 formula braces.

use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Template rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown template: {0}")]
    Unknown(String),

    #[error("template {template} has unresolved placeholder {{{{{placeholder}}}}}")]
    Unresolved {
        template: String,
        placeholder: String,
    },

    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const PREFIXES: &str = "\
@prefix dbpedia: <http://dbpedia.org/resource/>.
@prefix dbpedia-owl: <http://dbpedia.org/ontology/>.
@prefix http: <http://www.w3.org/2011/http#>.
@prefix tmpl: <http://purl.org/restdesc/http-template#>.
";

/// Adding an image to the collection.
///
/// Placeholders:
/// - `{{collection_url}}` - Absolute URL of the image collection
/// - `{{field}}` - Multipart field carrying the file
/// - `{{created_accept}}` - Media types the created response is offered in
pub const ADD_IMAGE: &str = r#"
{
  ?file a dbpedia:Image.
}
=>
{
  _:request http:methodName "POST";
            http:requestURI <{{collection_url}}>;
            http:headers ( [ http:fieldName "Content-Type"; http:fieldValue "multipart/form-data" ]
                           [ http:fieldName "Accept"; http:fieldValue "{{created_accept}}" ] );
            tmpl:formField "{{field}}";
            http:body ?file;
            http:resp [ http:statusCodeValue 201; http:location ?image ].
  ?image a dbpedia:Image.
}.
"#;

/// Retrieving a stored original.
///
/// Placeholders:
/// - `{{collection_url}}` - Absolute URL of the image collection
pub const GET_IMAGE: &str = r#"
{
  ?image a dbpedia:Image.
}
=>
{
  _:request http:methodName "GET";
            http:requestURI ?image;
            http:headers ( [ http:fieldName "Accept"; http:fieldValue "image/*" ] );
            http:resp [ http:statusCodeValue 200; http:body ?image ].
  ?image tmpl:memberOf <{{collection_url}}>.
}.
"#;

/// Retrieving the thumbnail of an image.
///
/// Placeholders:
/// - `{{thumbnail_name}}` - Localized thumbnail path segment
/// - `{{height}}` - Thumbnail height in pixels
/// - `{{thumbnail_accept}}` - Media types the thumbnail is offered in
pub const GET_THUMBNAIL: &str = r#"
{
  ?image a dbpedia:Image.
}
=>
{
  _:request http:methodName "GET";
            tmpl:requestURI (?image "/{{thumbnail_name}}");
            http:headers ( [ http:fieldName "Accept"; http:fieldValue "{{thumbnail_accept}}" ] );
            http:resp [ http:body ?thumbnail ].
  ?image dbpedia-owl:thumbnail ?thumbnail.
  ?thumbnail a dbpedia:Image;
             dbpedia-owl:height {{height}}.
}.
"#;

/// Newly created image, as N3.
///
/// Placeholders:
/// - `{{image_url}}` - Absolute URL of the image
/// - `{{thumbnail_url}}` - Absolute URL of its thumbnail
/// - `{{name}}` - Client-supplied filename
pub const CREATED_N3: &str = r#"
<{{image_url}}> a dbpedia:Image;
    dbpedia-owl:filename "{{name}}";
    dbpedia-owl:thumbnail <{{thumbnail_url}}>.
"#;

/// Newly created image, as JSON-LD.
pub const CREATED_JSONLD: &str = r#"{
  "@context": {
    "dbpedia": "http://dbpedia.org/resource/",
    "dbpedia-owl": "http://dbpedia.org/ontology/"
  },
  "@id": "{{image_url}}",
  "@type": "dbpedia:Image",
  "dbpedia-owl:filename": "{{name}}",
  "dbpedia-owl:thumbnail": { "@id": "{{thumbnail_url}}" }
}
"#;

/// Link from an image to its thumbnail, as N3.
///
/// Placeholders:
/// - `{{image_url}}` - Absolute URL of the image
/// - `{{thumbnail_url}}` - Absolute URL of the thumbnail
/// - `{{height}}` - Thumbnail height in pixels
pub const THUMBNAIL_N3: &str = r#"
<{{image_url}}> dbpedia-owl:thumbnail <{{thumbnail_url}}>.
<{{thumbnail_url}}> a dbpedia:Image;
    dbpedia-owl:height {{height}}.
"#;

/// Link from an image to its thumbnail, as JSON-LD.
pub const THUMBNAIL_JSONLD: &str = r#"{
  "@context": {
    "dbpedia": "http://dbpedia.org/resource/",
    "dbpedia-owl": "http://dbpedia.org/ontology/"
  },
  "@id": "{{image_url}}",
  "dbpedia-owl:thumbnail": {
    "@id": "{{thumbnail_url}}",
    "@type": "dbpedia:Image",
    "dbpedia-owl:height": {{height}}
  }
}
"#;

/// Names of the built-in templates.
pub mod names {
    pub const ADD_IMAGE: &str = "add_image.n3";
    pub const GET_IMAGE: &str = "get_image.n3";
    pub const GET_THUMBNAIL: &str = "get_thumbnail.n3";
    pub const CREATED_N3: &str = "created.n3";
    pub const CREATED_JSONLD: &str = "created.jsonld";
    pub const THUMBNAIL_N3: &str = "thumbnail.n3";
    pub const THUMBNAIL_JSONLD: &str = "thumbnail.jsonld";
}

const BUILTIN: &[(&str, &str)] = &[
    (names::ADD_IMAGE, ADD_IMAGE),
    (names::GET_IMAGE, GET_IMAGE),
    (names::GET_THUMBNAIL, GET_THUMBNAIL),
    (names::CREATED_N3, CREATED_N3),
    (names::CREATED_JSONLD, CREATED_JSONLD),
    (names::THUMBNAIL_N3, THUMBNAIL_N3),
    (names::THUMBNAIL_JSONLD, THUMBNAIL_JSONLD),
];

/// Template registry.
#[derive(Debug, Clone)]
pub struct Templates {
    templates: HashMap<&'static str, String>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Templates {
    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN
                .iter()
                .map(|(name, body)| (*name, (*body).to_string()))
                .collect(),
        }
    }

    /// Built-in templates, overridden by same-named files in `dir`.
    pub async fn load(dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut templates = Self::builtin();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        tokio::fs::metadata(dir)
            .await
            .map_err(|source| TemplateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        for &(name, _) in BUILTIN {
            let path = dir.join(name);
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => {
                    tracing::info!(template = name, path = %path.display(), "Template overridden");
                    templates.templates.insert(name, body);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(TemplateError::Io { path, source }),
            }
        }
        Ok(templates)
    }

    /// Render template `name` with `vars` substituted.
    ///
    /// N3 documents get the shared prefix declarations prepended. Values
    /// rendered into JSON-LD templates are JSON-string escaped.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<Bytes, TemplateError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))?;

        let json = name.ends_with(".jsonld");
        let unresolved = |placeholder: &str| TemplateError::Unresolved {
            template: name.to_string(),
            placeholder: placeholder.to_string(),
        };

        // Single pass over the template's own tokens; substituted values are
        // never scanned again.
        let mut output = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| unresolved(after))?;
            let key = &after[..end];
            let value = vars
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(|| unresolved(key))?;
            if json {
                output.push_str(&escape_json(value));
            } else {
                output.push_str(&escape_n3(value));
            }
            rest = &after[end + 2..];
        }
        output.push_str(rest);

        if name.ends_with(".n3") {
            output.insert_str(0, PREFIXES);
        }
        Ok(Bytes::from(output))
    }

    /// Render several N3 templates into a single document.
    pub fn render_all(
        &self,
        names: &[&str],
        vars: &[(&str, &str)],
    ) -> Result<Bytes, TemplateError> {
        let mut output = String::from(PREFIXES);
        for name in names {
            let rendered = self.render(name, vars)?;
            let body = String::from_utf8_lossy(&rendered);
            output.push_str(body.strip_prefix(PREFIXES).unwrap_or(&body));
        }
        Ok(Bytes::from(output))
    }
}

fn escape_json(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

fn escape_n3(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_and_prefixes() {
        let templates = Templates::builtin();
        let body = templates
            .render(
                names::THUMBNAIL_N3,
                &[
                    ("image_url", "http://localhost/images/ab"),
                    ("thumbnail_url", "http://localhost/images/ab/thumbnail"),
                    ("height", "80"),
                ],
            )
            .unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("@prefix dbpedia:"));
        assert!(text.contains("<http://localhost/images/ab> dbpedia-owl:thumbnail"));
        assert!(text.contains("dbpedia-owl:height 80."));
    }

    #[test]
    fn test_jsonld_is_valid_json() {
        let templates = Templates::builtin();
        let body = templates
            .render(
                names::CREATED_JSONLD,
                &[
                    ("image_url", "http://localhost/images/ab"),
                    ("thumbnail_url", "http://localhost/images/ab/thumbnail"),
                    ("name", "my \"holiday\".png"),
                ],
            )
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["@id"], "http://localhost/images/ab");
        assert_eq!(json["dbpedia-owl:filename"], "my \"holiday\".png");
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let templates = Templates::builtin();
        match templates.render(names::GET_IMAGE, &[]) {
            Err(TemplateError::Unresolved { placeholder, .. }) => {
                assert_eq!(placeholder, "collection_url")
            }
            other => panic!("expected unresolved placeholder, got {other:?}"),
        }
    }

    #[test]
    fn test_values_with_braces_are_not_placeholders() {
        let templates = Templates::builtin();
        let vars = [
            ("image_url", "http://localhost/images/ab"),
            ("thumbnail_url", "http://localhost/images/ab/thumbnail"),
            ("name", "{{x}}.png"),
        ];

        let n3 = templates.render(names::CREATED_N3, &vars).unwrap();
        assert!(std::str::from_utf8(&n3)
            .unwrap()
            .contains("dbpedia-owl:filename \"{{x}}.png\""));

        let jsonld = templates.render(names::CREATED_JSONLD, &vars).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&jsonld).unwrap();
        assert_eq!(json["dbpedia-owl:filename"], "{{x}}.png");
    }

    #[test]
    fn test_unterminated_placeholder_is_an_error() {
        let mut templates = Templates::builtin();
        templates
            .templates
            .insert(names::GET_IMAGE, "<{{collection_url>".to_string());
        assert!(matches!(
            templates.render(names::GET_IMAGE, &[("collection_url", "/x")]),
            Err(TemplateError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(
            Templates::builtin().render("nope.n3", &[]),
            Err(TemplateError::Unknown(_))
        ));
    }

    #[test]
    fn test_render_all_declares_prefixes_once() {
        let templates = Templates::builtin();
        let body = templates
            .render_all(
                &[names::GET_IMAGE, names::GET_IMAGE],
                &[("collection_url", "http://localhost/images")],
            )
            .unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert_eq!(text.matches("@prefix dbpedia:").count(), 1);
        assert_eq!(text.matches("http:methodName \"GET\"").count(), 2);
    }

    #[tokio::test]
    async fn test_load_overrides_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(names::GET_IMAGE), "# custom {{collection_url}}\n").unwrap();

        let templates = Templates::load(Some(dir.path())).await.unwrap();
        let body = templates
            .render(names::GET_IMAGE, &[("collection_url", "/x")])
            .unwrap();
        assert!(std::str::from_utf8(&body).unwrap().ends_with("# custom /x\n"));

        // Other templates keep their built-in body
        assert!(templates.render(names::ADD_IMAGE, &[]).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Templates::load(Some(&dir.path().join("absent"))).await;
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }
}
