//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3 document of the directory REST API to `openapi.json`,
//! or to the path given as the first argument.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn generate_spec(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI document written to {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    generate_spec(ApiDoc::openapi(), &path)
}
