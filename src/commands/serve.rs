use std::net::SocketAddr;

use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tower_http::services::ServeDir;

use crate::{
    ServeArgs,
    commands::{
        base_path_from_config,
        build::{make_site, write_site},
        config_path_from_arg,
    },
};

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>404 Not Found</title></head>
<body><h1>404 Not Found</h1><p>The requested page does not exist.</p></body>
</html>
"#;

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let config_path = config_path_from_arg(args.config_file.as_deref())?;
    let base_path = base_path_from_config(&config_path);

    // Build the site first
    println!("Building site...");
    let site = make_site(&config_path, &base_path).await?;
    let result = write_site(&site, &base_path).await?;
    println!(
        "Built {} pages, {} static files",
        result.pages, result.static_files
    );

    let app = router(&result.output_dir);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let url = format!("http://localhost:{}", args.port);

    println!("\nServing site at {}", url);
    println!("Press Ctrl+C to stop\n");

    if args.open
        && let Err(e) = open::that(&url)
    {
        eprintln!("Failed to open browser: {}", e);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Static file router over the output directory. Directory requests resolve
/// to their `index.html`; anything missing gets the built-in 404 page.
fn router(output_dir: &std::path::Path) -> Router {
    let serve_dir = ServeDir::new(output_dir)
        .append_index_html_on_directories(true)
        .not_found_service(not_found_handler.into_service());

    Router::new().fallback_service(serve_dir)
}
