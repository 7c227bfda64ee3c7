//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::config::BreezeConfig;
use crate::content::ContentFile;
use crate::utils::escape_html;
use crate::utils::mime;

use super::HOTUPDATE_JS_ROUTE;

/// Respond with a route hit rendered into the HTML shell, with the hot
/// update bootstrap injected when the watcher is active.
pub fn respond_page(
    request: Request,
    file: &ContentFile,
    config: &BreezeConfig,
    hmr_active: bool,
) -> Result<()> {
    use crate::utils::mime::types::HTML;

    if is_head_request(&request) {
        return send_head(request, 200, HTML);
    }

    let mut html = render_shell(file, config);
    if hmr_active {
        html = inject_bootstrap(&html);
    }
    send_body(request, 200, HTML, None, html.into_bytes())
}

/// Minimal HTML shell around the processed body. Theme rendering is an
/// external collaborator; this is enough to preview and publish content.
pub fn render_shell(file: &ContentFile, config: &BreezeConfig) -> String {
    let page_title = escape_html(&file.title());
    let site_title = escape_html(&config.site.title);
    let title = if site_title.is_empty() {
        page_title
    } else {
        format!("{} - {}", page_title, site_title)
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n<main>\n{}\n</main>\n</body>\n</html>\n",
        title, file.rendered_body
    )
}

/// Inject the bootstrap script tag before `</head>` so it loads before the
/// document body. Falls back to appending when no head tag exists.
pub fn inject_bootstrap(html: &str) -> String {
    let tag = format!("<script src=\"{}\"></script>", HOTUPDATE_JS_ROUTE);
    let bytes = html.as_bytes();

    const PATTERN: &[u8] = b"</head>";
    if let Some(pos) = bytes
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        let mut result = String::with_capacity(html.len() + tag.len());
        result.push_str(&html[..pos]);
        result.push_str(&tag);
        result.push_str(&html[pos..]);
        return result;
    }

    let mut result = String::with_capacity(html.len() + tag.len());
    result.push_str(html);
    result.push_str(&tag);
    result
}

/// Respond with a static file from disk.
pub fn respond_file(request: Request, path: &Path, config: &BreezeConfig) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let cache_control = mime::cache_control_for(content_type, &config.serve.cache_control);
    send_body(request, 200, content_type, cache_control, body)
}

/// Respond with 404 page (custom or default).
pub fn respond_not_found(request: Request, config: &BreezeConfig) -> Result<()> {
    use crate::utils::mime::types::{HTML, PLAIN};

    let custom_404 = config.build.assets.join("404.html");

    if custom_404.is_file() {
        if is_head_request(&request) {
            return send_head(request, 404, HTML);
        }
        if let Ok(body) = fs::read(&custom_404) {
            return send_body(request, 404, HTML, None, body);
        }
    }

    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, None, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;
    send_body(request, 503, PLAIN, None, b"503 Service Unavailable".to_vec())
}

/// Respond with a loading page while the initial build runs.
pub fn respond_loading(request: Request) -> Result<()> {
    use crate::utils::mime::types::HTML;
    let body = "<!DOCTYPE html><html><head><meta http-equiv=\"refresh\" content=\"1\">\
                <title>Building...</title></head><body><p>Building site...</p></body></html>";
    send_body(request, 200, HTML, None, body.as_bytes().to_vec())
}

/// Respond with the hot update client script from memory.
pub fn respond_hotupdate_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{HOTUPDATE_JS, HotUpdateVars};
    use crate::utils::mime::types::JAVASCRIPT;

    let body = HOTUPDATE_JS.render(&HotUpdateVars {
        ws_port,
        max_reconnect_attempts: super::MAX_CLIENT_RECONNECTS,
    });
    send_body(request, 200, JAVASCRIPT, None, body.into_bytes())
}

/// Respond with a plugin-registered route body.
pub fn respond_extra_route(request: Request, body: &str, content_type: &'static str) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }
    send_body(request, 200, content_type, None, body.as_bytes().to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    cache_control: Option<&str>,
    body: Vec<u8>,
) -> Result<()> {
    let mut response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    if let Some(value) = cache_control {
        if let Ok(header) = Header::from_bytes("Cache-Control", value.as_bytes()) {
            response = response.with_header(header);
        }
    }
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
