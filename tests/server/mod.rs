use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};

/// Nothing listens on port 1, so the connection is refused right away
#[allow(dead_code)]
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/unreachable";

#[allow(dead_code)]
pub const CAREERS_PAGE: &str = include_str!("../static/careers-home24.html");

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
  <h1>Sign in</h1>
  <form action="/session" method="post">
    <input type="email" name="email">
    <input type="password" name="password">
    <button type="submit">Sign in</button>
  </form>
</body>
</html>"#;

fn html(body: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body.into())
}

/// Page whose links point back at this server: two reachable, two answering
/// with error statuses, one unreachable, plus relative links that must be
/// ignored.
async fn links_page(req: HttpRequest) -> HttpResponse {
    let host = req.connection_info().host().to_string();
    html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Link check</title></head>
<body>
  <h1>Links</h1>
  <a href="http://{host}/ok">ok</a>
  <a href="http://{host}/ok?again=1">ok again</a>
  <a href="http://{host}/not-found">not found</a>
  <a href="http://{host}/server-error">server error</a>
  <a href="{unreachable}">unreachable</a>
  <a href="/ok">relative</a>
  <a href="ok">relative too</a>
</body>
</html>"#,
        host = host,
        unreachable = UNREACHABLE_URL
    ))
}

pub async fn start_test_server() -> String {
    let http_server = HttpServer::new(|| {
        App::new()
            .route(
                "/ok",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
            .route(
                "/not-found",
                web::get().to(|| async { HttpResponse::NotFound().body("Not Found") }),
            )
            .route(
                "/server-error",
                web::get().to(|| async { HttpResponse::InternalServerError().body("Error") }),
            )
            .route("/links.html", web::get().to(links_page))
            .route("/login.html", web::get().to(|| async { html(LOGIN_PAGE) }))
            .route("/careers.html", web::get().to(|| async { html(CAREERS_PAGE) }))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    url
}
