//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::normalize_error_response;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// CORS 配置；包含 `*` 时允许任意来源（此时不能携带凭证）
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600));
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(3600))
}

/// 构建 Router
///
/// 层次（外 -> 内）：CORS -> Trace -> 错误规范化 -> panic 捕获 -> 请求体限制 -> 路由
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    // base64 编码后的图片比原始字节大约 1/3
    let body_limit = config.max_upload_size.saturating_mul(2);

    create_routes(state.clone())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            normalize_error_response,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state.clone(), &self.config);
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{AccessPolicy, AvatarSource};
    use crate::config::{ApiKeyConfig, AuthConfig, Scope};
    use crate::domain::VideoStatus;
    use crate::infrastructure::adapters::FakeVideoProvider;
    use crate::infrastructure::http::state::test_support::{test_state, test_state_with_locales};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    struct TestApp {
        router: Router,
        provider: Arc<FakeVideoProvider>,
    }

    async fn app_with(access: AccessPolicy) -> TestApp {
        let (state, provider) = test_state(access).await;
        TestApp {
            router: build_router(state, &ServerConfig::default()),
            provider,
        }
    }

    async fn app() -> TestApp {
        app_with(AccessPolicy::open()).await
    }

    async fn app_with_locales(default_locale: &str, supported: &[&str]) -> TestApp {
        let (state, provider) =
            test_state_with_locales(AccessPolicy::open(), default_locale, supported).await;
        TestApp {
            router: build_router(state, &ServerConfig::default()),
            provider,
        }
    }

    fn with_accept_language(uri: &str, accept: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::ACCEPT_LANGUAGE, accept)
            .body(Body::empty())
            .unwrap()
    }

    struct TestResponse {
        status: StatusCode,
        headers: http::HeaderMap,
        bytes: bytes::Bytes,
    }

    impl TestResponse {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.bytes).unwrap()
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> TestResponse {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            TestResponse {
                status,
                headers,
                bytes,
            }
        }

        async fn get(&self, uri: &str) -> TestResponse {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }

        /// 提交一个视频并返回其 ID
        async fn generate(&self) -> String {
            let response = self
                .post_json("/video/generate", json!({"text": "The water cycle has four stages."}))
                .await;
            assert_eq!(response.status, StatusCode::OK);
            response.json()["id"].as_str().unwrap().to_string()
        }
    }

    fn assert_error(response: &TestResponse, status: StatusCode, kind: &str) {
        assert_eq!(response.status, status);
        let body = response.json();
        assert_eq!(body["error_kind"], kind);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    // ------------------------------------------------------------------
    // Root / ping
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_welcome_is_localized() {
        let app = app().await;

        let response = app.get("/").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({"message": "Welcome to Viducate"}));

        let response = app
            .send(
                Request::get("/")
                    .header(header::ACCEPT_LANGUAGE, "es-MX,es;q=0.8")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.json()["message"], "Bienvenido a Viducate");

        let response = app.get("/?lang=hi").await;
        assert_eq!(response.json()["message"], "Viducate में आपका स्वागत है");
    }

    #[tokio::test]
    async fn test_unsupported_french_falls_back_along_the_chain() {
        let app = app_with_locales("en", &["en", "es", "hi"]).await;

        let response = app.send(with_accept_language("/", "fr")).await;
        assert_eq!(response.json()["message"], "Welcome to Viducate");

        // fr-CA 和 fr 都不支持时尝试下一个偏好
        let response = app.send(with_accept_language("/", "fr-CA, es;q=0.5")).await;
        assert_eq!(response.json()["message"], "Bienvenido a Viducate");

        let response = app.send(with_accept_language("/video/status/tlk_missing", "fr")).await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
        assert_eq!(response.json()["message"], "Video not found: tlk_missing");
    }

    #[tokio::test]
    async fn test_french_default_serves_regional_and_unknown_preferences() {
        let app = app_with_locales("fr", &["fr", "en"]).await;

        let response = app.send(with_accept_language("/", "fr-FR")).await;
        assert_eq!(response.json()["message"], "Bienvenue à Viducate");

        let response = app.send(with_accept_language("/", "de-DE, ja")).await;
        assert_eq!(response.json()["message"], "Bienvenue à Viducate");

        let response = app.get("/").await;
        assert_eq!(response.json()["message"], "Bienvenue à Viducate");

        let response = app.send(with_accept_language("/?lang=en", "fr")).await;
        assert_eq!(response.json()["message"], "Welcome to Viducate");
    }

    #[tokio::test]
    async fn test_ping() {
        let app = app().await;
        let response = app.get("/api/ping").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["status"], "ok");
        assert_eq!(response.json()["provider"], true);
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_missing_text_lists_every_violation() {
        let app = app().await;
        let response = app
            .post_json("/video/generate", json!({"language": "??", "avatar": ""}))
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        let body = response.json();
        assert_eq!(body["message"], "The request is invalid");
        let details = body["details"].as_object().unwrap();
        let fields: Vec<&String> = details.keys().collect();
        assert_eq!(fields, vec!["avatar", "language", "text"]);
        assert_eq!(details["text"], json!(["This field is required"]));

        // 校验失败的请求不会到达视频服务
        assert!(app.provider.last_request().is_none());
    }

    #[tokio::test]
    async fn test_wrong_type_does_not_hide_other_violations() {
        let app = app().await;
        let response = app
            .post_json(
                "/video/generate?lang=es",
                json!({"text": 123, "avatar": "", "language": "??"}),
            )
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        let details = response.json()["details"].clone();
        let fields: Vec<&String> = details.as_object().unwrap().keys().collect();
        assert_eq!(fields, vec!["avatar", "language", "text"]);
        assert_eq!(details["text"], json!(["Este campo tiene un tipo incorrecto"]));
        assert!(app.provider.last_request().is_none());
    }

    #[tokio::test]
    async fn test_non_object_json_is_body_error() {
        let app = app().await;
        let response = app.post_json("/video/generate", json!(["text"])).await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        assert_eq!(
            response.json()["details"],
            json!({"body": ["The request body could not be read"]})
        );
    }

    #[tokio::test]
    async fn test_validation_messages_fall_back_per_key() {
        let app = app().await;
        let response = app
            .post_json("/video/generate?lang=fr", json!({"text": "", "language": "x y"}))
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        let body = response.json();
        assert_eq!(body["message"], "La requête est invalide");
        let text = body["details"]["text"].as_array().unwrap();
        assert_eq!(text.len(), 2);
        assert!(text.contains(&json!("La longueur doit être comprise entre 1 et 5000")));
        assert!(text.contains(&json!("Ce champ ne doit pas être vide")));
        // fr 目录没有 language_tag，回退到默认语言
        assert_eq!(
            body["details"]["language"],
            json!(["Must be a language tag such as en or en-US"])
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_body_error() {
        let app = app().await;
        let response = app
            .send(
                Request::post("/video/generate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"text\": "))
                    .unwrap(),
            )
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        assert_eq!(
            response.json()["details"],
            json!({"body": ["The request body could not be read"]})
        );
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_body_error() {
        let app = app().await;
        let response = app
            .send(
                Request::post("/video/generate")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        assert!(response.json()["details"]["body"].is_array());
    }

    #[tokio::test]
    async fn test_invalid_video_id_is_validation_error() {
        let app = app().await;
        let response = app.get("/video/status/not$valid").await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        assert!(response.json()["details"]["video_id"].is_array());
    }

    // ------------------------------------------------------------------
    // Video flow
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_status_and_stream() {
        let app = app().await;

        let response = app
            .send(
                Request::post("/video/generate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ACCEPT_LANGUAGE, "es")
                    .body(Body::from(
                        json!({"text": "El ciclo del agua", "language": "es"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let body = response.json();
        assert_eq!(body["status"], "pending");
        assert_eq!(body["message"], "Tu video se está generando");
        let id = body["id"].as_str().unwrap().to_string();

        let sent = app.provider.last_request().unwrap();
        assert_eq!(sent.voice_id, "es-ES-ElviraNeural");
        assert_eq!(sent.avatar, AvatarSource::Presenter("rian".to_string()));

        let response = app.get(&format!("/video/status/{}", id)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.json(),
            json!({
                "status": "created",
                "message": "Your video is still processing",
                "video_url": null
            })
        );

        let response = app.get(&format!("/video/stream/{}", id)).await;
        assert_error(&response, StatusCode::CONFLICT, "conflict");
        assert_eq!(response.json()["message"], "Video is not ready yet");

        app.provider.complete(&id, "https://cdn.example.com/v.mp4");

        let response = app.get(&format!("/video/status/{}", id)).await;
        assert_eq!(response.json()["status"], "completed");
        assert_eq!(response.json()["video_url"], "https://cdn.example.com/v.mp4");

        let response = app.get(&format!("/video/stream/{}", id)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(&response.bytes[..], FakeVideoProvider::VIDEO_BYTES);
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let app = app().await;

        let response = app.get("/video/status/tlk_missing").await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
        assert_eq!(response.json()["message"], "Video not found: tlk_missing");
        assert!(response.json()["details"].is_null());

        let response = app.get("/video/stream/tlk_missing?lang=es").await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
        assert_eq!(response.json()["message"], "Video no encontrado: tlk_missing");
    }

    #[tokio::test]
    async fn test_video_gone_from_provider_is_not_found() {
        let app = app().await;
        let id = app.generate().await;
        app.provider.forget(&id);

        let response = app.get(&format!("/video/status/{}", id)).await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
        assert_eq!(response.json()["message"], format!("Video not found: {}", id));

        let response = app.get(&format!("/video/stream/{}?lang=fr", id)).await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
        assert_eq!(response.json()["message"], format!("Vidéo introuvable : {}", id));
    }

    #[tokio::test]
    async fn test_provider_conflict_is_conflict() {
        let app = app().await;
        app.provider.fail_next_with_status(409);

        let response = app.post_json("/video/generate", json!({"text": "hi"})).await;
        assert_error(&response, StatusCode::CONFLICT, "conflict");
        assert_eq!(
            response.json()["message"],
            "The request conflicts with the current state of the resource"
        );
        assert!(response.json()["details"].is_null());
    }

    #[tokio::test]
    async fn test_generate_from_urlencoded_form() {
        let app = app().await;
        let response = app
            .send(
                Request::post("/video/generate")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("text=Gravity+pulls+objects&language=hi&avatar=amy"))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        let sent = app.provider.last_request().unwrap();
        assert_eq!(sent.text, "Gravity pulls objects");
        assert_eq!(sent.voice_id, "hi-IN-SwaraNeural");
        assert_eq!(sent.avatar, AvatarSource::Presenter("amy".to_string()));
    }

    #[tokio::test]
    async fn test_generate_from_multipart_with_custom_avatar() {
        let app = app().await;

        let mut body = Vec::new();
        body.extend_from_slice(
            b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nPlants need light\r\n",
        );
        body.extend_from_slice(
            b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"custom_avatar\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n",
        );
        body.extend_from_slice(PNG);
        body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");

        let response = app
            .send(
                Request::post("/video/generate")
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        let sent = app.provider.last_request().unwrap();
        assert_eq!(sent.voice_id, "en-US-JennyNeural");
        assert_eq!(sent.avatar, AvatarSource::Image(PNG.to_vec()));
    }

    #[tokio::test]
    async fn test_custom_avatar_must_be_image() {
        let app = app().await;
        let response = app
            .post_json(
                "/video/generate",
                json!({"text": "hi", "custom_avatar": BASE64.encode(b"not an image")}),
            )
            .await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        assert_eq!(
            response.json()["details"]["custom_avatar"],
            json!(["Must be a base64 encoded PNG or JPEG image"])
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_internal_error() {
        let app = app().await;
        app.provider.fail_next_with_status(502);

        let response = app.post_json("/video/generate", json!({"text": "hi"})).await;
        assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
        // 内部细节不返回给客户端
        assert_eq!(response.json()["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_response_contract_violation_is_internal_error() {
        let app = app().await;
        let id = app.generate().await;
        // 视频服务报告完成但没有下载地址
        app.provider.set_status(&id, VideoStatus::Done);

        let response = app.get(&format!("/video/status/{}", id)).await;
        assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "internal_error");
    }

    #[tokio::test]
    async fn test_list_avatars() {
        let app = app().await;
        let response = app.get("/video/avatars").await;

        assert_eq!(response.status, StatusCode::OK);
        let avatars = response.json();
        assert_eq!(avatars[0], json!({"id": "rian", "name": "Rian", "thumbnail": null}));
    }

    #[tokio::test]
    async fn test_list_videos_paginates() {
        let app = app().await;
        let first = app.generate().await;
        let second = app.generate().await;

        let response = app.get("/video?limit=1").await;
        assert_eq!(response.status, StatusCode::OK);
        let videos = response.json();
        assert_eq!(videos.as_array().unwrap().len(), 1);
        assert_eq!(videos[0]["id"], second.as_str());

        let response = app.get("/video?limit=5&offset=1").await;
        assert_eq!(response.json()[0]["id"], first.as_str());

        let response = app.get("/video?limit=0").await;
        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        let details = response.json()["details"].clone();
        assert_eq!(details.as_object().unwrap().len(), 1);
        assert!(details["limit"].is_array());

        let response = app.get("/video?limit=many").await;
        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        assert_eq!(
            response.json()["details"],
            json!({"limit": ["This field has the wrong type"]})
        );
    }

    #[tokio::test]
    async fn test_list_query_reports_range_and_type_together() {
        let app = app().await;
        let response = app.get("/video?limit=0&offset=-1").await;

        assert_error(&response, StatusCode::BAD_REQUEST, "validation_error");
        let details = response.json()["details"].clone();
        let fields: Vec<&String> = details.as_object().unwrap().keys().collect();
        assert_eq!(fields, vec!["limit", "offset"]);
        assert_eq!(details["offset"], json!(["This field has the wrong type"]));
    }

    // ------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = app().await;

        let response = app.get("/video/unknown/path").await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
        assert!(response.json()["details"].is_null());

        let response = app
            .send(Request::builder().method(Method::DELETE).uri("/video/avatars").body(Body::empty()).unwrap())
            .await;
        assert_error(&response, StatusCode::NOT_FOUND, "not_found");
    }

    // ------------------------------------------------------------------
    // Access control
    // ------------------------------------------------------------------

    fn policy() -> AccessPolicy {
        AccessPolicy::from_config(&AuthConfig {
            api_keys: vec![
                ApiKeyConfig {
                    key: "reader".to_string(),
                    scopes: vec![Scope::Read],
                },
                ApiKeyConfig {
                    key: "educator".to_string(),
                    scopes: vec![Scope::Read, Scope::Generate],
                },
            ],
        })
    }

    fn generate_request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/video/generate").header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }
        builder.body(Body::from(json!({"text": "hi"}).to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unauthorized() {
        let app = app_with(policy()).await;
        let response = app.send(generate_request(None)).await;
        assert_error(&response, StatusCode::UNAUTHORIZED, "unauthorized");

        let response = app.send(generate_request(Some("stolen"))).await;
        assert_error(&response, StatusCode::UNAUTHORIZED, "unauthorized");
    }

    #[tokio::test]
    async fn test_insufficient_scope_is_forbidden() {
        let app = app_with(policy()).await;
        let response = app.send(generate_request(Some("reader"))).await;
        assert_error(&response, StatusCode::FORBIDDEN, "forbidden");

        let response = app
            .send(
                Request::get("/video/avatars")
                    .header("x-api-key", "reader")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_authorized_generate_and_public_root() {
        let app = app_with(policy()).await;
        let response = app.send(generate_request(Some("educator"))).await;
        assert_eq!(response.status, StatusCode::OK);

        let response = app.get("/").await;
        assert_eq!(response.status, StatusCode::OK);
    }

    // ------------------------------------------------------------------
    // CORS
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let app = app().await;
        let response = app
            .send(
                Request::get("/")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(
            response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
