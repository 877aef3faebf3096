use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::cli::check::StatusSummary;
use crate::cli::ServeArgs;
use crate::matching::{EntryReport, Reconciler, ReconcilerConfig};
use crate::parsing::citation::{self, ParsedDocument};
use crate::parsing::document::{text_lines, DocumentFormat};
use crate::parsing::ParseError;
use crate::retrieval::SourceLimits;
use crate::sources::http::{build_client, DEFAULT_CALL_TIMEOUT};
use crate::sources::registry::SourceRegistry;
use crate::utils::validation::{validate_upload, ValidationError};

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_MULTIPART_FIELDS: usize = 10;
pub const MAX_FILE_FIELD_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const MAX_TEXT_FIELD_SIZE: usize = 1024 * 1024; // 1MB

/// Whole-request bound; a long list against slow registries needs minutes
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared application state
pub struct AppState {
    pub registry: SourceRegistry,

    /// Configuration that form fields override per request
    pub defaults: ReconcilerConfig,

    /// Per-source call caps shared by all requests
    pub limits: SourceLimits,
}

impl AppState {
    pub fn new(registry: SourceRegistry, defaults: ReconcilerConfig) -> Self {
        let limits = SourceLimits::new(&registry, defaults.retrieval.max_concurrent_per_source);
        Self {
            registry,
            defaults,
            limits,
        }
    }
}

/// Input data extracted from multipart form
#[derive(Debug, Default)]
struct InputData {
    /// Pasted text or uploaded .txt content
    text_content: Option<String>,
    /// Uploaded .docx content
    docx_content: Option<Vec<u8>>,
    /// Sanitized original filename
    filename: Option<String>,
}

impl InputData {
    fn format(&self) -> DocumentFormat {
        if self.docx_content.is_some() {
            DocumentFormat::Docx
        } else {
            DocumentFormat::Text
        }
    }
}

/// Enhanced error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Per-request overrides taken from form fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOptions {
    pub include_slow: bool,
    pub author_threshold: u8,
    pub title_threshold: u8,
}

impl CheckOptions {
    pub fn from_config(config: &ReconcilerConfig) -> Self {
        Self {
            include_slow: config.retrieval.include_slow_sources,
            author_threshold: config.scoring.author_threshold,
            title_threshold: config.classifier.title_threshold,
        }
    }

    /// Apply one form field; unknown names and unparsable values are ignored
    pub fn apply_field(&mut self, name: &str, value: &str) {
        let value = value.trim();
        match name {
            "include_slow" => {
                self.include_slow = matches!(value.to_lowercase().as_str(), "true" | "on" | "1" | "yes");
            }
            "author_threshold" => {
                if let Ok(threshold) = value.parse::<u8>() {
                    self.author_threshold = threshold.min(100);
                }
            }
            "title_threshold" => {
                if let Ok(threshold) = value.parse::<u8>() {
                    self.title_threshold = threshold.min(100);
                }
            }
            _ => {}
        }
    }

    pub fn to_config(&self, defaults: &ReconcilerConfig) -> ReconcilerConfig {
        let mut config = defaults.clone();
        config.retrieval.include_slow_sources = self.include_slow;
        config.scoring.author_threshold = self.author_threshold;
        config.classifier.title_threshold = self.title_threshold;
        config
    }
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    // Log detailed error server-side for debugging (not exposed to client)
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None, // Never expose internal details to prevent information disclosure
    }
}

fn error_response(
    status: StatusCode,
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> Response {
    (
        status,
        Json(create_safe_error_response(error_type, user_message, internal_error)),
    )
        .into_response()
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    // Build tokio runtime
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Create the application router over the default registries.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn create_router() -> anyhow::Result<Router> {
    let client = build_client(DEFAULT_CALL_TIMEOUT)?;
    let state = Arc::new(AppState::new(
        SourceRegistry::with_default_sources(&client),
        ReconcilerConfig::default(),
    ));
    Ok(router_with_state(state))
}

/// Create the application router with all routes and middleware configured.
#[allow(clippy::missing_panics_doc)] // Panics only on invalid governor config (constants are valid)
pub fn router_with_state(state: Arc<AppState>) -> Router {
    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2) // one token every 2 seconds per IP
        .burst_size(10)
        .finish()
        .unwrap();

    // Build router with comprehensive security layers
    Router::new()
        .route("/", get(index_handler))
        .route("/api/check", post(check_handler))
        .route("/api/sources", get(sources_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Security headers for browser protection
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-xss-protection"),
                    HeaderValue::from_static("1; mode=block"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("strict-transport-security"),
                    HeaderValue::from_static("max-age=31536000; includeSubDomains"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                // IP-based rate limiting to prevent abuse
                .layer(GovernorLayer {
                    config: Arc::new(governor_conf),
                })
                // Request timeout to prevent slow client attacks
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                ))
                // Limit concurrent requests; each one fans out to many registries
                .layer(ConcurrencyLimitLayer::new(16))
                // Limit request body size (largest file + multipart overhead)
                .layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB limit
        )
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let app = create_router()?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting cite-check web server at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Main page handler
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("templates/index.html"))
}

/// API endpoint for checking an uploaded or pasted reading list
async fn check_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let start_time = std::time::Instant::now();

    let defaults = CheckOptions::from_config(&state.defaults);
    let (input_data, options) = match extract_request_data(&mut multipart, defaults).await {
        Ok(data) => data,
        Err(error_response) => return error_response,
    };

    let parsed = match parse_input_data(&input_data) {
        Ok(parsed) => parsed,
        Err(error_response) => return *error_response,
    };

    if parsed.entries.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "no_entries",
            "No entries with a [DOI: ...] or [ISBN: ...] tag found.",
            None,
        );
    }

    let reconciler = Reconciler::with_limits(
        state.registry.clone(),
        options.to_config(&state.defaults),
        state.limits.clone(),
    );
    let results = reconciler.check_all(&parsed.entries).await;

    let total = results.len();
    let reports: Vec<EntryReport> = results.into_iter().filter_map(Result::ok).collect();

    #[allow(clippy::cast_possible_truncation)] // Processing time won't exceed u64
    let processing_time = start_time.elapsed().as_millis() as u64;

    info!(
        entries = total,
        invalid = total - reports.len(),
        processing_time_ms = processing_time,
        "Checked uploaded reading list"
    );

    Json(serde_json::json!({
        "summary": StatusSummary::from_reports(&reports),
        "reports": reports,
        "processing_info": {
            "filename": input_data.filename,
            "format": input_data.format(),
            "skipped_lines": parsed.skipped_lines,
            "invalid_entries": total - reports.len(),
            "processing_time_ms": processing_time,
            "configuration": options,
        }
    }))
    .into_response()
}

/// Extract input data and configuration from multipart form
async fn extract_request_data(
    multipart: &mut Multipart,
    mut options: CheckOptions,
) -> Result<(InputData, CheckOptions), Response> {
    let mut input_data = InputData::default();
    let mut fields_received = 0usize;
    let mut had_parse_error = false;

    loop {
        // Check field count limit before processing
        if fields_received >= MAX_MULTIPART_FIELDS {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "field_limit_exceeded",
                "Too many form fields",
                None,
            ));
        }

        match multipart.next_field().await {
            Ok(Some(field)) => {
                fields_received += 1;
                let name = field.name().unwrap_or_default().to_string();

                match name.as_str() {
                    "file" => {
                        let filename = field.file_name().map(ToString::to_string);
                        match field.bytes().await {
                            Ok(bytes) => accept_file(&mut input_data, filename.as_deref(), &bytes)?,
                            Err(_) => had_parse_error = true,
                        }
                    }
                    "text" => match field.text().await {
                        Ok(text) => {
                            if text.len() > MAX_TEXT_FIELD_SIZE {
                                return Err(error_response(
                                    StatusCode::PAYLOAD_TOO_LARGE,
                                    "text_too_large",
                                    "Text field size exceeds limit",
                                    None,
                                ));
                            }
                            if !text.trim().is_empty() {
                                input_data.text_content = Some(text);
                            }
                        }
                        Err(_) => had_parse_error = true,
                    },
                    "include_slow" | "author_threshold" | "title_threshold" => {
                        if let Ok(text) = field.text().await {
                            options.apply_field(&name, &text);
                        }
                    }
                    _ => {} // Ignore unknown fields
                }
            }
            Ok(None) => break,
            Err(_) => {
                had_parse_error = true;
                break;
            }
        }
    }

    if input_data.text_content.is_none() && input_data.docx_content.is_none() {
        let error_msg = if had_parse_error {
            "Failed to parse upload. Please check the file format."
        } else if fields_received == 0 {
            "No data received. Please upload a file or paste citations."
        } else {
            "No reading list found in upload."
        };

        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing_input",
            error_msg,
            None,
        ));
    }

    Ok((input_data, options))
}

/// Validate an uploaded file and store it in `input_data`
fn accept_file(
    input_data: &mut InputData,
    filename: Option<&str>,
    bytes: &[u8],
) -> Result<(), Response> {
    if bytes.len() > MAX_FILE_FIELD_SIZE {
        return Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "file_too_large",
            "File size exceeds limit",
            None,
        ));
    }

    let format = match filename {
        Some(name) => DocumentFormat::from_filename(name).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "unsupported_format",
                "Unsupported file type. Please upload a .txt or .docx file.",
                None,
            )
        })?,
        None => DocumentFormat::Text,
    };

    match validate_upload(filename, bytes, format) {
        Ok(validated_filename) => {
            input_data.filename = validated_filename;
            match format {
                DocumentFormat::Docx => input_data.docx_content = Some(bytes.to_vec()),
                DocumentFormat::Text => {
                    input_data.text_content = Some(String::from_utf8_lossy(bytes).to_string());
                }
            }
            Ok(())
        }
        Err(e) => {
            let (error_type, message) = match &e {
                ValidationError::FilenameTooLong | ValidationError::EmptyFilename => {
                    ("invalid_filename", "Filename is empty or too long.")
                }
                ValidationError::InvalidFilename => {
                    ("invalid_filename", "Filename contains invalid characters.")
                }
                ValidationError::FormatValidationFailed => (
                    "format_validation_failed",
                    "File content does not match its file type.",
                ),
                ValidationError::InvalidFileContent => (
                    "invalid_content",
                    "File content appears malformed or is not UTF-8 text.",
                ),
            };
            Err(error_response(
                StatusCode::BAD_REQUEST,
                error_type,
                message,
                Some(&e.to_string()),
            ))
        }
    }
}

/// Turn the received text or document into entries
fn parse_input_data(input_data: &InputData) -> Result<ParsedDocument, Box<Response>> {
    let result = if let Some(docx) = &input_data.docx_content {
        citation::parse_bytes(docx.clone(), DocumentFormat::Docx)
    } else if let Some(text) = &input_data.text_content {
        citation::parse_lines(&text_lines(text))
    } else {
        return Err(Box::new(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal error: no input data",
            None,
        )));
    };

    result.map_err(|e| {
        let response = match &e {
            ParseError::TooManyEntries(_) => error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "too_many_entries",
                &e.to_string(),
                None,
            ),
            _ => error_response(
                StatusCode::BAD_REQUEST,
                "parse_failed",
                "Unable to read the reading list. Please check the file and try again.",
                Some(&e.to_string()),
            ),
        };
        Box::new(response)
    })
}

/// Return the registered sources in query order
async fn sources_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sources = state.registry.describe();
    Json(serde_json::json!({
        "count": sources.len(),
        "sources": sources,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> CheckOptions {
        CheckOptions::from_config(&ReconcilerConfig::default())
    }

    #[test]
    fn test_apply_field_overrides() {
        let mut options = defaults();
        options.apply_field("include_slow", "on");
        options.apply_field("author_threshold", "60");
        options.apply_field("title_threshold", "300");
        options.apply_field("unknown", "x");

        assert!(options.include_slow);
        assert_eq!(options.author_threshold, 60);
        // Out of u8 range: ignored
        assert_eq!(options.title_threshold, 85);

        // Fits u8 but above 100: clamped
        options.apply_field("title_threshold", "250");
        assert_eq!(options.title_threshold, 100);
    }

    #[test]
    fn test_create_router() {
        assert!(create_router().is_ok());
    }

    #[test]
    fn test_state_limits_follow_defaults() {
        let client = build_client(DEFAULT_CALL_TIMEOUT).unwrap();
        let state = AppState::new(
            SourceRegistry::with_default_sources(&client),
            ReconcilerConfig::default(),
        );
        let per_source = ReconcilerConfig::default().retrieval.max_concurrent_per_source;
        assert_eq!(state.limits.available("Crossref"), Some(per_source));

        // Every request's reconciler draws on the state's semaphores
        let reconciler = Reconciler::with_limits(
            state.registry.clone(),
            state.defaults.clone(),
            state.limits.clone(),
        );
        assert_eq!(reconciler.orchestrator().limits().available("Crossref"), Some(per_source));
    }

    #[test]
    fn test_apply_field_ignores_garbage() {
        let mut options = defaults();
        options.apply_field("author_threshold", "high");
        assert_eq!(options, defaults());
    }

    #[test]
    fn test_options_to_config() {
        let options = CheckOptions {
            include_slow: true,
            author_threshold: 70,
            title_threshold: 90,
        };
        let config = options.to_config(&ReconcilerConfig::default());
        assert!(config.retrieval.include_slow_sources);
        assert_eq!(config.scoring.author_threshold, 70);
        assert_eq!(config.classifier.title_threshold, 90);
        assert_eq!(config.max_concurrent_entries, ReconcilerConfig::default().max_concurrent_entries);
    }

    #[test]
    fn test_accept_text_file() {
        let mut input = InputData::default();
        let content = b"Smith, Journal, Sample Title [DOI: 10.1000/xyz123]\n";
        assert!(accept_file(&mut input, Some("liste.txt"), content).is_ok());
        assert_eq!(input.filename.as_deref(), Some("liste.txt"));
        assert_eq!(input.format(), DocumentFormat::Text);

        let parsed = parse_input_data(&input).unwrap();
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn test_accept_docx_file() {
        let mut input = InputData::default();
        let docx = crate::parsing::document::tests::make_docx(&[
            "Weber, Berlin, Stadtchronik [ISBN: 3-7965-1914-4]",
        ]);
        assert!(accept_file(&mut input, Some("liste.docx"), &docx).is_ok());
        assert_eq!(input.format(), DocumentFormat::Docx);

        let parsed = parse_input_data(&input).unwrap();
        assert_eq!(parsed.entries[0].title, "Stadtchronik");
    }

    #[test]
    fn test_reject_unsupported_extension() {
        let mut input = InputData::default();
        let response = accept_file(&mut input, Some("liste.pdf"), b"%PDF-1.4 content").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_reject_docx_without_zip_magic() {
        let mut input = InputData::default();
        let response = accept_file(&mut input, Some("liste.docx"), b"not a zip container").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(input.docx_content.is_none());
    }

    #[test]
    fn test_reject_path_traversal() {
        let mut input = InputData::default();
        let response = accept_file(&mut input, Some("../etc/liste.txt"), b"some text content").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_input_entry_limit() {
        let text: String = (0..=crate::utils::validation::MAX_ENTRIES)
            .map(|i| format!("A, B, Title {i} [DOI: 10.1000/{i}]\n"))
            .collect();
        let input = InputData {
            text_content: Some(text),
            ..InputData::default()
        };
        let response = parse_input_data(&input).unwrap_err();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
