//! Inbound routing and the operation handlers.
//!
//! Every handler follows the same protocol: validate preconditions against
//! the session (short-circuit with a warning), acquire a scoped workspace,
//! download the inputs, run exactly one document transform, deliver the
//! result, and only then commit the session update. Collaborator failures
//! are reported as a generic message and leave the session untouched; the
//! workspace is removed on every exit path.

use {
    teloxide::types::{ChatId, MediaKind, Message, MessageKind, Update, UpdateKind},
    tracing::{debug, warn},
};

use {
    pdfmill_docops::{Workspace, pdf, text, word},
    pdfmill_sessions::{CollectMode, FileRef, Session},
};

use crate::{Error, Result, menu::MenuCommand, state::BotState, transfer};

const WELCOME: &str = "👋 Welcome to pdfmill.\nUse the buttons below to interact.";
const FALLBACK: &str = "Use the keyboard buttons or /start.";
const SEND_IMAGES: &str = "📸 Send images now.";
const SEND_PDF: &str = "📁 Send PDF file now.";
const OK_IMAGE_SAVED: &str = "✅ Image saved. Send more or press 📄 Create PDF.";
const OK_PDF_SAVED: &str = "✅ PDF saved!";
const OK_SESSION_CLEARED: &str = "🗑️ Session cleared.";
const BUSY_CREATING: &str = "⏳ Creating PDF...";
const BUSY_MERGING: &str = "⏳ Merging PDFs...";
const BUSY_SPLITTING: &str = "⏳ Splitting PDF...";
const BUSY_EXTRACTING: &str = "⏳ Extracting text...";
const BUSY_CONVERTING: &str = "⏳ Converting to Word...";
const WARN_NO_IMAGES: &str = "⚠️ No images yet. Press 🖼️ Add Image first.";
const WARN_NO_PDF: &str = "⚠️ No PDF in session. Send one first (📥 Add PDF).";
const WARN_NEED_TWO_PDFS: &str = "⚠️ Need at least two PDFs to merge. Send more with 📥 Add PDF.";
const WARN_NO_TEXT: &str = "⚠️ No text found in PDF.";
const WARN_PRESS_ADD_IMAGE: &str = "⚠️ Click 🖼️ Add Image first.";
const REJECT_UNSUPPORTED: &str = "⚠️ Unsupported document type.";
const FAIL_GENERIC: &str = "❌ Something went wrong while processing your file. Please try again.";

/// Entry point for the dispatch loop: route one update.
pub async fn handle_update(state: &BotState, update: Update) -> Result<()> {
    match update.kind {
        UpdateKind::Message(msg) => handle_message(state, msg).await,
        other => {
            debug!("ignoring non-message update: {other:?}");
            Ok(())
        },
    }
}

/// Classify one message as menu text, photo, or document and dispatch.
pub async fn handle_message(state: &BotState, msg: Message) -> Result<()> {
    let Some(user_id) = msg.from.as_ref().map(|u| u.id.0) else {
        debug!("ignoring message without a sender");
        return Ok(());
    };
    let chat = msg.chat.id;

    if let Some(message_text) = extract_message_text(&msg) {
        return handle_text(state, chat, user_id, &message_text).await;
    }
    if let Some(file_id) = extract_photo_file_id(&msg) {
        return handle_photo(state, chat, user_id, &file_id).await;
    }
    if let Some(document) = extract_document(&msg) {
        return handle_document(state, chat, user_id, document).await;
    }
    if has_media(&msg) {
        return state.outbound.send_text(chat, REJECT_UNSUPPORTED).await;
    }
    Ok(())
}

async fn handle_text(state: &BotState, chat: ChatId, user_id: u64, message_text: &str) -> Result<()> {
    match MenuCommand::parse(message_text) {
        Some(MenuCommand::AddImage) => {
            state
                .sessions
                .update(user_id, Session::begin_collecting_images);
            state.outbound.send_text(chat, SEND_IMAGES).await
        },
        Some(MenuCommand::CreatePdf) => op_create_pdf(state, chat, user_id).await,
        Some(MenuCommand::AddPdf) => {
            state
                .sessions
                .update(user_id, Session::begin_collecting_pdfs);
            state.outbound.send_text(chat, SEND_PDF).await
        },
        Some(MenuCommand::MergePdfs) => op_merge_pdfs(state, chat, user_id).await,
        Some(MenuCommand::SplitPdf) => op_split_pdf(state, chat, user_id).await,
        Some(MenuCommand::ExtractText) => op_extract_text(state, chat, user_id).await,
        Some(MenuCommand::ConvertToWord) => op_convert_to_word(state, chat, user_id).await,
        Some(MenuCommand::Cancel) => {
            state.sessions.clear(user_id);
            state.outbound.send_text(chat, OK_SESSION_CLEARED).await
        },
        None => {
            let greeting = if message_text.trim() == "/start" {
                WELCOME
            } else {
                FALLBACK
            };
            state.outbound.send_menu(chat, greeting).await
        },
    }
}

async fn handle_photo(state: &BotState, chat: ChatId, user_id: u64, file_id: &str) -> Result<()> {
    if state.sessions.snapshot(user_id).mode != CollectMode::Images {
        return state.outbound.send_text(chat, WARN_PRESS_ADD_IMAGE).await;
    }
    match transfer::rehost_photo(state, file_id).await {
        Ok(file) => {
            state.sessions.update(user_id, |s| s.push_image(file));
            state.outbound.send_text(chat, OK_IMAGE_SAVED).await
        },
        Err(e) => {
            warn!(user_id, error = %e, "failed to store image");
            state.outbound.send_text(chat, FAIL_GENERIC).await
        },
    }
}

struct DocumentInfo {
    file_id: String,
    mime: Option<String>,
}

async fn handle_document(
    state: &BotState,
    chat: ChatId,
    user_id: u64,
    document: DocumentInfo,
) -> Result<()> {
    match document.mime.as_deref() {
        Some("application/pdf") => match transfer::rehost_document(state, &document.file_id).await {
            Ok(file) => {
                state.sessions.update(user_id, |s| s.store_pdf(file));
                state.outbound.send_text(chat, OK_PDF_SAVED).await
            },
            Err(e) => {
                warn!(user_id, error = %e, "failed to store PDF");
                state.outbound.send_text(chat, FAIL_GENERIC).await
            },
        },
        Some("image/jpeg" | "image/png") => {
            if state.sessions.snapshot(user_id).mode != CollectMode::Images {
                return state.outbound.send_text(chat, WARN_PRESS_ADD_IMAGE).await;
            }
            match transfer::rehost_document(state, &document.file_id).await {
                Ok(file) => {
                    state.sessions.update(user_id, |s| s.push_image(file));
                    state.outbound.send_text(chat, OK_IMAGE_SAVED).await
                },
                Err(e) => {
                    warn!(user_id, error = %e, "failed to store image document");
                    state.outbound.send_text(chat, FAIL_GENERIC).await
                },
            }
        },
        other => {
            debug!(user_id, mime = ?other, "rejecting unsupported document");
            state.outbound.send_text(chat, REJECT_UNSUPPORTED).await
        },
    }
}

// ── Operation handlers ──────────────────────────────────────────────────────

async fn op_create_pdf(state: &BotState, chat: ChatId, user_id: u64) -> Result<()> {
    let session = state.sessions.snapshot(user_id);
    if session.images.is_empty() {
        return state.outbound.send_text(chat, WARN_NO_IMAGES).await;
    }
    state.outbound.send_text(chat, BUSY_CREATING).await?;
    state.outbound.upload_action(chat).await;

    let bytes = match build_pdf_from_images(state, &session.images).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(user_id, error = %e, "create PDF failed");
            return state.outbound.send_text(chat, FAIL_GENERIC).await;
        },
    };

    let artifact = deliver_artifact(state, chat, "output.pdf", bytes).await?;
    state.sessions.update(user_id, |s| {
        s.pdfs = vec![artifact];
        s.images.clear();
        s.mode = CollectMode::Idle;
    });
    Ok(())
}

async fn op_merge_pdfs(state: &BotState, chat: ChatId, user_id: u64) -> Result<()> {
    let session = state.sessions.snapshot(user_id);
    if session.pdfs.len() < 2 {
        return state.outbound.send_text(chat, WARN_NEED_TWO_PDFS).await;
    }
    state.outbound.send_text(chat, BUSY_MERGING).await?;
    state.outbound.upload_action(chat).await;

    let bytes = match merge_pdfs(state, &session.pdfs).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(user_id, error = %e, "merge failed");
            return state.outbound.send_text(chat, FAIL_GENERIC).await;
        },
    };

    let artifact = deliver_artifact(state, chat, "merged.pdf", bytes).await?;
    state.sessions.update(user_id, |s| {
        s.pdfs = vec![artifact];
        s.mode = CollectMode::Idle;
    });
    Ok(())
}

async fn op_split_pdf(state: &BotState, chat: ChatId, user_id: u64) -> Result<()> {
    let session = state.sessions.snapshot(user_id);
    let Some(current) = session.current_pdf() else {
        return state.outbound.send_text(chat, WARN_NO_PDF).await;
    };
    state.outbound.send_text(chat, BUSY_SPLITTING).await?;
    state.outbound.upload_action(chat).await;

    let parts = match split_pdf(state, current).await {
        Ok(parts) => parts,
        Err(e) => {
            warn!(user_id, error = %e, "split failed");
            return state.outbound.send_text(chat, FAIL_GENERIC).await;
        },
    };

    let mut artifacts = Vec::with_capacity(parts.len());
    for (idx, part) in parts.into_iter().enumerate() {
        let name = format!("page_{}.pdf", idx + 1);
        artifacts.push(deliver_artifact(state, chat, &name, part).await?);
    }
    state.sessions.update(user_id, |s| s.pdfs = artifacts);
    Ok(())
}

async fn op_extract_text(state: &BotState, chat: ChatId, user_id: u64) -> Result<()> {
    let session = state.sessions.snapshot(user_id);
    let Some(current) = session.current_pdf() else {
        return state.outbound.send_text(chat, WARN_NO_PDF).await;
    };
    state.outbound.send_text(chat, BUSY_EXTRACTING).await?;

    let extracted = match extract_pdf_text(state, current).await {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!(user_id, error = %e, "text extraction failed");
            return state.outbound.send_text(chat, FAIL_GENERIC).await;
        },
    };

    if extracted.trim().is_empty() {
        return state.outbound.send_text(chat, WARN_NO_TEXT).await;
    }
    let chunks = text::chunk_text(&extracted, text::MAX_CHUNK_LEN);
    state.outbound.send_text_chunks(chat, &chunks).await
}

async fn op_convert_to_word(state: &BotState, chat: ChatId, user_id: u64) -> Result<()> {
    let session = state.sessions.snapshot(user_id);
    let Some(current) = session.current_pdf() else {
        return state.outbound.send_text(chat, WARN_NO_PDF).await;
    };
    state.outbound.send_text(chat, BUSY_CONVERTING).await?;
    state.outbound.upload_action(chat).await;

    let bytes = match convert_pdf_to_word(state, current).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(user_id, error = %e, "word conversion failed");
            return state.outbound.send_text(chat, FAIL_GENERIC).await;
        },
    };

    deliver_artifact(state, chat, "output.docx", bytes).await?;
    Ok(())
}

// ── Workspace-scoped transform steps ────────────────────────────────────────

async fn build_pdf_from_images(state: &BotState, images: &[FileRef]) -> Result<Vec<u8>> {
    let ws = Workspace::create()?;
    let mut paths = Vec::with_capacity(images.len());
    for (idx, image) in images.iter().enumerate() {
        let path = ws.file(&format!("{}.jpg", idx + 1));
        transfer::download_to(&state.bot, image.as_str(), &path).await?;
        paths.push(path);
    }
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let mut inputs = Vec::with_capacity(paths.len());
        for path in &paths {
            inputs.push(std::fs::read(path)?);
        }
        Ok(pdf::compose_from_images(&inputs)?)
    })
    .await??;
    drop(ws);
    Ok(bytes)
}

async fn merge_pdfs(state: &BotState, pdfs: &[FileRef]) -> Result<Vec<u8>> {
    let ws = Workspace::create()?;
    let mut paths = Vec::with_capacity(pdfs.len());
    for (idx, file) in pdfs.iter().enumerate() {
        let path = ws.file(&format!("{}.pdf", idx + 1));
        transfer::download_to(&state.bot, file.as_str(), &path).await?;
        paths.push(path);
    }
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let mut inputs = Vec::with_capacity(paths.len());
        for path in &paths {
            inputs.push(std::fs::read(path)?);
        }
        Ok(pdf::merge(&inputs)?)
    })
    .await??;
    drop(ws);
    Ok(bytes)
}

async fn split_pdf(state: &BotState, current: &FileRef) -> Result<Vec<Vec<u8>>> {
    let ws = Workspace::create()?;
    let path = ws.file("in.pdf");
    transfer::download_to(&state.bot, current.as_str(), &path).await?;
    let parts = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<u8>>> {
        let input = std::fs::read(&path)?;
        Ok(pdf::split(&input)?)
    })
    .await??;
    drop(ws);
    Ok(parts)
}

async fn extract_pdf_text(state: &BotState, current: &FileRef) -> Result<String> {
    let ws = Workspace::create()?;
    let path = ws.file("in.pdf");
    transfer::download_to(&state.bot, current.as_str(), &path).await?;
    let extracted = tokio::task::spawn_blocking(move || -> Result<String> {
        let input = std::fs::read(&path)?;
        Ok(text::extract_text(&input)?)
    })
    .await??;
    drop(ws);
    Ok(extracted)
}

async fn convert_pdf_to_word(state: &BotState, current: &FileRef) -> Result<Vec<u8>> {
    let ws = Workspace::create()?;
    let path = ws.file("in.pdf");
    transfer::download_to(&state.bot, current.as_str(), &path).await?;
    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let input = std::fs::read(&path)?;
        let extracted = text::extract_text(&input)?;
        Ok(word::text_to_docx(&extracted)?)
    })
    .await??;
    drop(ws);
    Ok(bytes)
}

/// Send an artifact to the user, mirror it to the archive chat when one is
/// configured, and return the uploaded file's id.
async fn deliver_artifact(
    state: &BotState,
    chat: ChatId,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<FileRef> {
    let sent = state.outbound.send_document(chat, file_name, bytes).await?;
    let file_id = sent
        .document()
        .map(|d| d.file.id.clone())
        .ok_or_else(|| Error::message("sent artifact has no document"))?;
    if let Err(e) = transfer::archive_copy(state, &file_id).await {
        warn!(error = %e, "failed to mirror artifact to archive chat");
    }
    Ok(FileRef(file_id))
}

// ── Message classification helpers ──────────────────────────────────────────

fn extract_message_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Largest photo size of a photo message.
fn extract_photo_file_id(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Photo(p) => p.photo.last().map(|ps| ps.file.id.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn extract_document(msg: &Message) -> Option<DocumentInfo> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Document(d) => Some(DocumentInfo {
                file_id: d.document.file.id.clone(),
                mime: d
                    .document
                    .mime_type
                    .as_ref()
                    .map(|m| m.essence_str().to_string()),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Whether the message carries media of any kind.
fn has_media(msg: &Message) -> bool {
    match &msg.kind {
        MessageKind::Common(common) => !matches!(common.media_kind, MediaKind::Text(_)),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        std::{
            collections::HashMap,
            sync::{Arc, Mutex},
        },
    };

    use {
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        serde::Deserialize,
        serde_json::json,
        tokio::sync::oneshot,
    };

    use crate::{config::BotConfig, state::SharedState};

    #[derive(Debug, Clone, Deserialize)]
    struct SendMessageRequest {
        chat_id: i64,
        text: String,
    }

    #[derive(Debug, Clone)]
    enum Captured {
        SendMessage(SendMessageRequest),
        Other { method: String },
    }

    impl Captured {
        fn message_text(&self) -> Option<&str> {
            match self {
                Self::SendMessage(req) => Some(&req.text),
                Self::Other { .. } => None,
            }
        }

        fn method(&self) -> &str {
            match self {
                Self::SendMessage(_) => "SendMessage",
                Self::Other { method } => method,
            }
        }
    }

    #[derive(Clone)]
    struct MockApi {
        requests: Arc<Mutex<Vec<Captured>>>,
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    async fn api_handler(
        State(state): State<MockApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<serde_json::Value> {
        let method = uri
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let captured = if method == "SendMessage" {
            serde_json::from_slice::<SendMessageRequest>(&body)
                .map(Captured::SendMessage)
                .unwrap_or(Captured::Other {
                    method: method.clone(),
                })
        } else {
            Captured::Other {
                method: method.clone(),
            }
        };
        state.requests.lock().expect("requests lock").push(captured);

        let result = match method.as_str() {
            "GetFile" => {
                let file_id = serde_json::from_slice::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| {
                        v.get("file_id")
                            .and_then(|f| f.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_default();
                json!({
                    "file_id": file_id,
                    "file_unique_id": "unique",
                    "file_size": 3,
                    "file_path": format!("files/{file_id}")
                })
            },
            "SendDocument" => json!({
                "message_id": 2,
                "date": 0,
                "chat": { "id": 42, "type": "private", "first_name": "Alice" },
                "document": {
                    "file_id": "artifact-file-id",
                    "file_unique_id": "artifact-unique",
                    "file_size": 3
                }
            }),
            "SendPhoto" => json!({
                "message_id": 3,
                "date": 0,
                "chat": { "id": 42, "type": "private", "first_name": "Alice" },
                "photo": [{
                    "file_id": "photo-file-id",
                    "file_unique_id": "photo-unique",
                    "width": 1,
                    "height": 1,
                    "file_size": 3
                }]
            }),
            "SendChatAction" => json!(true),
            _ => json!({
                "message_id": 1,
                "date": 0,
                "chat": { "id": 42, "type": "private", "first_name": "Alice" },
                "text": "ok"
            }),
        };
        Json(json!({ "ok": true, "result": result }))
    }

    // Serves registered file content for the bot's file-download GETs.
    async fn file_handler(State(state): State<MockApi>, uri: Uri) -> Vec<u8> {
        let file_id = uri.path().rsplit('/').next().unwrap_or_default();
        state
            .files
            .lock()
            .expect("files lock")
            .get(file_id)
            .cloned()
            .unwrap_or_default()
    }

    struct MockServer {
        requests: Arc<Mutex<Vec<Captured>>>,
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        api_url: reqwest::Url,
        _shutdown: oneshot::Sender<()>,
    }

    impl MockServer {
        fn sent_texts(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("requests lock")
                .iter()
                .filter_map(|c| c.message_text().map(str::to_string))
                .collect()
        }

        fn methods(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("requests lock")
                .iter()
                .map(|c| c.method().to_string())
                .collect()
        }

        fn put_file(&self, file_id: &str, bytes: Vec<u8>) {
            self.files
                .lock()
                .expect("files lock")
                .insert(file_id.to_string(), bytes);
        }
    }

    async fn spawn_mock_api() -> MockServer {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let files = Arc::new(Mutex::new(HashMap::new()));
        let mock = MockApi {
            requests: Arc::clone(&requests),
            files: Arc::clone(&files),
        };
        let app = Router::new()
            .route("/{*path}", post(api_handler).get(file_handler))
            .with_state(mock);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        MockServer {
            requests,
            files,
            api_url,
            _shutdown: shutdown_tx,
        }
    }

    /// Encode a tiny solid-color PNG for upload fixtures.
    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([60, 90, 200]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    fn test_state(server: &MockServer, config: BotConfig) -> SharedState {
        let bot = teloxide::Bot::new("test-token").set_api_url(server.api_url.clone());
        BotState::new(bot, config)
    }

    fn text_message(user_id: u64, message_text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": user_id, "is_bot": false, "first_name": "Alice" },
            "text": message_text
        }))
        .expect("deserialize text message")
    }

    fn photo_message(user_id: u64, file_id: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": user_id, "is_bot": false, "first_name": "Alice" },
            "photo": [{
                "file_id": file_id,
                "file_unique_id": "unique",
                "width": 100,
                "height": 100,
                "file_size": 1234
            }]
        }))
        .expect("deserialize photo message")
    }

    fn document_message(user_id: u64, file_id: &str, mime: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": user_id, "is_bot": false, "first_name": "Alice" },
            "document": {
                "file_id": file_id,
                "file_unique_id": "unique",
                "file_name": "upload.bin",
                "mime_type": mime,
                "file_size": 1234
            }
        }))
        .expect("deserialize document message")
    }

    #[tokio::test]
    async fn unmatched_text_replies_with_the_menu() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, text_message(1, "hello there"))
            .await
            .expect("handle");

        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("keyboard buttons")));
    }

    #[tokio::test]
    async fn start_command_sends_welcome() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, text_message(1, "/start"))
            .await
            .expect("handle");

        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("Welcome")));
    }

    #[tokio::test]
    async fn create_pdf_without_images_warns_and_leaves_session_unchanged() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, text_message(7, MenuCommand::CreatePdf.label()))
            .await
            .expect("handle");

        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("No images")));
        assert_eq!(state.sessions.snapshot(7), Session::default());
    }

    #[tokio::test]
    async fn add_image_enters_collection_mode_and_clears_old_batch() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());
        state.sessions.update(3, |s| s.push_image("stale".into()));

        handle_message(&state, text_message(3, MenuCommand::AddImage.label()))
            .await
            .expect("handle");

        let session = state.sessions.snapshot(3);
        assert_eq!(session.mode, CollectMode::Images);
        assert!(session.images.is_empty());
    }

    #[tokio::test]
    async fn photo_outside_collection_mode_is_dropped_with_guidance() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, photo_message(5, "ph-1"))
            .await
            .expect("handle");

        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("Add Image first")));
        assert!(state.sessions.snapshot(5).images.is_empty());
    }

    #[tokio::test]
    async fn photos_are_collected_in_upload_order() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, text_message(5, MenuCommand::AddImage.label()))
            .await
            .expect("enter collect mode");
        for file_id in ["ph-1", "ph-2"] {
            handle_message(&state, photo_message(5, file_id))
                .await
                .expect("accept photo");
        }

        let session = state.sessions.snapshot(5);
        let order: Vec<&str> = session.images.iter().map(FileRef::as_str).collect();
        assert_eq!(order, vec!["ph-1", "ph-2"]);
        let texts = server.sent_texts();
        assert_eq!(
            texts.iter().filter(|t| t.contains("Image saved")).count(),
            2
        );
    }

    #[tokio::test]
    async fn create_pdf_consumes_collected_images_and_records_the_artifact() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());
        server.put_file("ph-1", png(4, 4));
        server.put_file("ph-2", png(4, 4));

        handle_message(&state, text_message(21, MenuCommand::AddImage.label()))
            .await
            .expect("enter collect mode");
        for file_id in ["ph-1", "ph-2"] {
            handle_message(&state, photo_message(21, file_id))
                .await
                .expect("accept photo");
        }
        handle_message(&state, text_message(21, MenuCommand::CreatePdf.label()))
            .await
            .expect("create pdf");

        let session = state.sessions.snapshot(21);
        assert!(session.images.is_empty());
        assert_eq!(session.mode, CollectMode::Idle);
        assert_eq!(session.pdfs, vec![FileRef::from("artifact-file-id")]);
        assert!(server.methods().iter().any(|m| m == "SendDocument"));
    }

    #[tokio::test]
    async fn pdfs_collected_via_add_pdf_accumulate_and_merge() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());
        let doc_a = pdf::compose_from_images(&[png(2, 2)]).expect("build pdf a");
        let doc_b = pdf::compose_from_images(&[png(2, 2)]).expect("build pdf b");
        server.put_file("pdf-1", doc_a);
        server.put_file("pdf-2", doc_b);

        handle_message(&state, text_message(13, MenuCommand::AddPdf.label()))
            .await
            .expect("enter collect mode");
        handle_message(&state, document_message(13, "pdf-1", "application/pdf"))
            .await
            .expect("first pdf");
        handle_message(&state, document_message(13, "pdf-2", "application/pdf"))
            .await
            .expect("second pdf");

        let before = state.sessions.snapshot(13);
        assert_eq!(before.pdfs, vec![
            FileRef::from("pdf-1"),
            FileRef::from("pdf-2")
        ]);

        handle_message(&state, text_message(13, MenuCommand::MergePdfs.label()))
            .await
            .expect("merge");

        let after = state.sessions.snapshot(13);
        assert_eq!(after.pdfs, vec![FileRef::from("artifact-file-id")]);
        assert_eq!(after.mode, CollectMode::Idle);
        let texts = server.sent_texts();
        assert!(!texts.iter().any(|t| t.contains("at least two")));
        assert!(server.methods().iter().any(|m| m == "SendDocument"));
    }

    #[tokio::test]
    async fn pdf_upload_replaces_the_current_pdf() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, document_message(9, "pdf-1", "application/pdf"))
            .await
            .expect("first pdf");
        handle_message(&state, document_message(9, "pdf-2", "application/pdf"))
            .await
            .expect("second pdf");

        let session = state.sessions.snapshot(9);
        assert_eq!(session.pdfs, vec![FileRef::from("pdf-2")]);
        assert_eq!(session.mode, CollectMode::Idle);
    }

    #[tokio::test]
    async fn image_document_requires_collection_mode() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, document_message(4, "img-doc", "image/png"))
            .await
            .expect("handle");
        assert!(state.sessions.snapshot(4).images.is_empty());

        handle_message(&state, text_message(4, MenuCommand::AddImage.label()))
            .await
            .expect("enter collect mode");
        handle_message(&state, document_message(4, "img-doc", "image/png"))
            .await
            .expect("accept image document");
        assert_eq!(state.sessions.snapshot(4).images, vec![FileRef::from(
            "img-doc"
        )]);
    }

    #[tokio::test]
    async fn unsupported_document_type_is_rejected() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, document_message(2, "blob", "text/plain"))
            .await
            .expect("handle");

        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("Unsupported document type")));
        assert_eq!(state.sessions.snapshot(2), Session::default());
    }

    #[tokio::test]
    async fn merge_with_a_single_pdf_warns() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, document_message(8, "pdf-1", "application/pdf"))
            .await
            .expect("store pdf");
        handle_message(&state, text_message(8, MenuCommand::MergePdfs.label()))
            .await
            .expect("merge");

        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("at least two")));
        assert_eq!(state.sessions.snapshot(8).pdfs, vec![FileRef::from("pdf-1")]);
    }

    #[tokio::test]
    async fn split_and_extract_without_pdf_warn() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, text_message(6, MenuCommand::SplitPdf.label()))
            .await
            .expect("split");
        handle_message(&state, text_message(6, MenuCommand::ExtractText.label()))
            .await
            .expect("extract");

        let texts = server.sent_texts();
        assert_eq!(
            texts
                .iter()
                .filter(|t| t.contains("No PDF in session"))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn cancel_resets_the_session_from_any_state() {
        let server = spawn_mock_api().await;
        let state = test_state(&server, BotConfig::default());

        handle_message(&state, text_message(11, MenuCommand::AddImage.label()))
            .await
            .expect("enter collect mode");
        handle_message(&state, photo_message(11, "ph-1"))
            .await
            .expect("accept photo");
        handle_message(&state, document_message(11, "pdf-1", "application/pdf"))
            .await
            .expect("store pdf");

        handle_message(&state, text_message(11, MenuCommand::Cancel.label()))
            .await
            .expect("cancel");

        assert_eq!(state.sessions.snapshot(11), Session::default());
        let texts = server.sent_texts();
        assert!(texts.iter().any(|t| t.contains("Session cleared")));
    }
}
