//! Submission, lookup, progress stream, and result download routes.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::error::Error;
use crate::http::error::{ApiError, ApiResult};
use crate::http::mime::media_type_for_extension;
use crate::http::state::AppState;
use crate::jobs::{JobManager, JobStatus, SubscriptionId};
use crate::processors::traits::ProcessorDescriptor;
use crate::processors::util::extension_with_dot;
use crate::registry::options::validate_options;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(submit_job))
        .route("/jobs/batch", post(submit_batch))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/progress", get(progress_stream))
        .route("/jobs/{id}/result", get(download_result))
        .route("/jobs/batch/{id}", get(get_batch))
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

/// Drain a multipart body into `(processor_id, options, files)`. `file_field` selects
/// which field name carries the uploaded bytes (`"file"` for single submission,
/// `"files"` for batch), since both forms share every other field.
async fn read_submission(mut multipart: Multipart, file_field: &str) -> ApiResult<(String, serde_json::Value, Vec<UploadedFile>)> {
    let mut processor_id = None;
    let mut options_raw: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::bad_request(e.to_string()))? {
        let name = field.name().unwrap_or("").to_string();
        if name == file_field {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.to_string()))?;
            files.push(UploadedFile { filename, bytes: bytes.to_vec() });
        } else if name == "processor_id" {
            processor_id = Some(field.text().await.map_err(|e| ApiError::bad_request(e.to_string()))?);
        } else if name == "options" {
            options_raw = Some(field.text().await.map_err(|e| ApiError::bad_request(e.to_string()))?);
        }
    }

    let processor_id = processor_id.ok_or_else(|| ApiError::bad_request("missing 'processor_id' field"))?;
    let options = match options_raw {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(&raw).map_err(|e| Error::MalformedOptions(e.to_string()))?
        }
        _ => json!({}),
    };
    if files.is_empty() {
        return Err(ApiError::bad_request(format!("missing '{file_field}' field")));
    }

    Ok((processor_id, options, files))
}

fn check_extension(descriptor: &ProcessorDescriptor, filename: &str) -> Result<(), Error> {
    let ext = extension_with_dot(std::path::Path::new(filename)).unwrap_or_default();
    if descriptor.accepted_extensions.iter().any(|accepted| accepted == &ext) {
        Ok(())
    } else {
        Err(Error::ExtensionNotAccepted { processor_id: descriptor.id.clone(), ext })
    }
}

async fn submit_job(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<serde_json::Value>> {
    let (processor_id, options, mut files) = read_submission(multipart, "file").await?;
    let processor = state.registry.get(&processor_id)?;
    let upload = files.remove(0);
    check_extension(processor.descriptor(), &upload.filename)?;
    validate_options(&processor.descriptor().options_schema, &options)?;

    let job = state.manager.create(&processor_id, &upload.filename);
    let input_path = state.store.save_upload(&job.id, &upload.filename, &upload.bytes).await?;
    let output_dir = state.store.job_dir(&job.id).await?;

    spawn_execution(&state, job.id.clone(), processor, input_path.clone(), vec![input_path], output_dir, options);

    Ok(Json(serde_json::to_value(job.snapshot()).expect("JobSnapshot always serializes")))
}

async fn submit_batch(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<serde_json::Value>> {
    let (processor_id, options, files) = read_submission(multipart, "files").await?;
    let processor = state.registry.get(&processor_id)?;
    let descriptor = processor.descriptor();

    for file in &files {
        check_extension(descriptor, &file.filename)?;
    }
    validate_options(&descriptor.options_schema, &options)?;

    if descriptor.accepts_multiple_files {
        let job = state.manager.create(&processor_id, &files[0].filename);
        let output_dir = state.store.job_dir(&job.id).await?;

        let mut input_paths = Vec::with_capacity(files.len());
        for file in &files {
            input_paths.push(state.store.save_upload(&job.id, &file.filename, &file.bytes).await?);
        }

        spawn_execution(&state, job.id.clone(), processor, input_paths[0].clone(), input_paths, output_dir, options);

        let mut value = serde_json::to_value(job.snapshot()).expect("JobSnapshot always serializes");
        value.as_object_mut().expect("snapshot serializes as an object").insert("type".to_string(), json!("job"));
        Ok(Json(value))
    } else {
        let mut job_ids = Vec::with_capacity(files.len());
        for file in &files {
            let job = state.manager.create(&processor_id, &file.filename);
            let input_path = state.store.save_upload(&job.id, &file.filename, &file.bytes).await?;
            let output_dir = state.store.job_dir(&job.id).await?;

            spawn_execution(&state, job.id.clone(), processor.clone(), input_path.clone(), vec![input_path], output_dir, options.clone());
            job_ids.push(job.id);
        }

        let batch = state.manager.create_batch(&processor_id, job_ids);
        let mut value = serde_json::to_value(batch.snapshot()).expect("BatchSnapshot always serializes");
        value.as_object_mut().expect("snapshot serializes as an object").insert("type".to_string(), json!("batch"));
        Ok(Json(value))
    }
}

fn spawn_execution(
    state: &AppState,
    job_id: String,
    processor: Arc<dyn crate::processors::Processor>,
    input_path: PathBuf,
    input_paths: Vec<PathBuf>,
    output_dir: PathBuf,
    options: serde_json::Value,
) {
    let manager = state.manager.clone();
    let pool = state.pool.clone();
    tokio::spawn(crate::pipeline::run_job(job_id, manager, pool, processor, input_path, input_paths, output_dir, options));
}

async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let snapshot = state.manager.get(&id).ok_or_else(|| Error::JobNotFound(id.clone()))?;
    Ok(Json(serde_json::to_value(snapshot).expect("JobSnapshot always serializes")))
}

async fn get_batch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let batch = state.manager.get_batch(&id).ok_or_else(|| Error::BatchNotFound(id.clone()))?;
    let jobs: Vec<_> = batch
        .job_ids
        .iter()
        .filter_map(|job_id| state.manager.get(job_id))
        .collect();

    let mut value = serde_json::to_value(&batch).expect("BatchSnapshot always serializes");
    value
        .as_object_mut()
        .expect("snapshot serializes as an object")
        .insert("jobs".to_string(), serde_json::to_value(jobs).expect("job snapshots always serialize"));
    Ok(Json(value))
}

struct UnsubscribeGuard {
    manager: Arc<JobManager>,
    job_id: String,
    sub_id: SubscriptionId,
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        self.manager.unsubscribe(&self.job_id, self.sub_id);
    }
}

/// SSE progress stream. Emits the current snapshot on connect, then forwards
/// published events until a terminal one arrives, unsubscribing either way.
async fn progress_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let snapshot = state.manager.get(&id).ok_or_else(|| Error::JobNotFound(id.clone()))?;
    let manager = state.manager.clone();

    let stream = async_stream::stream! {
        yield Ok(Event::default().json_data(&snapshot).expect("snapshot serializes"));

        if snapshot.status.is_terminal() {
            return;
        }

        let Ok((sub_id, mut rx)) = manager.subscribe(&id) else { return; };
        let _guard = UnsubscribeGuard { manager: manager.clone(), job_id: id.clone(), sub_id };

        loop {
            match tokio::time::timeout(Duration::from_secs(60), rx.recv()).await {
                Ok(Some(event)) => {
                    let terminal = event.status.is_terminal();
                    yield Ok(Event::default().json_data(&event).expect("event serializes"));
                    if terminal {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    yield Ok(Event::default().json_data(&json!({"status": "timeout"})).expect("value serializes"));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn download_result(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let snapshot = state.manager.get(&id).ok_or_else(|| Error::JobNotFound(id.clone()))?;
    if snapshot.status != JobStatus::Completed {
        return Err(Error::MissingResult.into());
    }

    // Set whenever a job reaches Completed (Job invariant 1), so this is always present here.
    let result_path = state.manager.result_path(&id).ok_or(Error::MissingResult)?;

    let file = tokio::fs::File::open(&result_path).await.map_err(Error::Io)?;
    let body = Body::from_stream(ReaderStream::new(file));

    let stem = std::path::Path::new(&snapshot.original_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("result");
    let download_name = format!("{stem}{}", snapshot.result_extension);
    let media_type = media_type_for_extension(&snapshot.result_extension);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, media_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{download_name}\"")),
        ],
        body,
    )
        .into_response())
}

