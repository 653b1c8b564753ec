//! Uploads the recording parked while the user was signed out.
//!
//! Reads the server and credential from the saved [`AppConfig`]; the pending
//! entry is only cleared once the server accepted the upload.

use std::process::ExitCode;
use std::sync::Arc;

use screen_capture_cloud::config::{self, AppConfig};
use screen_capture_cloud::{ExportError, ExportSession, HttpUploader, RecordingUploader, RefreshNotifier, SaveOutcome};
use screen_capture_core::{FilePendingStore, PendingRecordingStore, PreviewRegistry};

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ExportError> {
    let config: AppConfig = config::load_config()?;
    let store = Arc::new(FilePendingStore::new(config::pending_dir()?));

    let Some(recording) = store.load()? else {
        println!("No pending recording.");
        return Ok(());
    };

    let uploader = if config.is_complete() {
        Some(HttpUploader::new(&config.server_url, &config.token)?)
    } else {
        None
    };

    let mut export = ExportSession::from_pending(
        recording,
        Arc::new(PreviewRegistry::new()),
        Arc::clone(&store) as Arc<dyn PendingRecordingStore>,
        Arc::new(RefreshNotifier::new()),
    );

    let outcome = export.save(uploader.as_ref().map(|u| u as &dyn RecordingUploader));
    export.close();

    match outcome? {
        SaveOutcome::Uploaded(receipt) => {
            store.clear()?;
            println!("Uploaded '{}' (HTTP {}).", export.filename(), receipt.status);
        }
        SaveOutcome::LoginRequired => {
            println!("Not signed in; the recording stays pending. Configure a server and token first.");
        }
    }
    Ok(())
}
