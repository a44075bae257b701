use crate::app::refresh::FetchJob;
use std::path::PathBuf;

/// Side effects the handler asks the main loop to perform.
#[derive(Debug, PartialEq)]
pub enum Action {
    Fetch(FetchJob),
    CheckHealth,
    ClearCache,
    ExportFile { path: PathBuf },
    ImportFile { path: PathBuf },
    Quit,
}
