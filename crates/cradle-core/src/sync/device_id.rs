// Device identity for multi-device sync diagnostics.
// Format: "cradle-<uuid>"

use std::fs;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::error::SyncError;

const DEVICE_ID_FILE: &str = "device_id.txt";
const DEVICE_ID_PREFIX: &str = "cradle-";

/// Get or create the device id stored under `path`, creating the directory
/// and file on first use. The id is stable for the lifetime of the install
/// and shows up in sync logs to tell household devices apart.
pub fn get_or_create_device_id_at(path: &Path) -> Result<String, SyncError> {
    let device_id_path = path.join(DEVICE_ID_FILE);

    if device_id_path.exists() {
        let content = fs::read_to_string(&device_id_path)?;
        let device_id = content.trim().to_string();
        if device_id.starts_with(DEVICE_ID_PREFIX) {
            return Ok(device_id);
        }
        return Err(SyncError::RemoteApi(format!(
            "invalid device id on disk: {}",
            device_id
        )));
    }

    let device_id = format!("{}{}", DEVICE_ID_PREFIX, Uuid::new_v4());

    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    let mut file = fs::File::create(&device_id_path)?;
    writeln!(file, "{}", device_id)?;

    Ok(device_id)
}

/// Get or create the device id in the default data directory.
pub fn get_or_create_device_id() -> Result<String, SyncError> {
    let dir = crate::config::data_dir()?;
    get_or_create_device_id_at(&dir)
}
