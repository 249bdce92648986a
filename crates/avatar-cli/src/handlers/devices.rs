//! Devices command handler.

use anyhow::Result;
use avatar_player::{OutputDeviceInfo, list_output_devices};

use crate::error::CliError;

/// List output devices with the index `--device` expects.
pub fn execute(json: bool) -> Result<()> {
    let devices = list_output_devices().map_err(CliError::from)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }
    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }
    for device in &devices {
        println!("{}", format_device(device));
    }
    Ok(())
}

fn format_device(device: &OutputDeviceInfo) -> String {
    let default = if device.is_default { "  (default)" } else { "" };
    format!(
        "{:>3}  {}  [{} ch]{default}",
        device.index, device.name, device.max_channels
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_default_device() {
        let device = OutputDeviceInfo {
            index: 1,
            name: "Speakers".into(),
            is_default: true,
            max_channels: 2,
        };
        assert_eq!(format_device(&device), "  1  Speakers  [2 ch]  (default)");
    }
}
